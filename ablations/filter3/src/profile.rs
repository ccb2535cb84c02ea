//! 算法运行统计.

use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时.
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    #[inline]
    fn total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// ablation/benchmark 数据统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 已完成的轮数.
    rounds: u64,

    /// 算法本身花费的时间 (不含合成数据的时间).
    work_time: AccTimer,

    /// 整个任务花费的总时间.
    real_time: AccTimer,

    /// 最耗时的一轮. 尚无记录时为 `None`.
    most: Option<Duration>,

    /// 输入中的标签总数.
    seen: u64,

    /// 过滤后幸存的标签总数.
    kept: u64,
}

impl Profile {
    /// 初始化, 同时开始总计时.
    #[inline]
    pub fn new() -> Self {
        Self {
            rounds: 0,
            work_time: AccTimer::new(),
            real_time: AccTimer::new(),
            most: None,
            seen: 0,
            kept: 0,
        }
    }

    /// 开始一轮计时.
    #[inline]
    pub fn round_start(&mut self) {
        self.work_time.start();
    }

    /// 结束一轮计时.
    #[inline]
    pub fn round_elapsed(&mut self) {
        let d = self.work_time.elapsed();
        self.rounds += 1;
        self.most = Some(self.most.map_or(d, |m| m.max(d)));
    }

    /// 记录本轮输入与输出的标签个数.
    #[inline]
    pub fn count_labels(&mut self, seen: u32, kept: u32) {
        self.seen += seen as u64;
        self.kept += kept as u64;
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    #[inline]
    pub fn get_rounds(&self) -> u64 {
        self.rounds
    }

    #[inline]
    pub fn get_seen(&self) -> u64 {
        self.seen
    }

    #[inline]
    pub fn get_kept(&self) -> u64 {
        self.kept
    }

    /// 以微秒为单位获得算法本身的总耗时.
    #[inline]
    pub fn get_work_time_us(&self) -> u64 {
        self.work_time.total_us()
    }

    /// 以微秒为单位获得任务的总自然时间.
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.total_us()
    }

    /// 以微秒为单位获得每轮的平均耗时. 没有任何一轮时返回 `None`.
    #[inline]
    pub fn get_avg_work_time_us(&self) -> Option<f64> {
        match self.rounds {
            0 => None,
            n => Some(self.get_work_time_us() as f64 / n as f64),
        }
    }

    /// 最耗时的一轮所消耗的时间.
    #[inline]
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        self.most
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
