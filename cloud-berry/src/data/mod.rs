use std::borrow::Cow;

use ndarray::{Array1, Array3, ArrayView, ArrayView3, Axis, Dimension};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Idx3d;

pub mod structure;

pub use structure::Structure;

/// 标签值类型. `0` 代表背景 (无对象), 正整数代表不同的对象.
pub type Label = u32;

/// 时间坐标轴. 内部以秒为单位保存严格递增的时间戳.
///
/// 该结构是只读的. 若要修改时间坐标, 你应该创建新的实例.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeCoord {
    seconds: Vec<f64>,
}

impl TimeCoord {
    /// 由时间戳 (单位: 秒) 构建时间坐标.
    ///
    /// `seconds` 必须非空, 有限且严格递增, 否则返回 `None`.
    pub fn new(seconds: Vec<f64>) -> Option<Self> {
        if seconds.is_empty()
            || !seconds.iter().all(|t| t.is_finite())
            || seconds.windows(2).any(|w| w[0] >= w[1])
        {
            return None;
        }
        Some(Self { seconds })
    }

    /// 构建从 `start` 开始, 间隔为 `step` 秒, 共 `len` 个时刻的等间隔时间坐标.
    #[inline]
    pub fn uniform(start: f64, step: f64, len: usize) -> Option<Self> {
        Self::new((0..len).map(|i| start + step * i as f64).collect())
    }

    /// 时刻个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    /// 是否为空. 合法构建的实例永远非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }

    /// 原始时间戳 (单位: 秒).
    #[inline]
    pub fn seconds(&self) -> &[f64] {
        &self.seconds
    }

    /// 每个时间步的实际间隔, 单位为分钟. 长度与时刻个数相同.
    ///
    /// 第 `i` 个分量为 `t[i + 1] - t[i]`, 最后一个分量重复最后一个间隔.
    /// 只有一个时刻时返回 `[1.0]`.
    pub fn step_minutes(&self) -> Array1<f32> {
        if self.seconds.len() == 1 {
            return Array1::ones(1);
        }
        let mut steps: Vec<f32> = self
            .seconds
            .windows(2)
            .map(|w| ((w[1] - w[0]) / 60.0) as f32)
            .collect();
        let last = steps[steps.len() - 1];
        steps.push(last);
        Array1::from(steps)
    }
}

/// 带时间坐标的三维网格数据 `(t, h, w)`.
#[derive(Clone, Debug)]
pub struct CoordArray<T> {
    data: Array3<T>,
    time: TimeCoord,
}

impl<T> CoordArray<T> {
    /// 用裸数据和时间坐标构建. 如果时间坐标长度与 `data` 首轴长度不一致, 返回 `None`.
    pub fn new(data: Array3<T>, time: TimeCoord) -> Option<Self> {
        (data.len_of(Axis(0)) == time.len()).then_some(Self { data, time })
    }

    /// 获取时间坐标.
    #[inline]
    pub fn time(&self) -> &TimeCoord {
        &self.time
    }

    /// 获取底层数据的引用.
    #[inline]
    pub fn as_array(&self) -> &Array3<T> {
        &self.data
    }

    /// 直接获得内部数据的所有权.
    #[inline]
    pub fn into_raw(self) -> (Array3<T>, TimeCoord) {
        (self.data, self.time)
    }
}

/// 三维网格数据的共用属性. 算法只依赖该接口,
/// 因此裸数组和带坐标的容器可以共享同一套实现.
pub trait GridData<T> {
    /// 与 `Self` 同类的容器, 但元素类型为 `U`.
    type Like<U>;

    /// 获取底层数据的一份不可变 shallow copy.
    fn data(&self) -> ArrayView3<'_, T>;

    /// 获取时间坐标. 裸数组没有时间坐标.
    fn time_coord(&self) -> Option<&TimeCoord>;

    /// 用 `data` 构建一个与 `self` 同类的容器. 带坐标的容器会复制自己的坐标.
    fn wrap_like<U>(&self, data: Array3<U>) -> Self::Like<U>;

    /// 获取数据形状.
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data().dim()
    }

    /// 每个时间步的实际间隔 (单位: 分钟). 没有时间坐标时视为等间隔的 1 分钟.
    fn time_steps(&self) -> Array1<f32> {
        match self.time_coord() {
            Some(coord) => coord.step_minutes(),
            None => Array1::ones(self.data().len_of(Axis(0))),
        }
    }
}

impl<T> GridData<T> for Array3<T> {
    type Like<U> = Array3<U>;

    #[inline]
    fn data(&self) -> ArrayView3<'_, T> {
        self.view()
    }

    #[inline]
    fn time_coord(&self) -> Option<&TimeCoord> {
        None
    }

    #[inline]
    fn wrap_like<U>(&self, data: Array3<U>) -> Array3<U> {
        data
    }
}

impl<'a, T> GridData<T> for ArrayView3<'a, T> {
    type Like<U> = Array3<U>;

    #[inline]
    fn data(&self) -> ArrayView3<'_, T> {
        self.view()
    }

    #[inline]
    fn time_coord(&self) -> Option<&TimeCoord> {
        None
    }

    #[inline]
    fn wrap_like<U>(&self, data: Array3<U>) -> Array3<U> {
        data
    }
}

impl<T> GridData<T> for CoordArray<T> {
    type Like<U> = CoordArray<U>;

    #[inline]
    fn data(&self) -> ArrayView3<'_, T> {
        self.data.view()
    }

    #[inline]
    fn time_coord(&self) -> Option<&TimeCoord> {
        Some(&self.time)
    }

    fn wrap_like<U>(&self, data: Array3<U>) -> CoordArray<U> {
        assert_eq!(data.dim(), self.data.dim(), "包装数据与原容器形状不一致");
        CoordArray {
            data,
            time: self.time.clone(),
        }
    }
}

/// 获得行优先存储的序列化数据.
/// 当原始数据本身就是行优先格式时, 可以避免一次 deepcopy.
pub(crate) fn row_major<'a, A: Clone, D: Dimension>(a: &'a ArrayView<'_, A, D>) -> Cow<'a, [A]> {
    match a.as_slice() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(a.iter().cloned().collect()),
    }
}
