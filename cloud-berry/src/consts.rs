//! 通用常量.

/// 有效观测的下限. 低于该值的格点视为无效 (例如卫星扫描边缘外的填充值).
pub const VALIDITY_FLOOR: f32 = -5.0;

/// 单通道增长标记在时间轴上的最短持续步数.
pub const MIN_MARKER_LENGTH: usize = 3;

/// 双通道增长标记在时间轴上的最短持续步数.
pub const MIN_MULTICHANNEL_LENGTH: usize = 4;

/// 增长率上阈值 (单位: 场的单位 / 分钟). 超过该值的区域视为强增长核心.
pub const UPPER_GROWTH_THRESHOLD: f32 = 0.5;

/// 增长率下阈值. 增长标记的外延.
pub const LOWER_GROWTH_THRESHOLD: f32 = 0.25;

/// 曲率过滤的空间高斯平滑尺度 (单位: 格点).
pub const CURVATURE_SIGMA: f64 = 2.0;

/// 边缘分水岭背景掩膜的腐蚀次数.
pub const ERODE_DISTANCE: usize = 5;

/// 高斯核截断半径 (单位: σ).
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// 常用结构元素. 均为进程级只读常量, 首次访问时构建.
pub mod structure {
    use once_cell::sync::Lazy;

    use crate::Structure;

    /// 仅在时间轴方向延伸的 `3 x 1 x 1` 十字.
    pub static TEMPORAL_CROSS: Lazy<Structure> =
        Lazy::new(|| Structure::from_offsets([(-1, 0, 0), (0, 0, 0), (1, 0, 0)]));

    /// 空间平面内的 4 邻域十字 (`1 x 3 x 3`, 含中心).
    pub static SPATIAL_CROSS: Lazy<Structure> = Lazy::new(|| {
        Structure::from_offsets([(0, -1, 0), (0, 0, -1), (0, 0, 0), (0, 0, 1), (0, 1, 0)])
    });

    /// 空间平面内的 8 邻域方框 (`1 x 3 x 3`, 含中心).
    pub static SPATIAL_BOX: Lazy<Structure> = Lazy::new(|| {
        Structure::from_offsets((-1..=1).flat_map(|h| (-1..=1).map(move |w| (0, h, w))))
    });

    /// 三维 6 邻域十字 (`3 x 3 x 3`, 含中心). 连通标记的默认连通性.
    pub static CROSS_3D: Lazy<Structure> = Lazy::new(|| {
        Structure::from_offsets([
            (-1, 0, 0),
            (0, -1, 0),
            (0, 0, -1),
            (0, 0, 0),
            (0, 0, 1),
            (0, 1, 0),
            (1, 0, 0),
        ])
    });
}
