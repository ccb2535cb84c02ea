//! 增长标记检测.

use ndarray::{Array3, ArrayView3, Zip};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::curvature::{get_curvature_filter, CurvatureDirection, CurvatureSpec};
use crate::consts::structure::{SPATIAL_CROSS, TEMPORAL_CROSS};
use crate::consts::{
    CURVATURE_SIGMA, LOWER_GROWTH_THRESHOLD, MIN_MARKER_LENGTH, MIN_MULTICHANNEL_LENGTH,
    UPPER_GROWTH_THRESHOLD, VALIDITY_FLOOR,
};
use crate::error::check_shape;
use crate::flow::{FlowEngine, LabelOptions, Reducer};
use crate::labels::{
    filter_labels_by_length_and_mask, filter_labels_by_length_and_multimask, max_label,
};
use crate::morph::{binary_opening, grey_opening};
use crate::{GridData, Label, LabelResult};

/// 单通道增长标记检测参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrowthConfig {
    /// 曲率过滤参数.
    pub curvature: CurvatureSpec,

    /// 强增长核心的阈值.
    pub upper_threshold: f32,

    /// 增长标记外延的阈值.
    pub lower_threshold: f32,

    /// 最短持续步数.
    pub min_length: usize,

    /// 有效观测的下限 (含).
    pub validity_floor: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            curvature: CurvatureSpec::default(),
            upper_threshold: UPPER_GROWTH_THRESHOLD,
            lower_threshold: LOWER_GROWTH_THRESHOLD,
            min_length: MIN_MARKER_LENGTH,
            validity_floor: VALIDITY_FLOOR,
        }
    }
}

/// 双通道增长标记检测参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultichannelConfig {
    /// 转发给连通标记的重叠比例.
    pub overlap: f32,

    /// 转发给连通标记的子段收缩比例.
    pub subsegment_shrink: f32,

    /// 最短持续步数.
    pub min_length: usize,

    /// 候选区域的阈值.
    pub lower_threshold: f32,

    /// 两个通道各自的强增长阈值.
    pub upper_threshold: f32,

    /// 曲率过滤的空间平滑标准差.
    pub sigma: f64,

    /// 上升通道有效观测的下限 (不含).
    pub validity_floor: f32,
}

impl Default for MultichannelConfig {
    fn default() -> Self {
        Self {
            overlap: 0.5,
            subsegment_shrink: 0.0,
            min_length: MIN_MULTICHANNEL_LENGTH,
            lower_threshold: LOWER_GROWTH_THRESHOLD,
            upper_threshold: UPPER_GROWTH_THRESHOLD,
            sigma: CURVATURE_SIGMA,
            validity_floor: VALIDITY_FLOOR,
        }
    }
}

/// 单通道检测结果. 两个字段与输入场是同一类容器.
#[derive(Clone, Debug)]
pub struct GrowthMarkers<G, L> {
    /// 平滑后的增长率 (单位: 场的单位 / 分钟).
    pub growth: G,

    /// 增长标记.
    pub markers: L,
}

/// 双通道检测结果. 各字段与对应的输入场是同一类容器.
#[derive(Clone, Debug)]
pub struct DualGrowthMarkers<G, L> {
    /// 上升通道平滑后的增长率.
    pub rising_growth: G,

    /// 下降通道平滑后的增长率.
    pub falling_growth: G,

    /// 增长标记.
    pub markers: L,
}

/// 运动补偿的时间平滑: 先在时间十字上取均值, 再取最大值.
///
/// 第二步把每个时刻的峰值扩展到前后相邻的时刻, 使标记不受单帧噪声的影响.
pub fn filtered_tdiff<E: FlowEngine>(flow: &E, raw_diff: ArrayView3<f32>) -> Array3<f32> {
    let mean = flow.convolve(raw_diff, &TEMPORAL_CROSS, Reducer::Mean);
    flow.convolve(mean.view(), &TEMPORAL_CROSS, Reducer::Max)
}

/// 单位时间 (分钟) 的运动补偿时间差分. 时间间隔取自场的时间坐标,
/// 没有时间坐标时视为每步 1 分钟.
pub fn time_derivative<E, F>(flow: &E, field: &F) -> Array3<f32>
where
    E: FlowEngine,
    F: GridData<f32>,
{
    let mut diff = flow.diff(field.data());
    assert_eq!(diff.dim(), field.shape(), "光流引擎返回的差分形状不一致");
    let steps = field.time_steps();
    for (mut s, &dt) in diff.outer_iter_mut().zip(steps.iter()) {
        s.mapv_inplace(|v| v / dt);
    }
    diff
}

/// `value * mask`, 但缺失值保持缺失.
#[inline]
fn masked(value: f32, keep: bool) -> f32 {
    value * (keep as u8 as f32)
}

/// 单通道增长标记检测.
///
/// 1. 计算单位时间的时间差分, 并做时间平滑.
/// 2. 平滑结果经过灰度开运算, 再乘以负曲率掩膜.
/// 3. 不低于上阈值的连通域为强增长核心, 按持续时间和有效性过滤.
/// 4. 不低于下阈值的区域经开运算后标记为候选, 依次按 "与核心重叠" 和有效性过滤.
///
/// # 返回值
///
/// 平滑后的增长率与最终标记, 均为与 `field` 同类的容器.
pub fn detect_growth_markers<E, F>(
    flow: &E,
    field: &F,
    cfg: &GrowthConfig,
) -> LabelResult<GrowthMarkers<F::Like<f32>, F::Like<Label>>>
where
    E: FlowEngine,
    F: GridData<f32>,
{
    let data = field.data();
    let raw = time_derivative(flow, field);
    let smoothed = filtered_tdiff(flow, raw.view());
    let curvature = get_curvature_filter(data, &cfg.curvature);
    let opened = grey_opening(smoothed.view(), &SPATIAL_CROSS);
    let filtered = Zip::from(&opened)
        .and(&curvature)
        .map_collect(|&v, &c| masked(v, c));
    let valid = data.mapv(|v| v >= cfg.validity_floor);
    let no_options = LabelOptions::default();

    let strong = flow.label(filtered.mapv(|v| v >= cfg.upper_threshold).view(), &no_options);
    log::debug!("强增长核心: {} 个", max_label(&strong.view()));
    let strong = filter_labels_by_length_and_mask(strong.view(), valid.view(), cfg.min_length)?;
    log::debug!("有效的强增长核心: {} 个", max_label(&strong.view()));

    let coarse = binary_opening(
        filtered.mapv(|v| v >= cfg.lower_threshold).view(),
        &SPATIAL_CROSS,
    );
    let markers = flow.label(coarse.view(), &no_options);
    log::debug!("候选标记: {} 个", max_label(&markers.view()));
    let markers = filter_labels_by_length_and_mask(
        markers.view(),
        strong.mapv(|l| l != 0).view(),
        cfg.min_length,
    )?;
    let markers = filter_labels_by_length_and_mask(markers.view(), valid.view(), cfg.min_length)?;
    log::debug!("最终标记: {} 个", max_label(&markers.view()));

    Ok(GrowthMarkers {
        growth: field.wrap_like(smoothed),
        markers: field.wrap_like(markers),
    })
}

/// 双通道增长标记检测. `rising` 中的对象预期上升, `falling` 中的对象预期下降
/// (例如水汽差值上升的同时亮温下降).
///
/// 候选区域为 "上升通道在负曲率区域不低于下阈值" 或 "下降通道在正曲率区域不高于负的下阈值",
/// 经开运算后以 `overlap` 与 `subsegment_shrink` 标记. 对象需要同时满足:
/// 上升通道达到上阈值, 下降通道达到负的上阈值, 且与上升通道的有效区域重叠.
///
/// 两个输入的形状不一致时返回 [`LabelError::ShapeMismatch`](crate::LabelError::ShapeMismatch).
pub fn detect_growth_markers_multichannel<E, F>(
    flow: &E,
    rising: &F,
    falling: &F,
    cfg: &MultichannelConfig,
) -> LabelResult<DualGrowthMarkers<F::Like<f32>, F::Like<Label>>>
where
    E: FlowEngine,
    F: GridData<f32>,
{
    check_shape(rising.data().shape(), falling.data().shape())?;

    let rising_growth = filtered_tdiff(flow, time_derivative(flow, rising).view());
    let falling_growth = filtered_tdiff(flow, time_derivative(flow, falling).view());

    let dome = get_curvature_filter(
        rising.data(),
        &CurvatureSpec::new(cfg.sigma, 0.0, CurvatureDirection::Negative),
    );
    let bowl = get_curvature_filter(
        falling.data(),
        &CurvatureSpec::new(cfg.sigma, 0.0, CurvatureDirection::Positive),
    );
    let lower = cfg.lower_threshold;
    let candidates = Zip::from(&rising_growth)
        .and(&dome)
        .and(&falling_growth)
        .and(&bowl)
        .map_collect(|&r, &d, &f, &b| masked(r, d) >= lower || masked(f, b) <= -lower);
    let candidates = binary_opening(candidates.view(), &SPATIAL_CROSS);

    let options = LabelOptions {
        overlap: cfg.overlap,
        subsegment_shrink: cfg.subsegment_shrink,
    };
    let markers = flow.label(candidates.view(), &options);
    log::debug!("双通道候选标记: {} 个", max_label(&markers.view()));

    let upper = cfg.upper_threshold;
    let rising_core = rising_growth.mapv(|v| v >= upper);
    let falling_core = falling_growth.mapv(|v| v <= -upper);
    let valid = rising.data().mapv(|v| v > cfg.validity_floor);
    let markers = filter_labels_by_length_and_multimask(
        markers.view(),
        &[rising_core.view(), falling_core.view(), valid.view()],
        cfg.min_length,
    )?;
    log::debug!("双通道最终标记: {} 个", max_label(&markers.view()));

    Ok(DualGrowthMarkers {
        rising_growth: rising.wrap_like(rising_growth),
        falling_growth: falling.wrap_like(falling_growth),
        markers: rising.wrap_like(markers),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::StaticFlow;
    use crate::{CoordArray, LabelError, TimeCoord};
    use ndarray::s;

    fn f32_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    /// 振幅随时间线性增长的高斯穹顶.
    fn growing_dome(t: usize, n: usize, s: f32, rate: f32) -> Array3<f32> {
        let c = (n / 2) as f32;
        Array3::from_shape_fn((t, n, n), |(k, h, w)| {
            let r2 = (h as f32 - c).powi(2) + (w as f32 - c).powi(2);
            rate * (1.0 + k as f32) * (-r2 / (2.0 * s * s)).exp()
        })
    }

    #[test]
    fn test_time_derivative_irregular_steps() {
        let series = [0.0f32, 5.0, 15.0, 20.0];
        let data = Array3::from_shape_fn((4, 2, 2), |(t, _, _)| series[t]);
        let time = TimeCoord::new(vec![0.0, 300.0, 900.0, 1200.0]).unwrap();
        let field = CoordArray::new(data.clone(), time).unwrap();
        let d = time_derivative(&StaticFlow, &field);
        assert!(d.iter().all(|v| f32_eq(*v, 1.0)));

        // 裸数组按每步 1 分钟计算
        let d = time_derivative(&StaticFlow, &data);
        assert_eq!(d.slice(s![.., 0, 0]).to_vec(), vec![5.0, 10.0, 5.0, 5.0]);
    }

    #[test]
    fn test_filtered_tdiff_extends_peaks() {
        let mut raw = Array3::<f32>::zeros((7, 1, 1));
        raw[(3, 0, 0)] = 3.0;
        let f = filtered_tdiff(&StaticFlow, raw.view());
        assert_eq!(
            f.iter().copied().collect::<Vec<_>>(),
            vec![0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_single_channel_dome() {
        // 重复初始化会失败, 忽略即可
        let _ = simple_logger::init_with_level(log::Level::Debug);
        let field = growing_dome(8, 21, 3.0, 1.0);
        let out = detect_growth_markers(&StaticFlow, &field, &GrowthConfig::default()).unwrap();
        assert!(f32_eq(out.growth[(4, 10, 10)], 1.0));
        assert_eq!(max_label(&out.markers.view()), 1);
        assert!((0..8).all(|t| out.markers[(t, 10, 10)] == 1));
        assert_eq!(out.markers[(0, 0, 0)], 0);
    }

    #[test]
    fn test_single_channel_invalid_field() {
        // 增长与曲率都相同, 但整个场低于有效下限
        let field = growing_dome(8, 21, 3.0, 1.0).mapv(|v| v - 100.0);
        let out = detect_growth_markers(&StaticFlow, &field, &GrowthConfig::default()).unwrap();
        assert!(out.markers.iter().all(|l| *l == 0));
    }

    #[test]
    fn test_single_channel_too_short() {
        let field = growing_dome(8, 21, 3.0, 1.0);
        let cfg = GrowthConfig {
            min_length: 9,
            ..Default::default()
        };
        let out = detect_growth_markers(&StaticFlow, &field, &cfg).unwrap();
        assert!(out.markers.iter().all(|l| *l == 0));
    }

    #[test]
    fn test_multichannel_keeps_coordinates() {
        // 每步 5 分钟, 振幅每步增长 5, 即每分钟增长 1
        let time = TimeCoord::uniform(0.0, 300.0, 8).unwrap();
        let up = growing_dome(8, 21, 3.0, 5.0);
        let down = up.mapv(|v| -v);
        let rising = CoordArray::new(up, time.clone()).unwrap();
        let falling = CoordArray::new(down, time.clone()).unwrap();

        let out = detect_growth_markers_multichannel(
            &StaticFlow,
            &rising,
            &falling,
            &MultichannelConfig::default(),
        )
        .unwrap();
        assert_eq!(out.markers.time(), &time);
        assert_eq!(out.falling_growth.time(), &time);
        let markers = out.markers.as_array();
        assert_eq!(max_label(&markers.view()), 1);
        assert!((0..8).all(|t| markers[(t, 10, 10)] == 1));
        assert!(f32_eq(out.rising_growth.as_array()[(2, 10, 10)], 1.0));
        assert!(f32_eq(out.falling_growth.as_array()[(2, 10, 10)], -1.0));
    }

    #[test]
    fn test_multichannel_needs_both_channels() {
        let rising = growing_dome(8, 21, 3.0, 1.0);
        let falling = Array3::<f32>::zeros((8, 21, 21));
        let out = detect_growth_markers_multichannel(
            &StaticFlow,
            &rising,
            &falling,
            &MultichannelConfig::default(),
        )
        .unwrap();
        assert!(out.markers.iter().all(|l| *l == 0));

        let short = Array3::<f32>::zeros((7, 21, 21));
        let e = detect_growth_markers_multichannel(
            &StaticFlow,
            &rising,
            &short,
            &MultichannelConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(e, LabelError::ShapeMismatch { .. }));
    }
}
