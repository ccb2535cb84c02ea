use ndarray::Zip;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::structure::{SPATIAL_BOX, SPATIAL_CROSS};
use crate::consts::ERODE_DISTANCE;
use crate::error::check_shape;
use crate::flow::{FlowEngine, SobelMethod};
use crate::labels::max_label;
use crate::morph::{binary_erosion, binary_opening};
use crate::{GridData, Label, LabelError, LabelResult, Structure};

/// 边缘分水岭参数.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeWatershedConfig {
    /// 背景掩膜的腐蚀次数.
    pub erode_distance: usize,

    /// 是否输出分水岭的诊断信息. 不影响结果.
    pub verbose: bool,
}

impl Default for EdgeWatershedConfig {
    fn default() -> Self {
        Self {
            erode_distance: ERODE_DISTANCE,
            verbose: false,
        }
    }
}

/// 沿边缘场把种子标签向外生长.
///
/// 1. 把场截断到 `[lower, upper]`, 种子所在位置强制设为 `upper`.
/// 2. 截断后恰好等于 `lower` 的区域视为背景, 逐时刻以 8 邻域方框腐蚀
///    `erode_distance` 次 (越界视为背景), 得到生长不可进入的掩膜.
/// 3. 在截断后的场上计算 Sobel 梯度幅值, 以此为代价运行受约束的分水岭,
///    连通性由 `structure` 决定 (通常为 [`CROSS_3D`](crate::consts::structure::CROSS_3D)).
/// 4. 逐时刻以 4 邻域十字做开运算, 去除单像素宽的细条. 保留下来的位置维持原有标签.
///
/// 种子全为 `0` 时结果全为 `0`.
///
/// # 注意
///
/// 缺失值 (NaN) 在截断后保持缺失, 分水岭不会生长进入这些位置.
///
/// # 返回值
///
/// 与 `field` 同类的标签容器. `markers` 可以是裸数组, 也可以是带坐标的容器.
/// `markers` 的形状与 `field` 不一致时返回
/// [`LabelError::ShapeMismatch`]; `lower > upper` 时返回 [`LabelError::InvalidArgument`].
pub fn edge_watershed<E, F, M>(
    flow: &E,
    field: &F,
    markers: &M,
    upper: f32,
    lower: f32,
    structure: &Structure,
    cfg: &EdgeWatershedConfig,
) -> LabelResult<F::Like<Label>>
where
    E: FlowEngine,
    F: GridData<f32>,
    M: GridData<Label>,
{
    let data = field.data();
    let markers = markers.data();
    check_shape(data.shape(), markers.shape())?;
    if lower > upper {
        return Err(LabelError::InvalidArgument(
            "lower threshold must not exceed upper threshold",
        ));
    }

    let clamped = Zip::from(&data).and(&markers).map_collect(|&v, &l| {
        if l != 0 {
            upper
        } else if v.is_nan() {
            v
        } else {
            v.max(lower).min(upper)
        }
    });
    let background = clamped.mapv(|v| v == lower);
    let mask = binary_erosion(background.view(), &SPATIAL_BOX, cfg.erode_distance, true);

    let edges = flow.sobel(clamped.view(), SobelMethod::Nearest);
    let grown = flow.watershed(edges.view(), markers, mask.view(), structure, cfg.verbose);
    let solid = binary_opening(grown.mapv(|l| l != 0).view(), &SPATIAL_CROSS);
    let out = Zip::from(&grown)
        .and(&solid)
        .map_collect(|&l, &keep| if keep { l } else { 0 });
    log::debug!(
        "边缘分水岭: 种子 {} 个, 结果 {} 个",
        max_label(&markers),
        max_label(&out.view())
    );

    Ok(field.wrap_like(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::structure::CROSS_3D;
    use crate::flow::StaticFlow;
    use crate::{CoordArray, TimeCoord};
    use ndarray::{s, Array3};

    fn plateau() -> Array3<f32> {
        let mut f = Array3::<f32>::zeros((1, 31, 31));
        f.slice_mut(s![.., 12..19, 12..19]).fill(1.0);
        f
    }

    fn seed() -> Array3<Label> {
        let mut m = Array3::<Label>::zeros((1, 31, 31));
        m[(0, 15, 15)] = 7;
        m
    }

    #[test]
    fn test_no_seeds() {
        let field = Array3::from_shape_fn((2, 9, 9), |(t, h, w)| (t + h * w) as f32 * 0.1);
        let markers = Array3::<Label>::zeros((2, 9, 9));
        let out = edge_watershed(
            &StaticFlow,
            &field,
            &markers,
            1.0,
            0.0,
            &CROSS_3D,
            &EdgeWatershedConfig::default(),
        )
        .unwrap();
        assert!(out.iter().all(|l| *l == 0));
    }

    #[test]
    fn test_growth_stops_at_eroded_background() {
        let field = plateau();
        let markers = seed();
        let run = |verbose| {
            let cfg = EdgeWatershedConfig {
                verbose,
                ..Default::default()
            };
            edge_watershed(&StaticFlow, &field, &markers, 1.0, 0.0, &CROSS_3D, &cfg).unwrap()
        };
        let out = run(false);
        // 平台外扩 5 格得到 17 x 17 的区域, 开运算去掉 4 个角
        assert_eq!(out.iter().filter(|l| **l == 7).count(), 285);
        assert!(out.iter().all(|l| *l == 0 || *l == 7));
        assert_eq!(out[(0, 7, 15)], 7);
        assert_eq!(out[(0, 6, 15)], 0);
        assert_eq!(out[(0, 7, 7)], 0);
        assert_eq!(out[(0, 8, 8)], 7);

        assert_eq!(run(true), out);
    }

    #[test]
    fn test_keeps_coordinates() {
        let time = TimeCoord::new(vec![0.0]).unwrap();
        let field = CoordArray::new(plateau(), time.clone()).unwrap();
        let markers = seed();
        let out = edge_watershed(
            &StaticFlow,
            &field,
            &markers,
            1.0,
            0.0,
            &CROSS_3D,
            &EdgeWatershedConfig::default(),
        )
        .unwrap();
        assert_eq!(out.time(), &time);
        assert_eq!(out.as_array()[(0, 15, 15)], 7);

        // 带坐标的种子与裸种子结果一致
        let tagged = CoordArray::new(seed(), time.clone()).unwrap();
        let again = edge_watershed(
            &StaticFlow,
            &field,
            &tagged,
            1.0,
            0.0,
            &CROSS_3D,
            &EdgeWatershedConfig::default(),
        )
        .unwrap();
        assert_eq!(again.as_array(), out.as_array());
        assert_eq!(again.as_array().iter().filter(|l| **l == 7).count(), 285);

        let small = Array3::<Label>::zeros((1, 30, 31));
        let e = edge_watershed(
            &StaticFlow,
            &field,
            &small,
            1.0,
            0.0,
            &CROSS_3D,
            &EdgeWatershedConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(e, LabelError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_inverted_thresholds() {
        let field = plateau();
        let markers = seed();
        let e = edge_watershed(
            &StaticFlow,
            &field,
            &markers,
            0.0,
            1.0,
            &CROSS_3D,
            &EdgeWatershedConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(e, LabelError::InvalidArgument(_)));
    }
}
