use ndarray::{Array3, ArrayView3, Axis, Slice, Zip};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::structure::SPATIAL_CROSS;
use crate::consts::CURVATURE_SIGMA;
use crate::morph::{binary_fill_holes, binary_opening, gaussian_filter_spatial};

/// 曲率的符号.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CurvatureDirection {
    /// 负曲率, 即局部凸起 (穹顶).
    #[default]
    Negative,

    /// 正曲率, 即局部凹陷 (碗).
    Positive,
}

/// 曲率过滤参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurvatureSpec {
    /// 空间高斯平滑的标准差 (单位: 格点).
    pub sigma: f64,

    /// 二阶差分需要严格越过的阈值.
    pub threshold: f32,

    /// 选取的曲率符号.
    pub direction: CurvatureDirection,
}

impl Default for CurvatureSpec {
    fn default() -> Self {
        Self {
            sigma: CURVATURE_SIGMA,
            threshold: 0.0,
            direction: CurvatureDirection::Negative,
        }
    }
}

impl CurvatureSpec {
    /// 创建曲率过滤参数. `sigma` 必须为正, 否则程序 panic.
    pub fn new(sigma: f64, threshold: f32, direction: CurvatureDirection) -> Self {
        assert!(sigma > 0.0, "曲率平滑的标准差必须为正");
        Self {
            sigma,
            threshold,
            direction,
        }
    }
}

/// 沿 `axis` 的二阶差分, 该轴两端的位置为 `0`.
fn second_diff(a: &Array3<f32>, axis: Axis) -> Array3<f32> {
    let n = a.len_of(axis);
    let mut out = Array3::zeros(a.raw_dim());
    if n < 3 {
        return out;
    }
    let lo = a.slice_axis(axis, Slice::from(..n - 2));
    let mid = a.slice_axis(axis, Slice::from(1..n - 1));
    let hi = a.slice_axis(axis, Slice::from(2..));
    Zip::from(out.slice_axis_mut(axis, Slice::from(1..n - 1)))
        .and(&lo)
        .and(&mid)
        .and(&hi)
        .for_each(|o, &l, &m, &h| *o = h - 2.0 * m + l);
    out
}

/// 曲率过滤掩膜: 只保留空间上两个方向的曲率同号 (且越过阈值) 的区域.
///
/// 场先在空间平面内高斯平滑, 再分别沿列和行求二阶差分. 两者都严格小于 `-threshold`
/// (负曲率) 或都严格大于 `threshold` (正曲率) 的像素入选, 随后逐时刻填充孔洞,
/// 并以 4 邻域十字做开运算去除碎片.
///
/// # 注意
///
/// 缺失值 (NaN) 的比较结果总是 `false`, 因此缺失区域不会入选.
pub fn get_curvature_filter(field: ArrayView3<f32>, spec: &CurvatureSpec) -> Array3<bool> {
    let smoothed = gaussian_filter_spatial(field, spec.sigma);
    let x_diff = second_diff(&smoothed, Axis(2));
    let y_diff = second_diff(&smoothed, Axis(1));
    let thr = spec.threshold;
    let raw = match spec.direction {
        CurvatureDirection::Negative => {
            Zip::from(&x_diff).and(&y_diff).map_collect(|&x, &y| x < -thr && y < -thr)
        }
        CurvatureDirection::Positive => {
            Zip::from(&x_diff).and(&y_diff).map_collect(|&x, &y| x > thr && y > thr)
        }
    };
    let filled = binary_fill_holes(raw.view(), &SPATIAL_CROSS);
    binary_opening(filled.view(), &SPATIAL_CROSS)
}
