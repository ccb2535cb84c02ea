use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView3, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Label;

/// 标签在时间与空间上的覆盖情况.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LabelCoverage {
    /// 每个像素被任意标签覆盖的时刻占比, 形状为 `(h, w)`.
    pub fraction: Array2<f32>,

    /// 每个像素在整个时间序列中出现过的不同标签个数, 形状为 `(h, w)`.
    pub unique_count: Array2<u32>,

    /// 每个时刻被任意标签覆盖的像素占比, 长度为 `t`.
    pub temporal_fraction: Array1<f32>,

    /// 每个时刻出现的不同标签个数, 长度为 `t`.
    pub temporal_unique_count: Array1<u32>,
}

#[inline]
fn count_unique<'a, I: Iterator<Item = &'a Label>>(it: I) -> u32 {
    it.filter(|l| **l != 0).unique().count() as u32
}

/// 统计 `(t, h, w)` 标签数组的覆盖情况. 背景 (`0`) 不计入任何计数.
pub fn label_coverage(labels: ArrayView3<Label>) -> LabelCoverage {
    let (t, h, w) = labels.dim();
    let fraction = labels.map_axis(Axis(0), |lane| {
        lane.iter().filter(|l| **l != 0).count() as f32 / t as f32
    });
    let unique_count = labels.map_axis(Axis(0), |lane| count_unique(lane.iter()));
    let plane = (h * w) as f32;
    let temporal_fraction = labels
        .outer_iter()
        .map(|s| s.iter().filter(|l| **l != 0).count() as f32 / plane)
        .collect();
    let temporal_unique_count = labels
        .outer_iter()
        .map(|s| count_unique(s.iter()))
        .collect();
    LabelCoverage {
        fraction,
        unique_count,
        temporal_fraction,
        temporal_unique_count,
    }
}
