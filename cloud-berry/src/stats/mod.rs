//! 对象统计.
//!
//! 对每个标签 (对象) 汇总某个场的均值, 标准差, 最大值和最小值.
//! 不存在的标签 (空桶) 与权重全为 `0` 的标签, 各项统计量均为 NaN.

use ndarray::{ArrayView, Dimension};
use num::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::labels::apply_func_to_labels;
use crate::labels::apply_weighted_func_to_labels;
use crate::{Label, LabelResult};

mod coverage;

mod reduce;

pub use coverage::{label_coverage, LabelCoverage};
pub use reduce::{nan_max, nan_mean, nan_min, nan_std, nan_sum, weighted_average};

/// 每个对象的统计量. 各向量长度均为 `max(labels)`, 第 `i` 个分量对应标签 `i + 1`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectStatistics<T> {
    /// 均值.
    pub mean: Vec<T>,

    /// 总体标准差.
    pub std: Vec<T>,

    /// 最大值.
    pub max: Vec<T>,

    /// 最小值.
    pub min: Vec<T>,
}

impl<T: Float> ObjectStatistics<T> {
    fn from_records(records: Vec<Option<[T; 4]>>) -> Self {
        let n = records.len();
        let mut ans = Self {
            mean: Vec::with_capacity(n),
            std: Vec::with_capacity(n),
            max: Vec::with_capacity(n),
            min: Vec::with_capacity(n),
        };
        for [mean, std, max, min] in records.into_iter().map(|r| r.unwrap_or([T::nan(); 4])) {
            ans.mean.push(mean);
            ans.std.push(std);
            ans.max.push(max);
            ans.min.push(min);
        }
        ans
    }

    /// 对象个数 (即最大标签值).
    #[inline]
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// 是否没有任何对象.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// 标签 `label` 的 `(mean, std, max, min)`. 背景或超出范围的标签返回 `None`.
    pub fn get(&self, label: Label) -> Option<(T, T, T, T)> {
        let i = (label as usize).checked_sub(1)?;
        Some((
            *self.mean.get(i)?,
            self.std[i],
            self.max[i],
            self.min[i],
        ))
    }
}

/// 每个标签的 `nanmean`, `nanstd`, `nanmax`, `nanmin`.
pub fn get_stats_for_labels<T, D>(
    labels: ArrayView<Label, D>,
    field: ArrayView<T, D>,
) -> LabelResult<ObjectStatistics<T>>
where
    T: Float,
    D: Dimension,
{
    let records = apply_func_to_labels(labels, field, |x| {
        [nan_mean(x), nan_std(x), nan_max(x), nan_min(x)]
    })?;
    Ok(ObjectStatistics::from_records(records))
}

/// 单个对象的加权统计量.
fn weighted_stats<T: Float>(x: &[T], w: &[T]) -> [T; 4] {
    if !(nan_sum(w) > T::zero()) {
        return [T::nan(); 4];
    }
    let mean = weighted_average(x, w, true);
    let sq: Vec<T> = x.iter().map(|&v| (v - mean).powi(2)).collect();
    let std = weighted_average(&sq, w, true).sqrt();
    let positive: Vec<T> = x
        .iter()
        .zip(w)
        .filter(|(_, w)| **w > T::zero())
        .map(|(&v, _)| v)
        .collect();
    [mean, std, nan_max(&positive), nan_min(&positive)]
}

/// 加权版本的 [`get_stats_for_labels`].
///
/// 1. 均值与标准差为加权平均, 数值缺失的位置连同其权重一起剔除.
/// 2. 最大值与最小值只在权重为正的位置上计算.
/// 3. 权重之和 (忽略 NaN) 不为正的对象, 各项统计量均为 NaN.
pub fn weighted_statistics_on_labels<T, D>(
    labels: ArrayView<Label, D>,
    field: ArrayView<T, D>,
    weights: ArrayView<T, D>,
) -> LabelResult<ObjectStatistics<T>>
where
    T: Float,
    D: Dimension,
{
    let records = apply_weighted_func_to_labels(labels, field, weights, weighted_stats)?;
    Ok(ObjectStatistics::from_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array3};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_weighted_example() {
        let labels = arr1(&[1, 1, 1]);
        let field = arr1(&[10.0, 20.0, 30.0]);
        let weights = arr1(&[1.0, 0.0, 1.0]);
        let s = weighted_statistics_on_labels(labels.view(), field.view(), weights.view()).unwrap();
        let (mean, std, max, min) = s.get(1).unwrap();
        assert!(f64_eq(mean, 20.0));
        assert!(f64_eq(std, 10.0));
        assert_eq!(max, 30.0);
        assert_eq!(min, 10.0);
    }

    #[test]
    fn test_uniform_weights_match_unweighted() {
        let labels = Array3::from_shape_fn((3, 4, 5), |(t, h, w)| ((t + 2 * h + w) % 4) as Label);
        let field = Array3::from_shape_fn((3, 4, 5), |(t, h, w)| {
            if (t + h + w) % 7 == 0 {
                f64::NAN
            } else {
                (t * 20 + h * 5 + w) as f64 * 0.5
            }
        });
        let weights = Array3::from_elem((3, 4, 5), 2.5);
        let plain = get_stats_for_labels(labels.view(), field.view()).unwrap();
        let weighted =
            weighted_statistics_on_labels(labels.view(), field.view(), weights.view()).unwrap();
        assert_eq!(plain.len(), 3);
        for (a, b) in [
            (&plain.mean, &weighted.mean),
            (&plain.std, &weighted.std),
            (&plain.max, &weighted.max),
            (&plain.min, &weighted.min),
        ] {
            assert!(a.iter().zip(b.iter()).all(|(x, y)| f64_eq(*x, *y)));
        }
    }

    #[test]
    fn test_missing_groups_and_weights() {
        let labels = arr2(&[[1, 0, 3], [3, 3, 1]]);
        let field = arr2(&[[1.0f32, 9.0, 2.0], [4.0, f32::NAN, 5.0]]);
        let weights = arr2(&[[0.0f32, 1.0, 1.0], [1.0, 1.0, 0.0]]);

        let s = get_stats_for_labels(labels.view(), field.view()).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.mean[0], 3.0);
        assert!(s.mean[1].is_nan() && s.std[1].is_nan());
        assert_eq!(s.mean[2], 3.0);
        assert_eq!(s.max[2], 4.0);

        let w = weighted_statistics_on_labels(labels.view(), field.view(), weights.view()).unwrap();
        // 标签 1 的权重全为 0
        assert!(w.mean[0].is_nan() && w.max[0].is_nan());
        assert_eq!(w.mean[2], 3.0);
        assert!(w.get(0).is_none() && w.get(4).is_none());
    }

    #[test]
    fn test_shape_mismatch() {
        let labels = arr2(&[[1, 1]]);
        let field = arr2(&[[1.0], [2.0]]);
        assert!(get_stats_for_labels(labels.view(), field.view()).is_err());
    }
}
