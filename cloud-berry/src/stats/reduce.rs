//! 忽略缺失值的基础归约.
//!
//! 缺失值 (NaN) 既不参与计算也不会被当作 `0`. 没有任何有效值时结果为 NaN
//! (求和除外, 此时为 `0`).

use num::Float;

#[inline]
fn valid<T: Float>(values: &[T]) -> impl Iterator<Item = T> + '_ {
    values.iter().copied().filter(|v| !v.is_nan())
}

/// 有效值之和.
pub fn nan_sum<T: Float>(values: &[T]) -> T {
    valid(values).fold(T::zero(), |acc, v| acc + v)
}

/// 有效值的算术平均.
pub fn nan_mean<T: Float>(values: &[T]) -> T {
    let (sum, n) = valid(values).fold((T::zero(), 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        return T::nan();
    }
    sum / T::from(n).unwrap_or_else(T::nan)
}

/// 有效值的总体标准差 (除以 `n` 而不是 `n - 1`).
pub fn nan_std<T: Float>(values: &[T]) -> T {
    let mean = nan_mean(values);
    if mean.is_nan() {
        return mean;
    }
    let sq: Vec<T> = valid(values).map(|v| (v - mean).powi(2)).collect();
    nan_mean(&sq).sqrt()
}

/// 有效值的最大值.
pub fn nan_max<T: Float>(values: &[T]) -> T {
    valid(values).fold(T::nan(), T::max)
}

/// 有效值的最小值.
pub fn nan_min<T: Float>(values: &[T]) -> T {
    valid(values).fold(T::nan(), T::min)
}

/// 加权平均 `Σ(v * w) / Σw`.
///
/// `ignore_nan` 为 `true` 时, 数值为 NaN 的位置连同其权重一起剔除.
/// 权重为 `0` 的位置仍然参与计算 (只是不贡献任何分量).
///
/// # 返回值
///
/// 剩余权重之和 (忽略 NaN 权重) 为 `0` 时返回 NaN.
pub fn weighted_average<T: Float>(values: &[T], weights: &[T], ignore_nan: bool) -> T {
    assert_eq!(values.len(), weights.len(), "数值与权重长度不一致");
    let pairs = values
        .iter()
        .zip(weights)
        .filter(|(v, _)| !(ignore_nan && v.is_nan()));
    let mut total = T::zero();
    let mut valid_total = T::zero();
    let mut acc = T::zero();
    for (&v, &w) in pairs {
        total = total + w;
        if !w.is_nan() {
            valid_total = valid_total + w;
        }
        acc = acc + v * w;
    }
    if valid_total == T::zero() {
        return T::nan();
    }
    acc / total
}
