//! 可分离高斯滤波.

use ndarray::{Array3, ArrayView3, Axis, Zip};

use crate::consts::GAUSSIAN_TRUNCATE;

/// 归一化的一维高斯核, 半径为 `truncate * sigma + 0.5` 向下取整.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-((x * x) as f64) / denom).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|v| *v /= sum);
    kernel
}

/// 对称反射边界 `(d c b a | a b c d | d c b a)` 下的索引映射.
#[inline]
fn reflect_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let i = i.rem_euclid(period);
    if i >= n as isize {
        (period - 1 - i) as usize
    } else {
        i as usize
    }
}

fn correlate_along(data: &mut Array3<f32>, axis: Axis, kernel: &[f64]) {
    let n = data.len_of(axis);
    let radius = (kernel.len() / 2) as isize;
    let mut buf = vec![0.0; n];
    for mut lane in data.lanes_mut(axis) {
        for (i, out) in buf.iter_mut().enumerate() {
            *out = kernel
                .iter()
                .zip(-radius..=radius)
                .map(|(w, k)| w * lane[reflect_index(i as isize + k, n)] as f64)
                .sum();
        }
        lane.iter_mut().zip(&buf).for_each(|(v, b)| *v = *b as f32);
    }
}

/// 三维高斯滤波. `sigma` 依次为时间, 行, 列方向的标准差 (单位: 格点),
/// 为 `0` 的方向不做平滑. 边界采用对称反射.
///
/// 内部以 `f64` 累加, 输出为 `f32`. 缺失值 (NaN) 会扩散到它的整个邻域,
/// 需要忽略缺失值时请使用 [`nan_gaussian_filter`].
pub fn gaussian_filter(input: ArrayView3<f32>, sigma: [f64; 3]) -> Array3<f32> {
    assert!(sigma.iter().all(|s| *s >= 0.0), "高斯滤波的标准差必须非负");
    let mut out = input.to_owned();
    if out.is_empty() {
        return out;
    }
    for (axis, &s) in sigma.iter().enumerate() {
        if s > 1e-15 {
            correlate_along(&mut out, Axis(axis), &gaussian_kernel(s));
        }
    }
    out
}

/// 仅在空间平面内的高斯滤波, 等价于 `gaussian_filter(input, [0, sigma, sigma])`.
#[inline]
pub fn gaussian_filter_spatial(input: ArrayView3<f32>, sigma: f64) -> Array3<f32> {
    gaussian_filter(input, [0.0, sigma, sigma])
}

/// 忽略缺失值的高斯滤波.
///
/// 缺失值先以 `0` 填充, 平滑结果再除以同样平滑过的有效性权重 (有效为 `1`, 缺失为 `0`),
/// 因此缺失值既不会扩散, 也不会被当作 `0` 拉低均值.
///
/// # 返回值
///
/// 平滑后的权重为 `0` (邻域内全部缺失) 的位置为 NaN.
/// `propagate_nan` 为 `true` 时, 原本缺失的位置在结果中重新置为 NaN.
pub fn nan_gaussian_filter(
    input: ArrayView3<f32>,
    sigma: [f64; 3],
    propagate_nan: bool,
) -> Array3<f32> {
    let filled = input.mapv(|v| if v.is_nan() { 0.0 } else { v });
    let weight = input.mapv(|v| if v.is_nan() { 0.0 } else { 1.0 });
    let filled = gaussian_filter(filled.view(), sigma);
    let weight = gaussian_filter(weight.view(), sigma);

    Zip::from(&filled)
        .and(&weight)
        .and(&input)
        .map_collect(|&a, &c, &v| {
            if (propagate_nan && v.is_nan()) || c == 0.0 {
                f32::NAN
            } else {
                a / c
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    fn f32_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_kernel() {
        let k = gaussian_kernel(1.0);
        assert_eq!(k.len(), 9);
        assert!((k.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(k[4] > k[3] && (k[3] - k[5]).abs() < 1e-15);
        assert_eq!(gaussian_kernel(2.0).len(), 17);
    }

    #[test]
    fn test_reflect_index() {
        let got: Vec<usize> = (-3..7).map(|i| reflect_index(i, 3)).collect();
        assert_eq!(got, vec![2, 1, 0, 0, 1, 2, 2, 1, 0, 0]);
        assert_eq!(reflect_index(5, 1), 0);
    }

    #[test]
    fn test_constant_field_unchanged() {
        let a = Array3::<f32>::from_elem((2, 6, 5), 3.5);
        let g = gaussian_filter(a.view(), [1.0, 2.0, 2.0]);
        assert!(g.iter().all(|v| f32_eq(*v, 3.5)));
    }

    #[test]
    fn test_spatial_only() {
        let mut a = Array3::<f32>::zeros((3, 7, 7));
        a[(1, 3, 3)] = 1.0;
        let g = gaussian_filter_spatial(a.view(), 1.0);
        // 时间方向不扩散
        assert!(g.slice(s![0, .., ..]).iter().all(|v| *v == 0.0));
        assert!(g.slice(s![2, .., ..]).iter().all(|v| *v == 0.0));
        let total: f32 = g.slice(s![1, .., ..]).sum();
        assert!(total > 0.95 && total < 1.05);
        assert!(g[(1, 3, 3)] > g[(1, 3, 4)]);
        assert!(f32_eq(g[(1, 3, 4)], g[(1, 4, 3)]));

        assert_eq!(gaussian_filter(a.view(), [0.0; 3]), a);
    }

    #[test]
    fn test_nan_gaussian() {
        let mut a = Array3::<f32>::from_elem((1, 5, 5), 2.0);
        a[(0, 2, 2)] = f32::NAN;
        a[(0, 0, 4)] = f32::NAN;

        let g = nan_gaussian_filter(a.view(), [0.0, 1.0, 1.0], true);
        assert!(g[(0, 2, 2)].is_nan() && g[(0, 0, 4)].is_nan());
        assert!(g.iter().filter(|v| !v.is_nan()).all(|v| f32_eq(*v, 2.0)));

        let g = nan_gaussian_filter(a.view(), [0.0, 1.0, 1.0], false);
        assert!(g.iter().all(|v| f32_eq(*v, 2.0)));

        // 普通高斯滤波会扩散缺失值
        assert!(gaussian_filter(a.view(), [0.0, 1.0, 1.0])[(0, 2, 3)].is_nan());

        let all_missing = Array3::<f32>::from_elem((1, 3, 3), f32::NAN);
        let g = nan_gaussian_filter(all_missing.view(), [0.0, 1.0, 1.0], false);
        assert!(g.iter().all(|v| v.is_nan()));
    }
}
