//! 三维形态学操作.
//!
//! 所有操作都以 [`Structure`] 描述邻域, 在 `(t, h, w)` 网格上逐体素进行.
//! 只在空间平面内延伸的结构元素 (例如 [`SPATIAL_CROSS`](crate::consts::structure::SPATIAL_CROSS))
//! 等价于对每个时刻的切片分别处理.

use std::collections::VecDeque;

use ndarray::{Array3, ArrayView3};

use crate::data::structure::shift;
use crate::{Offset3d, Structure};

mod gaussian;

pub use gaussian::{gaussian_filter, gaussian_filter_spatial, nan_gaussian_filter};

#[inline]
const fn neg((a, b, c): Offset3d) -> Offset3d {
    (-a, -b, -c)
}

fn erode_once(input: &Array3<bool>, offsets: &[Offset3d], border_value: bool) -> Array3<bool> {
    let shape = input.dim();
    Array3::from_shape_fn(shape, |p| {
        offsets.iter().all(|&o| match shift(p, o, shape) {
            Some(q) => input[q],
            None => border_value,
        })
    })
}

/// 二值腐蚀. 体素保留当且仅当结构元素覆盖的所有位置都为 `true`.
/// 越界位置视为 `border_value`.
///
/// `iterations` 为重复次数. 为 `0` 时一直重复, 直到结果不再变化.
///
/// # 注意
///
/// `iterations == 0` 时结构元素必须包含原点, 否则程序 panic (结果可能不收敛).
pub fn binary_erosion(
    input: ArrayView3<bool>,
    structure: &Structure,
    iterations: usize,
    border_value: bool,
) -> Array3<bool> {
    let offsets = structure.offsets();
    let mut cur = input.to_owned();
    if iterations == 0 {
        assert!(offsets.contains(&(0, 0, 0)), "迭代至收敛时结构元素必须包含原点");
        loop {
            let next = erode_once(&cur, offsets, border_value);
            if next == cur {
                return cur;
            }
            cur = next;
        }
    }
    for _ in 0..iterations {
        cur = erode_once(&cur, offsets, border_value);
    }
    cur
}

/// 二值膨胀 (一次). 使用关于原点反射后的结构元素, 越界位置视为 `false`.
pub fn binary_dilation(input: ArrayView3<bool>, structure: &Structure) -> Array3<bool> {
    let shape = input.dim();
    let offsets = structure.offsets();
    Array3::from_shape_fn(shape, |p| {
        offsets
            .iter()
            .any(|&o| shift(p, neg(o), shape).map_or(false, |q| input[q]))
    })
}

/// 二值开运算: 先腐蚀 (边界为 `false`) 再膨胀. 去除小于结构元素的前景碎片.
#[inline]
pub fn binary_opening(input: ArrayView3<bool>, structure: &Structure) -> Array3<bool> {
    let eroded = binary_erosion(input, structure, 1, false);
    binary_dilation(eroded.view(), structure)
}

/// 孔洞填充. 从网格边界出发沿结构元素在背景中传播,
/// 无法到达的背景体素 (即被前景完全包围的孔洞) 被填充为前景.
pub fn binary_fill_holes(input: ArrayView3<bool>, structure: &Structure) -> Array3<bool> {
    let shape = input.dim();
    let offsets = structure.offsets();
    let mut reached = Array3::from_elem(shape, false);
    let mut queue = VecDeque::new();

    // 种子: 结构元素 "伸出" 网格的背景体素
    for (p, &v) in input.indexed_iter() {
        if !v && offsets.iter().any(|&o| shift(p, neg(o), shape).is_none()) {
            reached[p] = true;
            queue.push_back(p);
        }
    }
    while let Some(q) = queue.pop_front() {
        for &o in offsets {
            if let Some(p) = shift(q, o, shape) {
                if !input[p] && !reached[p] {
                    reached[p] = true;
                    queue.push_back(p);
                }
            }
        }
    }
    reached.mapv_into(|r| !r)
}

fn grey_fold(
    input: ArrayView3<f32>,
    offsets: &[Offset3d],
    pick: fn(f32, f32) -> f32,
) -> Array3<f32> {
    let shape = input.dim();
    Array3::from_shape_fn(shape, |p| {
        if input[p].is_nan() {
            return f32::NAN;
        }
        offsets
            .iter()
            .filter_map(|&o| shift(p, o, shape))
            .fold(f32::NAN, |acc, q| pick(acc, input[q]))
    })
}

/// 灰度腐蚀: 邻域最小值. 缺失值 (NaN) 不参与比较, 本身为 NaN 的体素保持 NaN.
#[inline]
pub fn grey_erosion(input: ArrayView3<f32>, structure: &Structure) -> Array3<f32> {
    grey_fold(input, structure.offsets(), f32::min)
}

/// 灰度膨胀: 反射邻域最大值. 缺失值规则同 [`grey_erosion`].
#[inline]
pub fn grey_dilation(input: ArrayView3<f32>, structure: &Structure) -> Array3<f32> {
    grey_fold(input, structure.reflected().offsets(), f32::max)
}

/// 灰度开运算: 先灰度腐蚀再灰度膨胀. 削去比结构元素更窄的峰.
#[inline]
pub fn grey_opening(input: ArrayView3<f32>, structure: &Structure) -> Array3<f32> {
    let eroded = grey_erosion(input, structure);
    grey_dilation(eroded.view(), structure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::structure::*;
    use ndarray::{s, Array2, Axis};

    fn plane(rows: &[&str]) -> Array3<bool> {
        let h = rows.len();
        let w = rows[0].len();
        let v = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| c == '#'))
            .collect();
        Array2::from_shape_vec((h, w), v)
            .unwrap()
            .insert_axis(Axis(0))
    }

    #[test]
    fn test_erosion_border_value() {
        let full = Array3::from_elem((1, 5, 5), true);
        let e = binary_erosion(full.view(), &SPATIAL_CROSS, 1, false);
        assert_eq!(e.iter().filter(|v| **v).count(), 9);
        assert!(e.slice(s![0, 1..4, 1..4]).iter().all(|v| *v));

        let e = binary_erosion(full.view(), &SPATIAL_CROSS, 1, true);
        assert_eq!(e, full);

        // 迭代至收敛, 边界为 false 时一切都会被腐蚀掉
        let e = binary_erosion(full.view(), &SPATIAL_BOX, 0, false);
        assert!(e.iter().all(|v| !*v));
    }

    #[test]
    fn test_erosion_iterations() {
        let mut a = Array3::from_elem((2, 9, 9), false);
        a.slice_mut(s![.., 1..8, 1..8]).fill(true);
        let e = binary_erosion(a.view(), &SPATIAL_BOX, 2, true);
        assert_eq!(e.iter().filter(|v| **v).count(), 2 * 9);
        assert!(e.slice(s![.., 3..6, 3..6]).iter().all(|v| *v));
    }

    #[test]
    fn test_dilation_single_point() {
        let mut a = Array3::from_elem((3, 3, 3), false);
        a[(1, 1, 1)] = true;
        assert_eq!(binary_dilation(a.view(), &SPATIAL_CROSS).iter().filter(|v| **v).count(), 5);
        assert_eq!(binary_dilation(a.view(), &CROSS_3D).iter().filter(|v| **v).count(), 7);
        let d = binary_dilation(a.view(), &TEMPORAL_CROSS);
        assert!(d[(0, 1, 1)] && d[(2, 1, 1)] && !d[(1, 0, 1)]);
    }

    #[test]
    fn test_opening_removes_specks() {
        let a = plane(&["....#", "..#..", ".###.", "..#..", "....."]);
        let o = binary_opening(a.view(), &SPATIAL_CROSS);
        let want = plane(&[".....", "..#..", ".###.", "..#..", "....."]);
        assert_eq!(o, want);
    }

    #[test]
    fn test_fill_holes() {
        let a = plane(&[".....", ".###.", ".#.#.", ".###.", "....."]);
        let f = binary_fill_holes(a.view(), &SPATIAL_CROSS);
        assert!(f[(0, 2, 2)]);
        assert_eq!(f.iter().filter(|v| **v).count(), 9);

        // 与边界连通的 "孔" 不会被填充
        let a = plane(&["#.#", "#.#", "###"]);
        assert_eq!(binary_fill_holes(a.view(), &SPATIAL_CROSS), a);
    }

    #[test]
    fn test_fill_holes_per_slice() {
        // 第二个时刻的孔洞虽然被上下时刻 "包围", 但空间结构元素只看本时刻
        let mut a = Array3::from_elem((3, 3, 3), true);
        a[(1, 1, 1)] = false;
        a.slice_mut(s![1, 0, ..]).fill(false);
        let f = binary_fill_holes(a.view(), &SPATIAL_CROSS);
        assert!(!f[(1, 1, 1)]);
        let f = binary_fill_holes(a.view(), &CROSS_3D);
        assert!(!f[(1, 1, 1)]);

        a.slice_mut(s![1, 0, ..]).fill(true);
        assert!(binary_fill_holes(a.view(), &SPATIAL_CROSS)[(1, 1, 1)]);
    }

    #[test]
    fn test_grey_opening() {
        let mut a = Array3::<f32>::zeros((1, 5, 5));
        a[(0, 2, 2)] = 5.0;
        a[(0, 0, 0)] = f32::NAN;
        let o = grey_opening(a.view(), &SPATIAL_CROSS);
        assert!(o[(0, 0, 0)].is_nan());
        assert!(o.iter().filter(|v| !v.is_nan()).all(|v| *v == 0.0));

        // 足够宽的平台不受影响
        let b = Array3::<f32>::from_elem((2, 4, 4), 3.0);
        assert_eq!(grey_opening(b.view(), &SPATIAL_CROSS), b);
    }

    #[test]
    fn test_grey_erosion_ignores_nan() {
        let mut a = Array3::<f32>::from_elem((1, 1, 3), 2.0);
        a[(0, 0, 0)] = f32::NAN;
        a[(0, 0, 2)] = 1.0;
        let e = grey_erosion(a.view(), &SPATIAL_CROSS);
        assert!(e[(0, 0, 0)].is_nan());
        assert_eq!(e[(0, 0, 1)], 1.0);
        let d = grey_dilation(a.view(), &SPATIAL_CROSS);
        assert_eq!(d[(0, 0, 2)], 2.0);
    }
}
