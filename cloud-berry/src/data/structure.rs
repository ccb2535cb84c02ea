//! 结构元素 (邻域) 描述.

use ndarray::ArrayView3;

use crate::{Idx3d, Offset3d};

/// 三维结构元素. 内部保存相对中心的偏移集合, 构建后不可修改.
///
/// 常用的结构元素以进程级常量的形式提供, 见 [`crate::consts::structure`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Structure {
    offsets: Vec<Offset3d>,
}

impl Structure {
    /// 由布尔模板构建. 模板中心即偏移原点, 每个维度的长度必须为奇数, 否则程序 panic.
    pub fn from_stencil(stencil: ArrayView3<bool>) -> Self {
        let (t, h, w) = stencil.dim();
        assert!(
            t % 2 == 1 && h % 2 == 1 && w % 2 == 1,
            "结构元素每个维度的长度必须为奇数"
        );
        let (ct, ch, cw) = ((t / 2) as isize, (h / 2) as isize, (w / 2) as isize);
        let offsets = stencil
            .indexed_iter()
            .filter_map(|((a, b, c), &on)| {
                on.then_some((a as isize - ct, b as isize - ch, c as isize - cw))
            })
            .collect();
        Self { offsets }
    }

    /// 直接由偏移集合构建.
    #[inline]
    pub fn from_offsets<I: IntoIterator<Item = Offset3d>>(it: I) -> Self {
        Self {
            offsets: it.into_iter().collect(),
        }
    }

    /// 获取所有偏移. 顺序与构建时一致 (模板构建时为行优先).
    #[inline]
    pub fn offsets(&self) -> &[Offset3d] {
        &self.offsets
    }

    /// 偏移个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// 是否不含任何偏移.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// 关于原点的反射. 膨胀运算使用反射后的结构元素.
    pub fn reflected(&self) -> Self {
        Self::from_offsets(self.offsets.iter().map(|&(a, b, c)| (-a, -b, -c)))
    }

    /// 是否在时间轴方向有延伸.
    #[inline]
    pub fn is_temporal(&self) -> bool {
        self.offsets.iter().any(|o| o.0 != 0)
    }
}

/// 计算 `pos + offset`. 越出 `shape` 时返回 `None`.
#[inline]
pub(crate) fn shift((t, h, w): Idx3d, (dt, dh, dw): Offset3d, shape: Idx3d) -> Option<Idx3d> {
    let t = t.checked_add_signed(dt).filter(|v| *v < shape.0)?;
    let h = h.checked_add_signed(dh).filter(|v| *v < shape.1)?;
    let w = w.checked_add_signed(dw).filter(|v| *v < shape.2)?;
    Some((t, h, w))
}

/// 计算 `pos + offset`, 越界的分量被截断到最近的边缘 ("nearest" 边界).
///
/// `shape` 的每个分量都必须大于 0.
#[inline]
pub(crate) fn shift_clamped((t, h, w): Idx3d, (dt, dh, dw): Offset3d, shape: Idx3d) -> Idx3d {
    #[inline]
    fn clamp(v: usize, d: isize, len: usize) -> usize {
        v.saturating_add_signed(d).min(len - 1)
    }
    (clamp(t, dt, shape.0), clamp(h, dh, shape.1), clamp(w, dw, shape.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::structure::*;
    use ndarray::Array3;

    #[test]
    fn test_named_structures() {
        assert_eq!(TEMPORAL_CROSS.offsets(), &[(-1, 0, 0), (0, 0, 0), (1, 0, 0)]);
        assert_eq!(SPATIAL_CROSS.len(), 5);
        assert!(!SPATIAL_CROSS.is_temporal());
        assert_eq!(SPATIAL_BOX.len(), 9);
        assert!(!SPATIAL_BOX.is_temporal());
        assert_eq!(CROSS_3D.len(), 7);
        assert!(CROSS_3D.is_temporal());
        // 对称结构元素反射后不变 (偏移集合一致).
        let mut a = CROSS_3D.reflected().offsets().to_vec();
        let mut b = CROSS_3D.offsets().to_vec();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic]
    fn test_even_stencil() {
        Structure::from_stencil(Array3::from_elem((2, 3, 3), true).view());
    }

    #[test]
    fn test_shift() {
        let shape = (2, 3, 4);
        assert_eq!(shift((0, 0, 0), (0, 1, 1), shape), Some((0, 1, 1)));
        assert_eq!(shift((0, 0, 0), (-1, 0, 0), shape), None);
        assert_eq!(shift((1, 2, 3), (0, 0, 1), shape), None);
        assert_eq!(shift_clamped((0, 0, 0), (-1, -1, -1), shape), (0, 0, 0));
        assert_eq!(shift_clamped((1, 2, 3), (1, 1, 1), shape), (1, 2, 3));
    }
}
