//! 标签过滤与重映射.
//!
//! 所有过滤都是 "整体" 的: 一个标签要么完整保留, 要么完整删除.
//! 幸存标签按原始标签值的顺序重新从 `1` 开始连续编号, 被删除的标签变为 `0`.

use ndarray::{Array, ArrayView, Dimension};

use crate::data::row_major;
use crate::error::check_shape;
use crate::{Label, LabelError, LabelResult};

/// 最大标签值. 空数组为 `0`.
#[inline]
pub(crate) fn max_label<D: Dimension>(labels: &ArrayView<Label, D>) -> Label {
    labels.iter().copied().max().unwrap_or(0)
}

/// 每个标签沿首轴 (时间) 的跨度, 即包围盒在首轴上的 `stop - start`.
///
/// # 返回值
///
/// 长度为 `max(labels)` 的向量, 第 `i` 个分量对应标签 `i + 1`. 不存在的标签长度为 `0`.
///
/// # 注意
///
/// `labels` 至少为一维, 否则程序 panic.
pub fn find_object_lengths<D: Dimension>(labels: ArrayView<Label, D>) -> Vec<usize> {
    assert!(labels.ndim() >= 1, "标签数组至少为一维");
    let max = max_label(&labels) as usize;
    if max == 0 {
        return Vec::new();
    }
    // 行优先存储下, 每个时刻占据连续的 `plane` 个元素
    let plane = labels.len() / labels.shape()[0];
    let flat = row_major(&labels);
    let mut span = vec![(usize::MAX, 0usize); max];
    for (i, &l) in flat.iter().enumerate().filter(|(_, l)| **l != 0) {
        let t = i / plane;
        let (lo, hi) = &mut span[l as usize - 1];
        *lo = (*lo).min(t);
        *hi = (*hi).max(t);
    }
    span.into_iter()
        .map(|(lo, hi)| if lo == usize::MAX { 0 } else { hi - lo + 1 })
        .collect()
}

/// 每个标签是否与 `mask` 有任意重叠.
///
/// # 返回值
///
/// 长度为 `max(labels)` 的向量, 第 `i` 个分量对应标签 `i + 1`. 不存在的标签为 `false`.
pub fn mask_labels<D: Dimension>(
    labels: ArrayView<Label, D>,
    mask: ArrayView<bool, D>,
) -> LabelResult<Vec<bool>> {
    check_shape(labels.shape(), mask.shape())?;
    let mut hit = vec![false; max_label(&labels) as usize];
    for (&l, &m) in labels.iter().zip(mask.iter()) {
        if l != 0 && m {
            hit[l as usize - 1] = true;
        }
    }
    Ok(hit)
}

/// 由保留向量生成重映射表: `table[0] = 0`, 保留的标签依次编号为 `1, 2, ...`, 其余为 `0`.
pub fn remap_table(keep: &[bool]) -> Vec<Label> {
    let mut counter: Label = 0;
    std::iter::once(0)
        .chain(keep.iter().map(|&k| {
            if k {
                counter += 1;
                counter
            } else {
                0
            }
        }))
        .collect()
}

#[inline]
fn apply_keep<D: Dimension>(labels: ArrayView<Label, D>, keep: &[bool]) -> Array<Label, D> {
    let table = remap_table(keep);
    labels.mapv(|l| table[l as usize])
}

/// 按保留向量重映射标签. `keep[l - 1]` 为 `true` 的标签 `l` 依次获得新编号 `1..=K`,
/// 保持原有的相对顺序; 其余标签变为 `0`.
///
/// `keep` 的长度必须等于 `max(labels)`, 否则返回 [`LabelError::ShapeMismatch`].
pub fn remap_labels<D: Dimension>(
    labels: ArrayView<Label, D>,
    keep: &[bool],
) -> LabelResult<Array<Label, D>> {
    let max = max_label(&labels) as usize;
    if keep.len() != max {
        return Err(LabelError::ShapeMismatch {
            expected: vec![max],
            found: vec![keep.len()],
        });
    }
    Ok(apply_keep(labels, keep))
}

/// 存在且首轴跨度不小于 `min_length` 的标签.
pub(crate) fn length_keep<D: Dimension>(
    labels: ArrayView<Label, D>,
    min_length: usize,
) -> Vec<bool> {
    find_object_lengths(labels)
        .into_iter()
        .map(|n| n > 0 && n >= min_length)
        .collect()
}

/// 所有掩膜的 "任意重叠" 判定取逻辑与. 掩膜集合为空时返回 [`LabelError::InvalidArgument`].
pub(crate) fn multimask_keep<D: Dimension>(
    labels: ArrayView<Label, D>,
    masks: &[ArrayView<bool, D>],
) -> LabelResult<Vec<bool>> {
    let Some((first, rest)) = masks.split_first() else {
        return Err(LabelError::InvalidArgument("mask collection must not be empty"));
    };
    // 先检查全部形状, 再开始计算
    for m in masks {
        check_shape(labels.shape(), m.shape())?;
    }
    let mut keep = mask_labels(labels.view(), first.view())?;
    for m in rest {
        let hit = mask_labels(labels.view(), m.view())?;
        keep.iter_mut().zip(hit).for_each(|(k, h)| *k &= h);
    }
    Ok(keep)
}

/// 删除首轴跨度小于 `min_length` 的标签, 并重新编号.
pub fn filter_labels_by_length<D: Dimension>(
    labels: ArrayView<Label, D>,
    min_length: usize,
) -> Array<Label, D> {
    let keep = length_keep(labels.view(), min_length);
    apply_keep(labels, &keep)
}

/// 删除与 `mask` 没有任何重叠的标签, 并重新编号.
pub fn filter_labels_by_mask<D: Dimension>(
    labels: ArrayView<Label, D>,
    mask: ArrayView<bool, D>,
) -> LabelResult<Array<Label, D>> {
    let keep = mask_labels(labels.view(), mask)?;
    Ok(apply_keep(labels, &keep))
}

/// 同时满足 [`filter_labels_by_length`] 与 [`filter_labels_by_mask`] 的标签才会保留.
pub fn filter_labels_by_length_and_mask<D: Dimension>(
    labels: ArrayView<Label, D>,
    mask: ArrayView<bool, D>,
    min_length: usize,
) -> LabelResult<Array<Label, D>> {
    let mut keep = mask_labels(labels.view(), mask)?;
    let long = length_keep(labels.view(), min_length);
    keep.iter_mut().zip(long).for_each(|(k, l)| *k &= l);
    Ok(apply_keep(labels, &keep))
}

/// 只保留与 `masks` 中 **每一个** 掩膜都有重叠的标签, 并重新编号.
pub fn filter_labels_by_multimask<D: Dimension>(
    labels: ArrayView<Label, D>,
    masks: &[ArrayView<bool, D>],
) -> LabelResult<Array<Label, D>> {
    let keep = multimask_keep(labels.view(), masks)?;
    Ok(apply_keep(labels, &keep))
}

/// 长度条件与 [`filter_labels_by_multimask`] 的组合.
pub fn filter_labels_by_length_and_multimask<D: Dimension>(
    labels: ArrayView<Label, D>,
    masks: &[ArrayView<bool, D>],
    min_length: usize,
) -> LabelResult<Array<Label, D>> {
    let mut keep = multimask_keep(labels.view(), masks)?;
    let long = length_keep(labels.view(), min_length);
    keep.iter_mut().zip(long).for_each(|(k, l)| *k &= l);
    Ok(apply_keep(labels, &keep))
}
