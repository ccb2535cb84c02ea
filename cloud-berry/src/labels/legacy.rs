//! 原地修改的标签过滤.
//!
//! 与 [`super::filter`] 中的同名函数结果完全一致, 但不分配新的标签数组:
//! 依次访问每个标签的分桶, 幸存者就地写入递增的新编号, 其余写入 `0`.

use ndarray::{Array, ArrayView, Dimension};

use super::filter::find_object_lengths;
use super::partition::LabelBuckets;
use crate::data::row_major;
use crate::error::check_shape;
use crate::{Label, LabelError, LabelResult};

/// 按分桶顺序原地重新编号. `keep(l, idx)` 决定标签 `l` (扁平索引 `idx`) 是否保留.
fn renumber_in_place<D, P>(labels: &mut Array<Label, D>, mut keep: P)
where
    D: Dimension,
    P: FnMut(Label, &[usize]) -> bool,
{
    if !labels.is_standard_layout() {
        let owned = labels.as_standard_layout().into_owned();
        *labels = owned;
    }
    let buckets = LabelBuckets::new(labels.view());
    let Some(flat) = labels.as_slice_mut() else {
        unreachable!("标准布局的数组必然连续")
    };
    let mut counter: Label = 0;
    for (l, idx) in buckets.iter().filter(|(_, idx)| !idx.is_empty()) {
        let v = if keep(l, idx) {
            counter += 1;
            counter
        } else {
            0
        };
        idx.iter().for_each(|&i| flat[i] = v);
    }
}

/// 原地版本的 [`filter_labels_by_length`](super::filter_labels_by_length).
pub fn filter_labels_by_length_legacy<D: Dimension>(
    labels: &mut Array<Label, D>,
    min_length: usize,
) {
    let lengths = find_object_lengths(labels.view());
    renumber_in_place(labels, |l, _| lengths[l as usize - 1] >= min_length);
}

/// 原地版本的 [`filter_labels_by_length_and_mask`](super::filter_labels_by_length_and_mask).
///
/// 形状不一致时返回错误, `labels` 保持不变.
pub fn filter_labels_by_length_and_mask_legacy<D: Dimension>(
    labels: &mut Array<Label, D>,
    mask: ArrayView<bool, D>,
    min_length: usize,
) -> LabelResult<()> {
    check_shape(labels.shape(), mask.shape())?;
    let lengths = find_object_lengths(labels.view());
    let mask = row_major(&mask);
    renumber_in_place(labels, |l, idx| {
        lengths[l as usize - 1] >= min_length && idx.iter().any(|&i| mask[i])
    });
    Ok(())
}

/// 原地版本的 [`filter_labels_by_length_and_multimask`](super::filter_labels_by_length_and_multimask).
///
/// 掩膜集合为空或形状不一致时返回错误, `labels` 保持不变.
pub fn filter_labels_by_length_and_multimask_legacy<D: Dimension>(
    labels: &mut Array<Label, D>,
    masks: &[ArrayView<bool, D>],
    min_length: usize,
) -> LabelResult<()> {
    if masks.is_empty() {
        return Err(LabelError::InvalidArgument("mask collection must not be empty"));
    }
    for m in masks {
        check_shape(labels.shape(), m.shape())?;
    }
    let lengths = find_object_lengths(labels.view());
    let masks: Vec<_> = masks.iter().map(|m| row_major(m)).collect();
    renumber_in_place(labels, |l, idx| {
        lengths[l as usize - 1] >= min_length
            && masks.iter().all(|m| idx.iter().any(|&i| m[i]))
    });
    Ok(())
}
