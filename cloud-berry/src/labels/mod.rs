//! 标签引擎: 按标签分组归约, 以及标签的过滤与重映射.
//!
//! 本模块的所有操作都对任意维度的标签数组生效, 首轴总是被视为时间轴.

mod filter;

mod legacy;

mod partition;

pub use filter::{
    filter_labels_by_length, filter_labels_by_length_and_mask,
    filter_labels_by_length_and_multimask, filter_labels_by_mask, filter_labels_by_multimask,
    find_object_lengths, mask_labels, remap_labels, remap_table,
};
pub use legacy::{
    filter_labels_by_length_and_mask_legacy, filter_labels_by_length_and_multimask_legacy,
    filter_labels_by_length_legacy,
};
pub use partition::{
    apply_func_to_labels, apply_weighted_func_to_labels, labeled_comprehension,
    labeled_comprehension_with_positions, LabelBuckets,
};

#[cfg(feature = "rayon")]
pub use partition::{par_apply_func_to_labels, par_apply_weighted_func_to_labels};

pub(crate) use filter::max_label;
