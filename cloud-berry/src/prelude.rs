//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx3d, Offset3d};
pub use crate::{LabelError, LabelResult};

pub use crate::data::{CoordArray, GridData, Label, Structure, TimeCoord};

pub use crate::consts::structure::{CROSS_3D, SPATIAL_BOX, SPATIAL_CROSS, TEMPORAL_CROSS};

pub use crate::flow::{FlowEngine, LabelOptions, Reducer, SobelMethod, StaticFlow};

pub use crate::labels::{
    apply_func_to_labels, apply_weighted_func_to_labels, filter_labels_by_length,
    filter_labels_by_length_and_mask, filter_labels_by_length_and_multimask,
    filter_labels_by_mask, filter_labels_by_multimask, remap_labels,
};

pub use crate::stats::{
    get_stats_for_labels, label_coverage, weighted_statistics_on_labels, ObjectStatistics,
};

pub use crate::detect::{
    detect_growth_markers, detect_growth_markers_multichannel, edge_watershed,
    EdgeWatershedConfig, GrowthConfig, MultichannelConfig,
};
