//! 对流增长检测.
//!
//! [`detect_growth_markers`] 与 [`detect_growth_markers_multichannel`] 从场的时间演变中
//! 找出正在增长的区域并标记为种子, [`edge_watershed`] 再把种子沿边缘场生长为完整的对象.

mod curvature;

mod edge;

mod markers;

pub use curvature::{get_curvature_filter, CurvatureDirection, CurvatureSpec};
pub use edge::{edge_watershed, EdgeWatershedConfig};
pub use markers::{
    detect_growth_markers, detect_growth_markers_multichannel, filtered_tdiff, time_derivative,
    DualGrowthMarkers, GrowthConfig, GrowthMarkers, MultichannelConfig,
};
