#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 在 (时间, 行, 列) 三维网格场中识别, 标记, 过滤显著变化的时空区域
//! ("对象"), 并对其进行统计汇总. 主要服务于卫星云图中对流云增长的检测与追踪流程.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 光流引擎 (运动补偿的差分, 卷积, 连通标记, 分水岭, 边缘算子) 是外部协作者,
//!   这里只通过 [`flow::FlowEngine`] 描述其接口. [`flow::StaticFlow`]
//!   是一个零运动的参考实现, 便于在没有真实光流场时运行和测试.
//! 2. 文件读写, 时间戳解析和数据集元信息管理都不在本 crate 的范围内.
//! 3. 违反接口约定 (例如形状不一致的光流输入) 时程序会直接 panic;
//!   标签引擎的输入错误则通过 [`LabelError`] 返回.
//!
//! # 开发计划
//!
//! ### 按标签分组归约 ✅
//!
//! 基于计数排序的分桶, 对每个标签的所有元素调用归约函数.
//! 空桶不调用归约函数, 直接返回 `None`.
//!
//! 实现位于 `cloud-berry/src/labels/partition.rs`.
//!
//! ### 标签过滤与重映射 ✅
//!
//! 按首轴 (时间) 长度, 按单个或多个掩膜 ("任意重叠" 规则) 过滤标签,
//! 幸存标签按原始顺序连续编号. 另提供原地修改的 legacy 策略.
//!
//! 实现位于 `cloud-berry/src/labels/filter.rs` 和 `cloud-berry/src/labels/legacy.rs`.
//!
//! ### 对象统计 ✅
//!
//! 每个标签的均值/标准差/最大值/最小值, 以及带权重的版本.
//! 缺失值 (NaN) 不参与归约, 也不会被当成 0.
//!
//! 实现位于 `cloud-berry/src/stats`.
//!
//! ### 增长标记检测 ✅
//!
//! 时间差分 -> 运动补偿的时间平滑 -> 曲率过滤 -> 阈值 -> 连通标记 -> 两级过滤.
//! 支持单通道和双通道 (一个场上升, 另一个场下降) 两种模式.
//!
//! 实现位于 `cloud-berry/src/detect/markers.rs`.
//!
//! ### 边缘分水岭 ✅
//!
//! 从种子标签出发, 沿梯度幅值边缘生长, 由腐蚀得到的背景掩膜约束.
//!
//! 实现位于 `cloud-berry/src/detect/edge.rs`.
//!
//! ### 三维形态学 ✅
//!
//! 二值腐蚀/膨胀/开运算/孔洞填充, 灰度开运算, 空间高斯滤波及其 NaN 感知版本.
//!
//! 实现位于 `cloud-berry/src/morph`.

/// 三维索引 `(t, h, w)`.
pub type Idx3d = (usize, usize, usize);

/// 三维偏移 `(dt, dh, dw)`. 用于描述结构元素.
pub type Offset3d = (isize, isize, isize);

pub mod consts;

mod error;

pub use error::{LabelError, LabelResult};

/// 场, 标签, 坐标等基础数据结构.
pub mod data;

pub use data::{CoordArray, GridData, Label, Structure, TimeCoord};

pub mod morph;

pub mod flow;

pub mod labels;

pub mod stats;

pub mod detect;

pub mod prelude;
