//! 光流引擎接口.
//!
//! 增长检测和边缘分水岭所需的运动补偿原语 (差分, 卷积, 连通标记, 分水岭, 边缘算子)
//! 由外部的光流子系统提供. 这里只描述其接口, 并提供一个零运动的参考实现 [`StaticFlow`].

use ndarray::{Array3, ArrayView3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Label, Structure};

mod still;

mod watershed;

pub use still::StaticFlow;
pub use watershed::{priority_flood, FloodReport};

/// 卷积的邻域归约方式. 所有归约都忽略缺失值 (NaN),
/// 邻域内全部缺失时结果为 NaN.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Reducer {
    /// 均值.
    Mean,

    /// 最大值.
    Max,

    /// 最小值.
    Min,
}

impl Reducer {
    /// 对一组邻域值进行归约.
    pub fn reduce(&self, values: &[f32]) -> f32 {
        let mut valid = values.iter().copied().filter(|v| !v.is_nan()).peekable();
        if valid.peek().is_none() {
            return f32::NAN;
        }
        match self {
            Reducer::Mean => {
                let (sum, n) = valid.fold((0.0f64, 0usize), |(s, n), v| (s + v as f64, n + 1));
                (sum / n as f64) as f32
            }
            Reducer::Max => valid.fold(f32::NEG_INFINITY, f32::max),
            Reducer::Min => valid.fold(f32::INFINITY, f32::min),
        }
    }
}

/// 连通标记的可调参数. 其含义由光流引擎解释, 本 crate 只负责原样转发.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LabelOptions {
    /// 相邻时刻的区域被视为同一对象所需的重叠比例.
    pub overlap: f32,

    /// 子段收缩比例.
    pub subsegment_shrink: f32,
}

/// Sobel 算子中位移场的插值方式. 对零运动的引擎没有影响.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SobelMethod {
    /// 最近邻插值.
    #[default]
    Nearest,

    /// 线性插值.
    Linear,
}

/// 运动补偿的时空原语.
///
/// 所有输入输出都是 `(t, h, w)` 形状的三维数组, 输出形状与输入一致.
/// 违反形状约定时, 实现可以直接 panic.
pub trait FlowEngine {
    /// 沿光流方向的前向时间差分.
    fn diff(&self, field: ArrayView3<f32>) -> Array3<f32>;

    /// 沿光流方向, 在结构元素覆盖的邻域上进行归约.
    fn convolve(&self, field: ArrayView3<f32>, structure: &Structure, reducer: Reducer)
        -> Array3<f32>;

    /// 跨时间追踪的连通域标记. 背景为 `0`, 对象从 `1` 开始编号.
    fn label(&self, mask: ArrayView3<bool>, options: &LabelOptions) -> Array3<Label>;

    /// 受约束的分水岭: 从 `markers` 中的种子出发, 沿 `cost` 生长,
    /// 不进入 `mask` 为 `true` 的体素. `debug_mode` 只影响诊断输出.
    fn watershed(
        &self,
        cost: ArrayView3<f32>,
        markers: ArrayView3<Label>,
        mask: ArrayView3<bool>,
        structure: &Structure,
        debug_mode: bool,
    ) -> Array3<Label>;

    /// 梯度幅值边缘场.
    fn sobel(&self, field: ArrayView3<f32>, method: SobelMethod) -> Array3<f32>;
}

#[cfg(test)]
mod tests {
    use super::Reducer;

    #[test]
    fn test_reducer_nan() {
        let v = [1.0, f32::NAN, 3.0];
        assert_eq!(Reducer::Mean.reduce(&v), 2.0);
        assert_eq!(Reducer::Max.reduce(&v), 3.0);
        assert_eq!(Reducer::Min.reduce(&v), 1.0);
        assert!(Reducer::Mean.reduce(&[f32::NAN]).is_nan());
        assert!(Reducer::Max.reduce(&[]).is_nan());
    }
}
