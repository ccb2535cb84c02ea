use std::fmt::{Display, Formatter};

use binary_heap_plus::BinaryHeap;
use ndarray::{Array3, ArrayView3};
use ordered_float::OrderedFloat;

use crate::data::structure::shift;
use crate::{Idx3d, Label, Structure};

/// 分水岭生长过程的诊断信息. 不影响生长结果.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FloodReport {
    /// 种子体素个数.
    pub seeds: usize,

    /// 新生长出的体素个数.
    pub grown: usize,

    /// 被掩膜挡住的 (非种子) 体素个数.
    pub blocked: usize,

    /// 生长结束后既不在掩膜中, 也未被任何种子到达的体素个数.
    pub unreachable: usize,
}

impl Display for FloodReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "seeds = {}, grown = {}, blocked = {}, unreachable = {}",
            self.seeds, self.grown, self.blocked, self.unreachable
        )
    }
}

/// 基于优先队列的分水岭 (priority flood).
///
/// 所有种子同时出发, 每次从代价最小的前沿体素向外扩展;
/// 代价相同时先入队者优先, 因此结果是确定的.
/// 体素在入队时即获得标签, 种子保留原有标签.
///
/// # 注意
///
/// 1. 生长永远不会进入 `mask` 为 `true` 或代价为 NaN 的体素.
/// 2. 三个输入的形状必须一致, 否则程序 panic.
pub fn priority_flood(
    cost: ArrayView3<f32>,
    markers: ArrayView3<Label>,
    mask: ArrayView3<bool>,
    structure: &Structure,
) -> (Array3<Label>, FloodReport) {
    let shape = cost.dim();
    assert_eq!(markers.dim(), shape, "种子与代价场形状不一致");
    assert_eq!(mask.dim(), shape, "掩膜与代价场形状不一致");

    let mut out = markers.to_owned();
    let mut report = FloodReport::default();
    // 堆顶代价最小, 其次入队最早
    let mut heap: BinaryHeap<(OrderedFloat<f32>, u64, Idx3d), _> = BinaryHeap::new_min();
    let mut age = 0u64;

    for (p, &l) in markers.indexed_iter() {
        if l != 0 {
            heap.push((OrderedFloat(cost[p]), age, p));
            age += 1;
        }
    }
    report.seeds = heap.len();

    while let Some((_, _, p)) = heap.pop() {
        let l = out[p];
        for &o in structure.offsets() {
            let Some(q) = shift(p, o, shape) else {
                continue;
            };
            if out[q] != 0 || mask[q] || cost[q].is_nan() {
                continue;
            }
            out[q] = l;
            report.grown += 1;
            heap.push((OrderedFloat(cost[q]), age, q));
            age += 1;
        }
    }

    for ((&m, &l), &seed) in mask.iter().zip(out.iter()).zip(markers.iter()) {
        if seed != 0 {
            continue;
        }
        if m {
            report.blocked += 1;
        } else if l == 0 {
            report.unreachable += 1;
        }
    }
    (out, report)
}
