use std::collections::VecDeque;

use ndarray::{s, Array3, ArrayView3, Axis, Zip};

use super::{priority_flood, FlowEngine, LabelOptions, Reducer, SobelMethod};
use crate::consts::structure::CROSS_3D;
use crate::data::structure::{shift, shift_clamped};
use crate::{Label, Structure};

/// 零运动的光流引擎. 所有 "沿光流" 的邻域都退化为固定的网格偏移.
///
/// 当没有真实的光流场 (或场景几乎静止) 时, 可以用它运行完整的检测流程.
#[derive(Copy, Clone, Debug, Default)]
pub struct StaticFlow;

impl FlowEngine for StaticFlow {
    /// 前向差分, 最后一个时刻使用后向差分. 只有一个时刻时结果全为 `0`.
    fn diff(&self, field: ArrayView3<f32>) -> Array3<f32> {
        let t = field.len_of(Axis(0));
        let mut out = Array3::zeros(field.raw_dim());
        if t < 2 {
            return out;
        }
        let forward = &field.slice(s![1.., .., ..]) - &field.slice(s![..-1, .., ..]);
        out.slice_mut(s![..-1, .., ..]).assign(&forward);
        out.slice_mut(s![-1, .., ..]).assign(&forward.index_axis(Axis(0), t - 2));
        out
    }

    fn convolve(
        &self,
        field: ArrayView3<f32>,
        structure: &Structure,
        reducer: Reducer,
    ) -> Array3<f32> {
        let shape = field.dim();
        let mut buf = Vec::with_capacity(structure.len());
        Array3::from_shape_fn(shape, |p| {
            buf.clear();
            buf.extend(
                structure
                    .offsets()
                    .iter()
                    .filter_map(|&o| shift(p, o, shape))
                    .map(|q| field[q]),
            );
            reducer.reduce(&buf)
        })
    }

    /// 三维 6 邻域连通标记, 按首个体素的行优先顺序编号.
    fn label(&self, mask: ArrayView3<bool>, options: &LabelOptions) -> Array3<Label> {
        log::trace!("StaticFlow 忽略标记参数 {options:?}");
        let shape = mask.dim();
        let mut out = Array3::<Label>::zeros(shape);
        let mut next: Label = 0;
        let mut queue = VecDeque::new();

        for (p, &m) in mask.indexed_iter() {
            if !m || out[p] != 0 {
                continue;
            }
            next += 1;
            out[p] = next;
            queue.push_back(p);
            while let Some(q) = queue.pop_front() {
                for &o in CROSS_3D.offsets() {
                    if let Some(r) = shift(q, o, shape) {
                        if mask[r] && out[r] == 0 {
                            out[r] = next;
                            queue.push_back(r);
                        }
                    }
                }
            }
        }
        log::debug!("连通标记完成, 共 {next} 个对象");
        out
    }

    fn watershed(
        &self,
        cost: ArrayView3<f32>,
        markers: ArrayView3<Label>,
        mask: ArrayView3<bool>,
        structure: &Structure,
        debug_mode: bool,
    ) -> Array3<Label> {
        let (out, report) = priority_flood(cost, markers, mask, structure);
        if debug_mode {
            log::info!("分水岭诊断: {report}");
        } else {
            log::debug!("分水岭诊断: {report}");
        }
        out
    }

    /// 三维 Sobel 梯度幅值. 边界采用最近邻延拓.
    fn sobel(&self, field: ArrayView3<f32>, method: SobelMethod) -> Array3<f32> {
        log::trace!("零运动下插值方式 {method:?} 不影响结果");
        let shape = field.dim();
        if field.is_empty() {
            return Array3::zeros(shape);
        }
        let mut grads = [
            Array3::<f32>::zeros(shape),
            Array3::<f32>::zeros(shape),
            Array3::<f32>::zeros(shape),
        ];
        for dt in -1isize..=1 {
            for dh in -1isize..=1 {
                for dw in -1isize..=1 {
                    let d = [dt, dh, dw];
                    // 沿轴 a 求导, 其余两轴做 [1, 2, 1] 平滑
                    let weights: [f32; 3] = std::array::from_fn(|a| {
                        let smooth: isize = (0..3)
                            .filter(|b| *b != a)
                            .map(|b| 2 - d[b].abs())
                            .product();
                        (d[a] * smooth) as f32
                    });
                    if weights.iter().all(|w| *w == 0.0) {
                        continue;
                    }
                    for (g, &w) in grads.iter_mut().zip(&weights) {
                        if w != 0.0 {
                            g.indexed_iter_mut().for_each(|(p, v)| {
                                *v += w * field[shift_clamped(p, (dt, dh, dw), shape)];
                            });
                        }
                    }
                }
            }
        }
        let [gt, gh, gw] = grads;
        Zip::from(&gt)
            .and(&gh)
            .and(&gw)
            .map_collect(|a, b, c| (a * a + b * b + c * c).sqrt())
    }
}
