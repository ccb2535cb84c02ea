//! 可复现的合成数据. 同一个 `seed` 总是生成同一份数据.

use cloud_berry::{Idx3d, Label};
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 合成标签体的规格.
#[derive(Copy, Clone, Debug)]
pub struct BlobSpec {
    /// 体数据形状 `(t, h, w)`.
    pub shape: Idx3d,

    /// 对象个数.
    pub objects: usize,

    /// 对象在空间平面上的最大半宽.
    pub max_radius: usize,

    /// 对象的最长持续步数.
    pub max_duration: usize,
}

impl Default for BlobSpec {
    fn default() -> Self {
        Self {
            shape: (24, 128, 128),
            objects: 200,
            max_radius: 6,
            max_duration: 8,
        }
    }
}

/// 在 `spec.shape` 中随机放置长方体对象, 依次编号为 `1..=spec.objects`.
///
/// 后放置的对象会覆盖先放置的对象, 因此部分编号可能完全消失,
/// 这正好覆盖了 "不存在的标签" 这一情况.
pub fn random_blobs(spec: &BlobSpec, seed: u64) -> Array3<Label> {
    let (t, h, w) = spec.shape;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Array3::zeros(spec.shape);
    if t == 0 || h == 0 || w == 0 {
        return out;
    }
    for label in 1..=spec.objects as Label {
        let t0 = rng.random_range(0..t);
        let t1 = (t0 + rng.random_range(1..=spec.max_duration.max(1))).min(t);
        let (h0, h1) = span(&mut rng, h, spec.max_radius);
        let (w0, w1) = span(&mut rng, w, spec.max_radius);
        out.slice_mut(ndarray::s![t0..t1, h0..h1, w0..w1]).fill(label);
    }
    out
}

fn span(rng: &mut StdRng, len: usize, radius: usize) -> (usize, usize) {
    let c = rng.random_range(0..len);
    let r = rng.random_range(0..=radius);
    (c.saturating_sub(r), (c + r + 1).min(len))
}

/// 均匀分布于 `[lo, hi)` 的随机场, 其中约 `nan_ratio` 比例的格点为缺失值.
pub fn random_field(shape: Idx3d, lo: f32, hi: f32, nan_ratio: f64, seed: u64) -> Array3<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array3::from_shape_simple_fn(shape, || {
        if rng.random_bool(nan_ratio) {
            f32::NAN
        } else {
            rng.random_range(lo..hi)
        }
    })
}

/// 约 `ratio` 比例为 `true` 的随机掩膜.
pub fn random_mask(shape: Idx3d, ratio: f64, seed: u64) -> Array3<bool> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array3::from_shape_simple_fn(shape, || rng.random_bool(ratio))
}
