//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use cloud_berry::labels::{
    apply_func_to_labels, filter_labels_by_length_and_mask,
    filter_labels_by_length_and_mask_legacy, par_apply_func_to_labels,
};
use cloud_berry::stats::nan_mean;
use cloud_berry::Label;
use ndarray::Array3;
use utils::synth::{self, BlobSpec};

/// 每个策略运行的轮数.
const ROUNDS: u64 = 16;

/// 过滤时要求的最短持续步数.
const MIN_LENGTH: usize = 3;

/// 第 `round` 轮的输入: 标签, 掩膜, 数值场.
fn round_input(round: u64) -> (Array3<Label>, Array3<bool>, Array3<f32>) {
    let spec = BlobSpec::default();
    let labels = synth::random_blobs(&spec, round);
    let mask = synth::random_mask(spec.shape, 0.02, round + 1000);
    let field = synth::random_field(spec.shape, 200.0, 300.0, 0.05, round + 2000);
    (labels, mask, field)
}

#[inline]
fn max_of(labels: &Array3<Label>) -> u32 {
    labels.iter().copied().max().unwrap_or(0)
}

fn functional_remap() -> Profile {
    let mut profile = Profile::new();
    for round in 0..ROUNDS {
        let (labels, mask, _) = round_input(round);
        profile.round_start();
        let out = filter_labels_by_length_and_mask(labels.view(), mask.view(), MIN_LENGTH)
            .expect("Synthetic shapes mismatch");
        profile.round_elapsed();
        profile.count_labels(max_of(&labels), max_of(&out));
    }
    profile.finish()
}

fn legacy_in_place() -> Profile {
    let mut profile = Profile::new();
    for round in 0..ROUNDS {
        let (mut labels, mask, _) = round_input(round);
        let seen = max_of(&labels);
        profile.round_start();
        filter_labels_by_length_and_mask_legacy(&mut labels, mask.view(), MIN_LENGTH)
            .expect("Synthetic shapes mismatch");
        profile.round_elapsed();
        profile.count_labels(seen, max_of(&labels));
    }
    profile.finish()
}

fn sequential_partition() -> Profile {
    let mut profile = Profile::new();
    for round in 0..ROUNDS {
        let (labels, _, field) = round_input(round);
        profile.round_start();
        let means = apply_func_to_labels(labels.view(), field.view(), nan_mean::<f32>)
            .expect("Synthetic shapes mismatch");
        profile.round_elapsed();
        profile.count_labels(max_of(&labels), means.iter().flatten().count() as u32);
    }
    profile.finish()
}

fn parallel_partition() -> Profile {
    let mut profile = Profile::new();
    for round in 0..ROUNDS {
        let (labels, _, field) = round_input(round);
        profile.round_start();
        let means = par_apply_func_to_labels(labels.view(), field.view(), nan_mean::<f32>)
            .expect("Synthetic shapes mismatch");
        profile.round_elapsed();
        profile.count_labels(max_of(&labels), means.iter().flatten().count() as u32);
    }
    profile.finish()
}

/// 两种过滤策略必须给出完全相同的结果, 否则计时没有意义.
fn check_consistency() {
    let (labels, mask, _) = round_input(0);
    let functional = filter_labels_by_length_and_mask(labels.view(), mask.view(), MIN_LENGTH)
        .expect("Synthetic shapes mismatch");
    let mut legacy = labels;
    filter_labels_by_length_and_mask_legacy(&mut legacy, mask.view(), MIN_LENGTH)
        .expect("Synthetic shapes mismatch");
    assert_eq!(functional, legacy, "Filtering strategies disagree");
}

/// 实际运行.
pub fn run() -> AblationResult {
    check_consistency();

    println!("Running ablation studies...");
    let tasks: [fn() -> Profile; 4] = [
        functional_remap,
        legacy_in_place,
        sequential_partition,
        parallel_partition,
    ];
    // 并行归约本身会占满所有核心, 因此各策略依次运行
    let profiles = tasks.map(|t| t());

    ["remap", "legacy", "partition", "par_partition"]
        .into_iter()
        .zip(profiles)
        .collect()
}
