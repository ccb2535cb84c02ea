//! 标签过滤策略的消融实验.
//!
//! 1. 函数式重映射 (分配新数组) 与 legacy 原地重编号的耗时对比.
//! 2. 按标签分组归约的串行版本与 `rayon` 并行版本的耗时对比.

mod profile;
mod result;
mod runner;

fn main() {
    simple_logger::init_with_level(log::Level::Warn).expect("Logger initialization error");
    println!("Available cores: {}", utils::cpus());
    runner::run().analyze();
}
