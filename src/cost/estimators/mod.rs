//! 节点估算器模块
//!
//! 按算子家族拆分的代价公式。所有公式都是纯函数：固定输入必得
//! 逐位相同的输出，不做任何 I/O（统计信息由上层取好后传入）。

pub mod data_processing;
pub mod join;
pub mod parallel;
pub mod scan;
pub mod sort_limit;

pub use data_processing::DataProcessingEstimator;
pub use join::JoinEstimator;
pub use parallel::ParallelEstimator;
pub use scan::ScanEstimator;
pub use sort_limit::SortLimitEstimator;

use crate::cost::breakdown::CostBreakdown;

/// 取第 index 个子节点的重算结果，缺失时退回零代价占位
pub fn child_or_empty(children: &[CostBreakdown], index: usize) -> CostBreakdown {
    children.get(index).cloned().unwrap_or_else(CostBreakdown::empty)
}

/// log2，输入向下保护到 2 以避免 0 行/1 行时出现 0 或负值
pub fn safe_log2(n: f64) -> f64 {
    n.max(2.0).log2()
}
