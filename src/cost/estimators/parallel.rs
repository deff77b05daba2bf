//! 并行执行估算器
//!
//! Gather：子计划代价按有效 worker 数摊薄，外加每 worker 的并行
//! 启动开销。子计划无行可产出时只有 1 个有效 worker。

use crate::config::CostParams;
use crate::cost::breakdown::CostBreakdown;
use crate::plan::PlanNode;

/// 并行执行估算器
pub struct ParallelEstimator;

impl ParallelEstimator {
    /// Gather 节点
    ///
    /// effectiveWorkers = min(declared, childRows > 0 ? declared : 1)
    /// total = child.total / effectiveWorkers + declared × parallel_setup_cost
    pub fn gather(node: &PlanNode, child: &CostBreakdown, params: &CostParams) -> CostBreakdown {
        let declared = node.workers_planned.unwrap_or(1).max(1);
        let effective = if child.output_rows > 0 { declared } else { 1 };

        let scaled_cost = child.total_cost / effective as f64;
        let setup_cost = declared as f64 * params.parallel_setup_cost;
        let total = scaled_cost + setup_cost;
        let startup = (child.startup_cost + setup_cost).min(total);

        CostBreakdown::modeled(startup, total, node.estimated_rows)
            .with_term(
                format!("子计划摊薄: 子总代价 ÷ {effective} 个有效 worker"),
                scaled_cost,
            )
            .with_term(
                format!("并行启动: {declared} × parallel_setup_cost"),
                setup_cost,
            )
    }
}
