//! 连接操作估算器
//!
//! 子节点约定：外表在前（索引 0），内表在后（索引 1）。
//!
//! - NestedLoop：外表代价 + 外表行数 × 内表代价 + 行对比较 CPU
//! - MergeJoin：两侧代价 + 合并比较 CPU；未预排序的一侧合成排序计费
//! - HashJoin：两侧代价 + 构建/探测 CPU；内表超出工作内存则分批落盘

use crate::config::CostParams;
use crate::cost::breakdown::CostBreakdown;
use crate::cost::estimators::SortLimitEstimator;
use crate::plan::{OperatorKind, PlanNode};

/// 连接操作估算器
pub struct JoinEstimator;

impl JoinEstimator {
    /// 嵌套循环连接
    ///
    /// total = outer.total + outerRows × inner.total
    ///       + outerRows × innerRows × cpu_operator_cost
    /// startup = outer.startup + inner.startup
    pub fn nested_loop(
        node: &PlanNode,
        outer: &CostBreakdown,
        inner: &CostBreakdown,
        params: &CostParams,
    ) -> CostBreakdown {
        let outer_rows = outer.output_rows;
        let inner_rows = inner.output_rows;

        let rescan_cost = outer_rows as f64 * inner.total_cost;
        let compare_cost =
            outer_rows as f64 * inner_rows as f64 * params.cpu_operator_cost;
        let total = outer.total_cost + rescan_cost + compare_cost;
        // 外表 0 行时内表不会被执行，启动代价不得超过总代价
        let startup = (outer.startup_cost + inner.startup_cost).min(total);

        CostBreakdown::modeled(startup, total, node.estimated_rows)
            .with_term("外表总代价", outer.total_cost)
            .with_term(
                format!("内表重扫: {outer_rows} × 内表总代价"),
                rescan_cost,
            )
            .with_term(
                format!("行对比较 CPU: {outer_rows} × {inner_rows} × cpu_operator_cost"),
                compare_cost,
            )
    }

    /// 归并连接
    ///
    /// total = outer.total + inner.total + (outerRows + innerRows) × cpu_operator_cost
    /// 未预排序的子输入按排序公式合成一个前置 Sort 的代价。
    pub fn merge_join(
        node: &PlanNode,
        outer: &CostBreakdown,
        inner: &CostBreakdown,
        params: &CostParams,
    ) -> CostBreakdown {
        let outer_rows = outer.output_rows;
        let inner_rows = inner.output_rows;

        let merge_cost =
            (outer_rows + inner_rows) as f64 * params.cpu_operator_cost;
        let mut total = outer.total_cost + inner.total_cost + merge_cost;
        let mut breakdown = CostBreakdown::modeled(0.0, 0.0, node.estimated_rows)
            .with_term("外表总代价", outer.total_cost)
            .with_term("内表总代价", inner.total_cost)
            .with_term(
                format!("合并 CPU: ({outer_rows} + {inner_rows}) × cpu_operator_cost"),
                merge_cost,
            );

        // 排序规避检查：未预排序的一侧计入合成排序
        for (side, child_node, child) in [
            ("外表", node.outer_child(), outer),
            ("内表", node.inner_child(), inner),
        ] {
            let presorted = child_node.map(is_presorted).unwrap_or(false);
            if !presorted {
                let width = child_node.map(|c| c.estimated_row_width).unwrap_or(0).max(1);
                let (_, sort_cost) =
                    SortLimitEstimator::sort_terms(child.output_rows, width, params);
                total += sort_cost;
                breakdown = breakdown.with_term(
                    format!("{side}合成排序: {} 行", child.output_rows),
                    sort_cost,
                );
            }
        }

        breakdown.startup_cost = outer.startup_cost + inner.startup_cost;
        breakdown.total_cost = total;
        breakdown
    }

    /// 哈希连接
    ///
    /// total = outer.total + inner.total
    ///       + innerRows × cpu_operator_cost（构建）
    ///       + outerRows × cpu_operator_cost（探测）
    /// 内表体积超出工作内存时追加 batches × seq_page_cost × pages 落盘项。
    pub fn hash_join(
        node: &PlanNode,
        outer: &CostBreakdown,
        inner: &CostBreakdown,
        params: &CostParams,
    ) -> CostBreakdown {
        let outer_rows = outer.output_rows;
        let inner_rows = inner.output_rows;

        let build_cost = inner_rows as f64 * params.cpu_operator_cost;
        let probe_cost = outer_rows as f64 * params.cpu_operator_cost;
        let mut total = outer.total_cost + inner.total_cost + build_cost + probe_cost;

        // 首行产出前必须建完哈希表
        let startup = outer.startup_cost + inner.total_cost + build_cost;

        let mut breakdown = CostBreakdown::modeled(0.0, 0.0, node.estimated_rows)
            .with_term("外表总代价", outer.total_cost)
            .with_term("内表总代价", inner.total_cost)
            .with_term(format!("哈希构建 CPU: {inner_rows} × cpu_operator_cost"), build_cost)
            .with_term(format!("哈希探测 CPU: {outer_rows} × cpu_operator_cost"), probe_cost);

        let inner_width = node
            .inner_child()
            .map(|c| c.estimated_row_width)
            .unwrap_or(0)
            .max(1);
        let inner_bytes = inner_rows * inner_width;
        if inner_bytes > params.work_mem_bytes {
            let pages = inner_bytes.div_ceil(params.page_size).max(1);
            let batches = inner_bytes.div_ceil(params.work_mem_bytes).max(2);
            let spill_cost = batches as f64 * params.seq_page_cost * pages as f64;
            total += spill_cost;
            breakdown = breakdown.with_term(
                format!("哈希落盘: {batches} 批 × seq_page_cost × {pages} 页"),
                spill_cost,
            );
        }

        breakdown.startup_cost = startup.min(total);
        breakdown.total_cost = total;
        breakdown
    }
}

/// 子输入是否已按连接键有序
///
/// Sort / MergeJoin 的输出有序；IndexOnlyScan 按索引序产出；
/// 其余节点带非空 Sort Key 时也视为有序。
fn is_presorted(node: &PlanNode) -> bool {
    matches!(
        node.operator_kind,
        OperatorKind::Sort | OperatorKind::MergeJoin | OperatorKind::IndexOnlyScan
    ) || !node.sort_keys.is_empty()
}
