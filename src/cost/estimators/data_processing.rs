//! 数据加工估算器
//!
//! Aggregate / Group / Unique / Materialize 共享同一骨架：
//! 子节点总代价 + 输入行数 × cpu_operator_cost，再按算子各自加项。

use crate::config::CostParams;
use crate::cost::breakdown::CostBreakdown;
use crate::plan::PlanNode;

/// 数据加工估算器
pub struct DataProcessingEstimator;

impl DataProcessingEstimator {
    /// 聚合节点
    ///
    /// total = child.total + inputRows × cpu_operator_cost
    ///       + 每个聚合表达式一次 cpu_operator_cost
    /// 输入字段不携带聚合表达式列表，按单聚合计费。
    /// 无分组键时输出恒为 1 行（SUM/COUNT 等）。
    pub fn aggregate(node: &PlanNode, child: &CostBreakdown, params: &CostParams) -> CostBreakdown {
        let input_rows = child.output_rows;
        let transition_cost = input_rows as f64 * params.cpu_operator_cost;
        let agg_expr_cost = params.cpu_operator_cost;
        let total = child.total_cost + transition_cost + agg_expr_cost;

        let output_rows = if node.group_keys.is_empty() {
            1
        } else {
            node.estimated_rows
        };

        // 聚合是阻塞算子：产出前必须消费完全部输入
        CostBreakdown::modeled(child.total_cost.min(total), total, output_rows)
            .with_term("子节点总代价", child.total_cost)
            .with_term(
                format!("聚合转移 CPU: {input_rows} 行 × cpu_operator_cost"),
                transition_cost,
            )
            .with_term("聚合表达式 CPU: 1 × cpu_operator_cost", agg_expr_cost)
    }

    /// 分组节点（输入已有序，流式产出）
    pub fn group(node: &PlanNode, child: &CostBreakdown, params: &CostParams) -> CostBreakdown {
        Self::streaming_pass(node, child, params, "分组比较 CPU")
    }

    /// 去重节点（输入已有序，流式产出）
    pub fn unique(node: &PlanNode, child: &CostBreakdown, params: &CostParams) -> CostBreakdown {
        Self::streaming_pass(node, child, params, "去重比较 CPU")
    }

    /// 物化节点
    ///
    /// total = child.total + rows × cpu_operator_cost；
    /// 物化体积超出工作内存时追加一写一读的页 IO。
    pub fn materialize(
        node: &PlanNode,
        child: &CostBreakdown,
        params: &CostParams,
    ) -> CostBreakdown {
        let rows = child.output_rows;
        let pass_cost = rows as f64 * params.cpu_operator_cost;
        let mut total = child.total_cost + pass_cost;

        let mut breakdown = CostBreakdown::modeled(0.0, 0.0, rows)
            .with_term("子节点总代价", child.total_cost)
            .with_term(format!("物化 CPU: {rows} 行 × cpu_operator_cost"), pass_cost);

        let bytes = rows * node.estimated_row_width.max(1);
        if bytes > params.work_mem_bytes {
            let pages = bytes.div_ceil(params.page_size).max(1);
            let spill_cost = 2.0 * pages as f64 * params.seq_page_cost;
            total += spill_cost;
            breakdown = breakdown.with_term(
                format!("物化落盘: 2 × {pages} 页 × seq_page_cost"),
                spill_cost,
            );
        }

        breakdown.startup_cost = child.startup_cost.min(total);
        breakdown.total_cost = total;
        breakdown
    }

    fn streaming_pass(
        node: &PlanNode,
        child: &CostBreakdown,
        params: &CostParams,
        label: &str,
    ) -> CostBreakdown {
        let input_rows = child.output_rows;
        let pass_cost = input_rows as f64 * params.cpu_operator_cost;
        let total = child.total_cost + pass_cost;

        CostBreakdown::modeled(child.startup_cost.min(total), total, node.estimated_rows)
            .with_term("子节点总代价", child.total_cost)
            .with_term(format!("{label}: {input_rows} 行 × cpu_operator_cost"), pass_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::OperatorKind;

    fn node(kind: OperatorKind, rows: u64, group_keys: Vec<String>) -> PlanNode {
        PlanNode {
            operator_kind: kind,
            node_type: String::new(),
            reported_startup_cost: 0.0,
            reported_total_cost: 0.0,
            estimated_rows: rows,
            estimated_row_width: 8,
            actual_rows: None,
            actual_total_time: None,
            relation_name: None,
            index_name: None,
            join_type: None,
            sort_keys: vec![],
            group_keys,
            filter_expression: None,
            workers_planned: None,
            children: vec![],
        }
    }

    #[test]
    fn test_aggregate_plain_returns_one_row() {
        let params = CostParams::default();
        let agg = node(OperatorKind::Aggregate, 1, vec![]);
        let child = CostBreakdown::modeled(0.0, 150.0, 10000);
        let b = DataProcessingEstimator::aggregate(&agg, &child, &params);
        // 150 + 10000×0.0025 + 0.0025 = 175.0025
        assert!((b.total_cost - 175.0025).abs() < 1e-9);
        assert_eq!(b.output_rows, 1);
    }

    #[test]
    fn test_aggregate_grouped_keeps_planner_rows() {
        let params = CostParams::default();
        let agg = node(OperatorKind::Aggregate, 25, vec!["l_shipmode".into()]);
        let child = CostBreakdown::modeled(0.0, 150.0, 10000);
        let b = DataProcessingEstimator::aggregate(&agg, &child, &params);
        assert_eq!(b.output_rows, 25);
    }

    #[test]
    fn test_unique_charges_per_input_row() {
        let params = CostParams::default();
        let uniq = node(OperatorKind::Unique, 100, vec![]);
        let child = CostBreakdown::modeled(2.0, 50.0, 4000);
        let b = DataProcessingEstimator::unique(&uniq, &child, &params);
        assert!((b.total_cost - 60.0).abs() < 1e-9);
        assert_eq!(b.startup_cost, 2.0);
    }

    #[test]
    fn test_materialize_spill() {
        let params = CostParams {
            work_mem_bytes: 8192,
            ..Default::default()
        };
        let mat = node(OperatorKind::Materialize, 10000, vec![]);
        let child = CostBreakdown::modeled(0.0, 10.0, 10000);
        let b = DataProcessingEstimator::materialize(&mat, &child, &params);
        assert!(b.terms.iter().any(|t| t.label.contains("物化落盘")));
        // 10000 行 × 8 字节 = 80000 字节 → 10 页 → 2×10×1.0 = 20.0
        assert!((b.total_cost - (10.0 + 25.0 + 20.0)).abs() < 1e-9);
    }
}
