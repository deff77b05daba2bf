//! 节点代价重算结果
//!
//! `CostBreakdown` 是代价模型对单个节点的输出：重算的启动/总代价、
//! 估算行数、命名子项列表，以及与规划器报告值和实际耗时的对账增量。

use serde::Serialize;

use crate::plan::PlanNode;

/// 命名的代价子项，例如 "页 IO"、"每行 CPU"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostTerm {
    pub label: String,
    pub amount: f64,
}

impl CostTerm {
    pub fn new(label: impl Into<String>, amount: f64) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// 单个节点的代价重算结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    /// 重算的启动代价
    pub startup_cost: f64,
    /// 重算的总代价
    pub total_cost: f64,
    /// 重算的输出行数
    pub output_rows: u64,
    /// 构成总代价的命名子项（Unsupported 节点为空）
    pub terms: Vec<CostTerm>,
    /// 重算总代价 - 报告总代价（代价单位之间的可比增量）
    pub delta: f64,
    /// 重算总代价 ÷ 实际耗时（毫秒）
    ///
    /// 代价单位与时间单位不可直接比较，该比值只用作排序信号，
    /// 绝不代表相等关系。
    pub actual_ratio: Option<f64>,
    /// false 表示该节点无公式可用（Unsupported），代价为报告值的照抄
    pub modeled: bool,
    /// true 表示统计信息缺失，公式使用了文档默认常量
    pub defaults_used: bool,
}

impl CostBreakdown {
    /// 构造已建模的结果，增量在 [`finalize`](Self::finalize) 中回填
    pub fn modeled(startup_cost: f64, total_cost: f64, output_rows: u64) -> Self {
        Self {
            startup_cost,
            total_cost,
            output_rows,
            terms: Vec::new(),
            delta: 0.0,
            actual_ratio: None,
            modeled: true,
            defaults_used: false,
        }
    }

    /// 无公式可用：照抄报告值，不列子项
    pub fn unmodeled(node: &PlanNode) -> Self {
        Self {
            startup_cost: node.reported_startup_cost,
            total_cost: node.reported_total_cost,
            output_rows: node.estimated_rows,
            terms: Vec::new(),
            delta: 0.0,
            actual_ratio: None,
            modeled: false,
            defaults_used: false,
        }
    }

    /// 零代价空结果（结构异常的树中缺失的子节点占位）
    pub fn empty() -> Self {
        Self::modeled(0.0, 0.0, 0)
    }

    pub fn with_term(mut self, label: impl Into<String>, amount: f64) -> Self {
        self.terms.push(CostTerm::new(label, amount));
        self
    }

    pub fn with_defaults_used(mut self, defaults_used: bool) -> Self {
        self.defaults_used = self.defaults_used || defaults_used;
        self
    }

    /// 回填与报告值/实际值的对账增量
    pub fn finalize(mut self, node: &PlanNode) -> Self {
        self.delta = self.total_cost - node.reported_total_cost;
        self.actual_ratio = node.actual_total_time.and_then(|ms| {
            if ms > 0.0 {
                Some(self.total_cost / ms)
            } else {
                None
            }
        });
        self
    }

    /// 重算结果是否自洽：有限且非负
    pub fn is_consistent(&self) -> bool {
        self.startup_cost.is_finite()
            && self.total_cost.is_finite()
            && self.startup_cost >= 0.0
            && self.total_cost >= 0.0
            && self.startup_cost <= self.total_cost + f64::EPSILON
    }

    /// 人类可读的公式分解文本（每个子项一行）
    pub fn explanation(&self) -> String {
        if !self.modeled {
            return "该算子无公式可用，代价照抄规划器报告值".to_string();
        }
        let mut lines: Vec<String> = self
            .terms
            .iter()
            .map(|t| format!("{} = {:.4}", t.label, t.amount))
            .collect();
        lines.push(format!(
            "总代价 = {:.4} (启动 {:.4})",
            self.total_cost, self.startup_cost
        ));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::OperatorKind;

    fn leaf(reported_total: f64, actual_ms: Option<f64>) -> PlanNode {
        PlanNode {
            operator_kind: OperatorKind::SeqScan,
            node_type: "Seq Scan".into(),
            reported_startup_cost: 0.0,
            reported_total_cost: reported_total,
            estimated_rows: 100,
            estimated_row_width: 8,
            actual_rows: None,
            actual_total_time: actual_ms,
            relation_name: Some("t".into()),
            index_name: None,
            join_type: None,
            sort_keys: vec![],
            group_keys: vec![],
            filter_expression: None,
            workers_planned: None,
            children: vec![],
        }
    }

    #[test]
    fn test_finalize_delta() {
        let node = leaf(120.0, None);
        let b = CostBreakdown::modeled(0.0, 150.0, 100).finalize(&node);
        assert!((b.delta - 30.0).abs() < 1e-9);
        assert!(b.actual_ratio.is_none());
    }

    #[test]
    fn test_finalize_actual_ratio() {
        let node = leaf(150.0, Some(3.0));
        let b = CostBreakdown::modeled(0.0, 150.0, 100).finalize(&node);
        assert_eq!(b.actual_ratio, Some(50.0));
    }

    #[test]
    fn test_unmodeled_copies_reported() {
        let node = leaf(42.5, None);
        let b = CostBreakdown::unmodeled(&node);
        assert!(!b.modeled);
        assert_eq!(b.total_cost, 42.5);
        assert!(b.terms.is_empty());
    }

    #[test]
    fn test_explanation_lists_each_term() {
        let node = leaf(120.0, None);
        let b = CostBreakdown::modeled(0.0, 150.0, 100)
            .with_term("页 IO", 50.0)
            .with_term("每行 CPU", 100.0)
            .finalize(&node);
        let text = b.explanation();
        assert!(text.contains("页 IO = 50.0000"));
        assert!(text.contains("每行 CPU = 100.0000"));
        assert!(text.contains("总代价 = 150.0000"));
    }

    #[test]
    fn test_explanation_unmodeled_states_copied_cost() {
        let node = leaf(42.5, None);
        let b = CostBreakdown::unmodeled(&node);
        assert!(b.explanation().contains("照抄"));
    }

    #[test]
    fn test_consistency() {
        assert!(CostBreakdown::modeled(1.0, 2.0, 0).is_consistent());
        assert!(!CostBreakdown::modeled(3.0, 2.0, 0).is_consistent());
        assert!(!CostBreakdown::modeled(0.0, f64::NAN, 0).is_consistent());
    }
}
