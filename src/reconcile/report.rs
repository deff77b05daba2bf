//! 诊断报告模型
//!
//! `ReportModel` 与计划树 1:1 镜像，一次构建、构建后只读，
//! 是交给（范围之外的）展示层的唯一产物。可整体序列化为 JSON。

use serde::Serialize;

use crate::cost::CostBreakdown;
use crate::plan::{JoinType, OperatorKind, PlanNode};

/// 单个节点的诊断记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReport {
    /// 算子类别
    pub operator_kind: OperatorKind,
    /// 原始 `Node Type` 字符串
    pub node_type: String,
    /// 规划器报告的启动/总代价
    pub reported_startup_cost: f64,
    pub reported_total_cost: f64,
    /// 规划器估算的输出行数
    pub estimated_rows: u64,
    /// 实际行数与耗时（仅 ANALYZE 计划）
    pub actual_rows: Option<u64>,
    pub actual_total_time: Option<f64>,
    /// 关系/索引名（扫描节点）
    pub relation_name: Option<String>,
    pub index_name: Option<String>,
    /// 连接类型
    pub join_type: Option<JoinType>,
    /// 重算结果
    pub breakdown: CostBreakdown,
    /// 子节点记录，顺序与计划树一致
    pub children: Vec<NodeReport>,
}

impl NodeReport {
    pub(crate) fn new(node: &PlanNode, breakdown: CostBreakdown, children: Vec<NodeReport>) -> Self {
        Self {
            operator_kind: node.operator_kind,
            node_type: node.node_type.clone(),
            reported_startup_cost: node.reported_startup_cost,
            reported_total_cost: node.reported_total_cost,
            estimated_rows: node.estimated_rows,
            actual_rows: node.actual_rows,
            actual_total_time: node.actual_total_time,
            relation_name: node.relation_name.clone(),
            index_name: node.index_name.clone(),
            join_type: node.join_type,
            breakdown,
            children,
        }
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a NodeReport)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// 完整的诊断报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportModel {
    root: NodeReport,
}

impl ReportModel {
    pub(crate) fn new(root: NodeReport) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &NodeReport {
        &self.root
    }

    /// 树中节点总数
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.root.visit(&mut |_| count += 1);
        count
    }

    /// 已建模节点数（Unsupported 除外）
    pub fn modeled_count(&self) -> usize {
        let mut count = 0;
        self.root.visit(&mut |n| {
            if n.breakdown.modeled {
                count += 1;
            }
        });
        count
    }

    /// 使用了默认常量降级的节点数
    pub fn defaulted_count(&self) -> usize {
        let mut count = 0;
        self.root.visit(&mut |n| {
            if n.breakdown.defaults_used {
                count += 1;
            }
        });
        count
    }

    /// 重算 vs 报告的平均绝对百分比误差
    ///
    /// 只统计已建模且报告总代价非零的节点；Unsupported 节点的代价是
    /// 照抄值，计入只会人为压低误差，故排除。无可统计节点时返回 None。
    pub fn mean_abs_pct_error(&self) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        self.root.visit(&mut |n| {
            if n.breakdown.modeled && n.reported_total_cost > 0.0 {
                sum += (n.breakdown.delta / n.reported_total_cost).abs();
                count += 1;
            }
        });
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// 序列化为缩进 JSON（交付给展示层或落盘排查）
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
