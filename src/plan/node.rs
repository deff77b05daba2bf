//! 计划节点类型定义
//!
//! `PlanNode` 是解析后的算子节点，子节点由父节点独占持有，
//! 整棵树随单次分析请求创建、随报告交付销毁。

use serde::Serialize;

/// 算子类别
///
/// 封闭枚举：代价模型按此标签做一次穷尽分发，新增算子意味着
/// 新增一个枚举成员和一条公式分支。陌生的 `Node Type` 字符串
/// 统一映射为 `Unsupported`，而不是解析失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperatorKind {
    SeqScan,
    IndexOnlyScan,
    NestedLoop,
    MergeJoin,
    HashJoin,
    Aggregate,
    Gather,
    Group,
    Limit,
    Materialize,
    Sort,
    Unique,
    Unsupported,
}

impl OperatorKind {
    /// `Node Type` 字符串到算子类别的固定映射（大小写敏感，与 PostgreSQL 输出一致）
    pub fn from_node_type(node_type: &str) -> Self {
        match node_type {
            "Seq Scan" => Self::SeqScan,
            "Index Only Scan" => Self::IndexOnlyScan,
            "Nested Loop" => Self::NestedLoop,
            "Merge Join" => Self::MergeJoin,
            "Hash Join" => Self::HashJoin,
            "Aggregate" => Self::Aggregate,
            "Gather" => Self::Gather,
            "Group" => Self::Group,
            "Limit" => Self::Limit,
            "Materialize" => Self::Materialize,
            "Sort" => Self::Sort,
            "Unique" => Self::Unique,
            _ => Self::Unsupported,
        }
    }
}

/// 连接类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinType {
    Inner,
    Left,
    Semi,
    Anti,
    Full,
}

impl JoinType {
    /// `Join Type` 字符串到连接类型的映射，未知字符串返回 None
    pub fn from_join_type(join_type: &str) -> Option<Self> {
        match join_type {
            "Inner" => Some(Self::Inner),
            "Left" => Some(Self::Left),
            "Semi" => Some(Self::Semi),
            "Anti" => Some(Self::Anti),
            "Full" => Some(Self::Full),
            _ => None,
        }
    }
}

/// 解析后的计划节点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanNode {
    /// 算子类别
    pub operator_kind: OperatorKind,
    /// 原始 `Node Type` 字符串（Unsupported 节点在报告中仍需展示原名）
    pub node_type: String,
    /// 规划器报告的启动代价
    pub reported_startup_cost: f64,
    /// 规划器报告的总代价
    pub reported_total_cost: f64,
    /// 规划器估算的输出行数
    pub estimated_rows: u64,
    /// 规划器估算的行宽（字节）
    pub estimated_row_width: u64,
    /// 实际行数（仅 ANALYZE 计划）
    pub actual_rows: Option<u64>,
    /// 实际总耗时（毫秒，仅 ANALYZE 计划）
    pub actual_total_time: Option<f64>,
    /// 扫描的关系名
    pub relation_name: Option<String>,
    /// 扫描的索引名
    pub index_name: Option<String>,
    /// 连接类型
    pub join_type: Option<JoinType>,
    /// 排序键（不透明字符串）
    pub sort_keys: Vec<String>,
    /// 分组键（不透明字符串）
    pub group_keys: Vec<String>,
    /// 过滤表达式（不透明字符串）
    pub filter_expression: Option<String>,
    /// 计划的并行 worker 数（仅 Gather 节点）
    pub workers_planned: Option<u64>,
    /// 子节点，有序：连接节点外表在前
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    /// 外侧子节点（连接的外表，或一元算子的唯一输入）
    pub fn outer_child(&self) -> Option<&PlanNode> {
        self.children.first()
    }

    /// 内侧子节点（连接的内表）
    pub fn inner_child(&self) -> Option<&PlanNode> {
        self.children.get(1)
    }

    /// 树中节点总数
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(PlanNode::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_node_type_known_operators() {
        assert_eq!(OperatorKind::from_node_type("Seq Scan"), OperatorKind::SeqScan);
        assert_eq!(
            OperatorKind::from_node_type("Index Only Scan"),
            OperatorKind::IndexOnlyScan
        );
        assert_eq!(OperatorKind::from_node_type("Hash Join"), OperatorKind::HashJoin);
        assert_eq!(OperatorKind::from_node_type("Gather"), OperatorKind::Gather);
    }

    #[test]
    fn test_from_node_type_unknown_degrades() {
        assert_eq!(
            OperatorKind::from_node_type("Bitmap Heap Scan"),
            OperatorKind::Unsupported
        );
        // 大小写敏感：小写不匹配
        assert_eq!(OperatorKind::from_node_type("seq scan"), OperatorKind::Unsupported);
    }

    #[test]
    fn test_join_type_mapping() {
        assert_eq!(JoinType::from_join_type("Inner"), Some(JoinType::Inner));
        assert_eq!(JoinType::from_join_type("Anti"), Some(JoinType::Anti));
        assert_eq!(JoinType::from_join_type("Right"), None);
    }
}
