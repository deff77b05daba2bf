//! 计划载荷解析器
//!
//! 递归下降解析 EXPLAIN (FORMAT JSON) 的嵌套结构。字段名大小写敏感，
//! 与 PostgreSQL 输出一致。`Startup Cost`、`Total Cost`、`Plan Rows`
//! 是所有下游公式的输入，缺失或形状错误即返回 `Parse` 错误；
//! 其余字段全部可选。无 I/O，无副作用。

use serde_json::Value;

use crate::core::error::{AuditError, AuditResult};
use crate::plan::node::{JoinType, OperatorKind, PlanNode};

const FIELD_NODE_TYPE: &str = "Node Type";
const FIELD_STARTUP_COST: &str = "Startup Cost";
const FIELD_TOTAL_COST: &str = "Total Cost";
const FIELD_PLAN_ROWS: &str = "Plan Rows";
const FIELD_PLAN_WIDTH: &str = "Plan Width";
const FIELD_ACTUAL_ROWS: &str = "Actual Rows";
const FIELD_ACTUAL_TOTAL_TIME: &str = "Actual Total Time";
const FIELD_RELATION_NAME: &str = "Relation Name";
const FIELD_INDEX_NAME: &str = "Index Name";
const FIELD_JOIN_TYPE: &str = "Join Type";
const FIELD_SORT_KEY: &str = "Sort Key";
const FIELD_GROUP_KEY: &str = "Group Key";
const FIELD_FILTER: &str = "Filter";
const FIELD_WORKERS_PLANNED: &str = "Workers Planned";
const FIELD_PLANS: &str = "Plans";

/// 解析 EXPLAIN 载荷为计划树
///
/// 接受两种形状：
/// - 完整载荷：`[{"Plan": {...}}]`（EXPLAIN 的原始输出）
/// - 裸节点对象：`{...}`
pub fn parse(payload: &Value) -> AuditResult<PlanNode> {
    let node = unwrap_plan(payload)?;
    parse_node(node, "Plan")
}

/// 剥离 EXPLAIN 输出的外层数组与 "Plan" 包装
fn unwrap_plan(payload: &Value) -> AuditResult<&Value> {
    match payload {
        Value::Array(items) => {
            let first = items
                .first()
                .ok_or_else(|| AuditError::Parse("EXPLAIN 载荷为空数组".to_string()))?;
            first
                .get("Plan")
                .ok_or_else(|| AuditError::Parse("载荷首项缺少 'Plan' 键".to_string()))
        }
        Value::Object(map) => {
            if let Some(plan) = map.get("Plan") {
                Ok(plan)
            } else {
                Ok(payload)
            }
        }
        _ => Err(AuditError::Parse(
            "EXPLAIN 载荷必须是对象或数组".to_string(),
        )),
    }
}

fn parse_node(value: &Value, path: &str) -> AuditResult<PlanNode> {
    let obj = value
        .as_object()
        .ok_or_else(|| AuditError::Parse(format!("{path}: 节点必须是 JSON 对象")))?;

    let node_type = require_str(value, FIELD_NODE_TYPE, path)?;
    let operator_kind = OperatorKind::from_node_type(&node_type);

    let mut children = Vec::new();
    if let Some(plans) = obj.get(FIELD_PLANS) {
        let list = plans.as_array().ok_or_else(|| {
            AuditError::Parse(format!("{path}.{FIELD_PLANS}: 必须是数组"))
        })?;
        for (i, child) in list.iter().enumerate() {
            let child_path = format!("{path}.{FIELD_PLANS}[{i}]");
            children.push(parse_node(child, &child_path)?);
        }
    }

    Ok(PlanNode {
        operator_kind,
        node_type,
        reported_startup_cost: require_f64(value, FIELD_STARTUP_COST, path)?,
        reported_total_cost: require_f64(value, FIELD_TOTAL_COST, path)?,
        estimated_rows: require_u64(value, FIELD_PLAN_ROWS, path)?,
        estimated_row_width: optional_u64(value, FIELD_PLAN_WIDTH, path)?.unwrap_or(0),
        actual_rows: optional_u64(value, FIELD_ACTUAL_ROWS, path)?,
        actual_total_time: optional_f64(value, FIELD_ACTUAL_TOTAL_TIME, path)?,
        relation_name: optional_str(value, FIELD_RELATION_NAME),
        index_name: optional_str(value, FIELD_INDEX_NAME),
        join_type: optional_str(value, FIELD_JOIN_TYPE)
            .as_deref()
            .and_then(JoinType::from_join_type),
        sort_keys: string_list(value, FIELD_SORT_KEY),
        group_keys: string_list(value, FIELD_GROUP_KEY),
        filter_expression: optional_str(value, FIELD_FILTER),
        workers_planned: optional_u64(value, FIELD_WORKERS_PLANNED, path)?,
        children,
    })
}

fn require_f64(value: &Value, field: &str, path: &str) -> AuditResult<f64> {
    let raw = value
        .get(field)
        .ok_or_else(|| AuditError::Parse(format!("{path}: 缺少必需字段 '{field}'")))?;
    let num = raw
        .as_f64()
        .ok_or_else(|| AuditError::Parse(format!("{path}.{field}: 必须是数值")))?;
    if num < 0.0 || !num.is_finite() {
        return Err(AuditError::Parse(format!(
            "{path}.{field}: 必须是非负有限数值，得到 {num}"
        )));
    }
    Ok(num)
}

fn require_u64(value: &Value, field: &str, path: &str) -> AuditResult<u64> {
    let raw = value
        .get(field)
        .ok_or_else(|| AuditError::Parse(format!("{path}: 缺少必需字段 '{field}'")))?;
    parse_u64(raw, field, path)
}

fn require_str(value: &Value, field: &str, path: &str) -> AuditResult<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AuditError::Parse(format!("{path}: 缺少必需字段 '{field}'")))
}

fn optional_f64(value: &Value, field: &str, path: &str) -> AuditResult<Option<f64>> {
    match value.get(field) {
        None => Ok(None),
        Some(raw) => raw
            .as_f64()
            .map(Some)
            .ok_or_else(|| AuditError::Parse(format!("{path}.{field}: 必须是数值"))),
    }
}

fn optional_u64(value: &Value, field: &str, path: &str) -> AuditResult<Option<u64>> {
    match value.get(field) {
        None => Ok(None),
        Some(raw) => parse_u64(raw, field, path).map(Some),
    }
}

/// ANALYZE 输出中部分行数字段形如 1234.0，按非负整数接受
fn parse_u64(raw: &Value, field: &str, path: &str) -> AuditResult<u64> {
    if let Some(n) = raw.as_u64() {
        return Ok(n);
    }
    if let Some(f) = raw.as_f64() {
        if f >= 0.0 && f.is_finite() {
            return Ok(f as u64);
        }
    }
    Err(AuditError::Parse(format!(
        "{path}.{field}: 必须是非负整数"
    )))
}

fn optional_str(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Sort Key / Group Key 是字符串数组；单个字符串也按单元素列表接受
fn string_list(value: &Value, field: &str) -> Vec<String> {
    match value.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_seq_scan() {
        let payload = json!({
            "Node Type": "Seq Scan",
            "Relation Name": "lineitem",
            "Startup Cost": 0.0,
            "Total Cost": 150.0,
            "Plan Rows": 10000,
            "Plan Width": 8
        });
        let node = parse(&payload).unwrap();
        assert_eq!(node.operator_kind, OperatorKind::SeqScan);
        assert_eq!(node.relation_name.as_deref(), Some("lineitem"));
        assert_eq!(node.reported_total_cost, 150.0);
        assert_eq!(node.estimated_rows, 10000);
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_parse_wrapped_payload() {
        let payload = json!([{
            "Plan": {
                "Node Type": "Limit",
                "Startup Cost": 0.0,
                "Total Cost": 0.5,
                "Plan Rows": 5,
                "Plan Width": 4,
                "Plans": [{
                    "Node Type": "Seq Scan",
                    "Relation Name": "orders",
                    "Startup Cost": 0.0,
                    "Total Cost": 100.0,
                    "Plan Rows": 1000,
                    "Plan Width": 4
                }]
            },
            "Planning Time": 0.1
        }]);
        let node = parse(&payload).unwrap();
        assert_eq!(node.operator_kind, OperatorKind::Limit);
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].operator_kind, OperatorKind::SeqScan);
    }

    #[test]
    fn test_parse_join_children_order_preserved() {
        let payload = json!({
            "Node Type": "Hash Join",
            "Join Type": "Inner",
            "Startup Cost": 10.0,
            "Total Cost": 300.0,
            "Plan Rows": 500,
            "Plan Width": 16,
            "Plans": [
                {"Node Type": "Seq Scan", "Relation Name": "orders",
                 "Startup Cost": 0.0, "Total Cost": 100.0, "Plan Rows": 1000, "Plan Width": 8},
                {"Node Type": "Seq Scan", "Relation Name": "customer",
                 "Startup Cost": 0.0, "Total Cost": 50.0, "Plan Rows": 200, "Plan Width": 8}
            ]
        });
        let node = parse(&payload).unwrap();
        assert_eq!(node.join_type, Some(JoinType::Inner));
        // 外表在前
        assert_eq!(node.outer_child().unwrap().relation_name.as_deref(), Some("orders"));
        assert_eq!(node.inner_child().unwrap().relation_name.as_deref(), Some("customer"));
    }

    #[test]
    fn test_parse_missing_total_cost_fails() {
        // 场景 D：叶子节点缺 Total Cost
        let payload = json!({
            "Node Type": "Seq Scan",
            "Startup Cost": 0.0,
            "Plan Rows": 100
        });
        let err = parse(&payload).unwrap_err();
        match err {
            AuditError::Parse(msg) => assert!(msg.contains("Total Cost")),
            other => panic!("期望 Parse 错误，得到 {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_field_deep_in_tree_reports_path() {
        let payload = json!({
            "Node Type": "Limit",
            "Startup Cost": 0.0,
            "Total Cost": 1.0,
            "Plan Rows": 1,
            "Plans": [{
                "Node Type": "Seq Scan",
                "Startup Cost": 0.0,
                "Total Cost": 1.0
            }]
        });
        let err = parse(&payload).unwrap_err();
        match err {
            AuditError::Parse(msg) => {
                assert!(msg.contains("Plans[0]"));
                assert!(msg.contains("Plan Rows"));
            }
            other => panic!("期望 Parse 错误，得到 {other:?}"),
        }
    }

    #[test]
    fn test_parse_wrong_shape_fails() {
        let payload = json!({
            "Node Type": "Seq Scan",
            "Startup Cost": "zero",
            "Total Cost": 1.0,
            "Plan Rows": 1
        });
        assert!(matches!(parse(&payload), Err(AuditError::Parse(_))));
    }

    #[test]
    fn test_parse_unknown_node_type_degrades() {
        let payload = json!({
            "Node Type": "Bitmap Heap Scan",
            "Startup Cost": 0.0,
            "Total Cost": 42.0,
            "Plan Rows": 7
        });
        let node = parse(&payload).unwrap();
        assert_eq!(node.operator_kind, OperatorKind::Unsupported);
        assert_eq!(node.node_type, "Bitmap Heap Scan");
    }

    #[test]
    fn test_parse_analyze_fields() {
        let payload = json!({
            "Node Type": "Sort",
            "Startup Cost": 10.0,
            "Total Cost": 12.0,
            "Plan Rows": 100,
            "Plan Width": 8,
            "Actual Rows": 97,
            "Actual Total Time": 1.234,
            "Sort Key": ["l_shipdate"]
        });
        let node = parse(&payload).unwrap();
        assert_eq!(node.actual_rows, Some(97));
        assert_eq!(node.actual_total_time, Some(1.234));
        assert_eq!(node.sort_keys, vec!["l_shipdate".to_string()]);
    }
}
