//! 集成测试公共夹具
//!
//! 提供 EXPLAIN JSON 载荷构造器和预置统计信息的内存提供者。

#![allow(dead_code)]

use serde_json::{json, Value};

use planaudit::{ColumnStatistics, IndexStatistics, MemoryStatisticsProvider, TableStatistics};

/// 裸 Seq Scan 节点载荷
pub fn seq_scan_payload(relation: &str, rows: u64, total_cost: f64) -> Value {
    json!({
        "Node Type": "Seq Scan",
        "Relation Name": relation,
        "Startup Cost": 0.0,
        "Total Cost": total_cost,
        "Plan Rows": rows,
        "Plan Width": 8
    })
}

/// 带单个子节点的一元节点载荷
pub fn unary_payload(node_type: &str, rows: u64, total_cost: f64, child: Value) -> Value {
    json!({
        "Node Type": node_type,
        "Startup Cost": 0.0,
        "Total Cost": total_cost,
        "Plan Rows": rows,
        "Plan Width": 8,
        "Plans": [child]
    })
}

/// 二元连接节点载荷（外表在前）
pub fn join_payload(
    node_type: &str,
    rows: u64,
    total_cost: f64,
    outer: Value,
    inner: Value,
) -> Value {
    json!({
        "Node Type": node_type,
        "Join Type": "Inner",
        "Startup Cost": 0.0,
        "Total Cost": total_cost,
        "Plan Rows": rows,
        "Plan Width": 16,
        "Plans": [outer, inner]
    })
}

/// 完整 EXPLAIN 输出形状（外层数组 + Plan 包装）
pub fn wrap_payload(plan: Value) -> Value {
    json!([{ "Plan": plan, "Planning Time": 0.123 }])
}

/// TPC-H 风味的统计信息夹具
///
/// lineitem：10000 行 / 50 页（场景 A 的数字），orders：5000 行 / 50 页
pub fn tpch_provider() -> MemoryStatisticsProvider {
    let mut provider = MemoryStatisticsProvider::new();

    let mut lineitem = TableStatistics {
        relation_name: "lineitem".into(),
        row_count: 10000,
        page_count: 50,
        visible_pages: 50,
        ..Default::default()
    };
    lineitem.column_stats.insert(
        "l_shipmode".into(),
        ColumnStatistics {
            column_name: "l_shipmode".into(),
            n_distinct: 7.0,
            most_common_values: vec![("MAIL".into(), 0.142)],
            correlation: 0.1,
        },
    );
    provider.add_table_stats(lineitem);

    provider.add_table_stats(TableStatistics {
        relation_name: "orders".into(),
        row_count: 5000,
        page_count: 50,
        visible_pages: 50,
        ..Default::default()
    });

    provider.add_index_stats(IndexStatistics {
        index_name: "lineitem_pkey".into(),
        page_count: 30,
        entry_count: 10000,
        is_unique: true,
    });

    provider
}
