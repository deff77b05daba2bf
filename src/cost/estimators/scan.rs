//! 扫描操作估算器
//!
//! - SeqScan：页数 × 顺序页代价 + 行数 × 每行 CPU 代价（+ 过滤代价）
//! - IndexOnlyScan：索引页随机 IO × 选择性 + 索引项 CPU（+ 回表补充项）
//!
//! 统计信息缺失时用节点自身的行数/行宽推算页数，并置 defaults_used。

use crate::config::CostParams;
use crate::cost::breakdown::CostBreakdown;
use crate::cost::selectivity::{self, SelectivityEstimate};
use crate::plan::PlanNode;
use crate::stats::{IndexStatistics, TableStatistics};

/// 扫描操作估算器
pub struct ScanEstimator;

impl ScanEstimator {
    /// 全表扫描
    ///
    /// total = pages × seq_page_cost + rows × cpu_tuple_cost
    ///       (+ rows × cpu_operator_cost，当存在过滤条件)
    /// startup = 0
    pub fn seq_scan(
        node: &PlanNode,
        table: Option<&TableStatistics>,
        params: &CostParams,
    ) -> CostBreakdown {
        let defaults_used = table.is_none();
        // 扫描的输入规模来自表统计；缺失时退回规划器自己的行数估计
        let input_rows = table.map(|t| t.row_count).unwrap_or(node.estimated_rows);
        let pages = match table {
            Some(t) => t.estimate_pages(params.page_size, node.estimated_row_width),
            None => estimate_pages_from_node(node, params),
        };

        let io_cost = pages as f64 * params.seq_page_cost;
        let tuple_cost = input_rows as f64 * params.cpu_tuple_cost;

        let mut breakdown = CostBreakdown::modeled(0.0, io_cost + tuple_cost, node.estimated_rows)
            .with_term(format!("页 IO: {pages} 页 × seq_page_cost"), io_cost)
            .with_term(format!("每行 CPU: {input_rows} 行 × cpu_tuple_cost"), tuple_cost);

        if node.filter_expression.is_some() {
            let filter_cost = input_rows as f64 * params.cpu_operator_cost;
            breakdown.total_cost += filter_cost;
            breakdown = breakdown.with_term(
                format!("过滤 CPU: {input_rows} 行 × cpu_operator_cost"),
                filter_cost,
            );
        }

        breakdown.with_defaults_used(defaults_used)
    }

    /// 仅索引扫描
    ///
    /// total = index_pages × random_page_cost × selectivity
    ///       + rows × cpu_index_tuple_cost
    ///       (+ 非全可见页的回表项，当表统计可用)
    pub fn index_only_scan(
        node: &PlanNode,
        table: Option<&TableStatistics>,
        index: Option<&IndexStatistics>,
        params: &CostParams,
    ) -> CostBreakdown {
        let sel = Self::scan_selectivity(node, table);
        let defaults_used = sel.defaults_used || index.is_none();

        let index_pages = match index {
            Some(idx) => idx.page_count,
            None => estimate_pages_from_node(node, params),
        };
        let tuples = node.estimated_rows;

        let index_io = index_pages as f64 * params.random_page_cost * sel.selectivity;
        let index_cpu = tuples as f64 * params.cpu_index_tuple_cost;

        let mut breakdown = CostBreakdown::modeled(0.0, index_io + index_cpu, tuples)
            .with_term(
                format!(
                    "索引页 IO: {index_pages} 页 × random_page_cost × 选择性 {:.4}",
                    sel.selectivity
                ),
                index_io,
            )
            .with_term(format!("索引项 CPU: {tuples} 项 × cpu_index_tuple_cost"), index_cpu);

        // 回表补充项：非全可见页需要真实取堆页验证可见性
        if let Some(t) = table {
            let invisible = 1.0 - t.visible_fraction();
            if invisible > 0.0 {
                let heap_pages = t.page_count as f64 * sel.selectivity;
                let heap_io = invisible * heap_pages * params.seq_page_cost;
                let heap_cpu = tuples as f64 * params.cpu_tuple_cost;
                breakdown.total_cost += heap_io + heap_cpu;
                breakdown = breakdown
                    .with_term(
                        format!("回表页 IO: 非可见比例 {invisible:.4} × {heap_pages:.1} 页"),
                        heap_io,
                    )
                    .with_term(format!("回表 CPU: {tuples} 行 × cpu_tuple_cost"), heap_cpu);
            }
        }

        breakdown.with_defaults_used(defaults_used)
    }

    /// 索引扫描的选择性：优先谓词匹配统计信息，无谓词时取
    /// 输出行数 / 表行数，统计全缺时退回默认常量
    fn scan_selectivity(node: &PlanNode, table: Option<&TableStatistics>) -> SelectivityEstimate {
        if let Some(filter) = &node.filter_expression {
            return selectivity::filter_selectivity(filter, table);
        }
        match table {
            Some(t) if t.row_count > 0 => SelectivityEstimate {
                selectivity: (node.estimated_rows as f64 / t.row_count as f64).clamp(0.0, 1.0),
                defaults_used: false,
            },
            _ => SelectivityEstimate {
                selectivity: 1.0,
                defaults_used: true,
            },
        }
    }
}

/// 无统计信息时从节点自身的行数与行宽推算页数
fn estimate_pages_from_node(node: &PlanNode, params: &CostParams) -> u64 {
    let width = node.estimated_row_width.max(1);
    (node.estimated_rows * width).div_ceil(params.page_size).max(1)
}
