//! 排序与限制估算器
//!
//! - Sort：内存排序 rows × log2(rows) × cpu_operator_cost；
//!   估算体积超出工作内存时追加磁盘归并趟次的页 IO
//! - Limit：子代价按 min(1, limit/childRows) 缩放，体现提前终止

use crate::config::CostParams;
use crate::cost::breakdown::{CostBreakdown, CostTerm};
use crate::cost::estimators::safe_log2;
use crate::plan::PlanNode;

/// 排序与限制估算器
pub struct SortLimitEstimator;

impl SortLimitEstimator {
    /// 排序节点
    ///
    /// 排序是阻塞算子：启动代价等于总代价（首行产出前必须消费
    /// 完全部输入并完成排序）。
    pub fn sort(node: &PlanNode, child: &CostBreakdown, params: &CostParams) -> CostBreakdown {
        let rows = child.output_rows;
        let width = node.estimated_row_width.max(1);
        let (terms, sort_cost) = Self::sort_terms(rows, width, params);

        let total = child.total_cost + sort_cost;
        let mut breakdown = CostBreakdown::modeled(total, total, rows)
            .with_term("子节点总代价", child.total_cost);
        breakdown.terms.extend(terms);
        breakdown
    }

    /// 排序本身的代价子项（不含子节点代价）
    ///
    /// 同时供 MergeJoin 对未预排序的子输入合成排序使用。
    pub fn sort_terms(rows: u64, row_width: u64, params: &CostParams) -> (Vec<CostTerm>, f64) {
        let n = rows as f64;
        let cpu_cost = n * safe_log2(n) * params.cpu_operator_cost;
        let mut terms = vec![CostTerm::new(
            format!("排序 CPU: {rows} × log2({rows}) × cpu_operator_cost"),
            cpu_cost,
        )];
        let mut total = cpu_cost;

        let bytes = rows * row_width;
        if bytes > params.work_mem_bytes {
            let pages = bytes.div_ceil(params.page_size).max(1);
            let mem_pages = params.work_mem_pages();
            let merge_passes = safe_log2(pages as f64 / mem_pages as f64).ceil().max(1.0);
            let disk_cost = 2.0 * pages as f64 * params.seq_page_cost * merge_passes;
            terms.push(CostTerm::new(
                format!("磁盘归并: 2 × {pages} 页 × seq_page_cost × {merge_passes} 趟"),
                disk_cost,
            ));
            total += disk_cost;
        }

        (terms, total)
    }

    /// Limit 节点
    ///
    /// total = child.total × min(1, limit / childRows)
    /// limit 数取本节点的 Plan Rows（EXPLAIN 输出中 Limit 节点的
    /// 估算行数就是限制后的行数）。
    pub fn limit(node: &PlanNode, child: &CostBreakdown) -> CostBreakdown {
        let limit_count = node.estimated_rows;
        let child_rows = child.output_rows;

        let factor = if child_rows > 0 {
            (limit_count as f64 / child_rows as f64).min(1.0)
        } else {
            1.0
        };

        let total = child.total_cost * factor;
        let output_rows = limit_count.min(child_rows);

        CostBreakdown::modeled(child.startup_cost.min(total), total, output_rows).with_term(
            format!("子节点总代价 × 缩放系数 min(1, {limit_count}/{child_rows}) = {factor:.4}"),
            total,
        )
    }
}
