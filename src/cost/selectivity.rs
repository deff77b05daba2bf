//! 选择性估计模块
//!
//! 从过滤表达式字符串估算选择性，参考 PostgreSQL 的选择性估计算法：
//! 等值条件先查 MCV 列表，命中取其频率；未命中按非 MCV 均匀分布
//! 用 1/distinct；谓词无法与已知统计信息匹配时退回文档默认常量。
//!
//! 表达式是不透明字符串，这里只做模式识别（`col op const`），
//! 不做完整解析。识别失败不报错，按默认常量处理。

use crate::stats::TableStatistics;

/// 谓词无法匹配统计信息时的默认选择性（不等值条件的固定常量）
pub const DEFAULT_SELECTIVITY: f64 = 0.01;

/// 选择性估算结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectivityEstimate {
    /// 选择性（0.0 - 1.0）
    pub selectivity: f64,
    /// true 表示统计信息缺失或谓词无法匹配，使用了默认常量
    pub defaults_used: bool,
}

impl SelectivityEstimate {
    fn exact(selectivity: f64) -> Self {
        Self {
            selectivity: selectivity.clamp(0.0, 1.0),
            defaults_used: false,
        }
    }

    fn defaulted(selectivity: f64) -> Self {
        Self {
            selectivity: selectivity.clamp(0.0, 1.0),
            defaults_used: true,
        }
    }
}

/// 比较算子，按匹配优先级排列（双字符算子在前）
const COMPARISON_OPS: &[(&str, bool)] = &[
    ("<=", false),
    (">=", false),
    ("<>", false),
    ("!=", false),
    ("=", true),
    ("<", false),
    (">", false),
];

/// 估算过滤表达式的选择性
pub fn filter_selectivity(
    filter: &str,
    table: Option<&TableStatistics>,
) -> SelectivityEstimate {
    let Some((column, is_equality, literal)) = split_comparison(filter) else {
        // 无法识别的谓词形状
        return SelectivityEstimate::defaulted(DEFAULT_SELECTIVITY);
    };

    let Some(table) = table else {
        return SelectivityEstimate::defaulted(DEFAULT_SELECTIVITY);
    };

    if !is_equality {
        // 不等值条件不做区间估计，用的还是文档默认常量，计入降级
        return SelectivityEstimate::defaulted(DEFAULT_SELECTIVITY);
    }

    let Some(col) = table.column(&column) else {
        return SelectivityEstimate::defaulted(DEFAULT_SELECTIVITY);
    };

    // 1. MCV 命中直接取频率
    if let Some(freq) = col.mcv_frequency(&literal) {
        return SelectivityEstimate::exact(freq);
    }

    // 2. 非 MCV 均匀分布：1/distinct
    let distinct = col.distinct_values(table.row_count);
    if distinct > 0.0 {
        SelectivityEstimate::exact(1.0 / distinct)
    } else {
        SelectivityEstimate::defaulted(DEFAULT_SELECTIVITY)
    }
}

/// 将 `(col op const)` 拆为（列名，是否等值，字面量文本）
fn split_comparison(filter: &str) -> Option<(String, bool, String)> {
    let expr = filter.trim().trim_start_matches('(').trim_end_matches(')');

    for (op, is_equality) in COMPARISON_OPS {
        if let Some(pos) = expr.find(op) {
            let column = normalize_operand(&expr[..pos]);
            let literal = normalize_operand(&expr[pos + op.len()..]);
            if column.is_empty() || literal.is_empty() {
                return None;
            }
            return Some((column, *is_equality, literal));
        }
    }
    None
}

/// 去掉括号、引号和 `::type` 转换后缀
fn normalize_operand(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches(|c| c == '(' || c == ')');
    let without_cast = match trimmed.find("::") {
        Some(pos) => &trimmed[..pos],
        None => trimmed,
    };
    without_cast.trim().trim_matches('\'').to_string()
}
