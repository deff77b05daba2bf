//! 统计信息模块
//!
//! 提供代价公式所需的表级、列级和索引级统计信息，
//! 参考 PostgreSQL 的 pg_class 和 pg_stats 设计。

use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::error::{AuditError, AuditResult};

pub mod cache;
#[cfg(feature = "catalog")]
pub mod catalog;

pub use cache::CachingStatisticsProvider;
#[cfg(feature = "catalog")]
pub use catalog::CatalogStatisticsProvider;

/// 表级统计信息
/// 对应 pg_class 中的 reltuples、relpages 和 relallvisible
#[derive(Debug, Clone, Default)]
pub struct TableStatistics {
    /// 关系名
    pub relation_name: String,
    /// 估计行数
    pub row_count: u64,
    /// 数据页数
    pub page_count: u64,
    /// 全可见页数（index-only scan 免回表的部分）
    pub visible_pages: u64,
    /// 列级统计信息
    pub column_stats: HashMap<String, ColumnStatistics>,
}

impl TableStatistics {
    pub fn new(relation_name: impl Into<String>) -> Self {
        Self {
            relation_name: relation_name.into(),
            ..Default::default()
        }
    }

    /// 获取表的估计页数，未设置时基于行数和行宽估算
    pub fn estimate_pages(&self, page_size: u64, row_width: u64) -> u64 {
        if self.page_count > 0 {
            self.page_count
        } else if row_width > 0 {
            (self.row_count * row_width).div_ceil(page_size).max(1)
        } else {
            // 默认假设每页 100 行
            (self.row_count / 100).max(1)
        }
    }

    /// 全可见页占比（0.0 - 1.0）
    pub fn visible_fraction(&self) -> f64 {
        if self.page_count == 0 {
            0.0
        } else {
            (self.visible_pages as f64 / self.page_count as f64).clamp(0.0, 1.0)
        }
    }

    pub fn column(&self, column_name: &str) -> Option<&ColumnStatistics> {
        self.column_stats.get(column_name)
    }
}

/// 列级统计信息
/// 对应 pg_stats 的 n_distinct、most_common_vals/freqs 和 correlation
#[derive(Debug, Clone, Default)]
pub struct ColumnStatistics {
    /// 列名
    pub column_name: String,
    /// n_distinct 原始值：正数为不同值数量，负数为占行数的比例
    pub n_distinct: f64,
    /// 最常见值列表（文本形式）及其频率
    pub most_common_values: Vec<(String, f64)>,
    /// 物理顺序与逻辑顺序的相关系数（-1.0 - 1.0）
    pub correlation: f64,
}

impl ColumnStatistics {
    pub fn new(column_name: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            ..Default::default()
        }
    }

    /// 解析 n_distinct 为不同值数量
    ///
    /// pg_stats 语义：正数直接是数量，负数是行数的比例（-1 表示全部不同）
    pub fn distinct_values(&self, row_count: u64) -> f64 {
        if self.n_distinct >= 0.0 {
            self.n_distinct
        } else {
            -self.n_distinct * row_count as f64
        }
    }

    /// 查找某个文本值在 MCV 列表中的频率
    pub fn mcv_frequency(&self, value: &str) -> Option<f64> {
        self.most_common_values
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, freq)| *freq)
    }
}

/// 索引统计信息
#[derive(Debug, Clone, Default)]
pub struct IndexStatistics {
    /// 索引名
    pub index_name: String,
    /// 索引页数
    pub page_count: u64,
    /// 索引项数量
    pub entry_count: u64,
    /// 唯一索引标志
    pub is_unique: bool,
}

impl IndexStatistics {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            ..Default::default()
        }
    }
}

/// 统计信息提供者 trait
///
/// 定义代价模型获取统计信息的标准接口。目录实现走只读系统表查询，
/// 内存实现用于测试和离线分析。
///
/// 缺失按 `AuditError::StatisticsUnavailable` 返回，调用方必须按
/// 可恢复错误处理（代价模型降级为默认选择性，而非中止分析）。
#[async_trait]
pub trait StatisticsProvider: Send + Sync {
    /// 获取表的统计信息
    async fn table_stats(&self, relation_name: &str) -> AuditResult<TableStatistics>;

    /// 获取索引的统计信息
    async fn index_stats(&self, index_name: &str) -> AuditResult<IndexStatistics>;
}

/// 内存统计信息提供者（用于测试和离线分析）
#[derive(Debug, Default)]
pub struct MemoryStatisticsProvider {
    pub table_stats: HashMap<String, TableStatistics>,
    pub index_stats: HashMap<String, IndexStatistics>,
}

impl MemoryStatisticsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加表统计信息
    pub fn add_table_stats(&mut self, stats: TableStatistics) {
        self.table_stats.insert(stats.relation_name.clone(), stats);
    }

    /// 添加索引统计信息
    pub fn add_index_stats(&mut self, stats: IndexStatistics) {
        self.index_stats.insert(stats.index_name.clone(), stats);
    }
}

#[async_trait]
impl StatisticsProvider for MemoryStatisticsProvider {
    async fn table_stats(&self, relation_name: &str) -> AuditResult<TableStatistics> {
        self.table_stats
            .get(relation_name)
            .cloned()
            .ok_or_else(|| AuditError::table_stats_missing(relation_name))
    }

    async fn index_stats(&self, index_name: &str) -> AuditResult<IndexStatistics> {
        self.index_stats
            .get(index_name)
            .cloned()
            .ok_or_else(|| AuditError::index_stats_missing(index_name))
    }
}
