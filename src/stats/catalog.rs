//! 实时目录统计信息提供者
//!
//! 针对调用方提供的 PostgreSQL 连接执行只读目录查询：
//! - pg_class：reltuples / relpages / relallvisible
//! - pg_stats：n_distinct / most_common_vals / most_common_freqs / correlation
//! - pg_index：索引页数、索引项数量、唯一标志
//!
//! 连接由调用方独占供给，本提供者只在单次取数期间短暂持有
//! （tokio Mutex 的一次 lock-query-unlock），绝不跨整棵树的遍历持锁。

use async_trait::async_trait;
use sqlx::{PgConnection, Row};
use tokio::sync::Mutex;

use crate::core::error::{AuditError, AuditResult};
use crate::stats::{ColumnStatistics, IndexStatistics, StatisticsProvider, TableStatistics};

const TABLE_STATS_QUERY: &str = "SELECT reltuples::float8, relpages, relallvisible \
     FROM pg_class WHERE relname = $1 AND relkind = 'r'";

/// most_common_vals 是 anyarray，经 text 再转 text[] 取其文本形式
const COLUMN_STATS_QUERY: &str = "SELECT attname, n_distinct::float8, \
            most_common_vals::text::text[], most_common_freqs, correlation::float8 \
     FROM pg_stats WHERE tablename = $1 AND schemaname = current_schema()";

const INDEX_STATS_QUERY: &str = "SELECT c.relpages, c.reltuples::float8, i.indisunique \
     FROM pg_class c JOIN pg_index i ON i.indexrelid = c.oid \
     WHERE c.relname = $1 AND c.relkind = 'i'";

/// 目录统计信息提供者
///
/// 生命周期绑定单次分析请求；外层通常再套一层
/// [`CachingStatisticsProvider`](crate::stats::CachingStatisticsProvider)。
pub struct CatalogStatisticsProvider<'a> {
    conn: Mutex<&'a mut PgConnection>,
}

impl<'a> CatalogStatisticsProvider<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl<'a> StatisticsProvider for CatalogStatisticsProvider<'a> {
    async fn table_stats(&self, relation_name: &str) -> AuditResult<TableStatistics> {
        let mut conn = self.conn.lock().await;

        let row = sqlx::query(TABLE_STATS_QUERY)
            .bind(relation_name)
            .fetch_optional(&mut **conn)
            .await?
            .ok_or_else(|| AuditError::table_stats_missing(relation_name))?;

        let row_count: f64 = row.try_get(0)?;
        let page_count: i32 = row.try_get(1)?;
        let visible_pages: i32 = row.try_get(2)?;

        let mut stats = TableStatistics {
            relation_name: relation_name.to_string(),
            // reltuples 为 -1 表示从未统计过
            row_count: row_count.max(0.0) as u64,
            page_count: page_count.max(0) as u64,
            visible_pages: visible_pages.max(0) as u64,
            ..Default::default()
        };

        let column_rows = sqlx::query(COLUMN_STATS_QUERY)
            .bind(relation_name)
            .fetch_all(&mut **conn)
            .await?;
        for col_row in column_rows {
            let column_name: String = col_row.try_get(0)?;
            let n_distinct: Option<f64> = col_row.try_get(1)?;
            let mcv_values: Option<Vec<String>> = col_row.try_get(2)?;
            let mcv_freqs: Option<Vec<f32>> = col_row.try_get(3)?;
            let correlation: Option<f64> = col_row.try_get(4)?;

            let most_common_values = match (mcv_values, mcv_freqs) {
                (Some(values), Some(freqs)) => values
                    .into_iter()
                    .zip(freqs.into_iter().map(f64::from))
                    .collect(),
                _ => Vec::new(),
            };

            stats.column_stats.insert(
                column_name.clone(),
                ColumnStatistics {
                    column_name,
                    n_distinct: n_distinct.unwrap_or(0.0),
                    most_common_values,
                    correlation: correlation.unwrap_or(0.0),
                },
            );
        }

        log::debug!(
            "目录取数: 表 {} rows={} pages={} columns={}",
            relation_name,
            stats.row_count,
            stats.page_count,
            stats.column_stats.len()
        );
        Ok(stats)
    }

    async fn index_stats(&self, index_name: &str) -> AuditResult<IndexStatistics> {
        let mut conn = self.conn.lock().await;

        let row = sqlx::query(INDEX_STATS_QUERY)
            .bind(index_name)
            .fetch_optional(&mut **conn)
            .await?
            .ok_or_else(|| AuditError::index_stats_missing(index_name))?;

        let page_count: i32 = row.try_get(0)?;
        let entry_count: f64 = row.try_get(1)?;
        let is_unique: bool = row.try_get(2)?;

        let stats = IndexStatistics {
            index_name: index_name.to_string(),
            page_count: page_count.max(0) as u64,
            entry_count: entry_count.max(0.0) as u64,
            is_unique,
        };
        log::debug!(
            "目录取数: 索引 {} pages={} entries={}",
            index_name,
            stats.page_count,
            stats.entry_count
        );
        Ok(stats)
    }
}
