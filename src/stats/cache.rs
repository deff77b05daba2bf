//! 会话级统计信息缓存
//!
//! 同一棵计划树常有多个扫描节点命中同一张表，缓存避免重复的目录
//! 往返。缓存的生命周期与单次分析会话绑定，跨会话必须重建
//! （统计信息可能已经变化）。命中和缺失都会被缓存；数据库错误
//! 不缓存，下次访问重试。

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::error::{AuditError, AuditResult};
use crate::stats::{IndexStatistics, StatisticsProvider, TableStatistics};

/// 缓存项：`None` 表示已确认目录中无此行
type CacheSlot<T> = Option<T>;

/// 会话级缓存包装器
pub struct CachingStatisticsProvider<P> {
    inner: P,
    tables: Mutex<HashMap<String, CacheSlot<TableStatistics>>>,
    indexes: Mutex<HashMap<String, CacheSlot<IndexStatistics>>>,
}

impl<P: StatisticsProvider> CachingStatisticsProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            tables: Mutex::new(HashMap::new()),
            indexes: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<P: StatisticsProvider> StatisticsProvider for CachingStatisticsProvider<P> {
    async fn table_stats(&self, relation_name: &str) -> AuditResult<TableStatistics> {
        if let Some(slot) = self.tables.lock().get(relation_name) {
            return match slot {
                Some(stats) => Ok(stats.clone()),
                None => Err(AuditError::table_stats_missing(relation_name)),
            };
        }
        // 锁在 await 前释放：一次会话内遍历是顺序的，不会并发填充
        match self.inner.table_stats(relation_name).await {
            Ok(stats) => {
                self.tables
                    .lock()
                    .insert(relation_name.to_string(), Some(stats.clone()));
                Ok(stats)
            }
            Err(err) if err.is_recoverable() => {
                self.tables.lock().insert(relation_name.to_string(), None);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn index_stats(&self, index_name: &str) -> AuditResult<IndexStatistics> {
        if let Some(slot) = self.indexes.lock().get(index_name) {
            return match slot {
                Some(stats) => Ok(stats.clone()),
                None => Err(AuditError::index_stats_missing(index_name)),
            };
        }
        match self.inner.index_stats(index_name).await {
            Ok(stats) => {
                self.indexes
                    .lock()
                    .insert(index_name.to_string(), Some(stats.clone()));
                Ok(stats)
            }
            Err(err) if err.is_recoverable() => {
                self.indexes.lock().insert(index_name.to_string(), None);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}
