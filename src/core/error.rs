//! 统一错误处理系统 for planaudit
//!
//! ## 设计理念
//!
//! 1. **区分可恢复与不可恢复**：
//!    - `Parse` / `Database` / `Cancelled` 对单次分析请求是硬失败
//!    - `StatisticsUnavailable` 是可恢复的：代价模型降级为默认选择性常量继续计算
//!    - 陌生的算子类型不产生错误，解析阶段直接降级为 `Unsupported` 节点
//!
//! 2. **统一接口**：`AuditResult<T>` 提供统一的返回类型，简化错误传播

use std::fmt;
use thiserror::Error;

/// 统计信息的对象类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsKind {
    Table,
    Index,
}

impl fmt::Display for StatsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsKind::Table => write!(f, "表"),
            StatsKind::Index => write!(f, "索引"),
        }
    }
}

/// 统一的审计错误类型
#[derive(Error, Debug)]
pub enum AuditError {
    /// 计划载荷缺少必需字段或形状错误，单次请求的硬失败
    #[error("计划解析错误: {0}")]
    Parse(String),

    /// 目录中没有对应统计信息行，调用方必须按可恢复错误处理
    #[error("统计信息缺失: {kind} '{name}'")]
    StatisticsUnavailable { kind: StatsKind, name: String },

    /// 目录查询或 EXPLAIN 执行失败，向 analyze 调用方透传，不自动重试
    #[error("数据库错误: {0}")]
    Database(String),

    /// 调用方在遍历期间中止了请求
    #[error("分析已取消")]
    Cancelled,

    #[error("配置错误: {0}")]
    Config(String),
}

impl AuditError {
    /// 构造表统计信息缺失错误
    pub fn table_stats_missing(name: impl Into<String>) -> Self {
        Self::StatisticsUnavailable {
            kind: StatsKind::Table,
            name: name.into(),
        }
    }

    /// 构造索引统计信息缺失错误
    pub fn index_stats_missing(name: impl Into<String>) -> Self {
        Self::StatisticsUnavailable {
            kind: StatsKind::Index,
            name: name.into(),
        }
    }

    /// 该错误是否可由代价模型降级处理
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StatisticsUnavailable { .. })
    }
}

#[cfg(feature = "catalog")]
impl From<sqlx::Error> for AuditError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AuditError::Database("查询未返回行".to_string()),
            other => AuditError::Database(other.to_string()),
        }
    }
}

/// 统一的结果类型
pub type AuditResult<T> = Result<T, AuditError>;
