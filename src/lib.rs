//! planaudit - PostgreSQL 查询计划代价审计库
//!
//! 针对已有的 `EXPLAIN (FORMAT JSON)` / `EXPLAIN (ANALYZE, FORMAT JSON)`
//! 输出，逐算子重算优化器的代价估算，并与计划中报告的估算值
//! （以及 ANALYZE 的实际耗时）对账，生成透明的诊断报告。
//!
//! ## 数据流
//!
//! 原始计划 JSON → [`plan::parse`] → 类型化计划树
//! → [`reconcile::CostReconciler`]（经 [`stats::StatisticsProvider`] 拉取统计信息，
//! 经 [`cost::CostModel`] 重算代价）→ [`reconcile::ReportModel`]
//!
//! 本库是只读的事后审计器：不规划查询、不执行查询、不提出改写建议。

pub mod analyzer;
pub mod config;
pub mod core;
pub mod cost;
pub mod plan;
pub mod reconcile;
pub mod stats;

pub use crate::analyzer::PlanAuditor;
pub use crate::config::{AuditConfig, CostParams};
pub use crate::core::error::{AuditError, AuditResult};
pub use crate::cost::{CostBreakdown, CostModel, CostTerm};
pub use crate::plan::{JoinType, OperatorKind, PlanNode};
pub use crate::reconcile::{CancelFlag, CostReconciler, NodeReport, ReportModel};
pub use crate::stats::{
    ColumnStatistics, IndexStatistics, MemoryStatisticsProvider, StatisticsProvider,
    TableStatistics,
};
