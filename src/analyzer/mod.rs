//! 分析入口
//!
//! `PlanAuditor` 是暴露给（范围之外的）会话/UI 层的唯一入口：
//! 拿调用方已建立好的连接执行 EXPLAIN，解析，对账，交回只读报告。
//! 连接的创建、凭据与重试都是会话层的职责，这里只借用、绝不保存。

use serde_json::Value;

use crate::config::AuditConfig;
use crate::core::error::AuditResult;
use crate::cost::CostModel;
use crate::plan;
use crate::reconcile::{CancelFlag, CostReconciler, ReportModel};
use crate::stats::StatisticsProvider;

/// 计划审计器
///
/// 无状态（只持配置），同一实例可被多个请求并发使用，
/// 每个请求有自己的计划树与统计信息缓存。
#[derive(Debug, Clone, Default)]
pub struct PlanAuditor {
    config: AuditConfig,
}

impl PlanAuditor {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// 对已有的 EXPLAIN JSON 载荷做离线分析
    pub async fn analyze_payload(
        &self,
        payload: &Value,
        provider: &dyn StatisticsProvider,
    ) -> AuditResult<ReportModel> {
        self.analyze_payload_with_cancel(payload, provider, CancelFlag::new())
            .await
    }

    /// 带取消信号的离线分析
    pub async fn analyze_payload_with_cancel(
        &self,
        payload: &Value,
        provider: &dyn StatisticsProvider,
        cancel: CancelFlag,
    ) -> AuditResult<ReportModel> {
        let root = plan::parse(payload)?;
        log::info!("计划解析完成: {} 个节点", root.node_count());

        let model = CostModel::new(self.config.cost);
        let reconciler = CostReconciler::with_cancel(model, cancel);
        let report = reconciler.reconcile(&root, provider).await?;
        log::info!(
            "对账完成: {}/{} 节点已建模, {} 节点使用默认常量",
            report.modeled_count(),
            report.node_count(),
            report.defaulted_count()
        );
        Ok(report)
    }

    /// 对一条 SQL 做在线分析：执行 EXPLAIN，统计信息走目录查询
    ///
    /// 统计信息缓存的生命周期与本次调用绑定；重连或重跑必须重新取数。
    #[cfg(feature = "catalog")]
    pub async fn analyze(
        &self,
        conn: &mut sqlx::PgConnection,
        sql: &str,
    ) -> AuditResult<ReportModel> {
        self.analyze_with_cancel(conn, sql, CancelFlag::new()).await
    }

    /// 带取消信号的在线分析
    #[cfg(feature = "catalog")]
    pub async fn analyze_with_cancel(
        &self,
        conn: &mut sqlx::PgConnection,
        sql: &str,
        cancel: CancelFlag,
    ) -> AuditResult<ReportModel> {
        use crate::stats::{CachingStatisticsProvider, CatalogStatisticsProvider};

        let payload = self.run_explain(conn, sql).await?;
        let provider = CachingStatisticsProvider::new(CatalogStatisticsProvider::new(conn));
        self.analyze_payload_with_cancel(&payload, &provider, cancel)
            .await
    }

    /// 执行 EXPLAIN (FORMAT JSON) 并取回载荷
    #[cfg(feature = "catalog")]
    async fn run_explain(
        &self,
        conn: &mut sqlx::PgConnection,
        sql: &str,
    ) -> AuditResult<Value> {
        use sqlx::Row;

        let statement = if self.config.use_analyze {
            format!("EXPLAIN (ANALYZE true, FORMAT json) {sql}")
        } else {
            format!("EXPLAIN (FORMAT json) {sql}")
        };
        let row = sqlx::query(&statement).fetch_one(&mut *conn).await?;
        let payload: Value = row.try_get(0)?;
        log::info!("EXPLAIN 执行完成");
        Ok(payload)
    }
}
