//! 代价对账模块
//!
//! 对计划树做一次后序遍历（先子后父：父公式消费子节点的重算结果），
//! 每个节点恰好访问一次，无重试。节点间检查取消信号，
//! 取消后干净退出，绝不把半成品报告交给调用方。

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::error::{AuditError, AuditResult};
use crate::cost::CostModel;
use crate::plan::PlanNode;
use crate::stats::StatisticsProvider;

pub mod report;

pub use report::{NodeReport, ReportModel};

/// 取消信号
///
/// 克隆共享同一底层标志：调用方持一份用于 `cancel()`，
/// 对账器持一份在节点间轮询。
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// 代价对账器
pub struct CostReconciler {
    model: CostModel,
    cancel: CancelFlag,
}

impl CostReconciler {
    pub fn new(model: CostModel) -> Self {
        Self {
            model,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(model: CostModel, cancel: CancelFlag) -> Self {
        Self { model, cancel }
    }

    /// 对整棵计划树做一次对账，产出只读报告
    pub async fn reconcile(
        &self,
        root: &PlanNode,
        provider: &dyn StatisticsProvider,
    ) -> AuditResult<ReportModel> {
        let report = self.visit(root, provider).await?;
        Ok(ReportModel::new(report))
    }

    /// 后序访问单个节点
    ///
    /// 递归的 async 函数需要装箱 Future；树深即递归深（计划树深度
    /// 实际上限很小）。
    fn visit<'a>(
        &'a self,
        node: &'a PlanNode,
        provider: &'a dyn StatisticsProvider,
    ) -> Pin<Box<dyn Future<Output = AuditResult<NodeReport>> + Send + 'a>> {
        Box::pin(async move {
            if self.cancel.is_cancelled() {
                return Err(AuditError::Cancelled);
            }

            let mut child_reports = Vec::with_capacity(node.children.len());
            for child in &node.children {
                child_reports.push(self.visit(child, provider).await?);
            }

            let child_breakdowns: Vec<_> = child_reports
                .iter()
                .map(|r| r.breakdown.clone())
                .collect();
            let breakdown = self
                .model
                .estimate(node, &child_breakdowns, provider)
                .await?;

            // 一致性检查：重算结果必须有限且非负
            if !breakdown.is_consistent() {
                log::warn!(
                    "节点 {} 的重算结果不自洽: startup={} total={}",
                    node.node_type,
                    breakdown.startup_cost,
                    breakdown.total_cost
                );
            }
            debug_assert!(breakdown.is_consistent());

            Ok(NodeReport::new(node, breakdown, child_reports))
        })
    }
}
