//! 代价模型分发
//!
//! 按 `OperatorKind` 的一次穷尽 match 把节点路由到对应公式。
//! 新增算子：加一个枚举成员、一条 match 分支、一条公式，调用方不动。
//!
//! 统计信息缺失（可恢复错误）在这里降级：公式改用默认推算并置
//! defaults_used；数据库错误原样上抛给 analyze 的调用方。

use crate::config::CostParams;
use crate::core::error::AuditResult;
use crate::cost::breakdown::CostBreakdown;
use crate::cost::estimators::{
    child_or_empty, DataProcessingEstimator, JoinEstimator, ParallelEstimator, ScanEstimator,
    SortLimitEstimator,
};
use crate::plan::{OperatorKind, PlanNode};
use crate::stats::{IndexStatistics, StatisticsProvider, TableStatistics};

/// 代价模型
#[derive(Debug, Clone)]
pub struct CostModel {
    params: CostParams,
}

impl CostModel {
    pub fn new(params: CostParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CostParams {
        &self.params
    }

    /// 重算单个节点的代价
    ///
    /// `children` 是子节点已算好的结果，外表在前。统计信息按需拉取，
    /// 单个节点的缺失绝不阻塞兄弟节点的计算。
    pub async fn estimate(
        &self,
        node: &PlanNode,
        children: &[CostBreakdown],
        provider: &dyn StatisticsProvider,
    ) -> AuditResult<CostBreakdown> {
        let params = &self.params;

        let breakdown = match node.operator_kind {
            OperatorKind::SeqScan => {
                let table = self.fetch_table(node, provider).await?;
                ScanEstimator::seq_scan(node, table.as_ref(), params)
            }
            OperatorKind::IndexOnlyScan => {
                let table = self.fetch_table(node, provider).await?;
                let index = self.fetch_index(node, provider).await?;
                ScanEstimator::index_only_scan(node, table.as_ref(), index.as_ref(), params)
            }
            OperatorKind::NestedLoop => JoinEstimator::nested_loop(
                node,
                &child_or_empty(children, 0),
                &child_or_empty(children, 1),
                params,
            ),
            OperatorKind::MergeJoin => JoinEstimator::merge_join(
                node,
                &child_or_empty(children, 0),
                &child_or_empty(children, 1),
                params,
            ),
            OperatorKind::HashJoin => JoinEstimator::hash_join(
                node,
                &child_or_empty(children, 0),
                &child_or_empty(children, 1),
                params,
            ),
            OperatorKind::Aggregate => {
                DataProcessingEstimator::aggregate(node, &child_or_empty(children, 0), params)
            }
            OperatorKind::Group => {
                DataProcessingEstimator::group(node, &child_or_empty(children, 0), params)
            }
            OperatorKind::Unique => {
                DataProcessingEstimator::unique(node, &child_or_empty(children, 0), params)
            }
            OperatorKind::Materialize => {
                DataProcessingEstimator::materialize(node, &child_or_empty(children, 0), params)
            }
            OperatorKind::Sort => {
                SortLimitEstimator::sort(node, &child_or_empty(children, 0), params)
            }
            OperatorKind::Limit => {
                SortLimitEstimator::limit(node, &child_or_empty(children, 0))
            }
            OperatorKind::Gather => {
                ParallelEstimator::gather(node, &child_or_empty(children, 0), params)
            }
            OperatorKind::Unsupported => CostBreakdown::unmodeled(node),
        };

        Ok(breakdown.finalize(node))
    }

    /// 拉取表统计信息：缺失降级为 None，数据库错误上抛
    async fn fetch_table(
        &self,
        node: &PlanNode,
        provider: &dyn StatisticsProvider,
    ) -> AuditResult<Option<TableStatistics>> {
        let Some(relation) = &node.relation_name else {
            return Ok(None);
        };
        match provider.table_stats(relation).await {
            Ok(stats) => Ok(Some(stats)),
            Err(err) if err.is_recoverable() => {
                log::warn!("表 {relation} 无统计信息，公式降级为默认推算");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// 拉取索引统计信息：缺失降级为 None，数据库错误上抛
    async fn fetch_index(
        &self,
        node: &PlanNode,
        provider: &dyn StatisticsProvider,
    ) -> AuditResult<Option<IndexStatistics>> {
        let Some(index) = &node.index_name else {
            return Ok(None);
        };
        match provider.index_stats(index).await {
            Ok(stats) => Ok(Some(stats)),
            Err(err) if err.is_recoverable() => {
                log::warn!("索引 {index} 无统计信息，公式降级为默认推算");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::MemoryStatisticsProvider;

    fn seq_scan(relation: &str, rows: u64) -> PlanNode {
        PlanNode {
            operator_kind: OperatorKind::SeqScan,
            node_type: "Seq Scan".into(),
            reported_startup_cost: 0.0,
            reported_total_cost: 150.0,
            estimated_rows: rows,
            estimated_row_width: 8,
            actual_rows: None,
            actual_total_time: None,
            relation_name: Some(relation.into()),
            index_name: None,
            join_type: None,
            sort_keys: vec![],
            group_keys: vec![],
            filter_expression: None,
            workers_planned: None,
            children: vec![],
        }
    }

    fn provider_with_lineitem() -> MemoryStatisticsProvider {
        let mut provider = MemoryStatisticsProvider::new();
        provider.add_table_stats(TableStatistics {
            relation_name: "lineitem".into(),
            row_count: 10000,
            page_count: 50,
            ..Default::default()
        });
        provider
    }

    #[tokio::test]
    async fn test_estimate_is_deterministic() {
        let model = CostModel::new(CostParams::default());
        let provider = provider_with_lineitem();
        let node = seq_scan("lineitem", 10000);

        let a = model.estimate(&node, &[], &provider).await.unwrap();
        let b = model.estimate(&node, &[], &provider).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_missing_stats_degrades_not_fails() {
        let model = CostModel::new(CostParams::default());
        let provider = MemoryStatisticsProvider::new();
        let node = seq_scan("ghost_table", 1000);

        let b = model.estimate(&node, &[], &provider).await.unwrap();
        assert!(b.modeled);
        assert!(b.defaults_used);
        assert!(b.total_cost > 0.0);
    }

    #[tokio::test]
    async fn test_unsupported_copies_reported() {
        let model = CostModel::new(CostParams::default());
        let provider = MemoryStatisticsProvider::new();
        let mut node = seq_scan("lineitem", 100);
        node.operator_kind = OperatorKind::Unsupported;
        node.node_type = "Bitmap Heap Scan".into();
        node.reported_total_cost = 77.7;

        let b = model.estimate(&node, &[], &provider).await.unwrap();
        assert!(!b.modeled);
        assert_eq!(b.total_cost, 77.7);
        assert!(b.terms.is_empty());
        assert_eq!(b.delta, 0.0);
    }
}
