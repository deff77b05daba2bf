//! 代价模型模块
//!
//! 按算子类别分发的代价重算公式集合。每个公式消费节点参数、
//! 子节点的重算结果与统计信息，产出（启动代价，总代价，估算行数）
//! 三元组及其命名子项分解。

pub mod breakdown;
pub mod estimators;
pub mod model;
pub mod selectivity;

pub use breakdown::{CostBreakdown, CostTerm};
pub use model::CostModel;
