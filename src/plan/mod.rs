//! 计划树模块
//!
//! 将 EXPLAIN (FORMAT JSON) 的原始载荷转换为类型化的算子节点树。

pub mod node;
pub mod parser;

pub use node::{JoinType, OperatorKind, PlanNode};
pub use parser::parse;
