//! 配置模块
//!
//! 代价模型常量与分析选项，参考 PostgreSQL 的代价参数设计。
//! 常量既可走默认值，也可从 toml 文件加载，或连库读取
//! `current_setting(...)` 得到目标实例的真实配置。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{AuditError, AuditResult};

/// 代价模型常量
///
/// 五个规划器常量与 PostgreSQL 同名参数一一对应，默认值也相同。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CostParams {
    /// 顺序页读取代价，对应 seq_page_cost
    pub seq_page_cost: f64,

    /// 随机页读取代价，对应 random_page_cost
    /// 通常高于顺序页代价，因为随机 I/O 需要更多寻道时间
    pub random_page_cost: f64,

    /// 处理每行数据的 CPU 代价，对应 cpu_tuple_cost
    pub cpu_tuple_cost: f64,

    /// 执行每个操作符的 CPU 代价，对应 cpu_operator_cost
    pub cpu_operator_cost: f64,

    /// 处理每个索引项的 CPU 代价，对应 cpu_index_tuple_cost
    pub cpu_index_tuple_cost: f64,

    /// 并行查询的启动开销，对应 parallel_setup_cost
    pub parallel_setup_cost: f64,

    /// 排序/哈希的工作内存预算（字节），超出则落盘
    pub work_mem_bytes: u64,

    /// 页大小（字节）
    pub page_size: u64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            seq_page_cost: 1.0,
            random_page_cost: 4.0,
            cpu_tuple_cost: 0.01,
            cpu_operator_cost: 0.0025,
            cpu_index_tuple_cost: 0.005,
            parallel_setup_cost: 1000.0,
            work_mem_bytes: 4 * 1024 * 1024, // 4MB，PostgreSQL 默认 work_mem
            page_size: 8192,
        }
    }
}

impl CostParams {
    /// 工作内存折算为页数，至少 1 页
    pub fn work_mem_pages(&self) -> u64 {
        (self.work_mem_bytes / self.page_size).max(1)
    }

    /// 从目标实例读取五个规划器常量，其余字段保持默认
    ///
    /// 对应原始目录查询 `current_setting('seq_page_cost')::real` 等。
    #[cfg(feature = "catalog")]
    pub async fn fetch(conn: &mut sqlx::PgConnection) -> AuditResult<Self> {
        use sqlx::Row;

        let row = sqlx::query(
            "SELECT current_setting('seq_page_cost')::float8, \
                    current_setting('random_page_cost')::float8, \
                    current_setting('cpu_tuple_cost')::float8, \
                    current_setting('cpu_operator_cost')::float8, \
                    current_setting('cpu_index_tuple_cost')::float8, \
                    current_setting('parallel_setup_cost')::float8",
        )
        .fetch_one(&mut *conn)
        .await?;

        Ok(Self {
            seq_page_cost: row.try_get(0)?,
            random_page_cost: row.try_get(1)?,
            cpu_tuple_cost: row.try_get(2)?,
            cpu_operator_cost: row.try_get(3)?,
            cpu_index_tuple_cost: row.try_get(4)?,
            parallel_setup_cost: row.try_get(5)?,
            ..Default::default()
        })
    }
}

/// 分析选项
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// 代价模型常量
    pub cost: CostParams,

    /// true 时执行 EXPLAIN (ANALYZE true, FORMAT json)，报告携带实际行数与耗时
    pub use_analyze: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            cost: CostParams::default(),
            use_analyze: false,
        }
    }
}

impl AuditConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> AuditResult<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| AuditError::Config(e.to_string()))?;
        toml::from_str(&content).map_err(|e| AuditError::Config(e.to_string()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> AuditResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| AuditError::Config(e.to_string()))?;
        fs::write(path, content).map_err(|e| AuditError::Config(e.to_string()))
    }
}
