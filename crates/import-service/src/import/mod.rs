//! 导入编排
//!
//! 把解码后的行数据转换为用户与积分流水的写入。行的评估计划
//! （plan_row）是纯函数，事务写入由 [`orchestrator::ImportOrchestrator`]
//! 统一执行。

pub mod orchestrator;

pub use orchestrator::ImportOrchestrator;
