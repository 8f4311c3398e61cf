//! 直播互动积分导入服务
//!
//! 接收运营上传的互动数据表格（.xlsx / .xls / .csv），按配置的
//! 积分规则逐行评估，为用户生成只追加的积分流水，并提供批次与
//! 用户积分的查询 API。规则评估的纯逻辑在 livepoints-rule-engine。

pub mod decoder;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod import;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;
pub mod worker;

pub use error::{ImportError, Result};
pub use import::ImportOrchestrator;
pub use models::{BatchStatus, ImportBatch, ImportSummary, ImportUser, LedgerSource};
