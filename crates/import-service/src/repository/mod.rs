//! 数据访问层
//!
//! 仓储按表划分；事务路径统一提供 `*_in_tx(&mut PgConnection, ..)`
//! 静态方法，由导入编排器和过期 Worker 在同一事务内组合调用。

pub mod batch_repo;
pub mod ledger_repo;
pub mod rule_repo;
pub mod user_repo;

pub use batch_repo::BatchRepository;
pub use ledger_repo::{LedgerRepository, NewLedgerEntry};
pub use rule_repo::RuleRepository;
pub use user_repo::UserRepository;
