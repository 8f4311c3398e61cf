//! 积分规则引擎
//!
//! 导入核心的纯计算部分：列名解析、时长解析和规则条件评估。
//! 不依赖数据库和 I/O，所有函数均为输入的纯函数，便于独立测试。

pub mod columns;
pub mod duration;
pub mod error;
pub mod evaluator;
pub mod models;

pub use columns::{ColumnResolver, Row, normalize_header};
pub use duration::parse_duration_minutes;
pub use error::{Result, RuleError};
pub use evaluator::RuleEvaluator;
pub use models::{ConditionType, PointRule};
