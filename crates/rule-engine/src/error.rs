//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则解析失败: {0}")]
    ParseError(String),

    #[error("区间条件无效: {0}")]
    InvalidRange(String),
}

pub type Result<T> = std::result::Result<T, RuleError>;
