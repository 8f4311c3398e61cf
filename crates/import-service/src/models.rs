//! 导入服务领域模型
//!
//! 用户、积分流水、导入批次的数据库映射结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 流水来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerSource {
    /// 表格导入发放
    Import,
    /// 兑换扣减
    Exchange,
    /// 人工调整
    Manual,
    /// 到期自动过期
    Expire,
}

impl LedgerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Exchange => "exchange",
            Self::Manual => "manual",
            Self::Expire => "expire",
        }
    }
}

/// 批次状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Processing,
    Completed,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// 导入用户
///
/// user_id 是外部系统的业务自然键。首次出现时创建并标记
/// is_new_user，之后每次导入只刷新 last_active_at 并清除新用户标记。
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ImportUser {
    pub id: i64,
    pub user_id: String,
    pub name: Option<String>,
    pub total_points: i64,
    pub available_points: i64,
    pub used_points: i64,
    pub expired_points: i64,
    pub is_new_user: bool,
    pub first_seen_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

/// 积分流水记录
///
/// 只追加不修改。balance_after 是写入时点的余额快照，
/// 按写入顺序递推，之后不再重算。
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PointLedgerEntry {
    pub id: i64,
    pub user_id: String,
    /// 变动积分，负数表示扣减
    pub points: i64,
    pub balance_after: i64,
    pub source: String,
    pub rule_id: Option<i64>,
    pub expire_date: Option<DateTime<Utc>>,
    pub batch_id: Option<i64>,
    pub expired: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 导入批次
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ImportBatch {
    pub id: i64,
    pub filename: String,
    pub file_size: i64,
    pub total_rows: i32,
    pub success_rows: i32,
    pub failed_rows: i32,
    pub new_users: i32,
    pub existing_users: i32,
    pub total_points: i64,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 批次处理结果汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub success_rows: i32,
    pub failed_rows: i32,
    pub new_users: i32,
    pub existing_users: i32,
    pub total_points: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_source_as_str() {
        assert_eq!(LedgerSource::Import.as_str(), "import");
        assert_eq!(LedgerSource::Exchange.as_str(), "exchange");
        assert_eq!(LedgerSource::Manual.as_str(), "manual");
        assert_eq!(LedgerSource::Expire.as_str(), "expire");
    }

    #[test]
    fn test_batch_status_as_str() {
        assert_eq!(BatchStatus::Processing.as_str(), "processing");
        assert_eq!(BatchStatus::Completed.as_str(), "completed");
        assert_eq!(BatchStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_import_summary_default_is_zeroed() {
        let summary = ImportSummary::default();
        assert_eq!(summary.success_rows, 0);
        assert_eq!(summary.failed_rows, 0);
        assert_eq!(summary.total_points, 0);
    }
}
