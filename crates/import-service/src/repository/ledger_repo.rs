//! 积分流水仓储
//!
//! 流水只追加不修改，balance_after 在写入时按顺序递推，
//! 之后任何读取都不重算历史。

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Row};

use crate::error::Result;
use crate::models::{LedgerSource, PointLedgerEntry};

/// 待写入的流水记录
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub user_id: String,
    pub points: i64,
    pub balance_after: i64,
    pub source: LedgerSource,
    pub rule_id: Option<i64>,
    pub expire_date: Option<DateTime<Utc>>,
    pub batch_id: Option<i64>,
    pub description: Option<String>,
}

/// 积分流水仓储
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中追加流水记录，返回新记录 ID
    pub async fn create_in_tx(tx: &mut PgConnection, entry: &NewLedgerEntry) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO point_ledger
                (user_id, points, balance_after, source, rule_id, expire_date, batch_id, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING id
            "#,
        )
        .bind(&entry.user_id)
        .bind(entry.points)
        .bind(entry.balance_after)
        .bind(entry.source.as_str())
        .bind(entry.rule_id)
        .bind(entry.expire_date)
        .bind(entry.batch_id)
        .bind(&entry.description)
        .fetch_one(tx)
        .await?;

        Ok(row.get("id"))
    }

    /// 统计用户的流水条数
    pub async fn count_by_user(&self, user_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM point_ledger WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("total"))
    }

    /// 分页列出用户的流水，按时间倒序
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PointLedgerEntry>> {
        let entries = sqlx::query_as::<_, PointLedgerEntry>(
            r#"
            SELECT id, user_id, points, balance_after, source, rule_id,
                   expire_date, batch_id, expired, description, created_at
            FROM point_ledger
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// 在事务中读取用户最近一条流水的 balance_after 快照
    ///
    /// 过期 Worker 用它作为扣减流水的基线；无流水返回 0。
    pub async fn get_last_balance_in_tx(tx: &mut PgConnection, user_id: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(
                (SELECT balance_after
                 FROM point_ledger
                 WHERE user_id = $1
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1),
                0
            ) AS balance
            "#,
        )
        .bind(user_id)
        .fetch_one(tx)
        .await?;

        Ok(row.get("balance"))
    }
}
