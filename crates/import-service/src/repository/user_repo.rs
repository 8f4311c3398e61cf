//! 导入用户仓储

use std::collections::HashSet;

use sqlx::{PgConnection, PgPool, Row};

use crate::error::{ImportError, Result};
use crate::models::ImportUser;

/// 导入用户仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按业务 ID 查询用户
    pub async fn get_by_user_id(&self, user_id: &str) -> Result<ImportUser> {
        let user = sqlx::query_as::<_, ImportUser>(
            r#"
            SELECT id, user_id, name, total_points, available_points, used_points,
                   expired_points, is_new_user, first_seen_at, last_active_at
            FROM import_users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| ImportError::UserNotFound(user_id.to_string()))
    }

    /// 在事务中加载全部已知用户 ID 的快照
    ///
    /// 批次开始时取一次，用于区分新老用户，批次内不再查库。
    pub async fn load_known_ids_in_tx(tx: &mut PgConnection) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT user_id FROM import_users")
            .fetch_all(tx)
            .await?;

        Ok(rows.iter().map(|row| row.get("user_id")).collect())
    }

    /// 在事务中创建新用户
    pub async fn create_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        name: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO import_users (user_id, name, is_new_user, first_seen_at, last_active_at)
            VALUES ($1, $2, TRUE, NOW(), NOW())
            "#,
        )
        .bind(user_id)
        .bind(name)
        .execute(tx)
        .await?;

        Ok(())
    }

    /// 在事务中刷新老用户的活跃时间并清除新用户标记
    pub async fn touch_in_tx(tx: &mut PgConnection, user_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE import_users
            SET last_active_at = NOW(), is_new_user = FALSE
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(tx)
        .await?;

        Ok(())
    }

    /// 在事务中读取用户当前可用积分（流水 balance_after 的基线）
    pub async fn get_available_points_in_tx(tx: &mut PgConnection, user_id: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(
                (SELECT available_points FROM import_users WHERE user_id = $1),
                0
            ) AS balance
            "#,
        )
        .bind(user_id)
        .fetch_one(tx)
        .await?;

        Ok(row.get("balance"))
    }

    /// 在事务中应用积分变动
    ///
    /// available_points 随变动增减；total_points 只累计正向发放。
    pub async fn apply_points_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        delta: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE import_users
            SET available_points = available_points + $2,
                total_points = total_points + GREATEST($2, 0)
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .execute(tx)
        .await?;

        Ok(())
    }

    /// 在事务中把过期积分从可用额度移入过期额度
    pub async fn move_to_expired_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        amount: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE import_users
            SET available_points = available_points - $2,
                expired_points = expired_points + $2
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(tx)
        .await?;

        Ok(())
    }
}
