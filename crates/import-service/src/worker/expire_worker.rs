//! 积分过期处理 Worker
//!
//! 定期扫描已到期的导入积分流水，逐条：标记过期、追加一条
//! source = 'expire' 的负向冲销流水、把额度从可用积分移入过期积分。
//!
//! 使用 `FOR UPDATE SKIP LOCKED` 保证多实例部署时不会重复处理。

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info};

use crate::models::LedgerSource;
use crate::repository::{LedgerRepository, NewLedgerEntry, UserRepository};

/// 过期处理 Worker
///
/// 以固定间隔轮询数据库，处理到期的积分流水。
/// 设计为可在多实例环境中安全运行。
pub struct ExpireWorker {
    pool: PgPool,
    /// 轮询间隔（建议 300 秒）
    poll_interval: Duration,
    /// 每批处理的最大流水条数
    batch_size: i64,
}

/// 已到期的积分流水
#[derive(sqlx::FromRow)]
struct ExpiredEntry {
    id: i64,
    user_id: String,
    points: i64,
    expire_date: DateTime<Utc>,
}

impl ExpireWorker {
    /// 创建 ExpireWorker 实例
    pub fn new(pool: PgPool, poll_interval_secs: u64, batch_size: i64) -> Self {
        Self {
            pool,
            poll_interval: Duration::from_secs(poll_interval_secs),
            batch_size,
        }
    }

    /// 使用默认配置创建 ExpireWorker
    pub fn with_defaults(pool: PgPool) -> Self {
        Self::new(pool, 300, 1000)
    }

    /// 主循环：持续处理过期积分直到进程退出
    pub async fn run(&self) {
        info!(
            poll_interval = ?self.poll_interval,
            batch_size = self.batch_size,
            "ExpireWorker 已启动"
        );

        loop {
            if let Err(e) = self.process_expired_entries().await {
                error!(error = %e, "处理过期积分出错");
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// 处理已到期的积分流水
    ///
    /// 整批在一个事务内完成；冲销流水的 balance_after 以
    /// 用户最近一条流水的快照为基线顺序递推。
    async fn process_expired_entries(&self) -> Result<(), crate::error::ImportError> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let entries = sqlx::query_as::<_, ExpiredEntry>(
            r#"
            SELECT id, user_id, points, expire_date
            FROM point_ledger
            WHERE source = 'import'
              AND expired = FALSE
              AND points > 0
              AND expire_date IS NOT NULL
              AND expire_date <= $1
            ORDER BY expire_date ASC
            FOR UPDATE SKIP LOCKED
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(self.batch_size)
        .fetch_all(&mut *tx)
        .await?;

        if entries.is_empty() {
            tx.rollback().await?;
            return Ok(());
        }

        let count = entries.len();
        info!(count, "发现已到期的积分流水，准备处理");

        for entry in &entries {
            // 标记原流水已过期
            sqlx::query("UPDATE point_ledger SET expired = TRUE WHERE id = $1")
                .bind(entry.id)
                .execute(&mut *tx)
                .await?;

            // 追加负向冲销流水。余额口径以 balance_after 链和
            // import_users.available_points 为准：原流水置 expired 后
            // 又写入负向冲销，对全部流水的 points 直接求和会把这笔
            // 过期扣两次，读取方不能用全量求和还原余额。
            let balance =
                LedgerRepository::get_last_balance_in_tx(&mut tx, &entry.user_id).await?;
            let offset = NewLedgerEntry {
                user_id: entry.user_id.clone(),
                points: -entry.points,
                balance_after: balance - entry.points,
                source: LedgerSource::Expire,
                rule_id: None,
                expire_date: None,
                batch_id: None,
                description: Some(format!(
                    "积分到期冲销（原流水 #{}，到期时间 {}）",
                    entry.id,
                    entry.expire_date.to_rfc3339()
                )),
            };
            LedgerRepository::create_in_tx(&mut tx, &offset).await?;

            // 额度从可用积分移入过期积分
            UserRepository::move_to_expired_in_tx(&mut tx, &entry.user_id, entry.points).await?;

            info!(
                ledger_id = entry.id,
                user_id = %entry.user_id,
                points = entry.points,
                "积分过期处理完成"
            );
        }

        tx.commit().await?;

        info!(count, "过期积分批次处理完成");
        Ok(())
    }
}
