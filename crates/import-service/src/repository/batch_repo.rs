//! 导入批次仓储

use sqlx::{PgPool, Row};

use crate::error::{ImportError, Result};
use crate::models::{BatchStatus, ImportBatch, ImportSummary};

/// 导入批次仓储
pub struct BatchRepository {
    pool: PgPool,
}

impl BatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建 processing 状态的批次记录，返回批次 ID
    ///
    /// 批次记录在导入事务之外创建，即使后续处理失败，
    /// 也能留下一条 failed 批次供排查。
    pub async fn create(&self, filename: &str, file_size: i64, total_rows: i32) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO import_batches (filename, file_size, total_rows, status, created_at, updated_at)
            VALUES ($1, $2, $3, 'processing', NOW(), NOW())
            RETURNING id
            "#,
        )
        .bind(filename)
        .bind(file_size)
        .bind(total_rows)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    /// 回填处理结果并置批次为终态
    pub async fn finalize(
        &self,
        batch_id: i64,
        summary: &ImportSummary,
        status: BatchStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE import_batches
            SET success_rows = $2,
                failed_rows = $3,
                new_users = $4,
                existing_users = $5,
                total_points = $6,
                status = $7,
                error_message = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(batch_id)
        .bind(summary.success_rows)
        .bind(summary.failed_rows)
        .bind(summary.new_users)
        .bind(summary.existing_users)
        .bind(summary.total_points)
        .bind(status.as_str())
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 按 ID 查询批次
    pub async fn get(&self, batch_id: i64) -> Result<ImportBatch> {
        let batch = sqlx::query_as::<_, ImportBatch>(
            r#"
            SELECT id, filename, file_size, total_rows, success_rows, failed_rows,
                   new_users, existing_users, total_points, status, error_message,
                   created_at, updated_at
            FROM import_batches
            WHERE id = $1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?;

        batch.ok_or(ImportError::BatchNotFound(batch_id))
    }

    /// 批次总数
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM import_batches")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("total"))
    }

    /// 分页列出批次，最新的在前
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ImportBatch>> {
        let batches = sqlx::query_as::<_, ImportBatch>(
            r#"
            SELECT id, filename, file_size, total_rows, success_rows, failed_rows,
                   new_users, existing_users, total_points, status, error_message,
                   created_at, updated_at
            FROM import_batches
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }
}
