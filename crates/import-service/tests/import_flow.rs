//! 导入全流程集成测试
//!
//! 覆盖「解码 → 规则评估 → 事务落库 → 查询」的端到端场景，
//! 需要可用的 PostgreSQL 实例（见 shared::config::DatabaseConfig 默认值）。

use livepoints_import_service::decoder::FileDecoder;
use livepoints_import_service::models::BatchStatus;
use livepoints_import_service::repository::{BatchRepository, LedgerRepository, UserRepository};
use livepoints_import_service::{ImportOrchestrator, ImportSummary};
use livepoints_shared::config::DatabaseConfig;
use livepoints_shared::database::Database;
use sqlx::PgPool;

async fn setup() -> PgPool {
    let db = Database::connect(&DatabaseConfig::default())
        .await
        .expect("连接测试数据库失败");
    sqlx::migrate!("./migrations")
        .run(db.pool())
        .await
        .expect("执行迁移失败");
    db.pool().clone()
}

/// 插入一条观看时长 >= 30 分钟发 10 分的规则
async fn insert_watch_rule(pool: &PgPool) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO point_rules
            (name, column_name, condition_type, condition_value, points, priority, enabled)
        VALUES ('观看时长达标', '直播观看时长', 'greater_or_equal', '30', 10, 10, TRUE)
        RETURNING id
        "#,
    )
    .fetch_one(pool)
    .await
    .expect("插入规则失败")
}

async fn cleanup(pool: &PgPool, rule_id: i64, user_ids: &[&str]) {
    for user_id in user_ids {
        sqlx::query("DELETE FROM point_ledger WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await
            .ok();
        sqlx::query("DELETE FROM import_users WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await
            .ok();
    }
    sqlx::query("DELETE FROM point_rules WHERE id = $1")
        .bind(rule_id)
        .execute(pool)
        .await
        .ok();
}

/// 两行场景：U1 观看 45 分钟命中规则得 10 分，U2 观看 10 分钟不命中，
/// 两行都算成功，批次汇总与流水账一致。
#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_two_row_import_scenario() {
    let pool = setup().await;
    let rule_id = insert_watch_rule(&pool).await;

    let csv = "用户ID,直播观看时长\nIT-U1,45分钟\nIT-U2,10分钟\n";
    let rows = FileDecoder::decode("engagement.csv", csv.as_bytes()).unwrap();
    assert_eq!(rows.len(), 2);

    let batch_repo = BatchRepository::new(pool.clone());
    let batch_id = batch_repo.create("engagement.csv", csv.len() as i64, 2).await.unwrap();

    let orchestrator = ImportOrchestrator::new(pool.clone());
    let summary = orchestrator.run(&rows, batch_id).await.unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            success_rows: 2,
            failed_rows: 0,
            new_users: 2,
            existing_users: 0,
            total_points: 10,
        }
    );

    batch_repo
        .finalize(batch_id, &summary, BatchStatus::Completed, None)
        .await
        .unwrap();
    let batch = batch_repo.get(batch_id).await.unwrap();
    assert_eq!(batch.status, "completed");
    assert_eq!(batch.total_points, 10);

    // U1 有一条命中流水，balance_after = 10；U2 成功但零流水
    let user_repo = UserRepository::new(pool.clone());
    let u1 = user_repo.get_by_user_id("IT-U1").await.unwrap();
    assert_eq!(u1.available_points, 10);
    assert!(u1.is_new_user);

    let u2 = user_repo.get_by_user_id("IT-U2").await.unwrap();
    assert_eq!(u2.available_points, 0);

    let ledger_repo = LedgerRepository::new(pool.clone());
    let u1_entries = ledger_repo.list_by_user("IT-U1", 10, 0).await.unwrap();
    assert_eq!(u1_entries.len(), 1);
    assert_eq!(u1_entries[0].points, 10);
    assert_eq!(u1_entries[0].balance_after, 10);
    assert_eq!(u1_entries[0].batch_id, Some(batch_id));
    assert_eq!(u1_entries[0].rule_id, Some(rule_id));

    assert_eq!(ledger_repo.count_by_user("IT-U2").await.unwrap(), 0);

    cleanup(&pool, rule_id, &["IT-U1", "IT-U2"]).await;
}

/// 文件内重复用户：首行生效，重复行计为失败，不产生第二条流水。
#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_duplicate_user_first_occurrence_wins() {
    let pool = setup().await;
    let rule_id = insert_watch_rule(&pool).await;

    let csv = "用户ID,直播观看时长\nIT-DUP,45分钟\nIT-DUP,120分钟\n";
    let rows = FileDecoder::decode("dup.csv", csv.as_bytes()).unwrap();

    let batch_repo = BatchRepository::new(pool.clone());
    let batch_id = batch_repo.create("dup.csv", csv.len() as i64, 2).await.unwrap();

    let orchestrator = ImportOrchestrator::new(pool.clone());
    let summary = orchestrator.run(&rows, batch_id).await.unwrap();

    assert_eq!(summary.success_rows, 1);
    assert_eq!(summary.failed_rows, 1);
    assert_eq!(summary.total_points, 10);

    let ledger_repo = LedgerRepository::new(pool.clone());
    assert_eq!(ledger_repo.count_by_user("IT-DUP").await.unwrap(), 1);

    cleanup(&pool, rule_id, &["IT-DUP"]).await;
}

/// 老用户再次导入：不重复创建，is_new_user 清除，余额在原有基础上递推。
#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_existing_user_balance_accumulates() {
    let pool = setup().await;
    let rule_id = insert_watch_rule(&pool).await;

    let csv = "用户ID,直播观看时长\nIT-OLD,45分钟\n";
    let rows = FileDecoder::decode("first.csv", csv.as_bytes()).unwrap();

    let batch_repo = BatchRepository::new(pool.clone());
    let orchestrator = ImportOrchestrator::new(pool.clone());

    let batch1 = batch_repo.create("first.csv", csv.len() as i64, 1).await.unwrap();
    orchestrator.run(&rows, batch1).await.unwrap();

    let batch2 = batch_repo.create("second.csv", csv.len() as i64, 1).await.unwrap();
    let summary = orchestrator.run(&rows, batch2).await.unwrap();

    assert_eq!(summary.new_users, 0);
    assert_eq!(summary.existing_users, 1);

    let user_repo = UserRepository::new(pool.clone());
    let user = user_repo.get_by_user_id("IT-OLD").await.unwrap();
    assert_eq!(user.available_points, 20);
    assert!(!user.is_new_user);

    // 两条流水的 balance_after 顺序递推
    let ledger_repo = LedgerRepository::new(pool.clone());
    let entries = ledger_repo.list_by_user("IT-OLD", 10, 0).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].balance_after, 20);
    assert_eq!(entries[1].balance_after, 10);

    cleanup(&pool, rule_id, &["IT-OLD"]).await;
}
