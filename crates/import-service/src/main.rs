//! 积分导入服务入口
//!
//! 提供表格导入、批次查询、用户积分查询的 REST API，
//! 并在后台运行积分过期 Worker。

use std::time::Duration;

use axum::{Json, Router, routing::get};
use livepoints_import_service::{routes, state::AppState, worker::ExpireWorker};
use livepoints_shared::{config::AppConfig, database::Database, observability};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 统一加载配置：config/default.toml + config/{env}.toml + POINTS_ 环境变量
    let config = AppConfig::load("livepoints-import-service").unwrap_or_default();

    observability::init(&config.observability)?;

    info!("Starting livepoints-import-service on {}", config.server_addr());

    let db = Database::connect(&config.database).await?;

    // 启动积分过期后台 Worker
    let expire_worker_pool = db.pool().clone();
    let expire_interval = config.import.expire_poll_interval_seconds;
    let expire_batch = config.import.expire_batch_size;
    tokio::spawn(async move {
        let worker = ExpireWorker::new(expire_worker_pool, expire_interval, expire_batch);
        worker.run().await;
    });

    let state = AppState::new(db.pool().clone(), config.import.clone());

    let app = Router::new()
        .nest("/api/admin", routes::api_routes())
        .route("/health", get(health_check))
        .route(
            "/ready",
            get({
                let db_for_ready = db;
                move || readiness_check(db_for_ready.clone())
            }),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        // 大文件导入同步处理，超时上限要容纳解码加落库
        .layer(TimeoutLayer::new(Duration::from_secs(120)))
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM（K8s 停止 Pod）或 Ctrl+C 时，
    // 停止接收新连接并等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针：服务进程正常即返回 ok
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "livepoints-import-service"
    }))
}

/// 就绪探针：检查数据库连接是否可用
async fn readiness_check(db: Database) -> Json<serde_json::Value> {
    let db_ok = db.health_check().await.is_ok();

    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "service": "livepoints-import-service",
        "checks": {
            "database": if db_ok { "ok" } else { "fail" }
        }
    }))
}
