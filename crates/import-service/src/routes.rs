//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers, state::AppState};

/// 构建管理端 API 路由（挂载在 /api/admin 下）
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 导入
        .route("/imports", post(handlers::import::upload_import))
        .route("/imports", get(handlers::import::list_batches))
        .route("/imports/{id}", get(handlers::import::get_batch))
        // 用户积分查询
        .route(
            "/users/{user_id}/points",
            get(handlers::user_view::get_user_points),
        )
        .route(
            "/users/{user_id}/ledger",
            get(handlers::user_view::get_user_ledger),
        )
}
