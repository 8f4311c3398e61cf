//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use livepoints_shared::config::ImportConfig;
use sqlx::PgPool;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL 连接池
    pub pool: PgPool,
    /// 导入相关配置（上传大小上限等）
    pub import_config: ImportConfig,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(pool: PgPool, import_config: ImportConfig) -> Self {
        Self {
            pool,
            import_config,
        }
    }
}
