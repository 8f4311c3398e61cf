//! 用户积分查询 API 处理器

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;
use validator::Validate;

use crate::{
    dto::{ApiResponse, LedgerEntryDto, PageResponse, PaginationParams, UserPointsDto},
    error::Result,
    repository::{LedgerRepository, UserRepository},
    state::AppState,
};

/// 获取用户当前积分
///
/// GET /api/admin/users/:user_id/points
#[instrument(skip(state))]
pub async fn get_user_points(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserPointsDto>>> {
    let repo = UserRepository::new(state.pool.clone());
    let user = repo.get_by_user_id(&user_id).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// 获取用户积分流水（分页，最新的在前）
///
/// GET /api/admin/users/:user_id/ledger
#[instrument(skip(state))]
pub async fn get_user_ledger(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<LedgerEntryDto>>>> {
    pagination.validate()?;

    // 用户不存在返回 404 而不是空列表
    let user_repo = UserRepository::new(state.pool.clone());
    user_repo.get_by_user_id(&user_id).await?;

    let ledger_repo = LedgerRepository::new(state.pool.clone());
    let total = ledger_repo.count_by_user(&user_id).await?;
    if total == 0 {
        return Ok(Json(ApiResponse::success(PageResponse::empty(
            pagination.page,
            pagination.page_size,
        ))));
    }

    let entries = ledger_repo
        .list_by_user(&user_id, pagination.limit(), pagination.offset())
        .await?;
    let items: Vec<LedgerEntryDto> = entries.into_iter().map(Into::into).collect();

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page,
        pagination.page_size,
    ))))
}
