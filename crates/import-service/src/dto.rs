//! REST API 请求与响应 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{ImportBatch, ImportSummary, ImportUser, PointLedgerEntry};

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

/// 分页响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> PageResponse<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };

        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }

    pub fn empty(page: i64, page_size: i64) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            page_size,
            total_pages: 0,
        }
    }
}

/// 分页参数
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page 必须 >= 1"))]
    pub page: i64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "pageSize 取值范围 1-100"))]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    /// 计算数据库查询的 offset
    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0) * self.page_size
    }

    /// 获取限制条数（最大100）
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }
}

/// 导入结果响应 DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResultDto {
    pub batch_id: i64,
    pub total_rows: i32,
    pub success_rows: i32,
    pub failed_rows: i32,
    pub new_users: i32,
    pub existing_users: i32,
    pub total_points: i64,
}

impl ImportResultDto {
    pub fn from_summary(batch_id: i64, total_rows: i32, summary: &ImportSummary) -> Self {
        Self {
            batch_id,
            total_rows,
            success_rows: summary.success_rows,
            failed_rows: summary.failed_rows,
            new_users: summary.new_users,
            existing_users: summary.existing_users,
            total_points: summary.total_points,
        }
    }
}

/// 导入批次响应 DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatchDto {
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

impl From<ImportBatch> for ImportBatchDto {
    fn from(batch: ImportBatch) -> Self {
        Self {
            id: batch.id,
            filename: batch.filename,
            file_size: batch.file_size,
            total_rows: batch.total_rows,
            success_rows: batch.success_rows,
            failed_rows: batch.failed_rows,
            new_users: batch.new_users,
            existing_users: batch.existing_users,
            total_points: batch.total_points,
            status: batch.status,
            error_message: batch.error_message,
            created_at: batch.created_at,
            updated_at: batch.updated_at,
        }
    }
}

/// 用户积分视图 DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPointsDto {
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

impl From<ImportUser> for UserPointsDto {
    fn from(user: ImportUser) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            total_points: user.total_points,
            available_points: user.available_points,
            used_points: user.used_points,
            expired_points: user.expired_points,
            is_new_user: user.is_new_user,
            first_seen_at: user.first_seen_at,
            last_active_at: user.last_active_at,
        }
    }
}

/// 积分流水响应 DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryDto {
    pub id: i64,
    pub user_id: String,
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

impl From<PointLedgerEntry> for LedgerEntryDto {
    fn from(entry: PointLedgerEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            points: entry.points,
            balance_after: entry.balance_after,
            source: entry.source,
            rule_id: entry.rule_id,
            expire_date: entry.expire_date,
            batch_id: entry.batch_id,
            expired: entry.expired,
            description: entry.description,
            created_at: entry.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_response_total_pages_calculation() {
        let response = PageResponse::<i32>::new(vec![], 100, 1, 10);
        assert_eq!(response.total_pages, 10);

        let response = PageResponse::<i32>::new(vec![], 101, 1, 10);
        assert_eq!(response.total_pages, 11);

        let response = PageResponse::<i32>::empty(1, 10);
        assert_eq!(response.total_pages, 0);
    }

    #[test]
    fn test_pagination_params_validation() {
        assert!(PaginationParams::default().validate().is_ok());

        let params = PaginationParams {
            page: 0,
            page_size: 20,
        };
        assert!(params.validate().is_err());

        let params = PaginationParams {
            page: 1,
            page_size: 101,
        };
        let errors = params.validate().unwrap_err();
        // 校验错误进入统一错误类型后按参数错误返回
        let err = crate::error::ImportError::from(errors);
        assert!(matches!(err, crate::error::ImportError::Validation(_)));
    }

    #[test]
    fn test_pagination_params_offset_and_limit() {
        let params = PaginationParams {
            page: 3,
            page_size: 20,
        };
        assert_eq!(params.offset(), 40);
        assert_eq!(params.limit(), 20);

        // page_size 超限被钳制
        let params = PaginationParams {
            page: 1,
            page_size: 5000,
        };
        assert_eq!(params.limit(), 100);
    }

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("data");
        assert!(response.success);
        assert_eq!(response.code, "SUCCESS");
        assert_eq!(response.data, Some("data"));
    }

    #[test]
    fn test_import_result_from_summary() {
        let summary = ImportSummary {
            success_rows: 2,
            failed_rows: 1,
            new_users: 1,
            existing_users: 1,
            total_points: 15,
        };
        let dto = ImportResultDto::from_summary(7, 3, &summary);
        assert_eq!(dto.batch_id, 7);
        assert_eq!(dto.total_rows, 3);
        assert_eq!(dto.success_rows, 2);
        assert_eq!(dto.total_points, 15);
    }

    #[test]
    fn test_dto_serializes_camel_case() {
        let summary = ImportSummary::default();
        let dto = ImportResultDto::from_summary(1, 0, &summary);
        let json = serde_json::to_string(&dto).unwrap();
        assert!(json.contains("\"batchId\":1"));
        assert!(json.contains("\"successRows\":0"));
    }
}
