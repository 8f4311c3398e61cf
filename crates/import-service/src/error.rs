//! 导入服务错误类型定义

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// 导入服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    // 文件级错误（整个请求失败，不产生任何写入）
    #[error("不支持的文件类型: {0}，仅支持 .xlsx / .xls / .csv")]
    UnsupportedFileType(String),
    #[error("文件为空或没有数据行")]
    EmptyFile,
    #[error("文件解析失败: {0}")]
    FileDecode(String),
    #[error("文件大小超过限制: {actual} 字节，上限 {limit} 字节")]
    FileTooLarge { actual: u64, limit: u64 },

    // 验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    // 资源不存在
    #[error("导入批次不存在: {0}")]
    BatchNotFound(i64),
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    // 系统错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ImportError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedFileType(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::EmptyFile | Self::FileDecode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BatchNotFound(_) | Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            Self::EmptyFile => "EMPTY_FILE",
            Self::FileDecode(_) => "FILE_DECODE_ERROR",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BatchNotFound(_) => "BATCH_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ImportError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ImportError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    /// 构造所有可简单构造的错误变体及其期望的 (StatusCode, error_code) 映射。
    /// 表驱动方式保证新增变体时只需在一处维护。
    fn all_error_variants() -> Vec<(ImportError, StatusCode, &'static str)> {
        vec![
            (
                ImportError::UnsupportedFileType("report.pdf".into()),
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_FILE_TYPE",
            ),
            (
                ImportError::EmptyFile,
                StatusCode::UNPROCESSABLE_ENTITY,
                "EMPTY_FILE",
            ),
            (
                ImportError::FileDecode("bad xlsx".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "FILE_DECODE_ERROR",
            ),
            (
                ImportError::FileTooLarge {
                    actual: 100,
                    limit: 10,
                },
                StatusCode::PAYLOAD_TOO_LARGE,
                "FILE_TOO_LARGE",
            ),
            (
                ImportError::Validation("file 字段缺失".into()),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                ImportError::BatchNotFound(42),
                StatusCode::NOT_FOUND,
                "BATCH_NOT_FOUND",
            ),
            (
                ImportError::UserNotFound("U1001".into()),
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
            ),
            (
                ImportError::Internal("unexpected state".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ]
    }

    #[test]
    fn test_all_variants_status_code() {
        for (error, expected_status, label) in all_error_variants() {
            assert_eq!(
                error.status_code(),
                expected_status,
                "状态码不匹配: variant={label}"
            );
        }
    }

    /// 错误码是 API 契约的一部分，客户端用它做条件分支，必须逐一锁定
    #[test]
    fn test_all_variants_error_code() {
        for (error, _status, expected_code) in all_error_variants() {
            assert_eq!(
                error.error_code(),
                expected_code,
                "错误码不匹配: expected={expected_code}"
            );
        }
    }

    #[test]
    fn test_display_contains_context() {
        assert!(
            ImportError::UnsupportedFileType("a.pdf".into())
                .to_string()
                .contains("a.pdf")
        );
        assert!(ImportError::BatchNotFound(42).to_string().contains("42"));
        assert!(
            ImportError::UserNotFound("U9".into())
                .to_string()
                .contains("U9")
        );
        assert!(
            ImportError::FileTooLarge {
                actual: 123,
                limit: 10
            }
            .to_string()
            .contains("123")
        );
    }

    #[test]
    fn test_from_sqlx_error() {
        let err = ImportError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ImportError::Database(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }

    /// IntoResponse 是错误到 HTTP 响应的最终出口，
    /// 验证状态码和响应体四字段结构（success/code/message/data）
    #[tokio::test]
    async fn test_into_response_body_structure() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let label = format!("{:?}", error);
            let response = error.into_response();

            assert_eq!(response.status(), expected_status, "状态码不匹配: {label}");

            let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("读取响应体失败");
            let body: serde_json::Value =
                serde_json::from_slice(&body_bytes).expect("响应体不是合法 JSON");

            assert_eq!(body["success"], json!(false), "success 应为 false: {label}");
            assert_eq!(body["code"], json!(expected_code), "code 不匹配: {label}");
            assert!(
                !body["message"].as_str().unwrap_or("").is_empty(),
                "message 不应为空: {label}"
            );
            assert!(body["data"].is_null(), "data 应为 null: {label}");
        }
    }

    /// 系统级错误的响应消息不应泄露内部细节
    #[tokio::test]
    async fn test_system_errors_hide_internal_details() {
        let error = ImportError::Internal("stack overflow at module X".into());
        let response = error.into_response();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("读取响应体失败");
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        let message = body["message"].as_str().unwrap();

        assert!(!message.contains("stack overflow"), "泄露了内部细节: {message}");
        assert!(message.contains("服务内部错误"));
    }
}
