//! 导入 API 处理器
//!
//! 上传表格、查询批次列表与批次详情。上传是同步处理：
//! 解码、落库在请求内完成，响应直接携带批次汇总。

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::{
    decoder::FileDecoder,
    dto::{ApiResponse, ImportBatchDto, ImportResultDto, PageResponse, PaginationParams},
    error::{ImportError, Result},
    import::ImportOrchestrator,
    models::BatchStatus,
    repository::BatchRepository,
    state::AppState,
};

/// 从 multipart 请求中取出的上传文件
struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

/// 读取 multipart 中的 file 字段
///
/// 只接受第一个名为 `file` 的字段，其余字段忽略。
async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ImportError::Validation(format!("multipart 解析失败: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ImportError::Validation("file 字段缺少文件名".to_string()))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ImportError::Validation(format!("文件读取失败: {e}")))?;

        return Ok(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Err(ImportError::Validation("缺少 file 字段".to_string()))
}

/// 上传表格并执行导入
///
/// POST /api/admin/imports
///
/// 文件级错误（类型、大小、解码）直接返回错误且不产生批次写入；
/// 解码成功后先落一条 processing 批次，处理结束回填终态。
/// 部分行失败仍是 HTTP 成功，失败行数在汇总里体现。
#[instrument(skip(state, multipart))]
pub async fn upload_import(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ImportResultDto>>> {
    let upload = read_upload(multipart).await?;

    let limit = state.import_config.max_file_size_bytes;
    if upload.bytes.len() as u64 > limit {
        return Err(ImportError::FileTooLarge {
            actual: upload.bytes.len() as u64,
            limit,
        });
    }

    let rows = FileDecoder::decode(&upload.filename, &upload.bytes)?;
    let total_rows = rows.len() as i32;

    info!(filename = %upload.filename, total_rows, "文件解码完成，开始导入");

    let batch_repo = BatchRepository::new(state.pool.clone());
    let batch_id = batch_repo
        .create(&upload.filename, upload.bytes.len() as i64, total_rows)
        .await?;

    let orchestrator = ImportOrchestrator::new(state.pool.clone());
    match orchestrator.run(&rows, batch_id).await {
        Ok(summary) => {
            batch_repo
                .finalize(batch_id, &summary, BatchStatus::Completed, None)
                .await?;

            if summary.failed_rows > 0 {
                warn!(batch_id, failed_rows = summary.failed_rows, "批次含失败行");
            }

            Ok(Json(ApiResponse::success(ImportResultDto::from_summary(
                batch_id, total_rows, &summary,
            ))))
        }
        Err(e) => {
            error!(batch_id, error = %e, "导入批次处理失败，已回滚");
            // 终态回填失败只记录日志，优先把原始错误返回给调用方
            if let Err(finalize_err) = batch_repo
                .finalize(
                    batch_id,
                    &Default::default(),
                    BatchStatus::Failed,
                    Some(&e.to_string()),
                )
                .await
            {
                error!(batch_id, error = %finalize_err, "批次终态回填失败");
            }
            Err(e)
        }
    }
}

/// 获取导入批次列表（分页，最新的在前）
///
/// GET /api/admin/imports
#[instrument(skip(state))]
pub async fn list_batches(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<ImportBatchDto>>>> {
    pagination.validate()?;

    let repo = BatchRepository::new(state.pool.clone());

    let total = repo.count().await?;
    if total == 0 {
        return Ok(Json(ApiResponse::success(PageResponse::empty(
            pagination.page,
            pagination.page_size,
        ))));
    }

    let batches = repo.list(pagination.limit(), pagination.offset()).await?;
    let items: Vec<ImportBatchDto> = batches.into_iter().map(Into::into).collect();

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page,
        pagination.page_size,
    ))))
}

/// 获取导入批次详情
///
/// GET /api/admin/imports/:id
#[instrument(skip(state))]
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ImportBatchDto>>> {
    let repo = BatchRepository::new(state.pool.clone());
    let batch = repo.get(id).await?;
    Ok(Json(ApiResponse::success(batch.into())))
}
