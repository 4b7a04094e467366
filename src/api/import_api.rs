// ==========================================
// 商品批量导入API
// ==========================================
// 职责: 上传入口（输入形状校验 → 导入管道 → 结果摘要）、批次历史查询
// 说明: 返回给前端的错误列表按配置截断，批次中保存完整错误日志
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::pagination::{normalize_page, page_offset, Pagination};
use crate::config::{ConfigManager, DisplayLimits, ImportConfigReader};
use crate::domain::import::{ImportOutcome, UploadBatch};
use crate::domain::types::BatchStatus;
use crate::importer::file_parser::{normalize_content_type, ALLOWED_CONTENT_TYPES};
use crate::importer::{ImportError, ProductImporter, ProductImporterImpl};
use crate::repository::{CatalogImportRepository, CatalogImportRepositoryImpl};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 后台使用的导入器
pub type CatalogImporter = ProductImporterImpl<CatalogImportRepositoryImpl, ConfigManager>;

/// 上传的文件
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// 截断后的错误列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPreview {
    /// 前 N 条
    pub items: Vec<String>,
    /// 未展示的条数
    pub remaining: usize,
}

impl ErrorPreview {
    pub fn cap_for_display(errors: &[String], limit: usize) -> Self {
        let shown = errors.len().min(limit);
        Self {
            items: errors[..shown].to_vec(),
            remaining: errors.len() - shown,
        }
    }

    pub fn total(&self) -> usize {
        self.items.len() + self.remaining
    }
}

/// 上传结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportApiResponse {
    /// 批次是否全部成功（completed）
    pub success: bool,
    pub batch_id: String,
    pub status: BatchStatus,
    pub total_rows: i64,
    pub success_count: i64,
    pub error_count: i64,
    pub validation_errors: ErrorPreview,
    pub duplicate_skus: ErrorPreview,
    pub processing_errors: ErrorPreview,
    /// 全部错误条数（未截断）
    pub total_errors: usize,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

impl ImportApiResponse {
    pub fn from_outcome(outcome: &ImportOutcome, limits: &DisplayLimits) -> Self {
        let processing: &[String] = outcome
            .commit
            .as_ref()
            .map(|c| c.processing_errors.as_slice())
            .unwrap_or(&[]);

        let validation_errors =
            ErrorPreview::cap_for_display(&outcome.report.validation_errors, limits.validation);
        let duplicate_skus =
            ErrorPreview::cap_for_display(&outcome.report.duplicate_skus, limits.duplicates);
        let processing_errors = ErrorPreview::cap_for_display(processing, limits.processing);
        let total_errors =
            validation_errors.total() + duplicate_skus.total() + processing_errors.total();

        Self {
            success: outcome.batch.status == BatchStatus::Completed,
            batch_id: outcome.batch.batch_id.clone(),
            status: outcome.batch.status,
            total_rows: outcome.batch.total_rows,
            success_count: outcome.batch.success_rows,
            error_count: outcome.batch.error_rows,
            validation_errors,
            duplicate_skus,
            processing_errors,
            total_errors,
            elapsed_ms: outcome.elapsed_time.as_millis() as i64,
        }
    }
}

/// 批次列表（带分页信息）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchListResponse {
    pub batches: Vec<UploadBatch>,
    pub pagination: Pagination,
}

/// 导入API
pub struct ImportApi {
    importer: Arc<CatalogImporter>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(importer: Arc<CatalogImporter>) -> Self {
        Self { importer }
    }

    /// 上传商品文件
    ///
    /// # 参数
    /// - file: 上传内容（None 表示未上传文件）
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 批次已进入终态
    /// - Err(InvalidInput): 未上传 / 类型不允许 / 空文件（不创建批次）
    #[instrument(skip(self, file))]
    pub async fn upload_products(&self, file: Option<UploadedFile>) -> ApiResult<ImportApiResponse> {
        let file = match file {
            Some(f) if !f.file_name.trim().is_empty() => f,
            _ => return Err(ImportError::NoFile.into()),
        };

        let essence = normalize_content_type(&file.content_type);
        if !ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
            warn!(content_type = %file.content_type, "上传类型不允许");
            return Err(ImportError::UnsupportedContentType(file.content_type).into());
        }

        info!(file_name = %file.file_name, size = file.bytes.len(), "收到上传文件");

        let outcome = self
            .importer
            .import_bytes(&file.file_name, &essence, &file.bytes)
            .await?;
        let limits = self.importer.config().get_display_limits().await?;

        Ok(ImportApiResponse::from_outcome(&outcome, &limits))
    }

    /// 上传批次历史（按创建时间倒序）
    pub async fn list_upload_batches(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ApiResult<BatchListResponse> {
        let default_limit = self.importer.config().get_default_page_size().await?;
        let (page, limit) = normalize_page(page, limit, default_limit);

        let repo = self.importer.repository();
        let batches = repo.list_batches(limit, page_offset(page, limit)).await?;
        let total = repo.count_batches().await?;

        Ok(BatchListResponse {
            batches,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// 查询单个批次
    pub async fn get_upload_batch(&self, batch_id: &str) -> ApiResult<UploadBatch> {
        let batch_id = batch_id.trim();
        if batch_id.is_empty() {
            return Err(ApiError::InvalidInput("batch id is required".to_string()));
        }

        self.importer
            .repository()
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Upload batch not found".to_string()))
    }
}
