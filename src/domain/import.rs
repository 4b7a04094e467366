// ==========================================
// 商品目录后台 - 批量导入领域模型
// ==========================================
// 流程: 解析(ImportRow) → 校验 → 查重 → 映射(ImportCandidate) → 落库 → 批次状态
// 约束: success_rows + error_rows <= total_rows
// ==========================================

use crate::domain::product::{NewImage, NewProduct, NewVariant};
use crate::domain::types::BatchStatus;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 解析后的原始行（列名 → 文本值，保持表头顺序）
///
/// 未经校验的不可信数据，只在导入管道内部流转。
pub type ImportRow = IndexMap<String, String>;

// ==========================================
// ImportCandidate - 校验通过后的导入候选
// ==========================================
// 由 CandidateMapper 从 ImportRow 生成，强类型
#[derive(Debug, Clone, PartialEq)]
pub struct ImportCandidate {
    pub row_number: usize,          // 1 起始行号（不含表头）
    pub product: NewProduct,
    pub variant: NewVariant,
    pub images: Vec<NewImage>,
}

// ==========================================
// UploadBatch - 上传批次
// ==========================================
// 对齐: upload_batch 表
// 生命周期: 创建(processing) → 终态写入一次(completed/failed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBatch {
    pub batch_id: String,                     // 批次 ID（UUID）
    pub filename: String,                     // 源文件名
    pub uploaded_by: String,                  // 上传人
    pub status: BatchStatus,                  // 生命周期状态
    pub total_rows: i64,                      // 总行数
    pub processed_rows: i64,                  // 已处理行数
    pub success_rows: i64,                    // 成功行数
    pub error_rows: i64,                      // 失败行数
    pub error_log: Option<BatchErrorLog>,     // 错误日志（完整，不截断）
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// 批次终态写入内容（只允许从 processing 写入一次）
#[derive(Debug, Clone, PartialEq)]
pub struct BatchCompletion {
    pub status: BatchStatus,
    pub processed_rows: i64,
    pub success_rows: i64,
    pub error_rows: i64,
    pub error_log: Option<BatchErrorLog>,
}

impl BatchCompletion {
    /// 校验未通过: 不处理任何行
    pub fn rejected(report: ValidationReport) -> Self {
        Self {
            status: BatchStatus::Failed,
            processed_rows: 0,
            success_rows: 0,
            error_rows: 0,
            error_log: Some(report.into_error_log()),
        }
    }

    /// 落库循环结束
    pub fn from_commit(summary: &CommitSummary) -> Self {
        let error_log = if summary.processing_errors.is_empty() {
            None
        } else {
            Some(BatchErrorLog {
                processing_errors: summary.processing_errors.clone(),
                ..Default::default()
            })
        };
        Self {
            status: summary.final_status(),
            processed_rows: summary.processed_rows() as i64,
            success_rows: summary.success_rows as i64,
            error_rows: summary.error_rows as i64,
            error_log,
        }
    }
}

// ==========================================
// BatchErrorLog - 批次错误日志
// ==========================================
// 校验失败: validationErrors + duplicateSkus
// 落库失败: processingErrors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchErrorLog {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_skus: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processing_errors: Vec<String>,
}

impl BatchErrorLog {
    pub fn is_empty(&self) -> bool {
        self.validation_errors.is_empty()
            && self.duplicate_skus.is_empty()
            && self.processing_errors.is_empty()
    }

    pub fn total(&self) -> usize {
        self.validation_errors.len() + self.duplicate_skus.len() + self.processing_errors.len()
    }
}

// ==========================================
// 查重结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    IntraBatch,     // 同文件内重复（第二次及以后出现）
    ExistingInStore, // 库中已存在
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuConflict {
    pub row_number: usize,
    pub sku: String,
    pub kind: ConflictKind,
}

impl SkuConflict {
    pub fn message(&self) -> String {
        match self.kind {
            ConflictKind::IntraBatch => format!(
                "Row {}: Duplicate SKU '{}' found in CSV",
                self.row_number, self.sku
            ),
            ConflictKind::ExistingInStore => format!(
                "Row {}: SKU '{}' already exists in database",
                self.row_number, self.sku
            ),
        }
    }
}

/// 落库前校验报告（校验错误 + 查重错误）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub validation_errors: Vec<String>,
    pub duplicate_skus: Vec<String>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.validation_errors.is_empty() && self.duplicate_skus.is_empty()
    }

    pub fn into_error_log(self) -> BatchErrorLog {
        BatchErrorLog {
            validation_errors: self.validation_errors,
            duplicate_skus: self.duplicate_skus,
            processing_errors: Vec::new(),
        }
    }
}

/// 落库循环的累计结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub success_rows: usize,
    pub error_rows: usize,
    pub processing_errors: Vec<String>,
}

impl CommitSummary {
    pub fn processed_rows(&self) -> usize {
        self.success_rows + self.error_rows
    }

    pub fn final_status(&self) -> BatchStatus {
        if self.error_rows == 0 {
            BatchStatus::Completed
        } else {
            BatchStatus::Failed
        }
    }
}

// ==========================================
// ImportOutcome - 单次导入结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub batch: UploadBatch,                  // 终态批次记录
    pub report: ValidationReport,            // 校验阶段结果
    pub commit: Option<CommitSummary>,       // 落库阶段结果（校验失败时为 None）
    pub elapsed_time: std::time::Duration,
}

impl ImportOutcome {
    /// 校验阶段是否通过（进入了落库循环）
    pub fn validation_passed(&self) -> bool {
        self.commit.is_some()
    }
}
