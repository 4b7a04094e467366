// ==========================================
// 商品目录后台 - 批量商品导入器实现
// ==========================================
// 职责: 整合导入流程，从上传内容到数据库
// 流程: 解析 → 建批次 → 行校验 → 查重 → (拒绝 | 逐行落库) → 批次终态
// 约束: 校验/查重任一有错则整批拒绝，不写入任何商品
// 约束: 落库逐行进行，单行失败不影响其他行
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::import::{
    BatchCompletion, BatchErrorLog, CommitSummary, ImportOutcome, ImportRow, UploadBatch,
    ValidationReport,
};
use crate::domain::types::BatchStatus;
use crate::importer::candidate_mapper::CandidateMapperImpl;
use crate::importer::conflict_handler::ConflictHandler as ConflictHandlerImpl;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{content_type_for_path, UniversalFileParser};
use crate::importer::product_importer_trait::{
    CandidateMapper, ConflictHandler, ProductImporter, RowValidator,
};
use crate::importer::row_validator::{cell, columns, row_label, RowValidatorImpl};
use crate::repository::CatalogImportRepository;
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ProductImporterImpl - 批量商品导入器实现
// ==========================================
pub struct ProductImporterImpl<R, C>
where
    R: CatalogImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    row_validator: Box<dyn RowValidator>,
    conflict_handler: Box<dyn ConflictHandler>,
    candidate_mapper: Box<dyn CandidateMapper>,
}

impl<R, C> ProductImporterImpl<R, C>
where
    R: CatalogImportRepository,
    C: ImportConfigReader,
{
    /// 创建新的 ProductImporter 实例
    ///
    /// # 参数
    /// - import_repo: 导入数据仓储
    /// - config: 配置读取器
    /// - row_validator: 行校验器
    /// - conflict_handler: SKU 冲突检测
    /// - candidate_mapper: 导入候选映射
    pub fn new(
        import_repo: R,
        config: C,
        row_validator: Box<dyn RowValidator>,
        conflict_handler: Box<dyn ConflictHandler>,
        candidate_mapper: Box<dyn CandidateMapper>,
    ) -> Self {
        Self {
            import_repo,
            config,
            row_validator,
            conflict_handler,
            candidate_mapper,
        }
    }

    /// 使用默认组件创建
    pub fn with_default_components(import_repo: R, config: C) -> Self {
        Self::new(
            import_repo,
            config,
            Box::new(RowValidatorImpl),
            Box::new(ConflictHandlerImpl),
            Box::new(CandidateMapperImpl),
        )
    }

    /// 导入数据仓储（供批次查询复用）
    pub fn repository(&self) -> &R {
        &self.import_repo
    }

    /// 配置读取器
    pub fn config(&self) -> &C {
        &self.config
    }

    /// 行校验 + 查重（不写库）
    async fn validate_rows(&self, rows: &[ImportRow]) -> ImportResult<ValidationReport> {
        let validation_errors: Vec<String> = rows
            .iter()
            .enumerate()
            .flat_map(|(idx, row)| self.row_validator.validate(row, idx))
            .collect();

        // 库内查重：每个非空 SKU 一次点查
        let mut existing_skus = HashSet::new();
        for row in rows {
            let sku = cell(row, columns::SKU);
            if sku.is_empty() || existing_skus.contains(sku) {
                continue;
            }
            if self.import_repo.exists_product_sku(sku).await? {
                existing_skus.insert(sku.to_string());
            }
        }

        let intra_batch = self.conflict_handler.detect_intra_batch(rows);
        let existing = self.conflict_handler.detect_existing(rows, &existing_skus);
        let duplicate_skus = self
            .conflict_handler
            .merge(intra_batch, existing)
            .iter()
            .map(|c| c.message())
            .collect();

        Ok(ValidationReport {
            validation_errors,
            duplicate_skus,
        })
    }

    /// 逐行落库（严格按文件顺序，单行失败继续）
    async fn commit_rows(&self, rows: &[ImportRow], batch_id: &str) -> CommitSummary {
        let mut summary = CommitSummary::default();

        for (idx, row) in rows.iter().enumerate() {
            let result = match self.candidate_mapper.map_row(row, idx, batch_id) {
                Ok(candidate) => self
                    .import_repo
                    .insert_candidate(&candidate)
                    .await
                    .map_err(ImportError::from),
                Err(e) => Err(e),
            };

            match result {
                Ok(product_id) => {
                    summary.success_rows += 1;
                    debug!(row_number = idx + 1, product_id, "行落库成功");
                }
                Err(e) => {
                    summary.error_rows += 1;
                    warn!(row_number = idx + 1, error = %e, "行落库失败");
                    summary
                        .processing_errors
                        .push(format!("{}: {}", row_label(idx), e));
                }
            }
        }

        summary
    }

    /// 批次已创建后的流程
    async fn run_batch(
        &self,
        batch: UploadBatch,
        rows: &[ImportRow],
        started: Instant,
    ) -> ImportResult<ImportOutcome> {
        // === 步骤 3: 行校验 + 查重 ===
        debug!("步骤 3: 行校验与查重");
        let report = self.validate_rows(rows).await?;

        if !report.passed() {
            warn!(
                batch_id = %batch.batch_id,
                validation_errors = report.validation_errors.len(),
                duplicate_skus = report.duplicate_skus.len(),
                "校验未通过，整批拒绝"
            );
            let finished = self
                .import_repo
                .complete_batch(&batch.batch_id, BatchCompletion::rejected(report.clone()))
                .await?;
            return Ok(ImportOutcome {
                batch: finished,
                report,
                commit: None,
                elapsed_time: started.elapsed(),
            });
        }

        // === 步骤 4: 逐行落库 ===
        debug!("步骤 4: 逐行落库");
        let summary = self.commit_rows(rows, &batch.batch_id).await;

        // === 步骤 5: 批次终态 ===
        let finished = self
            .import_repo
            .complete_batch(&batch.batch_id, BatchCompletion::from_commit(&summary))
            .await?;

        info!(
            batch_id = %finished.batch_id,
            status = %finished.status,
            success_rows = summary.success_rows,
            error_rows = summary.error_rows,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "导入完成"
        );

        Ok(ImportOutcome {
            batch: finished,
            report,
            commit: Some(summary),
            elapsed_time: started.elapsed(),
        })
    }
}

#[async_trait::async_trait]
impl<R, C> ProductImporter for ProductImporterImpl<R, C>
where
    R: CatalogImportRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, bytes), fields(batch_id, size = bytes.len()))]
    async fn import_bytes(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> ImportResult<ImportOutcome> {
        let started = Instant::now();

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let csv_mode = self.config.get_csv_mode().await?;
        let rows = UniversalFileParser::new(csv_mode)
            .parser_for(content_type)?
            .parse_rows(bytes)
            .map_err(|e| {
                error!(error = %e, "文件解析失败");
                e
            })?;

        if rows.is_empty() {
            warn!(file_name, "文件为空或无数据行");
            return Err(ImportError::EmptyFile);
        }
        info!(total_rows = rows.len(), csv_mode = %csv_mode, "文件解析完成");

        // === 步骤 2: 创建批次 ===
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        let batch = UploadBatch {
            batch_id: batch_id.clone(),
            filename: file_name.to_string(),
            uploaded_by: self.config.get_uploaded_by().await?,
            status: BatchStatus::Processing,
            total_rows: rows.len() as i64,
            processed_rows: 0,
            success_rows: 0,
            error_rows: 0,
            error_log: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.import_repo.create_batch(batch.clone()).await?;
        info!(batch_id = %batch_id, file_name, "批次已创建");

        match self.run_batch(batch, &rows, started).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                // 流程中断：批次不能停留在 processing
                error!(batch_id = %batch_id, error = %e, "导入中断，批次置为失败");
                let completion = BatchCompletion {
                    status: BatchStatus::Failed,
                    processed_rows: 0,
                    success_rows: 0,
                    error_rows: 0,
                    error_log: Some(BatchErrorLog {
                        processing_errors: vec![e.to_string()],
                        ..Default::default()
                    }),
                };
                if let Err(close_err) = self.import_repo.complete_batch(&batch_id, completion).await {
                    warn!(batch_id = %batch_id, error = %close_err, "批次终态写入失败");
                }
                Err(e)
            }
        }
    }

    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportOutcome> {
        let path = file_path.as_ref();
        let content_type = content_type_for_path(path).ok_or_else(|| {
            ImportError::UnsupportedContentType(path.display().to_string())
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let bytes = tokio::fs::read(path).await?;
        self.import_bytes(&file_name, content_type, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CsvMode, DisplayLimits};
    use crate::domain::import::ImportCandidate;
    use crate::repository::{RepositoryError, RepositoryResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    // 内存仓储：可注入指定 SKU 的落库失败
    #[derive(Default)]
    struct FakeRepo {
        existing: HashSet<String>,
        fail_skus: HashSet<String>,
        batches: Mutex<Vec<UploadBatch>>,
        inserted: Mutex<Vec<ImportCandidate>>,
    }

    #[async_trait]
    impl CatalogImportRepository for FakeRepo {
        async fn exists_product_sku(&self, sku: &str) -> RepositoryResult<bool> {
            Ok(self.existing.contains(sku))
        }

        async fn create_batch(&self, batch: UploadBatch) -> RepositoryResult<()> {
            self.batches.lock().unwrap().push(batch);
            Ok(())
        }

        async fn complete_batch(
            &self,
            batch_id: &str,
            completion: BatchCompletion,
        ) -> RepositoryResult<UploadBatch> {
            let mut batches = self.batches.lock().unwrap();
            let batch = batches
                .iter_mut()
                .find(|b| b.batch_id == batch_id)
                .ok_or_else(|| RepositoryError::not_found("UploadBatch", batch_id))?;
            batch.status = completion.status;
            batch.processed_rows = completion.processed_rows;
            batch.success_rows = completion.success_rows;
            batch.error_rows = completion.error_rows;
            batch.error_log = completion.error_log;
            batch.completed_at = Some(Utc::now());
            Ok(batch.clone())
        }

        async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<UploadBatch>> {
            Ok(self
                .batches
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.batch_id == batch_id)
                .cloned())
        }

        async fn list_batches(&self, _limit: i64, _offset: i64) -> RepositoryResult<Vec<UploadBatch>> {
            Ok(self.batches.lock().unwrap().clone())
        }

        async fn count_batches(&self) -> RepositoryResult<i64> {
            Ok(self.batches.lock().unwrap().len() as i64)
        }

        async fn insert_candidate(&self, candidate: &ImportCandidate) -> RepositoryResult<i64> {
            if self.fail_skus.contains(&candidate.product.sku) {
                return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
            }
            let mut inserted = self.inserted.lock().unwrap();
            inserted.push(candidate.clone());
            Ok(inserted.len() as i64)
        }
    }

    struct FixedConfig(CsvMode);

    #[async_trait]
    impl ImportConfigReader for FixedConfig {
        async fn get_csv_mode(&self) -> ImportResult<CsvMode> {
            Ok(self.0)
        }
        async fn get_uploaded_by(&self) -> ImportResult<String> {
            Ok("admin".to_string())
        }
        async fn get_display_limits(&self) -> ImportResult<DisplayLimits> {
            Ok(DisplayLimits::default())
        }
        async fn get_default_page_size(&self) -> ImportResult<i64> {
            Ok(10)
        }
    }

    fn importer(repo: FakeRepo) -> ProductImporterImpl<FakeRepo, FixedConfig> {
        ProductImporterImpl::with_default_components(repo, FixedConfig(CsvMode::Naive))
    }

    const HEADER: &str = "sku,name,source,regularPrice";

    #[tokio::test]
    async fn test_empty_file_creates_no_batch() {
        let imp = importer(FakeRepo::default());

        let err = imp
            .import_bytes("p.csv", "text/csv", HEADER.as_bytes())
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::EmptyFile));
        assert_eq!(imp.repository().count_batches().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_content_type() {
        let imp = importer(FakeRepo::default());
        let err = imp
            .import_bytes("p.png", "image/png", b"x")
            .await
            .unwrap_err();
        assert!(err.is_input_shape());
    }

    #[tokio::test]
    async fn test_existing_sku_rejects_whole_batch() {
        let repo = FakeRepo {
            existing: ["A2".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let imp = importer(repo);
        let csv = format!("{}\nA1,Mug,own,5\nA2,Cup,online,3\n", HEADER);

        let outcome = imp.import_bytes("p.csv", "text/csv", csv.as_bytes()).await.unwrap();

        assert!(!outcome.validation_passed());
        assert_eq!(outcome.batch.status, BatchStatus::Failed);
        assert_eq!(outcome.batch.success_rows, 0);
        assert_eq!(
            outcome.batch.error_log.unwrap().duplicate_skus,
            vec!["Row 2: SKU 'A2' already exists in database".to_string()]
        );
        assert!(imp.repository().inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_row_failure_does_not_stop_loop() {
        let repo = FakeRepo {
            fail_skus: ["B2".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let imp = importer(repo);
        let csv = format!("{}\nB1,One,own,1\nB2,Two,own,2\nB3,Three,own,3\n", HEADER);

        let outcome = imp.import_bytes("p.csv", "text/csv", csv.as_bytes()).await.unwrap();

        let summary = outcome.commit.clone().unwrap();
        assert_eq!(summary.success_rows, 2);
        assert_eq!(summary.error_rows, 1);
        assert_eq!(outcome.batch.status, BatchStatus::Failed);
        assert_eq!(outcome.batch.processed_rows, 3);
        let log = outcome.batch.error_log.unwrap();
        assert_eq!(log.processing_errors.len(), 1);
        assert!(log.processing_errors[0].starts_with("Row 2: "));

        let skus: Vec<_> = imp
            .repository()
            .inserted
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.product.sku.clone())
            .collect();
        assert_eq!(skus, vec!["B1".to_string(), "B3".to_string()]);
    }

    #[tokio::test]
    async fn test_mapping_error_is_processing_error() {
        let imp = importer(FakeRepo::default());
        let csv = "sku,name,source,regularPrice,quantity\nC1,One,own,1,lots\nC2,Two,own,2,4\n";

        let outcome = imp.import_bytes("p.csv", "text/csv", csv.as_bytes()).await.unwrap();

        assert_eq!(outcome.batch.success_rows, 1);
        assert_eq!(
            outcome.batch.error_log.unwrap().processing_errors,
            vec!["Row 1: quantity must be a valid number".to_string()]
        );
    }
}
