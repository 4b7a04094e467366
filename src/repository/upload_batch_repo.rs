// ==========================================
// 商品目录后台 - 上传批次数据仓储
// ==========================================
// 状态机: processing → completed | failed
// 约束: 终态只写入一次（UPDATE 带 status='processing' 条件）
// ==========================================

use crate::domain::import::{BatchCompletion, BatchErrorLog, UploadBatch};
use crate::domain::types::BatchStatus;
use crate::repository::db_utils::{opt_json_from_db, opt_ts_from_db, ts_from_db, ts_to_db};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const BATCH_COLUMNS: &str = r#"
    batch_id, filename, uploaded_by, status, total_rows, processed_rows,
    success_rows, error_rows, error_log, created_at, completed_at
"#;

fn map_batch_row(row: &Row) -> SqliteResult<UploadBatch> {
    let status: String = row.get(3)?;
    Ok(UploadBatch {
        batch_id: row.get(0)?,
        filename: row.get(1)?,
        uploaded_by: row.get(2)?,
        status: BatchStatus::from_db_str(&status),
        total_rows: row.get(4)?,
        processed_rows: row.get(5)?,
        success_rows: row.get(6)?,
        error_rows: row.get(7)?,
        error_log: opt_json_from_db::<BatchErrorLog>(8, row.get(8)?)?,
        created_at: ts_from_db(9, &row.get::<_, String>(9)?)?,
        completed_at: opt_ts_from_db(10, row.get(10)?)?,
    })
}

fn find_batch(conn: &Connection, batch_id: &str) -> SqliteResult<Option<UploadBatch>> {
    conn.query_row(
        &format!("SELECT {} FROM upload_batch WHERE batch_id = ?1", BATCH_COLUMNS),
        params![batch_id],
        map_batch_row,
    )
    .optional()
}

// ==========================================
// UploadBatchRepository - 上传批次仓储
// ==========================================
pub struct UploadBatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UploadBatchRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建批次记录（状态必须为 processing）
    pub fn create(&self, batch: &UploadBatch) -> RepositoryResult<()> {
        if batch.status != BatchStatus::Processing {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "new batch must start in processing, got {}",
                batch.status
            )));
        }

        let error_log = batch
            .error_log
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO upload_batch (
                batch_id, filename, uploaded_by, status, total_rows, processed_rows,
                success_rows, error_rows, error_log, created_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch.batch_id,
                batch.filename,
                batch.uploaded_by,
                batch.status.to_db_str(),
                batch.total_rows,
                batch.processed_rows,
                batch.success_rows,
                batch.error_rows,
                error_log,
                ts_to_db(&batch.created_at),
                batch.completed_at.as_ref().map(ts_to_db),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, batch_id: &str) -> RepositoryResult<Option<UploadBatch>> {
        let conn = self.get_conn()?;
        Ok(find_batch(&conn, batch_id)?)
    }

    /// 最近批次（按创建时间倒序）
    pub fn list_recent(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<UploadBatch>> {
        let conn = self.get_conn()?;
        let batches = conn
            .prepare(&format!(
                "SELECT {} FROM upload_batch ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2",
                BATCH_COLUMNS
            ))?
            .query_map(params![limit, offset], map_batch_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(batches)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let total = conn.query_row("SELECT COUNT(*) FROM upload_batch", [], |row| row.get(0))?;
        Ok(total)
    }

    /// 写入批次终态
    ///
    /// # 错误
    /// - InvalidStateTransition: 目标状态非终态，或批次已处于终态
    /// - NotFound: 批次不存在
    pub fn complete(
        &self,
        batch_id: &str,
        completion: &BatchCompletion,
    ) -> RepositoryResult<UploadBatch> {
        if !completion.status.is_terminal() {
            return Err(RepositoryError::InvalidStateTransition {
                from: BatchStatus::Processing.to_string(),
                to: completion.status.to_string(),
            });
        }

        let error_log = completion
            .error_log
            .as_ref()
            .filter(|log| !log.is_empty())
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE upload_batch SET
                status = ?2, processed_rows = ?3, success_rows = ?4,
                error_rows = ?5, error_log = ?6, completed_at = ?7
            WHERE batch_id = ?1 AND status = 'processing'
            "#,
            params![
                batch_id,
                completion.status.to_db_str(),
                completion.processed_rows,
                completion.success_rows,
                completion.error_rows,
                error_log,
                ts_to_db(&Utc::now()),
            ],
        )?;

        if affected == 0 {
            return match find_batch(&conn, batch_id)? {
                Some(existing) => Err(RepositoryError::InvalidStateTransition {
                    from: existing.status.to_string(),
                    to: completion.status.to_string(),
                }),
                None => Err(RepositoryError::not_found("UploadBatch", batch_id)),
            };
        }

        find_batch(&conn, batch_id)?.ok_or_else(|| RepositoryError::not_found("UploadBatch", batch_id))
    }
}
