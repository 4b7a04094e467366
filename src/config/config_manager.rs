// ==========================================
// 商品目录后台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{CsvMode, DisplayLimits, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use indexmap::IndexMap;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（按键排序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<IndexMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<IndexMap<_, _>>>()?;
        Ok(rows)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ImportResult<String> {
        let value = self
            .get_global_config_value(key)
            .map_err(|e| ImportError::ConfigReadError {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(value.unwrap_or_else(|| default.to_string()))
    }

    /// 读取正整数配置，格式错误时回退默认值
    fn get_positive_or_default(&self, key: &str, default: usize) -> ImportResult<usize> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        match value.trim().parse::<usize>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                tracing::warn!(config_key = key, raw_value = %value, default, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_csv_mode(&self) -> ImportResult<CsvMode> {
        let value = self.get_config_or_default(config_keys::CSV_MODE, CsvMode::Naive.as_str())?;
        CsvMode::parse(&value).ok_or_else(|| ImportError::ConfigValueError {
            key: config_keys::CSV_MODE.to_string(),
            value,
            message: "expected naive or rfc4180".to_string(),
        })
    }

    async fn get_uploaded_by(&self) -> ImportResult<String> {
        let value = self.get_config_or_default(config_keys::UPLOADED_BY, "admin")?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok("admin".to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }

    async fn get_display_limits(&self) -> ImportResult<DisplayLimits> {
        let defaults = DisplayLimits::default();
        Ok(DisplayLimits {
            validation: self
                .get_positive_or_default(config_keys::DISPLAY_LIMIT_VALIDATION, defaults.validation)?,
            duplicates: self
                .get_positive_or_default(config_keys::DISPLAY_LIMIT_DUPLICATES, defaults.duplicates)?,
            processing: self
                .get_positive_or_default(config_keys::DISPLAY_LIMIT_PROCESSING, defaults.processing)?,
        })
    }

    async fn get_default_page_size(&self) -> ImportResult<i64> {
        let size = self.get_positive_or_default(config_keys::DEFAULT_PAGE_SIZE, 10)?;
        Ok(size.min(100) as i64)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入
    pub const CSV_MODE: &str = "import.csv_mode";
    pub const UPLOADED_BY: &str = "import.uploaded_by";

    // 上传结果展示上限
    pub const DISPLAY_LIMIT_VALIDATION: &str = "import.display_limit.validation";
    pub const DISPLAY_LIMIT_DUPLICATES: &str = "import.display_limit.duplicates";
    pub const DISPLAY_LIMIT_PROCESSING: &str = "import.display_limit.processing";

    // 列表分页
    pub const DEFAULT_PAGE_SIZE: &str = "api.default_page_size";
}
