// ==========================================
// 商品目录后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级错误文本写入批次错误日志，保持英文
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 输入形状错误（批次创建前）=====
    #[error("No file uploaded")]
    NoFile,

    #[error("Only CSV and Excel files are allowed")]
    UnsupportedContentType(String),

    #[error("CSV file is empty or invalid")]
    EmptyFile,

    // ===== 文件相关错误 =====
    #[error("file is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("Excel parse failed: {0}")]
    ExcelParseError(String),

    #[error("CSV parse failed: {0}")]
    CsvParseError(String),

    // ===== 数据映射错误 =====
    #[error("{field} must be a valid number")]
    InvalidNumber { field: String, value: String },

    #[error("{field}: {message}")]
    FieldValueError { field: String, message: String },

    // ===== 配置错误 =====
    #[error("config read failed (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("invalid config value (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 数据库错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为输入形状错误（此类错误不产生批次记录）
    pub fn is_input_shape(&self) -> bool {
        matches!(
            self,
            ImportError::NoFile | ImportError::UnsupportedContentType(_) | ImportError::EmptyFile
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Repository(RepositoryError::from(err))
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for ImportError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        ImportError::InvalidEncoding(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
