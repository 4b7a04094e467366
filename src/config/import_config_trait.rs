// ==========================================
// 商品目录后台 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入与批次查询所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CsvMode - CSV 解析模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvMode {
    /// 按行/逗号朴素切分，去除所有双引号
    #[default]
    Naive,
    /// RFC 4180（支持引号内逗号与换行）
    Rfc4180,
}

impl CsvMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CsvMode::Naive => "naive",
            CsvMode::Rfc4180 => "rfc4180",
        }
    }

    /// 解析配置值（大小写不敏感）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "naive" => Some(CsvMode::Naive),
            "rfc4180" | "strict" => Some(CsvMode::Rfc4180),
            _ => None,
        }
    }
}

impl fmt::Display for CsvMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 上传结果中各类错误的展示上限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLimits {
    pub validation: usize,
    pub duplicates: usize,
    pub processing: usize,
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            validation: 5,
            duplicates: 5,
            processing: 3,
        }
    }
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取 CSV 解析模式
    ///
    /// # 默认值
    /// - naive
    async fn get_csv_mode(&self) -> ImportResult<CsvMode>;

    /// 获取批次记录中的上传人
    ///
    /// # 默认值
    /// - admin
    async fn get_uploaded_by(&self) -> ImportResult<String>;

    /// 获取上传结果的错误展示上限
    ///
    /// # 默认值
    /// - validation 5 / duplicates 5 / processing 3
    async fn get_display_limits(&self) -> ImportResult<DisplayLimits>;

    /// 获取批次列表默认页大小
    ///
    /// # 默认值
    /// - 10
    async fn get_default_page_size(&self) -> ImportResult<i64>;
}
