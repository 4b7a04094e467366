// ==========================================
// 商品目录后台 - 领域类型定义
// ==========================================
// 枚举值与数据库存储格式保持一致（小写）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 商品来源 (Product Source)
// ==========================================
// 固定枚举: offline / online / own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductSource {
    Offline, // 线下采购
    Online,  // 线上代购
    Own,     // 自有商品（强制库存管理）
}

impl ProductSource {
    /// 全部合法取值（用于校验提示）
    pub const ALL: [ProductSource; 3] = [
        ProductSource::Offline,
        ProductSource::Online,
        ProductSource::Own,
    ];

    /// 数据库存储格式
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProductSource::Offline => "offline",
            ProductSource::Online => "online",
            ProductSource::Own => "own",
        }
    }

    /// 从字符串解析（大小写敏感，与导入模板一致）
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "offline" => Some(ProductSource::Offline),
            "online" => Some(ProductSource::Online),
            "own" => Some(ProductSource::Own),
            _ => None,
        }
    }

    /// 是否强制开启库存管理
    pub fn forces_inventory(&self) -> bool {
        matches!(self, ProductSource::Own)
    }
}

impl fmt::Display for ProductSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 批次状态 (Batch Status)
// ==========================================
// 状态机: processing → completed | failed，终态不可再迁移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Processing, // 处理中
    Completed,  // 全部成功
    Failed,     // 校验失败或存在落库失败行
}

impl BatchStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
        }
    }

    /// 从数据库字符串解析，未知值按 failed 处理
    pub fn from_db_str(value: &str) -> Self {
        match value.trim() {
            "processing" => BatchStatus::Processing,
            "completed" => BatchStatus::Completed,
            _ => BatchStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BatchStatus::Processing)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
