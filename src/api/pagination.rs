// ==========================================
// 商品目录后台 - 分页参数
// ==========================================

use serde::{Deserialize, Serialize};

/// 单页上限
pub const MAX_PAGE_SIZE: i64 = 100;

/// 分页元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total <= 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// 归一化页码与页大小: page >= 1，limit ∈ [1, 100]
pub fn normalize_page(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

/// 页码换算为行偏移，超大页码饱和到 i64::MAX
pub fn page_offset(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit)
}
