// ==========================================
// 商品目录后台 - 行级校验器
// ==========================================
// 阶段 1: 逐行校验，错误累积（不短路）
// 行号: 0 起始数据行序号 + 1（不含表头）
// ==========================================

use crate::domain::import::ImportRow;
use crate::domain::types::ProductSource;
use crate::importer::product_importer_trait::RowValidator;

// 导入模板列名
pub mod columns {
    pub const SKU: &str = "sku";
    pub const NAME: &str = "name";
    pub const SHORT_DESCRIPTION: &str = "shortDescription";
    pub const PRODUCT_DETAIL: &str = "productDetail";
    pub const SOURCE: &str = "source";
    pub const BRAND_NAME: &str = "brandName";
    pub const MANUFACTURER_INFO: &str = "manufacturerInfo";
    pub const SOURCE_URL: &str = "sourceUrl";
    pub const WEIGHT: &str = "weight";
    pub const SIZE_CHART: &str = "sizeChart";
    pub const MANAGE_INVENTORY: &str = "manageInventory";
    pub const META_TITLE: &str = "metaTitle";
    pub const META_DESCRIPTION: &str = "metaDescription";
    pub const SLUG: &str = "slug";
    pub const ACTIVE: &str = "active";
    pub const VARIANT_SKU: &str = "variantSku";
    pub const VARIANT_NAME: &str = "variantName";
    pub const COLOR: &str = "color";
    pub const SIZE: &str = "size";
    pub const QUANTITY: &str = "quantity";
    pub const STOCK_STATUS: &str = "stockStatus";
    pub const REGULAR_PRICE: &str = "regularPrice";
    pub const COST_PRICE: &str = "costPrice";
    pub const ON_SALE: &str = "onSale";
    pub const SALE_PRICE: &str = "salePrice";
    pub const VARIANT_ACTIVE: &str = "variantActive";
    pub const IMAGES: &str = "images";
}

/// 读取单元格（缺列视为空串），已 trim
pub(crate) fn cell<'a>(row: &'a ImportRow, column: &str) -> &'a str {
    row.get(column).map(|v| v.trim()).unwrap_or("")
}

/// 严格解析小数：整串可解析且为有限值
pub(crate) fn parse_decimal(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 行标签（错误文本前缀）
pub(crate) fn row_label(row_index: usize) -> String {
    format!("Row {}", row_index + 1)
}

// ==========================================
// RowValidatorImpl
// ==========================================
pub struct RowValidatorImpl;

impl RowValidator for RowValidatorImpl {
    fn validate(&self, row: &ImportRow, row_index: usize) -> Vec<String> {
        let label = row_label(row_index);
        let mut errors = Vec::new();

        if cell(row, columns::SKU).is_empty() {
            errors.push(format!("{}: SKU is required", label));
        }

        if cell(row, columns::NAME).is_empty() {
            errors.push(format!("{}: Product name is required", label));
        }

        if ProductSource::parse(cell(row, columns::SOURCE)).is_none() {
            errors.push(format!("{}: Valid source (offline/online/own) is required", label));
        }

        if parse_decimal(cell(row, columns::REGULAR_PRICE)).is_none() {
            errors.push(format!("{}: Valid regular price is required", label));
        }

        let weight = cell(row, columns::WEIGHT);
        if !weight.is_empty() && parse_decimal(weight).is_none() {
            errors.push(format!("{}: Weight must be a valid number", label));
        }

        errors
    }
}
