// ==========================================
// 商品目录后台 - 商品领域模型
// ==========================================
// 实体: Product（父）/ ProductVariant（子）/ ProductImage（子）
// 约束: 商品 SKU 全局唯一，规格 SKU 全局唯一（独立命名空间）
// 约束: 商品创建后至少有一个规格
// ==========================================

use crate::domain::types::ProductSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Product - 商品主数据
// ==========================================
// 对齐: product 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub sku: String,                          // 商品 SKU（全局唯一）
    pub name: String,                         // 商品名称
    pub short_description: Option<String>,    // 简介
    pub product_detail: Option<String>,       // 详情
    pub source: ProductSource,                // 来源
    pub brand_name: Option<String>,           // 品牌
    pub manufacturer_info: Option<String>,    // 厂商信息
    pub source_url: Option<String>,           // 来源链接
    pub weight: Option<f64>,                  // 重量
    pub size_chart: Option<String>,           // 尺码表
    pub manage_inventory: bool,               // 是否管理库存
    pub meta_title: Option<String>,           // SEO 标题
    pub meta_description: Option<String>,     // SEO 描述
    pub slug: Option<String>,                 // URL 别名
    pub active: bool,                         // 是否上架
    pub batch_id: Option<String>,             // 导入批次 ID（手工创建为空）
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// ProductVariant - 商品规格
// ==========================================
// 对齐: product_variant 表（product_id 外键，级联删除）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub sku: String,                          // 规格 SKU（全局唯一）
    pub name: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: i64,                        // 库存数量
    pub stock_status: bool,                   // 是否有货
    pub regular_price: f64,                   // 标价
    pub cost_price: Option<f64>,              // 成本价
    pub on_sale: bool,                        // 是否促销
    pub sale_price: Option<f64>,              // 促销价
    pub discount_cost_price: Option<f64>,     // 折扣成本价
    pub variant_data: Option<serde_json::Value>, // 扩展数据
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// ProductImage - 商品图片
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub sort_order: i64,                      // 展示顺序（从 0 开始）
}

/// 商品详情（含规格与图片，图片按 sort_order 升序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
    pub images: Vec<ProductImage>,
}

/// 规格所属商品摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub source: ProductSource,
}

/// 规格详情（含所属商品摘要）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDetail {
    #[serde(flatten)]
    pub variant: ProductVariant,
    pub product: ProductSummary,
}

// ==========================================
// 写入模型（不含自增 ID 与时间戳）
// ==========================================

/// 待创建商品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub short_description: Option<String>,
    pub product_detail: Option<String>,
    pub source: ProductSource,
    pub brand_name: Option<String>,
    pub manufacturer_info: Option<String>,
    pub source_url: Option<String>,
    pub weight: Option<f64>,
    pub size_chart: Option<String>,
    pub manage_inventory: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub slug: Option<String>,
    pub active: bool,
    pub batch_id: Option<String>,
}

impl NewProduct {
    /// 仅含必填字段的商品（其余字段取默认值）
    pub fn new(sku: impl Into<String>, name: impl Into<String>, source: ProductSource) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            short_description: None,
            product_detail: None,
            source,
            brand_name: None,
            manufacturer_info: None,
            source_url: None,
            weight: None,
            size_chart: None,
            manage_inventory: source.forces_inventory(),
            meta_title: None,
            meta_description: None,
            slug: None,
            active: true,
            batch_id: None,
        }
    }
}

/// 待创建规格（product_id 由仓储在落库时绑定）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVariant {
    pub sku: String,
    pub name: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: i64,
    pub stock_status: bool,
    pub regular_price: f64,
    pub cost_price: Option<f64>,
    pub on_sale: bool,
    pub sale_price: Option<f64>,
    pub discount_cost_price: Option<f64>,
    pub variant_data: Option<serde_json::Value>,
    pub active: bool,
}

impl NewVariant {
    /// 商品的默认规格: SKU 为 `<商品SKU>-DEFAULT`
    pub fn default_for(product_sku: &str, name: &str, regular_price: f64) -> Self {
        Self {
            sku: default_variant_sku(product_sku),
            name: name.to_string(),
            color: None,
            size: None,
            quantity: 0,
            stock_status: true,
            regular_price,
            cost_price: None,
            on_sale: false,
            sale_price: None,
            discount_cost_price: None,
            variant_data: None,
            active: true,
        }
    }
}

/// 待创建图片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImage {
    pub image_url: String,
    pub alt_text: Option<String>,
    pub sort_order: i64,
}

/// 默认规格 SKU
pub fn default_variant_sku(product_sku: &str) -> String {
    format!("{}-DEFAULT", product_sku)
}

// ==========================================
// 更新模型（None 表示保持原值）
// ==========================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub short_description: Option<String>,
    pub product_detail: Option<String>,
    pub source: Option<ProductSource>,
    pub brand_name: Option<String>,
    pub manufacturer_info: Option<String>,
    pub source_url: Option<String>,
    pub weight: Option<f64>,
    pub size_chart: Option<String>,
    pub manage_inventory: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub slug: Option<String>,
    pub active: Option<bool>,
}

impl ProductPatch {
    /// 将补丁应用到已有商品
    pub fn apply_to(self, existing: &Product) -> Product {
        let mut updated = existing.clone();
        if let Some(sku) = self.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            updated.sku = sku.to_string();
        }
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            updated.name = name.to_string();
        }
        if let Some(source) = self.source {
            updated.source = source;
        }
        merge_opt(&mut updated.short_description, self.short_description);
        merge_opt(&mut updated.product_detail, self.product_detail);
        merge_opt(&mut updated.brand_name, self.brand_name);
        merge_opt(&mut updated.manufacturer_info, self.manufacturer_info);
        merge_opt(&mut updated.source_url, self.source_url);
        merge_opt(&mut updated.size_chart, self.size_chart);
        merge_opt(&mut updated.meta_title, self.meta_title);
        merge_opt(&mut updated.meta_description, self.meta_description);
        merge_opt(&mut updated.slug, self.slug);
        if self.weight.is_some() {
            updated.weight = self.weight;
        }
        if let Some(flag) = self.manage_inventory {
            updated.manage_inventory = flag;
        }
        // 自有商品始终管理库存
        if updated.source.forces_inventory() {
            updated.manage_inventory = true;
        }
        if let Some(active) = self.active {
            updated.active = active;
        }
        updated.updated_at = Utc::now();
        updated
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<i64>,
    pub stock_status: Option<bool>,
    pub regular_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub on_sale: Option<bool>,
    pub sale_price: Option<f64>,
    pub discount_cost_price: Option<f64>,
    pub variant_data: Option<serde_json::Value>,
    pub active: Option<bool>,
}

impl VariantPatch {
    pub fn apply_to(self, existing: &ProductVariant) -> ProductVariant {
        let mut updated = existing.clone();
        if let Some(sku) = self.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            updated.sku = sku.to_string();
        }
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            updated.name = name.to_string();
        }
        merge_opt(&mut updated.color, self.color);
        merge_opt(&mut updated.size, self.size);
        if let Some(quantity) = self.quantity {
            updated.quantity = quantity;
        }
        if let Some(stock_status) = self.stock_status {
            updated.stock_status = stock_status;
        }
        if let Some(price) = self.regular_price {
            updated.regular_price = price;
        }
        if self.cost_price.is_some() {
            updated.cost_price = self.cost_price;
        }
        if let Some(on_sale) = self.on_sale {
            updated.on_sale = on_sale;
        }
        if self.sale_price.is_some() {
            updated.sale_price = self.sale_price;
        }
        if self.discount_cost_price.is_some() {
            updated.discount_cost_price = self.discount_cost_price;
        }
        if self.variant_data.is_some() {
            updated.variant_data = self.variant_data;
        }
        if let Some(active) = self.active {
            updated.active = active;
        }
        updated.updated_at = Utc::now();
        updated
    }
}

fn merge_opt(target: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        let trimmed = v.trim();
        *target = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }
}
