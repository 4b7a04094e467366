// ==========================================
// 商品管理API
// ==========================================
// 职责: 商品增删改查（直通仓储，附带 SKU 预检）
// 约束: 新建商品至少带一个规格（未提供时生成默认规格）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::pagination::{normalize_page, page_offset, Pagination};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::product::{NewProduct, NewVariant, ProductDetail, ProductPatch};
use crate::domain::types::ProductSource;
use crate::repository::{ProductFilter, ProductRepository, ProductVariantRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// 商品列表查询参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub source: Option<ProductSource>,
    pub active: Option<bool>,
}

/// 新建商品请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(flatten)]
    pub product: NewProduct,
    /// 规格列表（为空时生成价格为 0 的默认规格）
    #[serde(default)]
    pub variants: Vec<NewVariant>,
}

/// 商品列表响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub products: Vec<ProductDetail>,
    pub pagination: Pagination,
}

/// 商品API
pub struct ProductApi {
    products: Arc<ProductRepository>,
    variants: Arc<ProductVariantRepository>,
    config: Arc<ConfigManager>,
}

impl ProductApi {
    pub fn new(
        products: Arc<ProductRepository>,
        variants: Arc<ProductVariantRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            products,
            variants,
            config,
        }
    }

    /// 分页查询商品（含规格与图片）
    pub async fn list_products(&self, query: ProductQuery) -> ApiResult<ProductListResponse> {
        let default_limit = self.config.get_default_page_size().await?;
        let (page, limit) = normalize_page(query.page, query.limit, default_limit);

        let filter = ProductFilter {
            search: query.search,
            source: query.source,
            active: query.active,
        };

        let products = self.products.list(&filter, limit, page_offset(page, limit))?;
        let total = self.products.count(&filter)?;

        Ok(ProductListResponse {
            products,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// 查询商品详情
    pub fn get_product(&self, id: i64) -> ApiResult<ProductDetail> {
        self.products
            .find_detail(id)?
            .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
    }

    /// 新建商品
    pub fn create_product(&self, input: ProductInput) -> ApiResult<ProductDetail> {
        let mut product = input.product;
        product.sku = product.sku.trim().to_string();
        product.name = product.name.trim().to_string();

        if product.sku.is_empty() || product.name.is_empty() {
            return Err(ApiError::InvalidInput(
                "SKU, name, and source are required".to_string(),
            ));
        }
        if let Some(weight) = product.weight {
            if !weight.is_finite() {
                return Err(ApiError::InvalidInput("Weight must be a valid number".to_string()));
            }
        }
        if product.source.forces_inventory() {
            product.manage_inventory = true;
        }

        if self.products.exists_sku(&product.sku)? {
            return Err(ApiError::Conflict(
                "Product with this SKU already exists".to_string(),
            ));
        }

        let variants = if input.variants.is_empty() {
            vec![NewVariant::default_for(&product.sku, &product.name, 0.0)]
        } else {
            input.variants
        };
        for variant in &variants {
            if self.variants.find_by_sku(&variant.sku)?.is_some() {
                return Err(ApiError::Conflict(
                    "Variant with this SKU already exists".to_string(),
                ));
            }
        }

        let detail = self.products.create(&product, &variants, &[])?;
        info!(product_id = detail.product.id, sku = %detail.product.sku, "商品已创建");
        Ok(detail)
    }

    /// 更新商品（未提供的字段保持不变）
    pub fn update_product(&self, id: i64, patch: ProductPatch) -> ApiResult<ProductDetail> {
        let existing = self
            .products
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

        if let Some(sku) = patch.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if sku != existing.sku && self.products.exists_sku(sku)? {
                return Err(ApiError::Conflict(
                    "Another product with this SKU already exists".to_string(),
                ));
            }
        }

        let updated = patch.apply_to(&existing);
        self.products.update(&updated)?;
        info!(product_id = id, "商品已更新");
        self.get_product(id)
    }

    /// 删除商品（规格与图片级联删除）
    pub fn delete_product(&self, id: i64) -> ApiResult<()> {
        if self.products.find_by_id(id)?.is_none() {
            return Err(ApiError::NotFound("Product not found".to_string()));
        }
        self.products.delete(id)?;
        info!(product_id = id, "商品已删除");
        Ok(())
    }
}
