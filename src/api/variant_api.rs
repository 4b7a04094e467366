// ==========================================
// 商品规格API
// ==========================================
// 职责: 规格增删改查
// 约束: 不允许删除商品的最后一个规格
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::product::{NewVariant, ProductVariant, VariantDetail, VariantPatch};
use crate::repository::{ProductRepository, ProductVariantRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// 新建规格请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    pub product_id: i64,
    #[serde(flatten)]
    pub variant: NewVariant,
}

/// 规格API
pub struct VariantApi {
    products: Arc<ProductRepository>,
    variants: Arc<ProductVariantRepository>,
}

impl VariantApi {
    pub fn new(products: Arc<ProductRepository>, variants: Arc<ProductVariantRepository>) -> Self {
        Self { products, variants }
    }

    /// 为已有商品新增规格
    pub fn create_variant(&self, input: VariantInput) -> ApiResult<ProductVariant> {
        let mut variant = input.variant;
        variant.sku = variant.sku.trim().to_string();
        variant.name = variant.name.trim().to_string();

        if input.product_id <= 0
            || variant.sku.is_empty()
            || variant.name.is_empty()
            || !variant.regular_price.is_finite()
        {
            return Err(ApiError::InvalidInput(
                "Product ID, SKU, name, and regular price are required".to_string(),
            ));
        }

        if self.variants.find_by_sku(&variant.sku)?.is_some() {
            return Err(ApiError::Conflict(
                "Variant with this SKU already exists".to_string(),
            ));
        }

        if self.products.find_by_id(input.product_id)?.is_none() {
            return Err(ApiError::NotFound("Product not found".to_string()));
        }

        let created = self.variants.create(input.product_id, &variant)?;
        info!(variant_id = created.id, product_id = input.product_id, "规格已创建");
        Ok(created)
    }

    /// 查询规格（含所属商品摘要）
    pub fn get_variant(&self, id: i64) -> ApiResult<VariantDetail> {
        self.variants
            .find_detail(id)?
            .ok_or_else(|| ApiError::NotFound("Variant not found".to_string()))
    }

    /// 更新规格（未提供的字段保持不变）
    pub fn update_variant(&self, id: i64, patch: VariantPatch) -> ApiResult<ProductVariant> {
        let existing = self
            .variants
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound("Variant not found".to_string()))?;

        if let Some(sku) = patch.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if sku != existing.sku && self.variants.find_by_sku(sku)?.is_some() {
                return Err(ApiError::Conflict(
                    "Another variant with this SKU already exists".to_string(),
                ));
            }
        }
        if let Some(price) = patch.regular_price {
            if !price.is_finite() {
                return Err(ApiError::InvalidInput(
                    "Valid regular price is required".to_string(),
                ));
            }
        }

        let updated = self.variants.update(&patch.apply_to(&existing))?;
        info!(variant_id = id, "规格已更新");
        Ok(updated)
    }

    /// 删除规格
    pub fn delete_variant(&self, id: i64) -> ApiResult<()> {
        let existing = self
            .variants
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound("Variant not found".to_string()))?;

        if self.variants.count_by_product(existing.product_id)? <= 1 {
            return Err(ApiError::BusinessRuleViolation(
                "Cannot delete the last variant of a product".to_string(),
            ));
        }

        self.variants.delete(id)?;
        info!(variant_id = id, product_id = existing.product_id, "规格已删除");
        Ok(())
    }
}
