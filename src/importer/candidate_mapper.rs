// ==========================================
// 商品目录后台 - 导入候选映射
// ==========================================
// 阶段 3: ImportRow → ImportCandidate（商品 + 默认规格 + 图片）
// 前置: 行校验与查重均已通过
// ==========================================

use crate::domain::import::{ImportCandidate, ImportRow};
use crate::domain::product::{default_variant_sku, NewImage, NewProduct, NewVariant};
use crate::domain::types::ProductSource;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::product_importer_trait::CandidateMapper;
use crate::importer::row_validator::{cell, columns, parse_decimal};

/// 非空单元格 → Some
fn opt_text(row: &ImportRow, column: &str) -> Option<String> {
    let value = cell(row, column);
    (!value.is_empty()).then(|| value.to_string())
}

/// 可选小数列：空 → None，非法 → 错误
fn opt_decimal(row: &ImportRow, column: &str) -> ImportResult<Option<f64>> {
    let value = cell(row, column);
    if value.is_empty() {
        return Ok(None);
    }
    parse_decimal(value)
        .map(Some)
        .ok_or_else(|| ImportError::InvalidNumber {
            field: column.to_string(),
            value: value.to_string(),
        })
}

/// 标记列：仅 "true" 为真
fn flag_true(row: &ImportRow, column: &str) -> bool {
    cell(row, column) == "true"
}

/// 标记列：除 "false" 外均为真（含缺省）
fn flag_not_false(row: &ImportRow, column: &str) -> bool {
    cell(row, column) != "false"
}

/// 图片列：逗号分隔，去空，顺序即展示顺序
pub fn split_images(raw: &str, product_name: &str) -> Vec<NewImage> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .enumerate()
        .map(|(k, url)| NewImage {
            image_url: url.to_string(),
            alt_text: Some(format!("{} - Image {}", product_name, k + 1)),
            sort_order: k as i64,
        })
        .collect()
}

pub struct CandidateMapperImpl;

impl CandidateMapper for CandidateMapperImpl {
    fn map_row(
        &self,
        row: &ImportRow,
        row_index: usize,
        batch_id: &str,
    ) -> ImportResult<ImportCandidate> {
        let sku = cell(row, columns::SKU).to_string();
        let name = cell(row, columns::NAME).to_string();
        let source = ProductSource::parse(cell(row, columns::SOURCE)).ok_or_else(|| {
            ImportError::FieldValueError {
                field: columns::SOURCE.to_string(),
                message: "expected offline, online or own".to_string(),
            }
        })?;
        let regular_price = parse_decimal(cell(row, columns::REGULAR_PRICE)).ok_or_else(|| {
            ImportError::InvalidNumber {
                field: columns::REGULAR_PRICE.to_string(),
                value: cell(row, columns::REGULAR_PRICE).to_string(),
            }
        })?;

        let product = NewProduct {
            sku: sku.clone(),
            name: name.clone(),
            short_description: opt_text(row, columns::SHORT_DESCRIPTION),
            product_detail: opt_text(row, columns::PRODUCT_DETAIL),
            source,
            brand_name: opt_text(row, columns::BRAND_NAME),
            manufacturer_info: opt_text(row, columns::MANUFACTURER_INFO),
            source_url: opt_text(row, columns::SOURCE_URL),
            weight: opt_decimal(row, columns::WEIGHT)?,
            size_chart: opt_text(row, columns::SIZE_CHART),
            // 自有商品强制管理库存
            manage_inventory: flag_true(row, columns::MANAGE_INVENTORY) || source.forces_inventory(),
            meta_title: opt_text(row, columns::META_TITLE),
            meta_description: opt_text(row, columns::META_DESCRIPTION),
            slug: opt_text(row, columns::SLUG),
            active: flag_not_false(row, columns::ACTIVE),
            batch_id: Some(batch_id.to_string()),
        };

        let quantity = match cell(row, columns::QUANTITY) {
            "" => 0,
            raw => raw.parse::<i64>().map_err(|_| ImportError::InvalidNumber {
                field: columns::QUANTITY.to_string(),
                value: raw.to_string(),
            })?,
        };

        let variant = NewVariant {
            sku: opt_text(row, columns::VARIANT_SKU).unwrap_or_else(|| default_variant_sku(&sku)),
            name: opt_text(row, columns::VARIANT_NAME).unwrap_or_else(|| name.clone()),
            color: opt_text(row, columns::COLOR),
            size: opt_text(row, columns::SIZE),
            quantity,
            stock_status: flag_not_false(row, columns::STOCK_STATUS),
            regular_price,
            cost_price: opt_decimal(row, columns::COST_PRICE)?,
            on_sale: flag_true(row, columns::ON_SALE),
            sale_price: opt_decimal(row, columns::SALE_PRICE)?,
            discount_cost_price: None,
            variant_data: None,
            active: flag_not_false(row, columns::VARIANT_ACTIVE),
        };

        let images = split_images(cell(row, columns::IMAGES), &name);

        Ok(ImportCandidate {
            row_number: row_index + 1,
            product,
            variant,
            images,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> ImportRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn minimal(extra: &[(&str, &str)]) -> ImportRow {
        let mut r = row(&[
            ("sku", "A1"),
            ("name", "Mug"),
            ("source", "online"),
            ("regularPrice", "12.5"),
        ]);
        for (k, v) in extra {
            r.insert(k.to_string(), v.to_string());
        }
        r
    }

    #[test]
    fn test_minimal_row_defaults() {
        let c = CandidateMapperImpl.map_row(&minimal(&[]), 0, "batch-1").unwrap();

        assert_eq!(c.row_number, 1);
        assert_eq!(c.product.batch_id.as_deref(), Some("batch-1"));
        assert!(c.product.active);
        assert!(!c.product.manage_inventory);
        assert_eq!(c.variant.sku, "A1-DEFAULT");
        assert_eq!(c.variant.name, "Mug");
        assert_eq!(c.variant.quantity, 0);
        assert!(c.variant.stock_status);
        assert!(!c.variant.on_sale);
        assert!(c.variant.active);
        assert_eq!(c.variant.regular_price, 12.5);
        assert!(c.images.is_empty());
    }

    #[test]
    fn test_flags_and_overrides() {
        let r = minimal(&[
            ("source", "own"),
            ("active", "false"),
            ("variantSku", "A1-RED"),
            ("variantName", "Mug red"),
            ("quantity", "7"),
            ("stockStatus", "false"),
            ("onSale", "true"),
            ("salePrice", "10"),
            ("variantActive", "no"),
        ]);

        let c = CandidateMapperImpl.map_row(&r, 4, "b").unwrap();

        assert_eq!(c.row_number, 5);
        assert!(c.product.manage_inventory);
        assert!(!c.product.active);
        assert_eq!(c.variant.sku, "A1-RED");
        assert_eq!(c.variant.name, "Mug red");
        assert_eq!(c.variant.quantity, 7);
        assert!(!c.variant.stock_status);
        assert!(c.variant.on_sale);
        assert_eq!(c.variant.sale_price, Some(10.0));
        // 仅 "false" 关闭
        assert!(c.variant.active);
    }

    #[test]
    fn test_images_are_filtered_and_ordered() {
        let r = minimal(&[("images", "u1, u2,, u3 ,")]);

        let c = CandidateMapperImpl.map_row(&r, 0, "b").unwrap();

        let got: Vec<_> = c
            .images
            .iter()
            .map(|i| (i.image_url.as_str(), i.sort_order, i.alt_text.as_deref()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("u1", 0, Some("Mug - Image 1")),
                ("u2", 1, Some("Mug - Image 2")),
                ("u3", 2, Some("Mug - Image 3")),
            ]
        );
    }

    #[test]
    fn test_unparseable_optional_number_is_error() {
        let err = CandidateMapperImpl
            .map_row(&minimal(&[("quantity", "many")]), 1, "b")
            .unwrap_err();
        assert_eq!(err.to_string(), "quantity must be a valid number");

        let err = CandidateMapperImpl
            .map_row(&minimal(&[("costPrice", "1,5")]), 1, "b")
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidNumber { .. }));
    }
}
