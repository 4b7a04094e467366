// ==========================================
// VariantApi 集成测试
// ==========================================

mod test_helpers;

use catalog_admin::api::{ApiError, ProductInput, VariantInput};
use catalog_admin::domain::{NewProduct, NewVariant, ProductDetail, ProductSource, VariantPatch};
use catalog_admin::app::AppState;
use catalog_admin::logging;
use test_helpers::create_test_state;

fn create_product(state: &AppState, sku: &str) -> ProductDetail {
    state
        .product_api
        .create_product(ProductInput {
            product: NewProduct::new(sku, format!("Product {}", sku), ProductSource::Online),
            variants: Vec::new(),
        })
        .unwrap()
}

fn variant_input(product_id: i64, sku: &str, price: f64) -> VariantInput {
    let mut variant = NewVariant::default_for(sku, "Large", price);
    variant.sku = sku.to_string();
    variant.size = Some("L".to_string());
    VariantInput {
        product_id,
        variant,
    }
}

#[test]
fn test_create_and_get_variant() {
    logging::init_test();
    let (_temp_file, state) = create_test_state().unwrap();
    let product = create_product(&state, "V-1");

    let created = state
        .variant_api
        .create_variant(variant_input(product.product.id, "V-1-L", 12.5))
        .unwrap();
    assert_eq!(created.product_id, product.product.id);
    assert_eq!(created.size.as_deref(), Some("L"));

    let detail = state.variant_api.get_variant(created.id).unwrap();
    assert_eq!(detail.variant.sku, "V-1-L");
    assert_eq!(detail.product.sku, "V-1");
    assert_eq!(detail.product.source, ProductSource::Online);

    let err = state.variant_api.get_variant(9_999).unwrap_err();
    assert_eq!(err.to_string(), "Variant not found");
}

#[test]
fn test_create_variant_rejections() {
    logging::init_test();
    let (_temp_file, state) = create_test_state().unwrap();
    let product = create_product(&state, "V-2");

    let err = state
        .variant_api
        .create_variant(variant_input(product.product.id, " ", 1.0))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Product ID, SKU, name, and regular price are required"
    );

    let err = state
        .variant_api
        .create_variant(variant_input(product.product.id, "V-2-DEFAULT", 1.0))
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    let err = state
        .variant_api
        .create_variant(variant_input(9_999, "ORPHAN", 1.0))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.to_string(), "Product not found");
}

#[test]
fn test_update_variant() {
    logging::init_test();
    let (_temp_file, state) = create_test_state().unwrap();
    let product = create_product(&state, "V-3");
    let extra = state
        .variant_api
        .create_variant(variant_input(product.product.id, "V-3-L", 20.0))
        .unwrap();

    let updated = state
        .variant_api
        .update_variant(
            extra.id,
            VariantPatch {
                regular_price: Some(18.0),
                on_sale: Some(true),
                sale_price: Some(15.0),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.regular_price, 18.0);
    assert!(updated.on_sale);
    assert_eq!(updated.sale_price, Some(15.0));
    assert_eq!(updated.sku, "V-3-L");
    assert_eq!(updated.size.as_deref(), Some("L"));

    let err = state
        .variant_api
        .update_variant(
            extra.id,
            VariantPatch {
                sku: Some("V-3-DEFAULT".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Another variant with this SKU already exists");

    let err = state
        .variant_api
        .update_variant(
            extra.id,
            VariantPatch {
                regular_price: Some(f64::NAN),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_cannot_delete_last_variant() {
    logging::init_test();
    let (_temp_file, state) = create_test_state().unwrap();
    let product = create_product(&state, "V-4");
    let default_id = product.variants[0].id;

    let err = state.variant_api.delete_variant(default_id).unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    assert_eq!(err.to_string(), "Cannot delete the last variant of a product");

    let extra = state
        .variant_api
        .create_variant(variant_input(product.product.id, "V-4-L", 5.0))
        .unwrap();
    state.variant_api.delete_variant(default_id).unwrap();

    let remaining = state.product_api.get_product(product.product.id).unwrap();
    assert_eq!(remaining.variants.len(), 1);
    assert_eq!(remaining.variants[0].id, extra.id);
}
