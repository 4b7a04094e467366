// ==========================================
// ProductImporter 集成测试
// ==========================================
// 测试目标: 验证完整的商品导入流程（真实 SQLite）
// ==========================================

mod test_helpers;

use catalog_admin::config::{config_keys, ConfigManager};
use catalog_admin::domain::{BatchCompletion, BatchStatus};
use catalog_admin::importer::{ImportError, ProductImporter, ProductImporterImpl};
use catalog_admin::logging;
use catalog_admin::repository::{
    CatalogImportRepositoryImpl, ProductRepository, ProductVariantRepository, RepositoryError,
    UploadBatchRepository,
};
use test_helpers::{create_test_db, csv_bytes, seed_product, CSV_HEADER};

/// 创建测试用的 ProductImporter 实例
fn create_test_importer(
    db_path: &str,
) -> ProductImporterImpl<CatalogImportRepositoryImpl, ConfigManager> {
    let import_repo =
        CatalogImportRepositoryImpl::new(db_path).expect("Failed to create CatalogImportRepository");
    let config = ConfigManager::new(db_path).expect("Failed to create ConfigManager");

    ProductImporterImpl::with_default_components(import_repo, config)
}

#[tokio::test]
async fn test_import_valid_fixture() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let importer = create_test_importer(&db_path);

    let outcome = importer
        .import_file("tests/fixtures/products_valid.csv")
        .await
        .expect("Import should succeed");

    assert_eq!(outcome.batch.status, BatchStatus::Completed);
    assert_eq!(outcome.batch.filename, "products_valid.csv");
    assert_eq!(outcome.batch.total_rows, 3);
    assert_eq!(outcome.batch.processed_rows, 3);
    assert_eq!(outcome.batch.success_rows, 3);
    assert_eq!(outcome.batch.error_rows, 0);
    assert!(outcome.batch.error_log.is_none());
    assert!(outcome.batch.completed_at.is_some());

    let products = ProductRepository::new(&db_path).unwrap();
    let variants = ProductVariantRepository::new(&db_path).unwrap();
    assert_eq!(products.count_by_batch(&outcome.batch.batch_id).unwrap(), 3);

    // 自有商品强制管理库存，显式规格 SKU
    let tee = products.find_by_sku("TEE-001").unwrap().expect("TEE-001 should exist");
    assert!(tee.manage_inventory);
    assert_eq!(tee.weight, Some(0.2));
    assert_eq!(tee.batch_id.as_deref(), Some(outcome.batch.batch_id.as_str()));
    let tee_variant = variants.find_by_sku("TEE-001-BLK-M").unwrap().unwrap();
    assert_eq!(tee_variant.product_id, tee.id);
    assert_eq!(tee_variant.quantity, 10);
    assert_eq!(tee_variant.color.as_deref(), Some("Black"));
    assert!((tee_variant.regular_price - 19.99).abs() < 1e-9);

    // 缺省规格 SKU / 数量
    let mug = products.find_by_sku("MUG-001").unwrap().unwrap();
    assert!(!mug.manage_inventory);
    let mug_variant = variants.find_by_sku("MUG-001-DEFAULT").unwrap().unwrap();
    assert_eq!(mug_variant.quantity, 0);
    assert_eq!(mug_variant.name, "Coffee Mug");

    let mug_images = products.find_images(mug.id).unwrap();
    assert_eq!(mug_images.len(), 1);
    assert_eq!(mug_images[0].image_url, "https://cdn.example.com/mug.jpg");
    assert_eq!(mug_images[0].sort_order, 0);

    let cap = products.find_by_sku("CAP-001").unwrap().unwrap();
    assert!(products.find_images(cap.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_import_excel_fixture() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let importer = create_test_importer(&db_path);

    let outcome = importer
        .import_file("tests/fixtures/products_valid.xlsx")
        .await
        .expect("Excel import should succeed");

    // 空白行不计入总行数
    assert_eq!(outcome.batch.status, BatchStatus::Completed);
    assert_eq!(outcome.batch.filename, "products_valid.xlsx");
    assert_eq!(outcome.batch.total_rows, 2);
    assert_eq!(outcome.batch.success_rows, 2);
    assert!(outcome.batch.error_log.is_none());

    let products = ProductRepository::new(&db_path).unwrap();
    let variants = ProductVariantRepository::new(&db_path).unwrap();

    // 数值单元格按文本读取后再解析
    let fan = products.find_by_sku("XL-001").unwrap().expect("XL-001 should exist");
    assert_eq!(fan.name, "Desk Fan");
    assert!(fan.manage_inventory);
    assert_eq!(fan.weight, Some(1.25));
    let fan_variant = variants.find_by_sku("XL-001-DEFAULT").unwrap().unwrap();
    assert_eq!(fan_variant.regular_price, 9.5);
    assert_eq!(fan_variant.quantity, 3);
    let fan_images = products.find_images(fan.id).unwrap();
    assert_eq!(fan_images.len(), 1);
    assert_eq!(fan_images[0].image_url, "https://cdn.example.com/fan.jpg");

    let clock = products.find_by_sku("XL-002").unwrap().unwrap();
    assert!(!clock.manage_inventory);
    assert!(clock.weight.is_none());
    let clock_variant = variants.find_by_sku("XL-002-WHT").unwrap().unwrap();
    assert_eq!(clock_variant.product_id, clock.id);
    assert_eq!(clock_variant.regular_price, 24.0);
    assert_eq!(clock_variant.quantity, 0);
    assert_eq!(clock_variant.name, "Wall Clock");
}

#[tokio::test]
async fn test_import_invalid_fixture_rejects_whole_batch() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let importer = create_test_importer(&db_path);

    let outcome = importer
        .import_file("tests/fixtures/products_invalid.csv")
        .await
        .expect("Rejected batch is still an outcome");

    assert_eq!(outcome.batch.status, BatchStatus::Failed);
    assert_eq!(outcome.batch.total_rows, 4);
    assert_eq!(outcome.batch.processed_rows, 0);
    assert_eq!(outcome.batch.success_rows, 0);
    assert_eq!(outcome.batch.error_rows, 0);
    assert!(outcome.commit.is_none());

    // 错误累积，不短路
    let report = &outcome.report;
    assert_eq!(report.validation_errors.len(), 5);
    assert_eq!(report.validation_errors[0], "Row 1: SKU is required");
    assert!(report
        .validation_errors
        .contains(&"Row 4: Weight must be a valid number".to_string()));
    assert_eq!(
        report.duplicate_skus,
        vec!["Row 4: Duplicate SKU 'DUP-1' found in CSV".to_string()]
    );

    // 存储的错误日志保留完整列表
    let log = outcome.batch.error_log.as_ref().expect("error log stored");
    assert_eq!(log.validation_errors.len(), 5);
    assert_eq!(log.duplicate_skus.len(), 1);
    assert!(log.processing_errors.is_empty());

    let products = ProductRepository::new(&db_path).unwrap();
    assert_eq!(products.count(&Default::default()).unwrap(), 0);
}

#[tokio::test]
async fn test_existing_sku_blocks_batch() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_product(&db_path, "OLD-1", "OLD-1-V").unwrap();
    let importer = create_test_importer(&db_path);

    let bytes = csv_bytes(
        CSV_HEADER,
        &["NEW-1,New,own,5,,,,", "OLD-1,Old again,own,6,,,,", "OLD-1,Twice,own,7,,,,"],
    );
    let outcome = importer
        .import_bytes("dups.csv", "text/csv", &bytes)
        .await
        .unwrap();

    assert_eq!(outcome.batch.status, BatchStatus::Failed);
    // 按行号排序；同一行内先报文件内重复，再报库内重复
    assert_eq!(
        outcome.report.duplicate_skus,
        vec![
            "Row 2: SKU 'OLD-1' already exists in database".to_string(),
            "Row 3: Duplicate SKU 'OLD-1' found in CSV".to_string(),
            "Row 3: SKU 'OLD-1' already exists in database".to_string(),
        ]
    );

    // 未落库任何行
    let products = ProductRepository::new(&db_path).unwrap();
    assert!(products.find_by_sku("NEW-1").unwrap().is_none());
}

#[tokio::test]
async fn test_row_failure_does_not_stop_batch() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    // 第 2 行的规格 SKU 与已有规格冲突，仅在落库时暴露
    seed_product(&db_path, "SEED-1", "TAKEN-V").unwrap();
    let importer = create_test_importer(&db_path);

    let bytes = csv_bytes(
        CSV_HEADER,
        &[
            "R-1,First,online,1,,,,",
            "R-2,Second,online,2,,TAKEN-V,,",
            "R-3,Third,online,3,,,,",
        ],
    );
    let outcome = importer
        .import_bytes("partial.csv", "text/csv", &bytes)
        .await
        .unwrap();

    assert_eq!(outcome.batch.status, BatchStatus::Failed);
    assert_eq!(outcome.batch.processed_rows, 3);
    assert_eq!(outcome.batch.success_rows, 2);
    assert_eq!(outcome.batch.error_rows, 1);

    let log = outcome.batch.error_log.as_ref().expect("processing errors stored");
    assert_eq!(log.processing_errors.len(), 1);
    assert!(log.processing_errors[0].starts_with("Row 2: "));

    let products = ProductRepository::new(&db_path).unwrap();
    assert!(products.find_by_sku("R-1").unwrap().is_some());
    // 单行事务：失败行不留下半成品商品
    assert!(products.find_by_sku("R-2").unwrap().is_none());
    assert!(products.find_by_sku("R-3").unwrap().is_some());
}

#[tokio::test]
async fn test_quoted_images_in_rfc4180_mode() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    ConfigManager::new(&db_path)
        .unwrap()
        .set_global_config_value(config_keys::CSV_MODE, "rfc4180")
        .unwrap();
    let importer = create_test_importer(&db_path);

    let bytes = csv_bytes(
        "sku,name,source,regularPrice,images",
        &["LAMP-1,\"Desk Lamp, Brass\",own,20,\"u1, u2,, u3\""],
    );
    let outcome = importer
        .import_bytes("lamps.csv", "text/csv", &bytes)
        .await
        .unwrap();
    assert_eq!(outcome.batch.status, BatchStatus::Completed);

    let products = ProductRepository::new(&db_path).unwrap();
    let lamp = products.find_by_sku("LAMP-1").unwrap().unwrap();
    assert_eq!(lamp.name, "Desk Lamp, Brass");

    let images = products.find_images(lamp.id).unwrap();
    let urls: Vec<&str> = images.iter().map(|i| i.image_url.as_str()).collect();
    let orders: Vec<i64> = images.iter().map(|i| i.sort_order).collect();
    assert_eq!(urls, vec!["u1", "u2", "u3"]);
    assert_eq!(orders, vec![0, 1, 2]);
    assert_eq!(images[2].alt_text.as_deref(), Some("Desk Lamp, Brass - Image 3"));
}

#[tokio::test]
async fn test_empty_file_creates_no_batch() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let importer = create_test_importer(&db_path);

    let result = importer
        .import_bytes("empty.csv", "text/csv", b"sku,name,source,regularPrice\n")
        .await;
    assert!(matches!(result, Err(ImportError::EmptyFile)));

    let batches = UploadBatchRepository::new(&db_path).unwrap();
    assert_eq!(batches.count().unwrap(), 0);
}

#[tokio::test]
async fn test_terminal_batch_cannot_complete_twice() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let importer = create_test_importer(&db_path);

    let bytes = csv_bytes(CSV_HEADER, &["T-1,Once,offline,4,,,,"]);
    let outcome = importer
        .import_bytes("once.csv", "text/csv", &bytes)
        .await
        .unwrap();
    assert_eq!(outcome.batch.status, BatchStatus::Completed);

    let batches = UploadBatchRepository::new(&db_path).unwrap();
    let again = BatchCompletion {
        status: BatchStatus::Failed,
        processed_rows: 0,
        success_rows: 0,
        error_rows: 0,
        error_log: None,
    };
    let result = batches.complete(&outcome.batch.batch_id, &again);
    assert!(matches!(
        result,
        Err(RepositoryError::InvalidStateTransition { .. })
    ));

    let stored = batches.find_by_id(&outcome.batch.batch_id).unwrap().unwrap();
    assert_eq!(stored.status, BatchStatus::Completed);
    assert_eq!(stored.success_rows, 1);
}
