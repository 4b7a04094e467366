// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use catalog_admin::app::AppState;
use catalog_admin::db::{init_schema, open_sqlite_connection};
use catalog_admin::domain::{NewProduct, NewVariant, ProductDetail, ProductSource};
use catalog_admin::repository::ProductRepository;
use std::error::Error;
use tempfile::NamedTempFile;

/// 商品导入模板表头（常用列）
pub const CSV_HEADER: &str = "sku,name,source,regularPrice,weight,variantSku,quantity,images";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建临时数据库上的 AppState（不校验会话）
pub fn create_test_state() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let state = AppState::new(db_path, None)?;
    Ok((temp_file, state))
}

/// 直接写入一个带单规格的商品
pub fn seed_product(
    db_path: &str,
    sku: &str,
    variant_sku: &str,
) -> Result<ProductDetail, Box<dyn Error>> {
    let repo = ProductRepository::new(db_path)?;
    let product = NewProduct::new(sku, format!("Seed {}", sku), ProductSource::Online);
    let mut variant = NewVariant::default_for(sku, &product.name, 10.0);
    variant.sku = variant_sku.to_string();
    Ok(repo.create(&product, &[variant], &[])?)
}

/// 以表头 + 数据行拼出 CSV 字节
pub fn csv_bytes(header: &str, rows: &[&str]) -> Vec<u8> {
    let mut text = String::from(header);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    text.into_bytes()
}
