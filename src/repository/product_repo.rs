// ==========================================
// 商品目录后台 - 商品数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

use crate::domain::product::{NewImage, NewProduct, NewVariant, Product, ProductDetail, ProductImage};
use crate::domain::types::ProductSource;
use crate::repository::db_utils::{ts_from_db, ts_to_db};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::variant_repo::{insert_variant_tx, map_variant_row, VARIANT_COLUMNS};
use chrono::Utc;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub(crate) const PRODUCT_COLUMNS: &str = r#"
    id, sku, name, short_description, product_detail, source,
    brand_name, manufacturer_info, source_url, weight, size_chart,
    manage_inventory, meta_title, meta_description, slug, active,
    batch_id, created_at, updated_at
"#;

/// 商品列表过滤条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// 名称/SKU/品牌 模糊匹配
    pub search: Option<String>,
    pub source: Option<ProductSource>,
    pub active: Option<bool>,
}

impl ProductFilter {
    /// 生成 WHERE 子句与参数
    fn to_where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(search) = self.search.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            clauses.push(
                "(name LIKE ? ESCAPE '\\' OR sku LIKE ? ESCAPE '\\' OR brand_name LIKE ? ESCAPE '\\')"
                    .to_string(),
            );
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern));
        }
        if let Some(source) = self.source {
            clauses.push("source = ?".to_string());
            values.push(Value::Text(source.to_db_str().to_string()));
        }
        if let Some(active) = self.active {
            clauses.push("active = ?".to_string());
            values.push(Value::Integer(active as i64));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

/// 转义 LIKE 通配符，搭配 ESCAPE '\' 使用
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// 行映射: product
pub(crate) fn map_product_row(row: &Row) -> SqliteResult<Product> {
    let source_raw: String = row.get(5)?;
    let source = ProductSource::parse(&source_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown product source: {}", source_raw).into(),
        )
    })?;

    Ok(Product {
        id: row.get(0)?,
        sku: row.get(1)?,
        name: row.get(2)?,
        short_description: row.get(3)?,
        product_detail: row.get(4)?,
        source,
        brand_name: row.get(6)?,
        manufacturer_info: row.get(7)?,
        source_url: row.get(8)?,
        weight: row.get(9)?,
        size_chart: row.get(10)?,
        manage_inventory: row.get::<_, i64>(11)? != 0,
        meta_title: row.get(12)?,
        meta_description: row.get(13)?,
        slug: row.get(14)?,
        active: row.get::<_, i64>(15)? != 0,
        batch_id: row.get(16)?,
        created_at: ts_from_db(17, &row.get::<_, String>(17)?)?,
        updated_at: ts_from_db(18, &row.get::<_, String>(18)?)?,
    })
}

/// 在事务中插入商品，返回自增 ID
pub(crate) fn insert_product_tx(conn: &Connection, product: &NewProduct) -> SqliteResult<i64> {
    let now = ts_to_db(&Utc::now());
    conn.execute(
        r#"
        INSERT INTO product (
            sku, name, short_description, product_detail, source,
            brand_name, manufacturer_info, source_url, weight, size_chart,
            manage_inventory, meta_title, meta_description, slug, active,
            batch_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)
        "#,
        params![
            product.sku,
            product.name,
            product.short_description,
            product.product_detail,
            product.source.to_db_str(),
            product.brand_name,
            product.manufacturer_info,
            product.source_url,
            product.weight,
            product.size_chart,
            product.manage_inventory as i64,
            product.meta_title,
            product.meta_description,
            product.slug,
            product.active as i64,
            product.batch_id,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// 在事务中插入商品图片
pub(crate) fn insert_image_tx(conn: &Connection, product_id: i64, image: &NewImage) -> SqliteResult<i64> {
    conn.execute(
        "INSERT INTO product_image (product_id, image_url, alt_text, sort_order) VALUES (?1, ?2, ?3, ?4)",
        params![product_id, image.image_url, image.alt_text, image.sort_order],
    )?;
    Ok(conn.last_insert_rowid())
}

/// 按商品 ID 读取详情（规格 + 图片）
pub(crate) fn load_detail(conn: &Connection, product_id: i64) -> SqliteResult<Option<ProductDetail>> {
    let product = conn
        .query_row(
            &format!("SELECT {} FROM product WHERE id = ?1", PRODUCT_COLUMNS),
            params![product_id],
            map_product_row,
        )
        .optional()?;

    let product = match product {
        Some(p) => p,
        None => return Ok(None),
    };

    let variants = conn
        .prepare(&format!(
            "SELECT {} FROM product_variant WHERE product_id = ?1 ORDER BY id ASC",
            VARIANT_COLUMNS
        ))?
        .query_map(params![product_id], map_variant_row)?
        .collect::<SqliteResult<Vec<_>>>()?;

    let images = load_images(conn, product_id)?;

    Ok(Some(ProductDetail {
        product,
        variants,
        images,
    }))
}

fn load_images(conn: &Connection, product_id: i64) -> SqliteResult<Vec<ProductImage>> {
    conn.prepare(
        r#"
        SELECT id, product_id, image_url, alt_text, sort_order
        FROM product_image
        WHERE product_id = ?1
        ORDER BY sort_order ASC, id ASC
        "#,
    )?
    .query_map(params![product_id], |row| {
        Ok(ProductImage {
            id: row.get(0)?,
            product_id: row.get(1)?,
            image_url: row.get(2)?,
            alt_text: row.get(3)?,
            sort_order: row.get(4)?,
        })
    })?
    .collect()
}

// ==========================================
// ProductRepository - 商品仓储
// ==========================================
/// 商品仓储
/// 职责: 管理 product / product_image 表的 CRUD 操作
/// 红线: 不含业务逻辑，只负责数据访问
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    /// 创建新的 ProductRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 SKU 点查
    pub fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let product = conn
            .query_row(
                &format!("SELECT {} FROM product WHERE sku = ?1", PRODUCT_COLUMNS),
                params![sku],
                map_product_row,
            )
            .optional()?;
        Ok(product)
    }

    /// SKU 是否已存在
    pub fn exists_sku(&self, sku: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM product WHERE sku = ?1", params![sku], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// 按 ID 查询商品（不含子表）
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let product = conn
            .query_row(
                &format!("SELECT {} FROM product WHERE id = ?1", PRODUCT_COLUMNS),
                params![id],
                map_product_row,
            )
            .optional()?;
        Ok(product)
    }

    /// 按 ID 查询商品详情（含规格与图片）
    pub fn find_detail(&self, id: i64) -> RepositoryResult<Option<ProductDetail>> {
        let conn = self.get_conn()?;
        Ok(load_detail(&conn, id)?)
    }

    /// 创建商品（商品 + 规格 + 图片，单事务）
    ///
    /// # 返回
    /// - Ok(ProductDetail): 落库后的商品详情
    /// - Err(UniqueConstraintViolation): 商品或规格 SKU 冲突（整体回滚）
    pub fn create(
        &self,
        product: &NewProduct,
        variants: &[NewVariant],
        images: &[NewImage],
    ) -> RepositoryResult<ProductDetail> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let product_id = insert_product_tx(&tx, product)?;
        for variant in variants {
            insert_variant_tx(&tx, product_id, variant)?;
        }
        for image in images {
            insert_image_tx(&tx, product_id, image)?;
        }

        tx.commit()?;

        load_detail(&conn, product_id)?
            .ok_or_else(|| RepositoryError::not_found("Product", product_id))
    }

    /// 分页查询商品详情（按创建时间倒序）
    pub fn list(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<ProductDetail>> {
        let conn = self.get_conn()?;
        let (where_clause, mut values) = filter.to_where_clause();
        values.push(Value::Integer(limit));
        values.push(Value::Integer(offset));

        let ids = conn
            .prepare(&format!(
                "SELECT id FROM product {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                where_clause
            ))?
            .query_map(params_from_iter(values.iter()), |row| row.get::<_, i64>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut details = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(detail) = load_detail(&conn, id)? {
                details.push(detail);
            }
        }
        Ok(details)
    }

    /// 统计符合条件的商品数
    pub fn count(&self, filter: &ProductFilter) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let (where_clause, values) = filter.to_where_clause();
        let total = conn.query_row(
            &format!("SELECT COUNT(*) FROM product {}", where_clause),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 更新商品（全字段覆盖）
    pub fn update(&self, product: &Product) -> RepositoryResult<Product> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE product SET
                sku = ?2, name = ?3, short_description = ?4, product_detail = ?5,
                source = ?6, brand_name = ?7, manufacturer_info = ?8, source_url = ?9,
                weight = ?10, size_chart = ?11, manage_inventory = ?12, meta_title = ?13,
                meta_description = ?14, slug = ?15, active = ?16, updated_at = ?17
            WHERE id = ?1
            "#,
            params![
                product.id,
                product.sku,
                product.name,
                product.short_description,
                product.product_detail,
                product.source.to_db_str(),
                product.brand_name,
                product.manufacturer_info,
                product.source_url,
                product.weight,
                product.size_chart,
                product.manage_inventory as i64,
                product.meta_title,
                product.meta_description,
                product.slug,
                product.active as i64,
                ts_to_db(&product.updated_at),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Product", product.id));
        }

        conn.query_row(
            &format!("SELECT {} FROM product WHERE id = ?1", PRODUCT_COLUMNS),
            params![product.id],
            map_product_row,
        )
        .map_err(Into::into)
    }

    /// 删除商品（规格与图片级联删除）
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM product WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Product", id));
        }
        Ok(())
    }

    /// 查询商品图片（按 sort_order 升序）
    pub fn find_images(&self, product_id: i64) -> RepositoryResult<Vec<ProductImage>> {
        let conn = self.get_conn()?;
        Ok(load_images(&conn, product_id)?)
    }

    /// 按导入批次统计商品数
    pub fn count_by_batch(&self, batch_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let total = conn.query_row(
            "SELECT COUNT(*) FROM product WHERE batch_id = ?1",
            params![batch_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}
