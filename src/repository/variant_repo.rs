// ==========================================
// 商品目录后台 - 商品规格数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 规格 SKU 全局唯一（由表约束保证）
// ==========================================

use crate::domain::product::{NewVariant, ProductSummary, ProductVariant, VariantDetail};
use crate::domain::types::ProductSource;
use crate::repository::db_utils::{opt_json_from_db, ts_from_db, ts_to_db};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub(crate) const VARIANT_COLUMNS: &str = r#"
    id, product_id, sku, name, color, size, quantity, stock_status,
    regular_price, cost_price, on_sale, sale_price, discount_cost_price,
    variant_data, active, created_at, updated_at
"#;

/// 行映射: product_variant
pub(crate) fn map_variant_row(row: &Row) -> SqliteResult<ProductVariant> {
    Ok(ProductVariant {
        id: row.get(0)?,
        product_id: row.get(1)?,
        sku: row.get(2)?,
        name: row.get(3)?,
        color: row.get(4)?,
        size: row.get(5)?,
        quantity: row.get(6)?,
        stock_status: row.get::<_, i64>(7)? != 0,
        regular_price: row.get(8)?,
        cost_price: row.get(9)?,
        on_sale: row.get::<_, i64>(10)? != 0,
        sale_price: row.get(11)?,
        discount_cost_price: row.get(12)?,
        variant_data: opt_json_from_db(13, row.get(13)?)?,
        active: row.get::<_, i64>(14)? != 0,
        created_at: ts_from_db(15, &row.get::<_, String>(15)?)?,
        updated_at: ts_from_db(16, &row.get::<_, String>(16)?)?,
    })
}

fn variant_data_to_db(value: &Option<serde_json::Value>) -> Option<String> {
    value.as_ref().map(|v| v.to_string())
}

/// 在事务中插入规格，返回自增 ID
pub(crate) fn insert_variant_tx(
    conn: &Connection,
    product_id: i64,
    variant: &NewVariant,
) -> SqliteResult<i64> {
    let now = ts_to_db(&Utc::now());
    conn.execute(
        r#"
        INSERT INTO product_variant (
            product_id, sku, name, color, size, quantity, stock_status,
            regular_price, cost_price, on_sale, sale_price, discount_cost_price,
            variant_data, active, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
        "#,
        params![
            product_id,
            variant.sku,
            variant.name,
            variant.color,
            variant.size,
            variant.quantity,
            variant.stock_status as i64,
            variant.regular_price,
            variant.cost_price,
            variant.on_sale as i64,
            variant.sale_price,
            variant.discount_cost_price,
            variant_data_to_db(&variant.variant_data),
            variant.active as i64,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// ==========================================
// ProductVariantRepository - 规格仓储
// ==========================================
pub struct ProductVariantRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductVariantRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ProductVariant>> {
        let conn = self.get_conn()?;
        let variant = conn
            .query_row(
                &format!("SELECT {} FROM product_variant WHERE id = ?1", VARIANT_COLUMNS),
                params![id],
                map_variant_row,
            )
            .optional()?;
        Ok(variant)
    }

    pub fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<ProductVariant>> {
        let conn = self.get_conn()?;
        let variant = conn
            .query_row(
                &format!("SELECT {} FROM product_variant WHERE sku = ?1", VARIANT_COLUMNS),
                params![sku],
                map_variant_row,
            )
            .optional()?;
        Ok(variant)
    }

    /// 规格详情（含所属商品摘要）
    pub fn find_detail(&self, id: i64) -> RepositoryResult<Option<VariantDetail>> {
        let conn = self.get_conn()?;
        let variant = conn
            .query_row(
                &format!("SELECT {} FROM product_variant WHERE id = ?1", VARIANT_COLUMNS),
                params![id],
                map_variant_row,
            )
            .optional()?;

        let variant = match variant {
            Some(v) => v,
            None => return Ok(None),
        };

        let product = conn.query_row(
            "SELECT id, sku, name, source FROM product WHERE id = ?1",
            params![variant.product_id],
            |row| {
                let source_raw: String = row.get(3)?;
                let source = ProductSource::parse(&source_raw).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        Type::Text,
                        format!("unknown product source: {}", source_raw).into(),
                    )
                })?;
                Ok(ProductSummary {
                    id: row.get(0)?,
                    sku: row.get(1)?,
                    name: row.get(2)?,
                    source,
                })
            },
        )?;

        Ok(Some(VariantDetail { variant, product }))
    }

    /// 查询商品下全部规格（按 ID 升序）
    pub fn find_by_product(&self, product_id: i64) -> RepositoryResult<Vec<ProductVariant>> {
        let conn = self.get_conn()?;
        let variants = conn
            .prepare(&format!(
                "SELECT {} FROM product_variant WHERE product_id = ?1 ORDER BY id ASC",
                VARIANT_COLUMNS
            ))?
            .query_map(params![product_id], map_variant_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(variants)
    }

    pub fn count_by_product(&self, product_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let total = conn.query_row(
            "SELECT COUNT(*) FROM product_variant WHERE product_id = ?1",
            params![product_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 为已有商品新增规格
    ///
    /// # 错误
    /// - ForeignKeyViolation: 商品不存在
    /// - UniqueConstraintViolation: 规格 SKU 已存在
    pub fn create(&self, product_id: i64, variant: &NewVariant) -> RepositoryResult<ProductVariant> {
        let conn = self.get_conn()?;
        let id = insert_variant_tx(&conn, product_id, variant)?;
        conn.query_row(
            &format!("SELECT {} FROM product_variant WHERE id = ?1", VARIANT_COLUMNS),
            params![id],
            map_variant_row,
        )
        .map_err(Into::into)
    }

    /// 更新规格（全字段覆盖，product_id 不可变）
    pub fn update(&self, variant: &ProductVariant) -> RepositoryResult<ProductVariant> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE product_variant SET
                sku = ?2, name = ?3, color = ?4, size = ?5, quantity = ?6,
                stock_status = ?7, regular_price = ?8, cost_price = ?9, on_sale = ?10,
                sale_price = ?11, discount_cost_price = ?12, variant_data = ?13,
                active = ?14, updated_at = ?15
            WHERE id = ?1
            "#,
            params![
                variant.id,
                variant.sku,
                variant.name,
                variant.color,
                variant.size,
                variant.quantity,
                variant.stock_status as i64,
                variant.regular_price,
                variant.cost_price,
                variant.on_sale as i64,
                variant.sale_price,
                variant.discount_cost_price,
                variant_data_to_db(&variant.variant_data),
                variant.active as i64,
                ts_to_db(&variant.updated_at),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("ProductVariant", variant.id));
        }

        conn.query_row(
            &format!("SELECT {} FROM product_variant WHERE id = ?1", VARIANT_COLUMNS),
            params![variant.id],
            map_variant_row,
        )
        .map_err(Into::into)
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM product_variant WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ProductVariant", id));
        }
        Ok(())
    }
}
