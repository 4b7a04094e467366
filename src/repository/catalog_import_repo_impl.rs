// ==========================================
// 商品目录后台 - 批量导入 Repository 实现
// ==========================================
// 职责: 组合商品仓储与批次仓储，共享同一连接
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::import::{BatchCompletion, ImportCandidate, UploadBatch};
use crate::repository::catalog_import_repo::CatalogImportRepository;
use crate::repository::error::RepositoryResult;
use crate::repository::product_repo::ProductRepository;
use crate::repository::upload_batch_repo::UploadBatchRepository;
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// CatalogImportRepositoryImpl
// ==========================================
pub struct CatalogImportRepositoryImpl {
    products: ProductRepository,
    batches: UploadBatchRepository,
}

impl CatalogImportRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            products: ProductRepository::from_connection(conn.clone()),
            batches: UploadBatchRepository::from_connection(conn),
        }
    }
}

#[async_trait]
impl CatalogImportRepository for CatalogImportRepositoryImpl {
    async fn exists_product_sku(&self, sku: &str) -> RepositoryResult<bool> {
        self.products.exists_sku(sku)
    }

    async fn create_batch(&self, batch: UploadBatch) -> RepositoryResult<()> {
        self.batches.create(&batch)
    }

    async fn complete_batch(
        &self,
        batch_id: &str,
        completion: BatchCompletion,
    ) -> RepositoryResult<UploadBatch> {
        self.batches.complete(batch_id, &completion)
    }

    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<UploadBatch>> {
        self.batches.find_by_id(batch_id)
    }

    async fn list_batches(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<UploadBatch>> {
        self.batches.list_recent(limit, offset)
    }

    async fn count_batches(&self) -> RepositoryResult<i64> {
        self.batches.count()
    }

    async fn insert_candidate(&self, candidate: &ImportCandidate) -> RepositoryResult<i64> {
        let detail = self.products.create(
            &candidate.product,
            std::slice::from_ref(&candidate.variant),
            &candidate.images,
        )?;
        Ok(detail.product.id)
    }
}
