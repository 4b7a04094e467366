// ==========================================
// 商品目录后台 - 批量导入 Repository Trait
// ==========================================
// 职责: 定义导入管道所需的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::import::{BatchCompletion, ImportCandidate, UploadBatch};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// CatalogImportRepository Trait
// ==========================================
// 用途: 批量导入相关数据访问
// 实现者: CatalogImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait CatalogImportRepository: Send + Sync {
    // ===== 查询与校验 =====

    /// 检查商品 SKU 是否已存在
    ///
    /// # 返回
    /// - Ok(true): 商品已存在
    /// - Ok(false): 商品不存在
    async fn exists_product_sku(&self, sku: &str) -> RepositoryResult<bool>;

    // ===== 批次管理 =====

    /// 插入批次记录（processing）
    async fn create_batch(&self, batch: UploadBatch) -> RepositoryResult<()>;

    /// 写入批次终态（只允许一次）
    async fn complete_batch(
        &self,
        batch_id: &str,
        completion: BatchCompletion,
    ) -> RepositoryResult<UploadBatch>;

    /// 按 ID 查询批次
    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<UploadBatch>>;

    /// 最近批次（按创建时间倒序）
    async fn list_batches(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<UploadBatch>>;

    /// 批次总数
    async fn count_batches(&self) -> RepositoryResult<i64>;

    // ===== 单行落库（事务化）=====

    /// 写入一个导入候选（商品 + 默认规格 + 图片）
    ///
    /// # 返回
    /// - Ok(i64): 新商品 ID
    /// - Err: 数据库错误（该行整体回滚，不影响其他行）
    async fn insert_candidate(&self, candidate: &ImportCandidate) -> RepositoryResult<i64>;
}
