// ==========================================
// 商品目录后台 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod catalog_import_repo;
pub mod catalog_import_repo_impl;
pub mod db_utils;
pub mod error;
pub mod product_repo;
pub mod upload_batch_repo;
pub mod variant_repo;

// 重导出核心仓储
pub use catalog_import_repo::CatalogImportRepository;
pub use catalog_import_repo_impl::CatalogImportRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
pub use product_repo::{ProductFilter, ProductRepository};
pub use upload_batch_repo::UploadBatchRepository;
pub use variant_repo::ProductVariantRepository;
