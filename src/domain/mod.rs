// ==========================================
// 商品目录后台 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod import;
pub mod product;
pub mod types;

// 重导出核心类型
pub use import::{
    BatchCompletion, BatchErrorLog, CommitSummary, ConflictKind, ImportCandidate, ImportOutcome, ImportRow,
    SkuConflict, UploadBatch, ValidationReport,
};
pub use product::{
    default_variant_sku, NewImage, NewProduct, NewVariant, Product, ProductDetail, ProductImage,
    ProductPatch, ProductSummary, ProductVariant, VariantDetail, VariantPatch,
};
pub use types::{BatchStatus, ProductSource};
