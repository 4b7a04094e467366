// ==========================================
// 商品目录后台 - API 层
// ==========================================
// 职责: 提供业务 API 接口（上传导入、批次历史、商品/规格管理、会话校验）
// ==========================================

pub mod error;
pub mod import_api;
pub mod pagination;
pub mod product_api;
pub mod session;
pub mod variant_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{
    BatchListResponse, CatalogImporter, ErrorPreview, ImportApi, ImportApiResponse, UploadedFile,
};
pub use pagination::Pagination;
pub use product_api::{ProductApi, ProductInput, ProductListResponse, ProductQuery};
pub use session::{AdminSession, JwtSessionGate, SessionGate};
pub use variant_api::{VariantApi, VariantInput};
