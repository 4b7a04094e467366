// ==========================================
// 商品目录后台 - 导入层
// ==========================================
// 职责: 批量商品导入（CSV / Excel → 商品 + 规格 + 图片）
// 流程: 解析 → 行校验 → 查重 → 映射 → 逐行落库 → 批次终态
// ==========================================

// 模块声明
pub mod candidate_mapper;
pub mod conflict_handler;
pub mod error;
pub mod file_parser;
pub mod product_importer_impl;
pub mod product_importer_trait;
pub mod row_validator;

// 重导出核心类型
pub use candidate_mapper::CandidateMapperImpl;
pub use conflict_handler::ConflictHandler as ConflictHandlerImpl;
pub use error::{ImportError, ImportResult};
pub use file_parser::{
    ExcelParser, NaiveCsvParser, StrictCsvParser, UniversalFileParser, ALLOWED_CONTENT_TYPES,
};
pub use product_importer_impl::ProductImporterImpl;
pub use row_validator::RowValidatorImpl;

// 重导出 Trait 接口
pub use product_importer_trait::{
    CandidateMapper, ConflictHandler, FileParser, ProductImporter, RowValidator,
};
