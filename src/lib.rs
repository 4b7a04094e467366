// ==========================================
// 商品目录后台 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 商品/规格管理与 CSV / Excel 批量导入
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 批量商品导入
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BatchStatus, ProductSource};

// 领域实体
pub use domain::{
    ImportOutcome, Product, ProductDetail, ProductImage, ProductVariant, UploadBatch,
};

// 导入
pub use importer::{ImportError, ProductImporter, ProductImporterImpl};

// API
pub use api::{ApiError, ImportApi, ProductApi, VariantApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "商品目录后台";
