// ==========================================
// 商品目录后台 - 应用层
// ==========================================
// 职责: 组装仓储、导入器与API实例
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
