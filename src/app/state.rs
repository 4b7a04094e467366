// ==========================================
// 商品目录后台 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{
    AdminSession, ApiError, ApiResult, CatalogImporter, ImportApi, JwtSessionGate, ProductApi,
    SessionGate, VariantApi,
};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::importer::ProductImporterImpl;
use crate::repository::{
    CatalogImportRepositoryImpl, ProductRepository, ProductVariantRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 上传导入API
    pub import_api: Arc<ImportApi>,

    /// 商品API
    pub product_api: Arc<ProductApi>,

    /// 规格API
    pub variant_api: Arc<VariantApi>,

    /// 配置管理器（CLI 的 config 子命令直接使用）
    pub config_manager: Arc<ConfigManager>,

    /// 会话校验（未配置密钥时为 None）
    session_gate: Option<Arc<dyn SessionGate>>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - session_secret: 会话签名密钥；None 表示不校验会话
    ///
    /// # 说明
    /// 打开共享连接并建表（幂等），所有仓储共用同一连接
    pub fn new(db_path: String, session_secret: Option<String>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let product_repo = Arc::new(ProductRepository::from_connection(conn.clone()));
        let variant_repo = Arc::new(ProductVariantRepository::from_connection(conn.clone()));
        let import_repo = CatalogImportRepositoryImpl::from_connection(conn.clone());

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化导入器与API层
        // ==========================================
        let importer: Arc<CatalogImporter> = Arc::new(ProductImporterImpl::with_default_components(
            import_repo,
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        ));

        let import_api = Arc::new(ImportApi::new(importer));
        let product_api = Arc::new(ProductApi::new(
            product_repo.clone(),
            variant_repo.clone(),
            config_manager.clone(),
        ));
        let variant_api = Arc::new(VariantApi::new(product_repo, variant_repo));

        let session_gate = session_secret
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| Arc::new(JwtSessionGate::new(&s)) as Arc<dyn SessionGate>);
        if session_gate.is_none() {
            tracing::warn!("未配置会话密钥，跳过管理员会话校验");
        }

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            import_api,
            product_api,
            variant_api,
            config_manager,
            session_gate,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }

    /// 校验管理员会话
    ///
    /// # 返回
    /// - Ok(Some(session)): 已配置密钥且令牌有效
    /// - Ok(None): 未配置密钥
    /// - Err(Unauthorized/Forbidden): 令牌缺失、无效或非管理员
    pub fn authorize(&self, token: Option<&str>) -> ApiResult<Option<AdminSession>> {
        let Some(gate) = &self.session_gate else {
            return Ok(None);
        };
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::Unauthorized("missing session token".to_string()))?;
        gate.verify(token).map(Some)
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 CATALOG_DB_PATH（非空时）
/// - 否则: 用户数据目录/catalog-admin/catalog_admin.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("CATALOG_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./catalog_admin.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("catalog-admin");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("catalog_admin.db");
        }
    }

    path.to_string_lossy().to_string()
}
