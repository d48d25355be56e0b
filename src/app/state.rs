// ==========================================
// 地铁车队运营排程系统 - 应用状态
// ==========================================
// 职责: 组装共享连接、仓储、配置与服务实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{FleetDataApi, ScheduleService};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::estimator::RuleBasedEstimator;
use crate::engine::events::NoOpEventPublisher;
use crate::repository::feature_record_repo::FeatureRecordRepository;
use crate::repository::modification_log_repo::ModificationLogRepository;
use crate::repository::store::SqliteFeatureRecordStore;

/// 应用状态
///
/// 命令行入口持有一份,所有 API 共享同一数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 排程服务 (生成/干预/报表/假设分析)
    pub schedule_service: Arc<ScheduleService>,

    /// 车队数据 API (导入/模拟/导出)
    pub fleet_data_api: Arc<FleetDataApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 干预日志仓储
    pub modification_log_repo: Arc<ModificationLogRepository>,
}

impl AppState {
    /// 创建新的应用状态
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化失败信息
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState,数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let feature_repo = Arc::new(FeatureRecordRepository::new(conn.clone()));
        let modification_log_repo = Arc::new(ModificationLogRepository::new(conn.clone()));
        let store = Arc::new(SqliteFeatureRecordStore::new(feature_repo));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let schedule_service = Arc::new(ScheduleService::new(
            Arc::new(RuleBasedEstimator::new()),
            store.clone(),
            config_manager.clone(),
            Some(modification_log_repo.clone()),
            Some(Arc::new(NoOpEventPublisher)),
        ));
        let fleet_data_api = Arc::new(FleetDataApi::new(store));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            schedule_service,
            fleet_data_api,
            config_manager,
            modification_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先读取环境变量 METRO_FLEET_APS_DB_PATH,否则使用用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("METRO_FLEET_APS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./metro_fleet_aps.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录,避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("metro-fleet-aps-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("metro-fleet-aps");
        }

        std::fs::create_dir_all(&path).ok();
        path = path.join("metro_fleet_aps.db");
    }

    path.to_string_lossy().to_string()
}
