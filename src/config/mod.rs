// ==========================================
// 地铁车队运营排程系统 - 配置层
// ==========================================
// 职责: 运力规划参数管理,缺省值兜底
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod scheduler_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use scheduler_config_trait::{ConfigError, SchedulerConfigReader};
