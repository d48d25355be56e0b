// ==========================================
// 地铁车队运营排程系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::scheduler_config_trait::{ConfigError, SchedulerConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::capacity::{PlannerParams, DEFAULT_REVENUE_PER_TRAIN};
use async_trait::async_trait;
use chrono::NaiveTime;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// 时间配置格式
const TIME_FORMAT: &str = "%H:%M";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global 配置（存在则覆盖）
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 排程报表附带当时的运力参数来源
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取并解析配置；缺失取默认值，格式错误告警后取默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    fn get_time_or_default(&self, key: &str, default: NaiveTime) -> Result<NaiveTime, ConfigError> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT) {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    expected = TIME_FORMAT,
                    "时间配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 正数配置：非正值同样视为格式错误
    fn get_positive_or_default(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        let value = self.get_parsed_or_default(key, default)?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            tracing::warn!(config_key = key, value, "配置值必须为正数，使用默认值");
            Ok(default)
        }
    }
}

// ==========================================
// SchedulerConfigReader Trait 实现
// ==========================================
#[async_trait]
impl SchedulerConfigReader for ConfigManager {
    async fn get_service_start(&self) -> Result<NaiveTime, ConfigError> {
        self.get_time_or_default(config_keys::SERVICE_START, PlannerParams::default().service_start)
    }

    async fn get_service_end(&self) -> Result<NaiveTime, ConfigError> {
        self.get_time_or_default(config_keys::SERVICE_END, PlannerParams::default().service_end)
    }

    async fn get_avg_headway_minutes(&self) -> Result<f64, ConfigError> {
        self.get_positive_or_default(
            config_keys::AVG_HEADWAY_MINUTES,
            PlannerParams::default().avg_headway_minutes,
        )
    }

    async fn get_revenue_per_train(&self) -> Result<f64, ConfigError> {
        self.get_positive_or_default(config_keys::REVENUE_PER_TRAIN, DEFAULT_REVENUE_PER_TRAIN)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 运营时段 (HH:MM)
    pub const SERVICE_START: &str = "service_start";
    pub const SERVICE_END: &str = "service_end";

    // 行车间隔 (分钟)
    pub const AVG_HEADWAY_MINUTES: &str = "avg_headway_minutes";

    // 单车日收入
    pub const REVENUE_PER_TRAIN: &str = "revenue_per_train";
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, manager)
    }

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let (_tmp, manager) = create_test_manager();
        let params = manager.get_planner_params().await.unwrap();
        assert_eq!(params, PlannerParams::default());
    }

    #[tokio::test]
    async fn test_overrides_are_read() {
        let (_tmp, manager) = create_test_manager();
        manager.set_value(config_keys::SERVICE_START, "05:30").unwrap();
        manager.set_value(config_keys::AVG_HEADWAY_MINUTES, "10").unwrap();

        let params = manager.get_planner_params().await.unwrap();
        assert_eq!(params.service_start, NaiveTime::from_hms_opt(5, 30, 0).unwrap());
        assert_eq!(params.avg_headway_minutes, 10.0);
        assert_eq!(params.service_end, PlannerParams::default().service_end);
    }

    #[tokio::test]
    async fn test_malformed_values_fall_back() {
        let (_tmp, manager) = create_test_manager();
        manager.set_value(config_keys::SERVICE_END, "late").unwrap();
        manager.set_value(config_keys::AVG_HEADWAY_MINUTES, "-3").unwrap();
        manager.set_value(config_keys::REVENUE_PER_TRAIN, "abc").unwrap();

        let params = manager.get_planner_params().await.unwrap();
        assert_eq!(params, PlannerParams::default());
    }

    #[test]
    fn test_snapshot_and_upsert() {
        let (_tmp, manager) = create_test_manager();
        manager.set_value(config_keys::AVG_HEADWAY_MINUTES, "8").unwrap();
        manager.set_value(config_keys::AVG_HEADWAY_MINUTES, "9").unwrap();

        let snapshot: BTreeMap<String, String> =
            serde_json::from_str(&manager.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[config_keys::AVG_HEADWAY_MINUTES], "9");
    }
}
