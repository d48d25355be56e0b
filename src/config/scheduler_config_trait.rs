// ==========================================
// 地铁车队运营排程系统 - 排程配置读取 Trait
// ==========================================
// 职责: 定义运力规划所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::capacity::PlannerParams;
use async_trait::async_trait;
use chrono::NaiveTime;
use std::error::Error;

/// 配置读取错误
pub type ConfigError = Box<dyn Error + Send + Sync>;

// ==========================================
// SchedulerConfigReader Trait
// ==========================================
// 用途: 运力规划参数读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait SchedulerConfigReader: Send + Sync {
    // ===== 运营时段 =====

    /// 获取运营开始时间
    ///
    /// # 默认值
    /// - 06:00
    async fn get_service_start(&self) -> Result<NaiveTime, ConfigError>;

    /// 获取运营结束时间
    ///
    /// # 默认值
    /// - 22:30
    async fn get_service_end(&self) -> Result<NaiveTime, ConfigError>;

    // ===== 行车组织 =====

    /// 获取平均行车间隔 (分钟)
    ///
    /// # 默认值
    /// - 7.5
    async fn get_avg_headway_minutes(&self) -> Result<f64, ConfigError>;

    /// 获取单车日收入
    ///
    /// # 默认值
    /// - 3750 (150 × 25)
    async fn get_revenue_per_train(&self) -> Result<f64, ConfigError>;

    /// 组装运力规划参数
    async fn get_planner_params(&self) -> Result<PlannerParams, ConfigError> {
        Ok(PlannerParams {
            service_start: self.get_service_start().await?,
            service_end: self.get_service_end().await?,
            avg_headway_minutes: self.get_avg_headway_minutes().await?,
            revenue_per_train: self.get_revenue_per_train().await?,
        })
    }
}
