// ==========================================
// 地铁车队运营排程系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统 (调度员保留最终控制权)
// 流程: 每日批次 → 故障风险估计 → 资格判定 → 运力规划 → 排名 → 分配
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入导出层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/表结构）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AlertSeverity, ExclusionReason, IblCause, OverrideAction, TrainStatus};

// 领域实体
pub use domain::{
    AllocationJustification, CapacityTargets, FleetReport, ModificationLogEntry, PlannerParams,
    Schedule, ScheduledTrain, TrainFeatureRecord,
};

// 引擎
pub use engine::{
    CapacityPlanner, DesirabilityRanker, EligibilityClassifier, Estimator, OverrideController,
    OverrideOutcome, OverrideRequest, ReportAggregator, RuleBasedEstimator, ScheduleOrchestrator,
    SlotAllocator, WhatIfAnalyzer, WhatIfScenario,
};

// API
pub use api::{ApiError, ApiResult, FleetDataApi, ScheduleService};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "地铁车队运营排程系统";

// 数据库版本
pub const DB_VERSION: &str = "v1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(DB_VERSION, format!("v{}", db::CURRENT_SCHEMA_VERSION));
    }
}
