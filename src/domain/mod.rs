// ==========================================
// 地铁车队运营排程系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod capacity;
pub mod modification;
pub mod report;
pub mod schedule;
pub mod train;
pub mod types;

// 重导出核心类型
pub use capacity::{
    AllocationJustification, CapacityTargets, PlannerParams, DEFAULT_REVENUE_PER_TRAIN,
    MAX_SERVICE_TRAINS, MAX_STANDBY_TRAINS, MIN_STANDBY_FLOOR,
};
pub use modification::{ModificationLog, ModificationLogEntry};
pub use report::{
    AlertKind, EnergyEfficiency, EnergyRating, ExperienceRating, FleetAlert, FleetHealthIndex,
    FleetReport, MaintenanceTask, MaintenanceUrgency, PassengerExperience, RevenueImpact,
    RouteAssignment,
};
pub use schedule::Schedule;
pub use train::{Estimate, Prediction, ScheduledTrain, TrainFeatureRecord};
pub use types::{AlertSeverity, ExclusionReason, IblCause, OverrideAction, TrainStatus};
