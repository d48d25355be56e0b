// ==========================================
// 地铁车队运营排程系统 - 运力领域模型
// ==========================================
// 职责: 运力规划参数、分配目标、运力配置说明
// ==========================================

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// 正线运营硬上限 (与车队规模/行车间隔无关)
pub const MAX_SERVICE_TRAINS: usize = 14;

/// 热备硬上限
pub const MAX_STANDBY_TRAINS: usize = 4;

/// 热备下限 (无剩余列车时的固定值)
pub const MIN_STANDBY_FLOOR: usize = 3;

/// 每车每日收入 (150 km × 25 / km)
pub const DEFAULT_REVENUE_PER_TRAIN: f64 = 150.0 * 25.0;

// ==========================================
// PlannerParams - 运力规划参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannerParams {
    pub service_start: NaiveTime,
    pub service_end: NaiveTime,
    pub avg_headway_minutes: f64,
    pub revenue_per_train: f64,
}

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            service_start: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
            service_end: NaiveTime::from_hms_opt(22, 30, 0).unwrap_or(NaiveTime::MIN),
            avg_headway_minutes: 7.5,
            revenue_per_train: DEFAULT_REVENUE_PER_TRAIN,
        }
    }
}

// ==========================================
// AllocationJustification - 运力配置说明
// ==========================================
// 对外: get_allocation_justification()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationJustification {
    pub fleet_size: usize,
    pub service_minutes: f64,
    pub avg_headway_minutes: f64,
    pub min_service_trains: usize,
    pub min_standby_trains: usize,
    pub min_ibl_trains: usize,
    pub expected_revenue: f64,
    pub note: String,
}

// ==========================================
// CapacityTargets - 分配器实际使用的槽位数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityTargets {
    pub eligible_pool_size: usize,
    pub target_service: usize, // min(min_service_trains, eligible_pool_size, 14)
    pub max_standby: usize,    // 硬上限 4
}
