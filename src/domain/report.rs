// ==========================================
// 地铁车队运营排程系统 - 运营报告领域模型
// ==========================================
// 职责: 报告聚合器输出的只读视图 DTO
// 红线: 报告只由最终排程派生,不参与分配决策
// ==========================================

use crate::domain::capacity::AllocationJustification;
use crate::domain::types::{AlertSeverity, TrainStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// 车队健康指数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetHealthIndex {
    pub overall: f64, // 加权总分,保留两位小数
    pub maintenance_score: f64,
    pub availability_score: f64,
    pub efficiency_score: f64,
    pub safety_score: f64,
    pub utilization_score: f64,
}

// ==========================================
// 告警
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    PredictiveFailure,
    BogieWear,
    TempAnomaly,
    SafetyExclusion,  // 硬约束导致 IBL
    CapacityOverflow, // 容量降级导致 IBL
    ManualOverride,   // 人工强制 IBL
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertKind::PredictiveFailure => "PREDICTIVE_FAILURE",
            AlertKind::BogieWear => "BOGIE_WEAR",
            AlertKind::TempAnomaly => "TEMP_ANOMALY",
            AlertKind::SafetyExclusion => "SAFETY_EXCLUSION",
            AlertKind::CapacityOverflow => "CAPACITY_OVERFLOW",
            AlertKind::ManualOverride => "MANUAL_OVERRIDE",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetAlert {
    pub train_id: String,
    pub depot: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub value: Option<f64>,
    pub message: String,
}

// ==========================================
// 收入影响
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueImpact {
    pub out_of_service: usize,
    pub potential_loss: f64,
    pub maint_cost_today: f64,
    pub branding_shortfall_cost: f64,
}

// ==========================================
// 动态交路分配
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAssignment {
    pub train_id: String,
    pub assigned_route: String,
    pub reliability: f64,
}

// ==========================================
// 能耗评估
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnergyRating {
    Excellent,
    Good,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyEfficiency {
    pub train_id: String,
    pub kwh_per_100km: f64,
    pub rating: EnergyRating,
    pub main_issue: String,
}

// ==========================================
// 乘客体验
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperienceRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerExperience {
    pub train_id: String,
    pub score: i32,
    pub rating: ExperienceRating,
    pub factors: Vec<String>, // 最多两项,无影响因素时为 ["None"]
}

// ==========================================
// 智能维修计划
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceUrgency {
    Low,
    Medium,
    High,
    Immediate,
}

impl MaintenanceUrgency {
    /// 建议维修窗口
    pub fn window(&self) -> &'static str {
        match self {
            MaintenanceUrgency::Immediate => "Within 24 hours",
            MaintenanceUrgency::High => "Within 72 hours",
            _ => "Next scheduled window",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub train_id: String,
    pub final_status: TrainStatus,
    pub priority: f64,
    pub urgency: MaintenanceUrgency,
    pub types: Vec<String>,
    pub window: String,
    pub est_hours: u64,
}

// ==========================================
// FleetReport - 汇总报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetReport {
    pub schedule_version: Uuid,
    pub date: NaiveDate,
    pub health_index: FleetHealthIndex,
    pub alerts: Vec<FleetAlert>,
    pub optimizations: Vec<String>,
    pub revenue: RevenueImpact,
    pub routes: Vec<RouteAssignment>,
    pub energy: Vec<EnergyEfficiency>,
    pub passenger_experience: Vec<PassengerExperience>,
    pub maintenance_schedule: Vec<MaintenanceTask>,
    pub justification: AllocationJustification,
}
