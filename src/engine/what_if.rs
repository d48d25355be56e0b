// ==========================================
// 地铁车队运营排程系统 - 假设分析
// ==========================================
// 职责: 基于当前排程回答"如果…会怎样",不修改排程
// ==========================================

use crate::domain::schedule::Schedule;
use crate::domain::types::TrainStatus;
use crate::domain::MIN_STANDBY_FLOOR;
use crate::engine::error::{EngineError, OverrideError};
use crate::engine::override_controller::RISK_WARNING_THRESHOLD;
use crate::i18n;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 单程往返时长 (分钟),用于行车间隔反推所需车数
pub const ROUND_TRIP_MINUTES: f64 = 120.0;

/// 检修延期分析的风险阈值
pub const MAINTENANCE_DELAY_RISK_THRESHOLD: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum WhatIfScenario {
    ForceServiceAnalysis { train_id: String },
    SimulateFailure { train_id: String },
    MaintenanceDelay,
    HeadwayAnalysis { headway_minutes: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum WhatIfOutcome {
    ForceServiceAnalysis {
        train_id: String,
        current_status: TrainStatus,
        failure_risk: f64,
        safe: bool,
        recommendation: String,
        reason: String,
    },
    SimulateFailure {
        train_id: String,
        current_status: TrainStatus,
        service_impact: String,
        available_standby: usize,
        critical: bool,
    },
    MaintenanceDelay {
        high_risk_trains: usize,
        impact: String,
    },
    HeadwayAnalysis {
        headway_minutes: f64,
        trains_needed: f64,
        total_needed: f64,
        fleet_size: usize,
        feasible: bool,
        shortage: f64,
        /// 可行时的 (运营车数, 备用车数) 划分
        feasible_split: Option<(usize, usize)>,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WhatIfError {
    #[error(transparent)]
    Input(#[from] EngineError),

    #[error(transparent)]
    NotFound(#[from] OverrideError),
}

// ==========================================
// WhatIfAnalyzer - 假设分析器
// ==========================================
pub struct WhatIfAnalyzer {
    // 无状态
}

impl WhatIfAnalyzer {
    pub fn new() -> Self {
        Self {}
    }

    pub fn analyze(
        &self,
        schedule: &Schedule,
        scenario: &WhatIfScenario,
    ) -> Result<WhatIfOutcome, WhatIfError> {
        match scenario {
            WhatIfScenario::ForceServiceAnalysis { train_id } => {
                let train = Self::find(schedule, train_id)?;
                let risk = train.prediction.predicted_failure_risk;
                let current = train.final_status;
                let safe = risk <= RISK_WARNING_THRESHOLD && current != TrainStatus::Ibl;
                let reason_key = if risk > RISK_WARNING_THRESHOLD {
                    "whatif.reason_high_risk"
                } else if current == TrainStatus::Ibl {
                    "whatif.reason_ibl"
                } else {
                    "whatif.reason_safe"
                };
                Ok(WhatIfOutcome::ForceServiceAnalysis {
                    train_id: train_id.clone(),
                    current_status: current,
                    failure_risk: risk,
                    safe,
                    recommendation: if safe {
                        i18n::t("whatif.recommend_force")
                    } else {
                        i18n::t("whatif.not_recommended")
                    },
                    reason: i18n::t(reason_key),
                })
            }
            WhatIfScenario::SimulateFailure { train_id } => {
                let train = Self::find(schedule, train_id)?;
                let current = train.final_status;
                let available_standby = schedule.count_status(TrainStatus::Standby);
                let service_impact = if current == TrainStatus::Service {
                    i18n::t("whatif.standby_deployment")
                } else {
                    i18n::t("whatif.minimal_impact")
                };
                Ok(WhatIfOutcome::SimulateFailure {
                    train_id: train_id.clone(),
                    current_status: current,
                    service_impact,
                    available_standby,
                    critical: available_standby == 0 && current == TrainStatus::Service,
                })
            }
            WhatIfScenario::MaintenanceDelay => {
                let high_risk_trains = schedule
                    .trains
                    .iter()
                    .filter(|t| t.prediction.predicted_failure_risk > MAINTENANCE_DELAY_RISK_THRESHOLD)
                    .count();
                let count_text = high_risk_trains.to_string();
                let impact = if high_risk_trains > 0 {
                    i18n::t_with_args("whatif.trains_critical", &[("count", count_text.as_str())])
                } else {
                    i18n::t("whatif.no_high_risk")
                };
                Ok(WhatIfOutcome::MaintenanceDelay {
                    high_risk_trains,
                    impact,
                })
            }
            WhatIfScenario::HeadwayAnalysis { headway_minutes } => {
                let headway = *headway_minutes;
                if !headway.is_finite() || headway <= 0.0 {
                    return Err(EngineError::InvalidHeadway(headway).into());
                }
                let fleet_size = schedule.fleet_size();
                let trains_needed = ROUND_TRIP_MINUTES / headway;
                let total_needed = trains_needed + MIN_STANDBY_FLOOR as f64;
                let feasible = total_needed <= fleet_size as f64;
                let feasible_split = feasible.then(|| {
                    let service = (trains_needed.ceil() as usize).min(fleet_size);
                    (service, MIN_STANDBY_FLOOR.min(fleet_size - service))
                });
                Ok(WhatIfOutcome::HeadwayAnalysis {
                    headway_minutes: headway,
                    trains_needed,
                    total_needed,
                    fleet_size,
                    feasible,
                    shortage: (total_needed - fleet_size as f64).max(0.0),
                    feasible_split,
                })
            }
        }
    }

    fn find<'a>(
        schedule: &'a Schedule,
        train_id: &str,
    ) -> Result<&'a crate::domain::train::ScheduledTrain, WhatIfError> {
        schedule.find(train_id).ok_or_else(|| {
            OverrideError::NotFound {
                train_id: train_id.to_string(),
            }
            .into()
        })
    }
}

impl Default for WhatIfAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
