// ==========================================
// 地铁车队运营排程系统 - 人工干预控制器
// ==========================================
// 职责: 每列车的状态机 {Service, Standby, IBL} + 虚拟 Predicted 状态
// 红线: 已为 IBL 的列车禁止强制转回 Service/Standby
// 红线: 高风险强制上线必须显式确认,不得静默执行
// 红线: 每次成功转换都记录日志,并按分配器规则重排编号
// ==========================================
// 非目标: force_ibl 后不自动补位
// ==========================================

use crate::domain::modification::{ModificationLog, ModificationLogEntry};
use crate::domain::schedule::Schedule;
use crate::domain::train::ScheduledTrain;
use crate::domain::types::{IblCause, OverrideAction, TrainStatus};
use crate::engine::allocator::resort_and_rank;
use crate::engine::eligibility::EligibilityClassifier;
use crate::engine::error::{OverrideError, OverrideResult};
use crate::i18n;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// 强制上线的风险确认阈值
pub const RISK_WARNING_THRESHOLD: f64 = 0.3;

// ==========================================
// OverrideRequest - 干预请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub train_id: String,
    pub action: OverrideAction,
    pub reason: Option<String>,
    pub acknowledge_risk: bool, // 调用方已确认高风险
}

impl OverrideRequest {
    pub fn new(train_id: impl Into<String>, action: OverrideAction) -> Self {
        Self {
            train_id: train_id.into(),
            action,
            reason: None,
            acknowledge_risk: false,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn acknowledged(mut self) -> Self {
        self.acknowledge_risk = true;
        self
    }
}

// ==========================================
// RiskWarning - 高风险确认 (非错误)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskWarning {
    pub train_id: String,
    pub current_status: TrainStatus,
    pub failure_risk: f64,
    pub threshold: f64,
    pub warning: String,
    pub details: String,
}

// ==========================================
// OverrideNotice - 干预附带通知
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideNotice {
    /// 正线运力减少 1 列 (不自动补位)
    ServiceCapacityReduced {
        train_id: String,
        service_count: usize,
        message: String,
    },
    /// 干预日志持久化失败 (内存状态不回滚)
    PersistenceFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedOverride {
    pub entry: ModificationLogEntry,
    pub notices: Vec<OverrideNotice>,
    /// 重排后的完整排程 (与本次干预同一锁内取得)
    pub trains: Vec<ScheduledTrain>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideOutcome {
    Applied(AppliedOverride),
    ConfirmationRequired(RiskWarning),
}

// ==========================================
// OverrideController - 人工干预控制器
// ==========================================
pub struct OverrideController {
    // 无状态,排程与日志由调用方持有并串行化
}

impl OverrideController {
    pub fn new() -> Self {
        Self {}
    }

    /// 执行一次干预
    ///
    /// # 参数
    /// - schedule: 当前排程 (调用方已持有排他锁)
    /// - log: 干预日志
    /// - request: 干预请求
    ///
    /// # 返回
    /// - Ok(Applied): 已转换、已记录、已重排
    /// - Ok(ConfirmationRequired): 需要确认,状态未变
    /// - Err(NotFound / SafetyViolation): 拒绝,状态未变
    #[instrument(skip(self, schedule, log), fields(
        train_id = %request.train_id,
        action = %request.action,
        version = %schedule.version
    ))]
    pub fn apply(
        &self,
        schedule: &mut Schedule,
        log: &mut ModificationLog,
        request: &OverrideRequest,
    ) -> OverrideResult<OverrideOutcome> {
        let position = schedule
            .trains
            .iter()
            .position(|t| t.record.train_id == request.train_id)
            .ok_or_else(|| {
                warn!("干预目标不在当前排程中");
                OverrideError::NotFound {
                    train_id: request.train_id.clone(),
                }
            })?;

        let (current, risk, predicted) = {
            let train = &schedule.trains[position];
            (
                train.final_status,
                train.prediction.predicted_failure_risk,
                train.prediction.predicted_status,
            )
        };

        // === 步骤1: 合法性判定 ===
        let target = match request.action {
            OverrideAction::ForceService | OverrideAction::ForceStandby => {
                let attempted = request.action.target_status().unwrap_or(TrainStatus::Ibl);
                if current == TrainStatus::Ibl {
                    warn!(current = %current, attempted = %attempted, "安全约束拒绝");
                    return Err(OverrideError::SafetyViolation {
                        train_id: request.train_id.clone(),
                        current,
                        attempted,
                    });
                }
                if request.action == OverrideAction::ForceService
                    && risk > RISK_WARNING_THRESHOLD
                    && !request.acknowledge_risk
                {
                    warn!(failure_risk = risk, "高风险强制上线,等待确认");
                    return Ok(OverrideOutcome::ConfirmationRequired(Self::risk_warning(
                        &request.train_id,
                        current,
                        risk,
                    )));
                }
                attempted
            }
            OverrideAction::ForceIbl => TrainStatus::Ibl,
            OverrideAction::Reset => predicted,
        };

        // === 步骤2: 状态变更 ===
        {
            let train = &mut schedule.trains[position];
            train.final_status = target;
            train.record.assigned_status = target;
            match request.action {
                OverrideAction::Reset => {
                    train.record.manual_override_flag = false;
                    train.manual_override_reason = None;
                    train.ibl_cause = if target == TrainStatus::Ibl {
                        if EligibilityClassifier::is_hard_excluded(&train.record) {
                            Some(IblCause::SafetyExclusion)
                        } else {
                            Some(IblCause::Predicted)
                        }
                    } else {
                        None
                    };
                }
                _ => {
                    train.record.manual_override_flag = true;
                    train.manual_override_reason = request.reason.clone();
                    train.ibl_cause = if target == TrainStatus::Ibl {
                        Some(IblCause::ManualOverride)
                    } else {
                        None
                    };
                }
            }
        }

        // === 步骤3: 记录 ===
        let entry = ModificationLogEntry::new(
            schedule.version,
            request.train_id.clone(),
            request.action,
            current,
            target,
            request.reason.clone(),
            request.action == OverrideAction::ForceService && risk > RISK_WARNING_THRESHOLD,
        );
        log.append(entry.clone());

        // === 步骤4: 重排编号 ===
        resort_and_rank(&mut schedule.trains);

        let mut notices = Vec::new();
        if current == TrainStatus::Service && target != TrainStatus::Service {
            let service_count = schedule.count_status(TrainStatus::Service);
            let count_text = service_count.to_string();
            notices.push(OverrideNotice::ServiceCapacityReduced {
                train_id: request.train_id.clone(),
                service_count,
                message: i18n::t_with_args(
                    "override.capacity_reduced",
                    &[("service_count", count_text.as_str())],
                ),
            });
        }

        info!(
            from = %current,
            to = %target,
            log_len = log.len(),
            "人工干预已生效"
        );

        Ok(OverrideOutcome::Applied(AppliedOverride {
            entry,
            notices,
            trains: schedule.trains.clone(),
        }))
    }

    fn risk_warning(train_id: &str, current: TrainStatus, risk: f64) -> RiskWarning {
        let risk_text = format!("{:.1}%", risk * 100.0);
        RiskWarning {
            train_id: train_id.to_string(),
            current_status: current,
            failure_risk: risk,
            threshold: RISK_WARNING_THRESHOLD,
            warning: i18n::t_with_args("override.risk_warning", &[("risk", risk_text.as_str())]),
            details: i18n::t_with_args(
                "override.risk_details",
                &[("train_id", train_id), ("risk", risk_text.as_str())],
            ),
        }
    }
}

impl Default for OverrideController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capacity::PlannerParams;
    use crate::domain::train::TrainFeatureRecord;
    use crate::engine::estimator::RuleBasedEstimator;
    use crate::engine::orchestrator::ScheduleOrchestrator;
    use chrono::{NaiveDate, NaiveTime};

    fn create_test_schedule() -> Schedule {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let mut records: Vec<_> = (0..6)
            .map(|i| TrainFeatureRecord::new(format!("T{}", i), date))
            .collect();
        records[5].job_critical_count = 1;
        // 15 分钟 / 7.5 = 2 列正线
        let params = PlannerParams {
            service_start: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            service_end: NaiveTime::from_hms_opt(6, 15, 0).unwrap(),
            ..PlannerParams::default()
        };
        ScheduleOrchestrator::new()
            .generate(date, &records, None, &RuleBasedEstimator::new(), &params)
            .unwrap()
    }

    #[test]
    fn test_unknown_train_not_found() {
        let mut schedule = create_test_schedule();
        let mut log = ModificationLog::new();
        let before = schedule.clone();
        let result = OverrideController::new().apply(
            &mut schedule,
            &mut log,
            &OverrideRequest::new("NOPE", OverrideAction::ForceIbl),
        );
        assert!(matches!(result, Err(OverrideError::NotFound { .. })));
        assert_eq!(schedule, before);
        assert!(log.is_empty());
    }

    #[test]
    fn test_force_service_from_ibl_is_safety_violation() {
        let mut schedule = create_test_schedule();
        let mut log = ModificationLog::new();
        let before = schedule.clone();
        for action in [OverrideAction::ForceService, OverrideAction::ForceStandby] {
            let result = OverrideController::new().apply(
                &mut schedule,
                &mut log,
                &OverrideRequest::new("T5", action).acknowledged(),
            );
            assert!(matches!(result, Err(OverrideError::SafetyViolation { .. })));
        }
        assert_eq!(schedule, before);
        assert!(log.is_empty());
    }

    #[test]
    fn test_force_ibl_from_service_reports_capacity_drop() {
        let mut schedule = create_test_schedule();
        let mut log = ModificationLog::new();
        let service_id = schedule.train_ids_with_status(TrainStatus::Service)[0].clone();

        let outcome = OverrideController::new()
            .apply(
                &mut schedule,
                &mut log,
                &OverrideRequest::new(&service_id, OverrideAction::ForceIbl).with_reason("制动异响"),
            )
            .unwrap();

        let returned = match outcome {
            OverrideOutcome::Applied(applied) => {
                assert_eq!(applied.entry.from_status, TrainStatus::Service);
                assert_eq!(applied.entry.to_status, TrainStatus::Ibl);
                assert!(matches!(
                    applied.notices.as_slice(),
                    [OverrideNotice::ServiceCapacityReduced { service_count: 1, .. }]
                ));
                applied.trains
            }
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(returned, schedule.trains);

        let train = schedule.find(&service_id).unwrap();
        assert_eq!(train.final_status, TrainStatus::Ibl);
        assert!(train.manual_override_flag());
        assert_eq!(train.manual_override_reason.as_deref(), Some("制动异响"));
        assert_eq!(train.ibl_cause, Some(IblCause::ManualOverride));
        assert_eq!(schedule.count_status(TrainStatus::Service), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_reset_restores_prediction_and_clears_flag() {
        let mut schedule = create_test_schedule();
        let mut log = ModificationLog::new();
        let controller = OverrideController::new();
        let standby_id = schedule.train_ids_with_status(TrainStatus::Standby)[0].clone();
        let predicted = schedule.find(&standby_id).unwrap().prediction.predicted_status;

        controller
            .apply(
                &mut schedule,
                &mut log,
                &OverrideRequest::new(&standby_id, OverrideAction::ForceIbl),
            )
            .unwrap();
        controller
            .apply(
                &mut schedule,
                &mut log,
                &OverrideRequest::new(&standby_id, OverrideAction::Reset),
            )
            .unwrap();

        let train = schedule.find(&standby_id).unwrap();
        assert_eq!(train.final_status, predicted);
        assert!(!train.manual_override_flag());
        assert!(train.manual_override_reason.is_none());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_ranking_stays_dense_after_override() {
        let mut schedule = create_test_schedule();
        let mut log = ModificationLog::new();
        let service_id = schedule.train_ids_with_status(TrainStatus::Service)[0].clone();
        OverrideController::new()
            .apply(
                &mut schedule,
                &mut log,
                &OverrideRequest::new(&service_id, OverrideAction::ForceIbl),
            )
            .unwrap();

        let rankings: Vec<usize> = schedule.trains.iter().map(|t| t.ranking).collect();
        assert_eq!(rankings, (1..=schedule.fleet_size()).collect::<Vec<_>>());
        let ranks: Vec<u8> = schedule.trains.iter().map(|t| t.final_status.sort_rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }
}
