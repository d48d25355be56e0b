// ==========================================
// 地铁车队运营排程系统 - 运力规划器
// ==========================================
// 职责: 由车队规模、运营时段、行车间隔计算正线/热备/封存的目标数
// 红线: 正线硬上限 14,热备硬上限 4,与车队规模和间隔计算无关
// ==========================================

use crate::domain::capacity::{
    AllocationJustification, CapacityTargets, PlannerParams, MAX_SERVICE_TRAINS,
    MAX_STANDBY_TRAINS, MIN_STANDBY_FLOOR,
};
use crate::engine::error::{EngineError, EngineResult};
use tracing::{info, instrument};

const JUSTIFICATION_NOTE: &str = "Service trains are calculated based on service hours and headway.\n\
Standby trains are capped at maximum 4 units for operational efficiency.\n\
IBL (In-Bay-Lockdown) are the remaining trains not in active service or standby.\n\
Revenue is earned only from Service trains.";

// ==========================================
// CapacityPlanner - 运力规划器
// ==========================================
pub struct CapacityPlanner {
    // 无状态引擎
}

impl CapacityPlanner {
    pub fn new() -> Self {
        Self {}
    }

    /// 运营时长 (分钟)
    ///
    /// # 返回
    /// - Err(InvalidServiceWindow): end 不晚于 start (不支持跨零点)
    pub fn service_minutes(params: &PlannerParams) -> EngineResult<f64> {
        if params.service_end <= params.service_start {
            return Err(EngineError::InvalidServiceWindow {
                start: params.service_start.format("%H:%M").to_string(),
                end: params.service_end.format("%H:%M").to_string(),
            });
        }
        let duration = params.service_end - params.service_start;
        Ok(duration.num_seconds() as f64 / 60.0)
    }

    /// 计算运力配置说明
    ///
    /// # 规则
    /// - min_service = round(service_minutes / headway),夹在 [0, fleet_size]
    /// - 有剩余列车: min_standby = min(max(3, remaining), 4);否则固定为 3
    /// - min_ibl = max(0, fleet_size − min_service − min_standby)
    /// - expected_revenue = min_service × revenue_per_train
    #[instrument(skip(self, params), fields(fleet_size))]
    pub fn plan(
        &self,
        fleet_size: usize,
        params: &PlannerParams,
    ) -> EngineResult<AllocationJustification> {
        let headway = params.avg_headway_minutes;
        if !headway.is_finite() || headway <= 0.0 {
            return Err(EngineError::InvalidHeadway(headway));
        }
        let service_minutes = Self::service_minutes(params)?;

        // 四舍五入 (半数进位)
        let raw_service = (service_minutes / headway + 0.5).floor().max(0.0) as usize;
        let min_service_trains = raw_service.min(fleet_size);

        let remaining = fleet_size - min_service_trains;
        let min_standby_trains = if remaining > 0 {
            remaining.max(MIN_STANDBY_FLOOR).min(MAX_STANDBY_TRAINS)
        } else {
            MIN_STANDBY_FLOOR
        };

        let min_ibl_trains = fleet_size.saturating_sub(min_service_trains + min_standby_trains);
        let expected_revenue = min_service_trains as f64 * params.revenue_per_train;

        info!(
            fleet_size,
            service_minutes,
            min_service_trains,
            min_standby_trains,
            min_ibl_trains,
            "运力规划完成"
        );

        Ok(AllocationJustification {
            fleet_size,
            service_minutes,
            avg_headway_minutes: headway,
            min_service_trains,
            min_standby_trains,
            min_ibl_trains,
            expected_revenue,
            note: JUSTIFICATION_NOTE.to_string(),
        })
    }

    /// 分配器实际使用的槽位数
    ///
    /// target_service = min(min_service_trains, eligible_pool_size, 14)
    pub fn targets(
        &self,
        justification: &AllocationJustification,
        eligible_pool_size: usize,
    ) -> CapacityTargets {
        let target_service = justification
            .min_service_trains
            .min(eligible_pool_size)
            .min(MAX_SERVICE_TRAINS);

        CapacityTargets {
            eligible_pool_size,
            target_service,
            max_standby: MAX_STANDBY_TRAINS,
        }
    }
}

impl Default for CapacityPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn params(start: (u32, u32), end: (u32, u32), headway: f64) -> PlannerParams {
        PlannerParams {
            service_start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            service_end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            avg_headway_minutes: headway,
            revenue_per_train: 3750.0,
        }
    }

    #[test]
    fn test_default_day_for_25_trains() {
        let planner = CapacityPlanner::new();
        let j = planner.plan(25, &PlannerParams::default()).unwrap();
        // 990 分钟 / 7.5 = 132 → 夹到车队规模
        assert_eq!(j.service_minutes, 990.0);
        assert_eq!(j.min_service_trains, 25);
        assert_eq!(j.min_standby_trains, 3);
        assert_eq!(j.min_ibl_trains, 0);
        assert_eq!(j.expected_revenue, 25.0 * 3750.0);
        assert!(j.note.contains("capped at maximum 4"));
    }

    #[test]
    fn test_rounding_half_up() {
        let planner = CapacityPlanner::new();
        // 18.75 / 7.5 = 2.5 → 3
        let p = PlannerParams {
            service_end: NaiveTime::from_hms_opt(6, 18, 45).unwrap(),
            ..params((6, 0), (6, 0), 7.5)
        };
        assert_eq!(planner.plan(20, &p).unwrap().min_service_trains, 3);
        // 15 / 7.5 = 2
        let j = planner.plan(20, &params((6, 0), (6, 15), 7.5)).unwrap();
        assert_eq!(j.min_service_trains, 2);
    }

    #[test]
    fn test_standby_bounds() {
        let planner = CapacityPlanner::new();
        // 剩余 18 → 4
        let j = planner.plan(20, &params((6, 0), (6, 15), 7.5)).unwrap();
        assert_eq!(j.min_standby_trains, 4);
        assert_eq!(j.min_ibl_trains, 14);
        // 剩余 1 → max(3,1)=3
        let j = planner.plan(3, &params((6, 0), (6, 15), 7.5)).unwrap();
        assert_eq!(j.min_standby_trains, 3);
        assert_eq!(j.min_ibl_trains, 0);
    }

    #[test]
    fn test_invalid_window_and_headway() {
        let planner = CapacityPlanner::new();
        assert!(matches!(
            planner.plan(10, &params((22, 0), (6, 0), 7.5)),
            Err(EngineError::InvalidServiceWindow { .. })
        ));
        assert!(matches!(
            planner.plan(10, &params((6, 0), (22, 0), 0.0)),
            Err(EngineError::InvalidHeadway(_))
        ));
    }

    #[test]
    fn test_target_service_hard_cap() {
        let planner = CapacityPlanner::new();
        let j = planner.plan(25, &PlannerParams::default()).unwrap();
        let targets = planner.targets(&j, 20);
        assert_eq!(targets.target_service, MAX_SERVICE_TRAINS);
        assert_eq!(targets.max_standby, MAX_STANDBY_TRAINS);

        let targets = planner.targets(&j, 5);
        assert_eq!(targets.target_service, 5);
    }
}
