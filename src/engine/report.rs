// ==========================================
// 地铁车队运营排程系统 - 运营报告聚合器
// ==========================================
// 职责: 由最终排程派生健康指数、告警、收入、交路、能耗、乘客体验、维修计划
// 红线: 只读消费者,不参与分配决策,不修改排程
// ==========================================

use crate::domain::report::{
    AlertKind, EnergyEfficiency, EnergyRating, ExperienceRating, FleetAlert, FleetHealthIndex,
    FleetReport, MaintenanceTask, MaintenanceUrgency, PassengerExperience, RevenueImpact,
    RouteAssignment,
};
use crate::domain::schedule::Schedule;
use crate::domain::train::ScheduledTrain;
use crate::domain::types::{AlertSeverity, IblCause, TrainStatus};
use crate::i18n;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{info, instrument};

// ===== 健康指数权重 =====
const HEALTH_WEIGHT_MAINTENANCE: f64 = 0.3;
const HEALTH_WEIGHT_AVAILABILITY: f64 = 0.25;
const HEALTH_WEIGHT_EFFICIENCY: f64 = 0.2;
const HEALTH_WEIGHT_SAFETY: f64 = 0.15;
const HEALTH_WEIGHT_UTILIZATION: f64 = 0.1;

// ===== 告警阈值 =====
const ALERT_RISK_THRESHOLD: f64 = 0.25;
const ALERT_RISK_HIGH_THRESHOLD: f64 = 0.35;
const ALERT_WEAR_THRESHOLD: f64 = 0.35;
const ALERT_TEMP_THRESHOLD_C: f64 = 29.0;

// ===== 收入与成本 =====
const DAILY_KM_PER_TRAIN: f64 = 150.0;
const REVENUE_PER_KM: f64 = 25.0;
const MAINT_HOURS_PER_JOB: f64 = 4.0;
const MAINT_COST_PER_HOUR: f64 = 5000.0;
const BRANDING_COST_PER_HOUR: f64 = 2000.0;

/// 无交路满足可靠性要求时的兜底交路
pub const FALLBACK_ROUTE: &str = "Maintenance_Priority";

/// 交路画像 (名称, 需求系数, 可靠性门槛, 里程系数)
const ROUTE_PROFILES: [(&str, f64, f64, f64); 4] = [
    ("Peak_Express", 1.8, 0.9, 1.2),
    ("Off_Peak_Local", 0.7, 0.7, 0.8),
    ("Airport_Connector", 1.5, 0.95, 1.1),
    ("Tourist_Circuit", 1.0, 0.85, 0.9),
];

// ==========================================
// ReportAggregator - 运营报告聚合器
// ==========================================
pub struct ReportAggregator {
    // 无状态引擎
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 生成完整报告
    #[instrument(skip(self, schedule), fields(version = %schedule.version))]
    pub fn generate_report(&self, schedule: &Schedule) -> FleetReport {
        let report = FleetReport {
            schedule_version: schedule.version,
            date: schedule.date,
            health_index: self.fleet_health_index(&schedule.trains),
            alerts: self.alerts(&schedule.trains),
            optimizations: self.resource_optimization(&schedule.trains),
            revenue: self.revenue_impact(&schedule.trains),
            routes: self.route_assignment(&schedule.trains),
            energy: self.energy_efficiency(&schedule.trains),
            passenger_experience: self.passenger_experience(&schedule.trains),
            maintenance_schedule: self.maintenance_schedule(&schedule.trains),
            justification: schedule.justification.clone(),
        };
        info!(
            health = report.health_index.overall,
            alerts = report.alerts.len(),
            maintenance_tasks = report.maintenance_schedule.len(),
            "运营报告生成完成"
        );
        report
    }

    /// 车队健康指数
    ///
    /// # 规则
    /// - 检修: max(0, 100 − 逾期证书数·15 − 关键工单总数·10),逾期指倒计时 < 0
    /// - 可用: Service+Standby 占比 × 100
    /// - 效率: max(0, 100 − 平均风险·200 − 平均磨耗·100)
    /// - 安全: max(0, 100 − HVAC 告警数·10 − 高温(>30°C)车数·5)
    /// - 均衡: max(0, 100 − 各车辆段车数样本标准差·10)
    pub fn fleet_health_index(&self, trains: &[ScheduledTrain]) -> FleetHealthIndex {
        if trains.is_empty() {
            return FleetHealthIndex {
                overall: 0.0,
                maintenance_score: 0.0,
                availability_score: 0.0,
                efficiency_score: 0.0,
                safety_score: 0.0,
                utilization_score: 0.0,
            };
        }
        let n = trains.len() as f64;

        let cert_overdue: usize = trains
            .iter()
            .map(|t| {
                [
                    t.record.rs_days_from_plan,
                    t.record.sig_days_from_plan,
                    t.record.tel_days_from_plan,
                ]
                .iter()
                .filter(|&&d| d < 0)
                .count()
            })
            .sum();
        let critical_total: u64 = trains
            .iter()
            .map(|t| u64::from(t.record.job_critical_count))
            .sum();
        let maintenance_score =
            (100.0 - cert_overdue as f64 * 15.0 - critical_total as f64 * 10.0).max(0.0);

        let service_ready = trains.iter().filter(|t| t.final_status.is_operational()).count();
        let availability_score = service_ready as f64 / n * 100.0;

        let avg_risk = trains.iter().map(|t| t.failure_risk()).sum::<f64>() / n;
        let avg_wear = trains.iter().map(|t| t.record.bogie_wear_index).sum::<f64>() / n;
        let efficiency_score = (100.0 - avg_risk * 200.0 - avg_wear * 100.0).max(0.0);

        let hvac_issues = trains.iter().filter(|t| t.record.hvac_alert).count();
        let high_temp = trains.iter().filter(|t| t.record.iot_temp_avg_c > 30.0).count();
        let safety_score = (100.0 - hvac_issues as f64 * 10.0 - high_temp as f64 * 5.0).max(0.0);

        let depot_counts: Vec<f64> = group_by_depot(trains)
            .values()
            .map(|group| group.len() as f64)
            .collect();
        let utilization_score = (100.0 - sample_std_dev(&depot_counts) * 10.0).max(0.0);

        let overall = maintenance_score * HEALTH_WEIGHT_MAINTENANCE
            + availability_score * HEALTH_WEIGHT_AVAILABILITY
            + efficiency_score * HEALTH_WEIGHT_EFFICIENCY
            + safety_score * HEALTH_WEIGHT_SAFETY
            + utilization_score * HEALTH_WEIGHT_UTILIZATION;

        FleetHealthIndex {
            overall: round_to(overall, 2),
            maintenance_score,
            availability_score,
            efficiency_score,
            safety_score,
            utilization_score,
        }
    }

    /// 告警: 预测性维修告警 + 排程 IBL 成因告警
    pub fn alerts(&self, trains: &[ScheduledTrain]) -> Vec<FleetAlert> {
        let mut alerts = Vec::new();

        for train in trains {
            let record = &train.record;
            let risk = train.failure_risk();

            if risk > ALERT_RISK_THRESHOLD {
                let severity = if risk > ALERT_RISK_HIGH_THRESHOLD {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Medium
                };
                alerts.push(Self::alert(train, AlertKind::PredictiveFailure, severity, Some(risk)));
            }
            if record.bogie_wear_index > ALERT_WEAR_THRESHOLD {
                alerts.push(Self::alert(
                    train,
                    AlertKind::BogieWear,
                    AlertSeverity::Medium,
                    Some(record.bogie_wear_index),
                ));
            }
            if record.iot_temp_avg_c > ALERT_TEMP_THRESHOLD_C && !record.hvac_alert {
                alerts.push(Self::alert(
                    train,
                    AlertKind::TempAnomaly,
                    AlertSeverity::Low,
                    Some(record.iot_temp_avg_c),
                ));
            }

            if train.final_status == TrainStatus::Ibl {
                let schedule_alert = match train.ibl_cause {
                    Some(IblCause::SafetyExclusion) => {
                        Some((AlertKind::SafetyExclusion, AlertSeverity::High))
                    }
                    Some(IblCause::CapacityOverflow) => {
                        Some((AlertKind::CapacityOverflow, AlertSeverity::Low))
                    }
                    Some(IblCause::ManualOverride) => {
                        Some((AlertKind::ManualOverride, AlertSeverity::Medium))
                    }
                    Some(IblCause::Predicted) | None => None,
                };
                if let Some((kind, severity)) = schedule_alert {
                    alerts.push(Self::alert(train, kind, severity, None));
                }
            }
        }

        alerts
    }

    fn alert(
        train: &ScheduledTrain,
        kind: AlertKind,
        severity: AlertSeverity,
        value: Option<f64>,
    ) -> FleetAlert {
        let value_text = value
            .map(|v| format!("{:.4}", v))
            .unwrap_or_else(|| "-".to_string());
        let kind_text = kind.to_string();
        let severity_text = severity.to_string();
        let message = i18n::t_with_args(
            "alert.message",
            &[
                ("train_id", train.record.train_id.as_str()),
                ("depot", train.record.depot.as_str()),
                ("kind", kind_text.as_str()),
                ("severity", severity_text.as_str()),
                ("value", value_text.as_str()),
            ],
        );
        FleetAlert {
            train_id: train.record.train_id.clone(),
            depot: train.record.depot.clone(),
            kind,
            severity,
            value,
            message,
        }
    }

    /// 资源优化建议
    ///
    /// - 车辆段单车工作量 (open + 2·critical)/车数 的最大值 > 最小值 × 1.5 → 工作量失衡
    /// - No-Clean 车数 > 车队 40% → 洗车排班欠优
    pub fn resource_optimization(&self, trains: &[ScheduledTrain]) -> Vec<String> {
        let mut suggestions = Vec::new();
        if trains.is_empty() {
            return suggestions;
        }

        let workloads: Vec<f64> = group_by_depot(trains)
            .values()
            .map(|group| {
                let load: u64 = group
                    .iter()
                    .map(|t| {
                        u64::from(t.record.job_open_count) + 2 * u64::from(t.record.job_critical_count)
                    })
                    .sum();
                load as f64 / group.len() as f64
            })
            .collect();
        let max = workloads.iter().cloned().fold(f64::MIN, f64::max);
        let min = workloads.iter().cloned().fold(f64::MAX, f64::min);
        if max > min * 1.5 {
            suggestions.push(i18n::t("optimization.depot_imbalance"));
        }

        let no_clean = trains
            .iter()
            .filter(|t| t.record.cleaning_slot == "No-Clean")
            .count();
        if no_clean as f64 > trains.len() as f64 * 0.4 {
            suggestions.push(i18n::t("optimization.cleaning_suboptimal"));
        }

        suggestions
    }

    /// 收入影响
    pub fn revenue_impact(&self, trains: &[ScheduledTrain]) -> RevenueImpact {
        let out_of_service = trains
            .iter()
            .filter(|t| t.final_status == TrainStatus::Ibl)
            .count();
        let open_jobs: u64 = trains
            .iter()
            .map(|t| u64::from(t.record.job_open_count))
            .sum();
        let req: f64 = trains.iter().map(|t| t.record.branding_req_hours).sum();
        let alloc: f64 = trains.iter().map(|t| t.record.branding_alloc_hours).sum();

        RevenueImpact {
            out_of_service,
            potential_loss: out_of_service as f64 * DAILY_KM_PER_TRAIN * REVENUE_PER_KM,
            maint_cost_today: open_jobs as f64 * MAINT_HOURS_PER_JOB * MAINT_COST_PER_HOUR,
            branding_shortfall_cost: (req - alloc).max(0.0) * BRANDING_COST_PER_HOUR,
        }
    }

    /// 动态交路分配 (仅正线列车)
    ///
    /// reliability = 1 − risk − bogie_wear·0.3;满足门槛的交路中取
    /// reliability·demand·(2 − mileage) 最大者
    pub fn route_assignment(&self, trains: &[ScheduledTrain]) -> Vec<RouteAssignment> {
        trains
            .iter()
            .filter(|t| t.final_status == TrainStatus::Service)
            .map(|t| {
                let reliability = 1.0 - t.failure_risk() - t.record.bogie_wear_index * 0.3;
                let mut best: Option<&str> = None;
                let mut best_score = 0.0;
                for (route, demand, required, mileage) in ROUTE_PROFILES {
                    if reliability >= required {
                        let score = reliability * demand * (2.0 - mileage);
                        if score > best_score {
                            best = Some(route);
                            best_score = score;
                        }
                    }
                }
                RouteAssignment {
                    train_id: t.record.train_id.clone(),
                    assigned_route: best.unwrap_or(FALLBACK_ROUTE).to_string(),
                    reliability: round_to(reliability, 3),
                }
            })
            .collect()
    }

    /// 能耗评估 (kWh/100km)
    pub fn energy_efficiency(&self, trains: &[ScheduledTrain]) -> Vec<EnergyEfficiency> {
        trains
            .iter()
            .map(|t| {
                let record = &t.record;
                let wear_cost = record.bogie_wear_index * 20.0;
                let hvac_cost = if record.hvac_alert { 15.0 } else { 0.0 };
                let temp_cost = ((record.iot_temp_avg_c - 25.0) * 0.8).max(0.0);
                let shunting_cost = record.estimated_shunting_mins as f64 * 0.2;
                let total = 100.0 + wear_cost + hvac_cost + temp_cost + shunting_cost;

                let rating = if total < 110.0 {
                    EnergyRating::Excellent
                } else if total < 125.0 {
                    EnergyRating::Good
                } else {
                    EnergyRating::Poor
                };
                let main_issue = if wear_cost > 7.0 {
                    "Bogie Wear"
                } else if hvac_cost > 10.0 {
                    "HVAC"
                } else if temp_cost > 5.0 {
                    "Temp"
                } else {
                    "Ops"
                };

                EnergyEfficiency {
                    train_id: record.train_id.clone(),
                    kwh_per_100km: round_to(total, 1),
                    rating,
                    main_issue: main_issue.to_string(),
                }
            })
            .collect()
    }

    /// 乘客体验评分
    pub fn passenger_experience(&self, trains: &[ScheduledTrain]) -> Vec<PassengerExperience> {
        trains
            .iter()
            .map(|t| {
                let record = &t.record;
                let mut score: i32 = 100;
                let mut factors: Vec<String> = Vec::new();

                let penalties = [
                    (record.hvac_alert, 25, "HVAC malfunction"),
                    (record.iot_temp_avg_c > 28.0, 10, "High cabin temperature"),
                    (record.cleaning_slot == "No-Clean", 15, "No cleaning scheduled"),
                    (t.failure_risk() > 0.3, 20, "High service interruption risk"),
                    (record.bogie_wear_index > 0.35, 10, "Noise/Vibration risk"),
                    (record.estimated_shunting_mins > 30, 8, "Extended shunting delays"),
                ];
                for (hit, penalty, factor) in penalties {
                    if hit {
                        score -= penalty;
                        factors.push(factor.to_string());
                    }
                }

                let rating = if score >= 90 {
                    ExperienceRating::Excellent
                } else if score >= 75 {
                    ExperienceRating::Good
                } else if score >= 60 {
                    ExperienceRating::Fair
                } else {
                    ExperienceRating::Poor
                };
                factors.truncate(2);
                if factors.is_empty() {
                    factors.push("None".to_string());
                }

                PassengerExperience {
                    train_id: record.train_id.clone(),
                    score: score.max(0),
                    rating,
                    factors,
                }
            })
            .collect()
    }

    /// 智能维修计划 (按优先级降序)
    pub fn maintenance_schedule(&self, trains: &[ScheduledTrain]) -> Vec<MaintenanceTask> {
        let mut tasks: Vec<MaintenanceTask> = trains
            .iter()
            .filter_map(|t| {
                let record = &t.record;
                let mut priority = 0.0;
                let mut types: Vec<String> = Vec::new();
                let mut urgency = MaintenanceUrgency::Low;

                if record.job_critical_count > 0 {
                    priority += 100.0;
                    types.push("Critical".to_string());
                    urgency = MaintenanceUrgency::Immediate;
                }
                for (days, weight, label) in [
                    (record.rs_days_from_plan, 80.0, "RS Cert"),
                    (record.sig_days_from_plan, 75.0, "SIG Check"),
                    (record.tel_days_from_plan, 70.0, "TEL Maint"),
                ] {
                    if days <= 5 {
                        priority += weight;
                        types.push(label.to_string());
                        urgency = urgency.max(MaintenanceUrgency::High);
                    }
                }
                if t.failure_risk() > ALERT_RISK_THRESHOLD {
                    priority += t.failure_risk() * 100.0;
                    types.push("Predictive".to_string());
                    urgency = urgency.max(MaintenanceUrgency::Medium);
                }
                if record.bogie_wear_index > ALERT_WEAR_THRESHOLD {
                    priority += record.bogie_wear_index * 50.0;
                    types.push("Bogie".to_string());
                    urgency = urgency.max(MaintenanceUrgency::Medium);
                }

                if priority <= 0.0 {
                    return None;
                }
                let est_hours = types.len() as u64 * 4 + u64::from(record.job_open_count) * 2;
                Some(MaintenanceTask {
                    train_id: record.train_id.clone(),
                    final_status: t.final_status,
                    priority: round_to(priority, 1),
                    urgency,
                    window: urgency.window().to_string(),
                    types,
                    est_hours,
                })
            })
            .collect();

        tasks.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(Ordering::Equal));
        tasks
    }
}

impl Default for ReportAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn group_by_depot(trains: &[ScheduledTrain]) -> BTreeMap<&str, Vec<&ScheduledTrain>> {
    let mut groups: BTreeMap<&str, Vec<&ScheduledTrain>> = BTreeMap::new();
    for train in trains {
        groups.entry(train.record.depot.as_str()).or_default().push(train);
    }
    groups
}

/// 样本标准差 (n−1);少于两个样本时为 0
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::train::{Prediction, TrainFeatureRecord};
    use chrono::NaiveDate;

    fn create_test_train(train_id: &str, status: TrainStatus, risk: f64) -> ScheduledTrain {
        let mut record =
            TrainFeatureRecord::new(train_id, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        record.depot = "Pettah Depot".to_string();
        record.cleaning_slot = "Night-A".to_string();
        ScheduledTrain {
            record,
            prediction: Prediction {
                predicted_failure_risk: risk,
                predicted_next_day_mileage: 300.0,
                predicted_status: status,
            },
            final_status: status,
            ranking: 0,
            manual_override_reason: None,
            composite_score: None,
            ibl_cause: None,
        }
    }

    #[test]
    fn test_health_index_perfect_fleet() {
        let trains = vec![
            create_test_train("T1", TrainStatus::Service, 0.0),
            create_test_train("T2", TrainStatus::Standby, 0.0),
        ];
        let index = ReportAggregator::new().fleet_health_index(&trains);
        assert_eq!(index.maintenance_score, 100.0);
        assert_eq!(index.availability_score, 100.0);
        assert_eq!(index.utilization_score, 100.0);
        assert_eq!(index.overall, 100.0);
    }

    #[test]
    fn test_health_index_penalties() {
        let mut t1 = create_test_train("T1", TrainStatus::Ibl, 0.5);
        t1.record.rs_days_from_plan = -1;
        t1.record.job_critical_count = 1;
        t1.record.hvac_alert = true;
        let t2 = create_test_train("T2", TrainStatus::Service, 0.1);

        let index = ReportAggregator::new().fleet_health_index(&[t1, t2]);
        assert_eq!(index.maintenance_score, 75.0);
        assert_eq!(index.availability_score, 50.0);
        // 100 - 0.3*200
        assert!((index.efficiency_score - 40.0).abs() < 1e-9);
        assert_eq!(index.safety_score, 90.0);
    }

    #[test]
    fn test_alert_thresholds() {
        let mut high = create_test_train("T1", TrainStatus::Standby, 0.4);
        high.record.bogie_wear_index = 0.5;
        let medium = create_test_train("T2", TrainStatus::Service, 0.3);
        let mut hot = create_test_train("T3", TrainStatus::Service, 0.1);
        hot.record.iot_temp_avg_c = 29.5;

        let alerts = ReportAggregator::new().alerts(&[high, medium, hot]);
        let summary: Vec<(&str, AlertKind, AlertSeverity)> = alerts
            .iter()
            .map(|a| (a.train_id.as_str(), a.kind, a.severity))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("T1", AlertKind::PredictiveFailure, AlertSeverity::High),
                ("T1", AlertKind::BogieWear, AlertSeverity::Medium),
                ("T2", AlertKind::PredictiveFailure, AlertSeverity::Medium),
                ("T3", AlertKind::TempAnomaly, AlertSeverity::Low),
            ]
        );
    }

    #[test]
    fn test_ibl_cause_alerts_are_distinguished() {
        let mut safety = create_test_train("T1", TrainStatus::Ibl, 0.0);
        safety.ibl_cause = Some(IblCause::SafetyExclusion);
        let mut capacity = create_test_train("T2", TrainStatus::Ibl, 0.0);
        capacity.ibl_cause = Some(IblCause::CapacityOverflow);

        let alerts = ReportAggregator::new().alerts(&[safety, capacity]);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::SafetyExclusion);
        assert_eq!(alerts[1].kind, AlertKind::CapacityOverflow);
    }

    #[test]
    fn test_revenue_impact() {
        let mut t1 = create_test_train("T1", TrainStatus::Ibl, 0.0);
        t1.record.job_open_count = 2;
        t1.record.branding_req_hours = 10.0;
        t1.record.branding_alloc_hours = 4.0;
        let t2 = create_test_train("T2", TrainStatus::Service, 0.0);

        let revenue = ReportAggregator::new().revenue_impact(&[t1, t2]);
        assert_eq!(revenue.out_of_service, 1);
        assert_eq!(revenue.potential_loss, 3750.0);
        assert_eq!(revenue.maint_cost_today, 40_000.0);
        assert_eq!(revenue.branding_shortfall_cost, 12_000.0);
    }

    #[test]
    fn test_route_assignment_picks_best_profile() {
        let reliable = create_test_train("T1", TrainStatus::Service, 0.0);
        let mut weak = create_test_train("T2", TrainStatus::Service, 0.4);
        weak.record.bogie_wear_index = 0.5;
        let standby = create_test_train("T3", TrainStatus::Standby, 0.0);

        let routes = ReportAggregator::new().route_assignment(&[reliable, weak, standby]);
        assert_eq!(routes.len(), 2);
        // 1.0: Peak 1.44, Off-Peak 0.84, Airport 1.35, Tourist 1.1
        assert_eq!(routes[0].assigned_route, "Peak_Express");
        // 0.45 低于所有门槛
        assert_eq!(routes[1].assigned_route, FALLBACK_ROUTE);
    }

    #[test]
    fn test_energy_and_passenger_scores() {
        let mut t = create_test_train("T1", TrainStatus::Service, 0.35);
        t.record.hvac_alert = true;
        t.record.iot_temp_avg_c = 29.0;
        t.record.estimated_shunting_mins = 40;

        let energy = ReportAggregator::new().energy_efficiency(&[t.clone()]);
        // 100 + 0 + 15 + 3.2 + 8
        assert_eq!(energy[0].kwh_per_100km, 126.2);
        assert_eq!(energy[0].rating, EnergyRating::Poor);
        assert_eq!(energy[0].main_issue, "HVAC");

        let experience = ReportAggregator::new().passenger_experience(&[t]);
        // 100 - 25 - 10 - 20 - 8
        assert_eq!(experience[0].score, 37);
        assert_eq!(experience[0].rating, ExperienceRating::Poor);
        assert_eq!(
            experience[0].factors,
            vec!["HVAC malfunction".to_string(), "High cabin temperature".to_string()]
        );
    }

    #[test]
    fn test_maintenance_schedule_sorted_by_priority() {
        let mut critical = create_test_train("T1", TrainStatus::Ibl, 0.0);
        critical.record.job_critical_count = 1;
        critical.record.job_open_count = 3;
        let mut cert = create_test_train("T2", TrainStatus::Standby, 0.0);
        cert.record.rs_days_from_plan = 3;
        cert.record.sig_days_from_plan = 4;
        let healthy = create_test_train("T3", TrainStatus::Service, 0.0);

        let tasks = ReportAggregator::new().maintenance_schedule(&[critical, cert, healthy]);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].train_id, "T2");
        assert_eq!(tasks[0].priority, 155.0);
        assert_eq!(tasks[0].urgency, MaintenanceUrgency::High);
        assert_eq!(tasks[0].window, "Within 72 hours");
        assert_eq!(tasks[1].urgency, MaintenanceUrgency::Immediate);
        assert_eq!(tasks[1].est_hours, 4 + 6);
    }

    #[test]
    fn test_large_job_counts_do_not_overflow() {
        let mut t1 = create_test_train("T1", TrainStatus::Ibl, 0.0);
        t1.record.job_open_count = 3_000_000_000;
        t1.record.job_critical_count = u32::MAX;
        let mut t2 = create_test_train("T2", TrainStatus::Service, 0.0);
        t2.record.job_open_count = u32::MAX;

        let aggregator = ReportAggregator::new();
        let trains = [t1, t2];

        let tasks = aggregator.maintenance_schedule(&trains);
        let t1_task = tasks.iter().find(|t| t.train_id == "T1").unwrap();
        assert_eq!(t1_task.est_hours, 4 + 6_000_000_000);

        let revenue = aggregator.revenue_impact(&trains);
        let open_total = 3_000_000_000u64 + u64::from(u32::MAX);
        assert_eq!(
            revenue.maint_cost_today,
            open_total as f64 * MAINT_HOURS_PER_JOB * MAINT_COST_PER_HOUR
        );

        assert_eq!(aggregator.fleet_health_index(&trains).maintenance_score, 0.0);
        aggregator.resource_optimization(&trains);
    }
}
