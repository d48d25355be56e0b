// ==========================================
// 地铁车队运营排程系统 - 风险/里程/状态估计器
// ==========================================
// 职责: 估计器协作方接口 + 规则表实现 + 值域约定校验
// 约定: failure_risk ∈ [0,1], next_day_mileage ≥ 0, predicted_status ∈ {Service,Standby,IBL}
// ==========================================

use crate::domain::train::{Estimate, TrainFeatureRecord};
use crate::domain::types::TrainStatus;
use crate::engine::eligibility::EligibilityClassifier;
use crate::engine::error::{EstimatorError, EstimatorResult};

/// 规则估计器的基础次日里程 (km)
pub const DEFAULT_BASE_MILEAGE_KM: f64 = 400.0;

/// 长交路车辆段
pub const LONG_ROUTE_DEPOT: &str = "Pettah Depot";

// ==========================================
// Trait: Estimator
// ==========================================
// 任何满足值域约定的实现 (统计模型/规则表/学习模型) 都可替换
pub trait Estimator: Send + Sync {
    /// 对单条特征记录估计风险、次日里程与粗粒度状态
    ///
    /// predicted_status 返回 None 表示冷启动 (无先验)
    fn estimate(&self, record: &TrainFeatureRecord) -> EstimatorResult<Estimate>;

    /// 估计器名称 (日志用)
    fn name(&self) -> &str {
        "estimator"
    }
}

/// 校验估计结果是否满足值域约定
pub fn check_contract(train_id: &str, estimate: &Estimate) -> EstimatorResult<()> {
    let risk = estimate.failure_risk;
    if !risk.is_finite() || !(0.0..=1.0).contains(&risk) {
        return Err(EstimatorError::ContractViolation {
            train_id: train_id.to_string(),
            message: format!("failure_risk={} 超出 [0,1]", risk),
        });
    }
    let mileage = estimate.next_day_mileage;
    if !mileage.is_finite() || mileage < 0.0 {
        return Err(EstimatorError::ContractViolation {
            train_id: train_id.to_string(),
            message: format!("next_day_mileage={} 为负或非有限值", mileage),
        });
    }
    if estimate.predicted_status == Some(TrainStatus::Pending) {
        return Err(EstimatorError::ContractViolation {
            train_id: train_id.to_string(),
            message: "predicted_status 不允许为 PENDING".to_string(),
        });
    }
    Ok(())
}

// ==========================================
// RuleBasedEstimator - 规则表估计器
// ==========================================
#[derive(Debug, Clone)]
pub struct RuleBasedEstimator {
    base_mileage_km: f64,
}

impl RuleBasedEstimator {
    pub fn new() -> Self {
        Self {
            base_mileage_km: DEFAULT_BASE_MILEAGE_KM,
        }
    }

    pub fn with_base_mileage(base_mileage_km: f64) -> Self {
        Self { base_mileage_km }
    }

    /// 故障风险
    ///
    /// # 规则
    /// - 转向架磨耗 × 0.3
    /// - 关键工单数 × 0.2
    /// - 每张到期证书 (≤0) + 0.3
    /// - min(里程/10000, 1) × 0.2
    /// - 温度超过 28°C: (temp−28)/10 × 0.1
    /// - HVAC 告警 + 0.1
    /// 上限 1.0,保留 4 位小数
    pub fn failure_risk(record: &TrainFeatureRecord) -> f64 {
        let bogie_risk = record.bogie_wear_index * 0.3;
        let job_risk = record.job_critical_count as f64 * 0.2;

        let maintenance_risk = [
            record.rs_days_from_plan,
            record.sig_days_from_plan,
            record.tel_days_from_plan,
        ]
        .iter()
        .filter(|&&days| days <= 0)
        .count() as f64
            * 0.3;

        let mileage_risk = (record.mileage_km / 10_000.0).min(1.0) * 0.2;
        let temp_risk = if record.iot_temp_avg_c > 28.0 {
            (record.iot_temp_avg_c - 28.0) / 10.0 * 0.1
        } else {
            0.0
        };
        let hvac_risk = if record.hvac_alert { 0.1 } else { 0.0 };

        let total = (bogie_risk + job_risk + maintenance_risk + mileage_risk + temp_risk + hvac_risk)
            .clamp(0.0, 1.0);
        round_to(total, 4)
    }

    /// 次日里程
    ///
    /// base × min(里程/5000, 1.5) × (长交路车辆段 1.2 否则 1.0),保留 2 位小数
    pub fn next_day_mileage(&self, record: &TrainFeatureRecord) -> f64 {
        let mileage_factor = (record.mileage_km / 5_000.0).min(1.5);
        let depot_factor = if record.depot == LONG_ROUTE_DEPOT { 1.2 } else { 1.0 };
        round_to(
            (self.base_mileage_km * mileage_factor * depot_factor).max(0.0),
            2,
        )
    }
}

impl Default for RuleBasedEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for RuleBasedEstimator {
    fn estimate(&self, record: &TrainFeatureRecord) -> EstimatorResult<Estimate> {
        let failure_risk = Self::failure_risk(record);
        Ok(Estimate {
            failure_risk,
            next_day_mileage: self.next_day_mileage(record),
            predicted_status: Some(EligibilityClassifier::coarse_status(record, failure_risk)),
        })
    }

    fn name(&self) -> &str {
        "rule_based"
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_record(train_id: &str) -> TrainFeatureRecord {
        TrainFeatureRecord::new(train_id, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())
    }

    #[test]
    fn test_failure_risk_components() {
        let mut record = create_test_record("T1");
        record.bogie_wear_index = 0.5;
        record.mileage_km = 5_000.0;
        record.iot_temp_avg_c = 30.0;
        record.hvac_alert = true;
        // 0.15 + 0.1 + 0.02 + 0.1
        let risk = RuleBasedEstimator::failure_risk(&record);
        assert!((risk - 0.37).abs() < 1e-9);
    }

    #[test]
    fn test_failure_risk_is_capped() {
        let mut record = create_test_record("T1");
        record.job_critical_count = 3;
        record.rs_days_from_plan = -1;
        record.sig_days_from_plan = 0;
        assert_eq!(RuleBasedEstimator::failure_risk(&record), 1.0);
    }

    #[test]
    fn test_next_day_mileage_depot_factor() {
        let estimator = RuleBasedEstimator::with_base_mileage(400.0);
        let mut record = create_test_record("T1");
        record.mileage_km = 10_000.0;
        record.depot = LONG_ROUTE_DEPOT.to_string();
        // 400 * 1.5 * 1.2
        assert_eq!(estimator.next_day_mileage(&record), 720.0);
        record.depot = "Tripunithura Depot".to_string();
        assert_eq!(estimator.next_day_mileage(&record), 600.0);
    }

    #[test]
    fn test_hard_excluded_train_predicted_ibl() {
        let mut record = create_test_record("T1");
        record.tel_days_from_plan = 0;
        let estimate = RuleBasedEstimator::new().estimate(&record).unwrap();
        assert_eq!(estimate.predicted_status, Some(TrainStatus::Ibl));
    }

    #[test]
    fn test_contract_check() {
        let ok = Estimate {
            failure_risk: 0.2,
            next_day_mileage: 100.0,
            predicted_status: None,
        };
        assert!(check_contract("T1", &ok).is_ok());

        let bad_risk = Estimate { failure_risk: 1.2, ..ok };
        assert!(check_contract("T1", &bad_risk).is_err());

        let bad_mileage = Estimate { next_day_mileage: -1.0, ..ok };
        assert!(check_contract("T1", &bad_mileage).is_err());

        let nan_risk = Estimate { failure_risk: f64::NAN, ..ok };
        assert!(check_contract("T1", &nan_risk).is_err());
    }
}
