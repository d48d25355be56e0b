// ==========================================
// 地铁车队运营排程系统 - 准入分类器
// ==========================================
// 职责: 硬安全/检修约束判定,将车队切分为 排除池(强制 IBL) 与 合格池
// 红线: 纯函数、全量判定、无副作用;全系统唯一的准入规则实现
// ==========================================

use crate::domain::train::TrainFeatureRecord;
use crate::domain::types::{ExclusionReason, TrainStatus};
use tracing::{debug, info, instrument};

/// 粗粒度状态规则: 综合分 ≥ 0.7 → Service
pub const COARSE_SERVICE_THRESHOLD: f64 = 0.7;
/// 粗粒度状态规则: 综合分 ≥ 0.4 → Standby
pub const COARSE_STANDBY_THRESHOLD: f64 = 0.4;

/// 被排除的列车及其原因
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedTrain {
    pub index: usize, // 在输入批次中的位置
    pub reasons: Vec<ExclusionReason>,
}

/// 分类结果 (索引均指向输入批次,保持输入顺序)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    pub excluded: Vec<ExcludedTrain>,
    pub eligible: Vec<usize>,
}

impl Classification {
    pub fn is_excluded(&self, index: usize) -> bool {
        self.excluded.iter().any(|e| e.index == index)
    }
}

// ==========================================
// EligibilityClassifier - 准入分类器
// ==========================================
pub struct EligibilityClassifier {
    // 无状态引擎
}

impl EligibilityClassifier {
    pub fn new() -> Self {
        Self {}
    }

    /// 单条记录的硬排除原因
    ///
    /// # 规则
    /// 任一成立即排除 (强制 IBL):
    /// - job_critical_count > 0
    /// - rs/sig/tel_days_from_plan ≤ 0
    /// - manual_override_flag 已设置
    ///
    /// # 返回
    /// - 空列表: 合格
    pub fn exclusion_reasons(record: &TrainFeatureRecord) -> Vec<ExclusionReason> {
        let mut reasons = Vec::new();
        if record.job_critical_count > 0 {
            reasons.push(ExclusionReason::CriticalJobOpen);
        }
        if record.rs_days_from_plan <= 0 {
            reasons.push(ExclusionReason::RollingStockExpired);
        }
        if record.sig_days_from_plan <= 0 {
            reasons.push(ExclusionReason::SignallingExpired);
        }
        if record.tel_days_from_plan <= 0 {
            reasons.push(ExclusionReason::TelecomExpired);
        }
        if record.manual_override_flag {
            reasons.push(ExclusionReason::ManualFlag);
        }
        reasons
    }

    /// 是否触发硬排除
    pub fn is_hard_excluded(record: &TrainFeatureRecord) -> bool {
        !Self::exclusion_reasons(record).is_empty()
    }

    /// 粗粒度规则状态 (估计器冷启动时的替代值)
    ///
    /// # 规则
    /// - 硬排除 → IBL
    /// - 否则 score = 0.4·(1−risk) + 0.3·passenger/100 + 0.3·(1−bogie_wear)
    ///   ≥ 0.7 → Service, ≥ 0.4 → Standby, 否则 IBL
    ///
    /// passenger 采用与排序器一致的乘客体验分 (0..100)
    pub fn coarse_status(record: &TrainFeatureRecord, failure_risk: f64) -> TrainStatus {
        if Self::is_hard_excluded(record) {
            return TrainStatus::Ibl;
        }
        let passenger = crate::engine::ranker::DesirabilityRanker::passenger_score(record) * 100.0;
        let score = 0.4 * (1.0 - failure_risk)
            + 0.3 * passenger / 100.0
            + 0.3 * (1.0 - record.bogie_wear_index);

        if score >= COARSE_SERVICE_THRESHOLD {
            TrainStatus::Service
        } else if score >= COARSE_STANDBY_THRESHOLD {
            TrainStatus::Standby
        } else {
            TrainStatus::Ibl
        }
    }

    /// 全量分类
    ///
    /// # 参数
    /// - records: 当日批次
    ///
    /// # 返回
    /// - Classification: 排除池与合格池 (均保持输入顺序)
    #[instrument(skip(self, records), fields(fleet_size = records.len()))]
    pub fn classify(&self, records: &[TrainFeatureRecord]) -> Classification {
        let mut classification = Classification::default();

        for (index, record) in records.iter().enumerate() {
            let reasons = Self::exclusion_reasons(record);
            if reasons.is_empty() {
                classification.eligible.push(index);
            } else {
                debug!(
                    train_id = %record.train_id,
                    reasons = ?reasons,
                    cause = "SAFETY_EXCLUSION",
                    "列车触发硬约束,强制 IBL"
                );
                classification.excluded.push(ExcludedTrain { index, reasons });
            }
        }

        info!(
            eligible_count = classification.eligible.len(),
            excluded_count = classification.excluded.len(),
            "准入分类完成"
        );
        classification
    }
}

impl Default for EligibilityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_record(train_id: &str) -> TrainFeatureRecord {
        TrainFeatureRecord::new(train_id, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())
    }

    #[test]
    fn test_healthy_train_is_eligible() {
        let record = create_test_record("T1");
        assert!(EligibilityClassifier::exclusion_reasons(&record).is_empty());
    }

    #[test]
    fn test_each_hard_constraint_excludes() {
        let mut critical = create_test_record("T1");
        critical.job_critical_count = 1;
        let mut rs = create_test_record("T2");
        rs.rs_days_from_plan = 0;
        let mut sig = create_test_record("T3");
        sig.sig_days_from_plan = -3;
        let mut tel = create_test_record("T4");
        tel.tel_days_from_plan = 0;
        let mut manual = create_test_record("T5");
        manual.manual_override_flag = true;

        assert_eq!(
            EligibilityClassifier::exclusion_reasons(&critical),
            vec![ExclusionReason::CriticalJobOpen]
        );
        assert_eq!(
            EligibilityClassifier::exclusion_reasons(&rs),
            vec![ExclusionReason::RollingStockExpired]
        );
        assert_eq!(
            EligibilityClassifier::exclusion_reasons(&sig),
            vec![ExclusionReason::SignallingExpired]
        );
        assert_eq!(
            EligibilityClassifier::exclusion_reasons(&tel),
            vec![ExclusionReason::TelecomExpired]
        );
        assert_eq!(
            EligibilityClassifier::exclusion_reasons(&manual),
            vec![ExclusionReason::ManualFlag]
        );
    }

    #[test]
    fn test_day_one_countdown_is_still_eligible() {
        let mut record = create_test_record("T1");
        record.rs_days_from_plan = 1;
        record.sig_days_from_plan = 1;
        record.tel_days_from_plan = 1;
        assert!(!EligibilityClassifier::is_hard_excluded(&record));
    }

    #[test]
    fn test_classify_is_total_and_keeps_input_order() {
        let mut records: Vec<_> = (0..6).map(|i| create_test_record(&format!("T{}", i))).collect();
        records[1].job_critical_count = 2;
        records[4].tel_days_from_plan = -1;

        let classification = EligibilityClassifier::new().classify(&records);
        assert_eq!(classification.eligible, vec![0, 2, 3, 5]);
        let excluded: Vec<usize> = classification.excluded.iter().map(|e| e.index).collect();
        assert_eq!(excluded, vec![1, 4]);
        assert_eq!(
            classification.eligible.len() + classification.excluded.len(),
            records.len()
        );
    }

    #[test]
    fn test_coarse_status_thresholds() {
        let healthy = create_test_record("T1");
        assert_eq!(
            EligibilityClassifier::coarse_status(&healthy, 0.05),
            TrainStatus::Service
        );

        let mut worn = create_test_record("T2");
        worn.bogie_wear_index = 0.9;
        worn.hvac_alert = true;
        // 0.4*0.4 + 0.3*0.75 + 0.3*0.1 = 0.415
        assert_eq!(
            EligibilityClassifier::coarse_status(&worn, 0.6),
            TrainStatus::Standby
        );

        let mut critical = create_test_record("T3");
        critical.job_critical_count = 1;
        assert_eq!(
            EligibilityClassifier::coarse_status(&critical, 0.0),
            TrainStatus::Ibl
        );
    }
}
