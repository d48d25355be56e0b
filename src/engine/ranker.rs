// ==========================================
// 地铁车队运营排程系统 - 期望度排序器
// ==========================================
// 职责: 合格池列车的综合评分与全序排序
// 红线: 全系统唯一的综合评分公式;avg_mileage 每个分配周期只计算一次
// ==========================================
// 权重: 可靠性 0.35 / 乘客体验 0.25 / 机械状态 0.20 / 里程均衡 0.20
// ==========================================

use crate::domain::train::{Prediction, TrainFeatureRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, instrument};

pub const WEIGHT_RELIABILITY: f64 = 0.35;
pub const WEIGHT_PASSENGER: f64 = 0.25;
pub const WEIGHT_MECHANICAL: f64 = 0.20;
pub const WEIGHT_MILEAGE_BALANCE: f64 = 0.20;

/// 里程均衡阈值: 低于池均值 120% 的列车获得正向加分
pub const MILEAGE_BALANCE_FACTOR: f64 = 1.2;

/// 舒适温度上限 (°C),超出部分每度扣 10 分
pub const COMFORT_TEMP_C: f64 = 28.0;

// ==========================================
// ScoreBreakdown - 评分明细 (可解释性)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub reliability: f64,
    pub passenger: f64,
    pub mechanical: f64,
    pub mileage_balance: f64,
    pub composite: f64,
}

/// 排序后的合格列车
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCandidate {
    pub index: usize, // 在输入批次中的位置
    pub score: ScoreBreakdown,
}

// ==========================================
// DesirabilityRanker - 期望度排序器
// ==========================================
pub struct DesirabilityRanker {
    // 无状态引擎
}

impl DesirabilityRanker {
    pub fn new() -> Self {
        Self {}
    }

    /// 乘客体验子分 (归一化到 [.., 1])
    ///
    /// (100 − hvac_alert·25 − max(0, temp−28)·10) / 100
    pub fn passenger_score(record: &TrainFeatureRecord) -> f64 {
        let hvac_penalty = if record.hvac_alert { 25.0 } else { 0.0 };
        let temp_penalty = (record.iot_temp_avg_c - COMFORT_TEMP_C).max(0.0) * 10.0;
        (100.0 - hvac_penalty - temp_penalty) / 100.0
    }

    /// 单车综合评分
    ///
    /// # 参数
    /// - record / prediction: 合格池列车
    /// - avg_mileage: 合格池预测次日里程均值 (周期内只计算一次)
    pub fn score(
        &self,
        record: &TrainFeatureRecord,
        prediction: &Prediction,
        avg_mileage: f64,
    ) -> ScoreBreakdown {
        let reliability = 1.0 - prediction.predicted_failure_risk;
        let passenger = Self::passenger_score(record);
        let mechanical = 1.0 - record.bogie_wear_index;

        // 均值为 0 时 (全池预测零里程) 所有列车的比值视为 0
        let denominator = avg_mileage * MILEAGE_BALANCE_FACTOR;
        let ratio = if denominator > 0.0 {
            (prediction.predicted_next_day_mileage / denominator).min(1.0)
        } else {
            0.0
        };
        let mileage_balance = 1.0 - ratio;

        let composite = reliability * WEIGHT_RELIABILITY
            + passenger * WEIGHT_PASSENGER
            + mechanical * WEIGHT_MECHANICAL
            + mileage_balance * WEIGHT_MILEAGE_BALANCE;

        ScoreBreakdown {
            reliability,
            passenger,
            mechanical,
            mileage_balance,
            composite,
        }
    }

    /// 合格池平均预测里程
    pub fn average_mileage(predictions: &[&Prediction]) -> f64 {
        if predictions.is_empty() {
            return 0.0;
        }
        let total: f64 = predictions.iter().map(|p| p.predicted_next_day_mileage).sum();
        total / predictions.len() as f64
    }

    /// 对合格池排序
    ///
    /// # 参数
    /// - records / predictions: 整批数据 (按索引对齐)
    /// - eligible: 合格池索引 (输入顺序)
    ///
    /// # 返回
    /// - 按综合分降序的候选列表;同分保持输入顺序 (稳定排序)
    #[instrument(skip_all, fields(eligible_count = eligible.len()))]
    pub fn rank(
        &self,
        records: &[TrainFeatureRecord],
        predictions: &[Prediction],
        eligible: &[usize],
    ) -> Vec<RankedCandidate> {
        let pool: Vec<&Prediction> = eligible.iter().map(|&i| &predictions[i]).collect();
        let avg_mileage = Self::average_mileage(&pool);

        let mut ranked: Vec<RankedCandidate> = eligible
            .iter()
            .map(|&index| RankedCandidate {
                index,
                score: self.score(&records[index], &predictions[index], avg_mileage),
            })
            .collect();

        // sort_by 为稳定排序,同分保持输入顺序
        ranked.sort_by(|a, b| {
            b.score
                .composite
                .partial_cmp(&a.score.composite)
                .unwrap_or(Ordering::Equal)
        });

        debug!(avg_mileage, ranked = ranked.len(), "合格池排序完成");
        ranked
    }
}

impl Default for DesirabilityRanker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TrainStatus;
    use chrono::NaiveDate;

    fn create_test_record(train_id: &str) -> TrainFeatureRecord {
        TrainFeatureRecord::new(train_id, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())
    }

    fn prediction(risk: f64, mileage: f64) -> Prediction {
        Prediction {
            predicted_failure_risk: risk,
            predicted_next_day_mileage: mileage,
            predicted_status: TrainStatus::Service,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum = WEIGHT_RELIABILITY + WEIGHT_PASSENGER + WEIGHT_MECHANICAL + WEIGHT_MILEAGE_BALANCE;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_components() {
        let ranker = DesirabilityRanker::new();
        let mut record = create_test_record("T1");
        record.hvac_alert = true;
        record.iot_temp_avg_c = 29.0;
        record.bogie_wear_index = 0.2;

        let score = ranker.score(&record, &prediction(0.1, 300.0), 250.0);
        assert!((score.reliability - 0.9).abs() < 1e-9);
        assert!((score.passenger - 0.65).abs() < 1e-9);
        assert!((score.mechanical - 0.8).abs() < 1e-9);
        // 300 / (250 * 1.2) = 1.0 → 0
        assert!(score.mileage_balance.abs() < 1e-9);
        let expected = 0.9 * 0.35 + 0.65 * 0.25 + 0.8 * 0.2;
        assert!((score.composite - expected).abs() < 1e-9);
    }

    #[test]
    fn test_zero_average_mileage_does_not_divide_by_zero() {
        let ranker = DesirabilityRanker::new();
        let record = create_test_record("T1");
        let score = ranker.score(&record, &prediction(0.0, 0.0), 0.0);
        assert_eq!(score.mileage_balance, 1.0);
        assert!(score.composite.is_finite());
    }

    #[test]
    fn test_rank_orders_by_score_and_is_stable_on_ties() {
        let ranker = DesirabilityRanker::new();
        let records: Vec<_> = (0..4).map(|i| create_test_record(&format!("T{}", i))).collect();
        let predictions = vec![
            prediction(0.2, 300.0),
            prediction(0.05, 300.0),
            prediction(0.2, 300.0),
            prediction(0.4, 300.0),
        ];
        let ranked = ranker.rank(&records, &predictions, &[0, 1, 2, 3]);
        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_average_mileage_over_pool_only() {
        let p1 = prediction(0.1, 100.0);
        let p2 = prediction(0.1, 300.0);
        assert_eq!(DesirabilityRanker::average_mileage(&[&p1, &p2]), 200.0);
        assert_eq!(DesirabilityRanker::average_mileage(&[]), 0.0);
    }
}
