// ==========================================
// 地铁车队运营排程系统 - 槽位分配器
// ==========================================
// 职责: 按排序结果依次填充正线槽位、热备槽位,其余封存
// 输入: 排序后的合格池 + 排除池 + 运力目标
// 输出: 带 final_status / ranking 的完整排程行
// ==========================================
// 红线: 排除池无条件 IBL;容量降级 IBL 与安全排除 IBL 必须区分
// 红线: ranking 为 1..N 稠密排列,Service < Standby < IBL
// ==========================================

use crate::domain::capacity::CapacityTargets;
use crate::domain::train::{Prediction, ScheduledTrain, TrainFeatureRecord};
use crate::domain::types::{IblCause, TrainStatus};
use crate::engine::eligibility::Classification;
use crate::engine::ranker::RankedCandidate;
use tracing::{info, instrument};

/// 单车分配决策
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotDecision {
    pub index: usize,
    pub status: TrainStatus,
    pub ibl_cause: Option<IblCause>,
}

// ==========================================
// SlotAllocator - 槽位分配器
// ==========================================
pub struct SlotAllocator {
    // 无状态引擎
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self {}
    }

    /// 合格池分配
    ///
    /// # 规则
    /// - 前 target_service 名 → Service
    /// - 其后最多 max_standby 名 → Standby
    /// - 其余 → IBL (容量降级)
    ///
    /// # 返回
    /// - 与 ranked 顺序一致的分配决策
    pub fn allocate(
        &self,
        ranked: &[RankedCandidate],
        target_service: usize,
        max_standby: usize,
    ) -> Vec<SlotDecision> {
        ranked
            .iter()
            .enumerate()
            .map(|(position, candidate)| {
                if position < target_service {
                    SlotDecision {
                        index: candidate.index,
                        status: TrainStatus::Service,
                        ibl_cause: None,
                    }
                } else if position < target_service + max_standby {
                    SlotDecision {
                        index: candidate.index,
                        status: TrainStatus::Standby,
                        ibl_cause: None,
                    }
                } else {
                    SlotDecision {
                        index: candidate.index,
                        status: TrainStatus::Ibl,
                        ibl_cause: Some(IblCause::CapacityOverflow),
                    }
                }
            })
            .collect()
    }

    /// 组装完整排程
    ///
    /// 合格池 (排序顺序) 在前,排除池 (输入顺序) 拼接在后,
    /// 然后按状态秩稳定重排并编号
    #[instrument(skip_all, fields(
        target_service = targets.target_service,
        max_standby = targets.max_standby
    ))]
    pub fn build_schedule(
        &self,
        records: &[TrainFeatureRecord],
        predictions: &[Prediction],
        classification: &Classification,
        ranked: &[RankedCandidate],
        targets: &CapacityTargets,
    ) -> Vec<ScheduledTrain> {
        let decisions = self.allocate(ranked, targets.target_service, targets.max_standby);
        let mut trains = Vec::with_capacity(records.len());

        for (decision, candidate) in decisions.iter().zip(ranked.iter()) {
            if decision.ibl_cause == Some(IblCause::CapacityOverflow) {
                info!(
                    train_id = %records[decision.index].train_id,
                    composite_score = candidate.score.composite,
                    cause = "CAPACITY_OVERFLOW",
                    "合格列车超出正线+热备容量,降级为 IBL"
                );
            }
            trains.push(Self::scheduled_row(
                &records[decision.index],
                predictions[decision.index],
                decision.status,
                Some(candidate.score.composite),
                decision.ibl_cause,
            ));
        }

        for excluded in &classification.excluded {
            trains.push(Self::scheduled_row(
                &records[excluded.index],
                predictions[excluded.index],
                TrainStatus::Ibl,
                None,
                Some(IblCause::SafetyExclusion),
            ));
        }

        resort_and_rank(&mut trains);

        info!(
            service = count_status(&trains, TrainStatus::Service),
            standby = count_status(&trains, TrainStatus::Standby),
            ibl = count_status(&trains, TrainStatus::Ibl),
            "槽位分配完成"
        );
        trains
    }

    fn scheduled_row(
        record: &TrainFeatureRecord,
        prediction: Prediction,
        status: TrainStatus,
        composite_score: Option<f64>,
        ibl_cause: Option<IblCause>,
    ) -> ScheduledTrain {
        let mut record = record.clone();
        record.assigned_status = status;
        ScheduledTrain {
            record,
            prediction,
            final_status: status,
            ranking: 0,
            manual_override_reason: None,
            composite_score,
            ibl_cause,
        }
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// 按状态秩 (Service=0, Standby=1, IBL=2) 稳定重排,并重新编号 1..N
///
/// 同状态内保持当前相对顺序;分配与人工干预共用此函数
pub fn resort_and_rank(trains: &mut [ScheduledTrain]) {
    trains.sort_by_key(|t| t.final_status.sort_rank());
    for (position, train) in trains.iter_mut().enumerate() {
        train.ranking = position + 1;
    }
}

fn count_status(trains: &[ScheduledTrain], status: TrainStatus) -> usize {
    trains.iter().filter(|t| t.final_status == status).count()
}
