// ==========================================
// 地铁车队运营排程系统 - 引擎编排器
// ==========================================
// 用途: 协调 校验 → 估计 → 准入 → 运力 → 排序 → 分配 的执行顺序
// 红线: 单线程、同步、纯计算;估计器失败不得以默认值静默生成排程
// ==========================================

use crate::domain::capacity::PlannerParams;
use crate::domain::schedule::Schedule;
use crate::domain::train::{Prediction, TrainFeatureRecord};
use crate::domain::types::TrainStatus;
use crate::engine::allocator::SlotAllocator;
use crate::engine::batch_validator::BatchValidator;
use crate::engine::capacity_planner::CapacityPlanner;
use crate::engine::eligibility::EligibilityClassifier;
use crate::engine::error::OrchestratorError;
use crate::engine::estimator::{check_contract, Estimator};
use crate::engine::ranker::DesirabilityRanker;
use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ScheduleOrchestrator - 引擎编排器
// ==========================================
pub struct ScheduleOrchestrator {
    validator: BatchValidator,
    classifier: EligibilityClassifier,
    planner: CapacityPlanner,
    ranker: DesirabilityRanker,
    allocator: SlotAllocator,
}

impl ScheduleOrchestrator {
    pub fn new() -> Self {
        Self {
            validator: BatchValidator::new(),
            classifier: EligibilityClassifier::new(),
            planner: CapacityPlanner::new(),
            ranker: DesirabilityRanker::new(),
            allocator: SlotAllocator::new(),
        }
    }

    /// 为整批记录附加估计结果
    ///
    /// # 规则
    /// - 估计器输出必须满足值域约定,否则整批失败
    /// - 冷启动 (predicted_status = None) 以准入分类器的粗粒度规则状态替代
    /// - 触发硬约束的列车,预测状态强制为 IBL (reset 不得借预测状态重新放行)
    pub fn attach_predictions(
        &self,
        records: &[TrainFeatureRecord],
        estimator: &dyn Estimator,
    ) -> Result<Vec<Prediction>, OrchestratorError> {
        let mut predictions = Vec::with_capacity(records.len());

        for record in records {
            let estimate = estimator.estimate(record).map_err(|e| {
                error!(
                    estimator = estimator.name(),
                    train_id = %record.train_id,
                    error = %e,
                    "估计器调用失败"
                );
                e
            })?;
            check_contract(&record.train_id, &estimate).map_err(|e| {
                error!(estimator = estimator.name(), error = %e, "估计器输出违反值域约定");
                e
            })?;

            let mut predicted_status = match estimate.predicted_status {
                Some(status) => status,
                None => {
                    debug!(train_id = %record.train_id, "估计器冷启动,采用粗粒度规则状态");
                    EligibilityClassifier::coarse_status(record, estimate.failure_risk)
                }
            };
            if predicted_status != TrainStatus::Ibl && EligibilityClassifier::is_hard_excluded(record)
            {
                warn!(
                    train_id = %record.train_id,
                    predicted = %predicted_status,
                    "硬约束列车的预测状态被收敛为 IBL"
                );
                predicted_status = TrainStatus::Ibl;
            }

            predictions.push(Prediction {
                predicted_failure_risk: estimate.failure_risk,
                predicted_next_day_mileage: estimate.next_day_mileage,
                predicted_status,
            });
        }

        Ok(predictions)
    }

    /// 执行完整排程流程
    ///
    /// # 参数
    /// - date: 排程日期
    /// - records: 当日批次
    /// - previous: 昨日批次 (可选)
    /// - estimator: 估计器协作方
    /// - params: 运力规划参数
    ///
    /// # 返回
    /// - Schedule: 新版本排程
    #[instrument(skip(self, records, previous, estimator, params), fields(fleet_size = records.len()))]
    pub fn generate(
        &self,
        date: NaiveDate,
        records: &[TrainFeatureRecord],
        previous: Option<&[TrainFeatureRecord]>,
        estimator: &dyn Estimator,
        params: &PlannerParams,
    ) -> Result<Schedule, OrchestratorError> {
        info!(%date, has_previous = previous.is_some(), "开始执行排程流程");

        // 步骤1: 批次校验
        self.validator.validate(records, previous)?;

        // 步骤2: 估计
        let predictions = self.attach_predictions(records, estimator)?;

        // 步骤3: 准入分类
        let classification = self.classifier.classify(records);

        // 步骤4: 运力规划
        let justification = self.planner.plan(records.len(), params)?;
        let targets = self
            .planner
            .targets(&justification, classification.eligible.len());

        // 步骤5: 排序
        let ranked = self
            .ranker
            .rank(records, &predictions, &classification.eligible);

        // 步骤6: 分配
        let trains =
            self.allocator
                .build_schedule(records, &predictions, &classification, &ranked, &targets);

        let schedule = Schedule {
            version: Uuid::new_v4(),
            date,
            generated_at: Utc::now(),
            trains,
            justification,
            targets,
        };

        info!(
            version = %schedule.version,
            target_service = targets.target_service,
            "排程流程完成"
        );
        Ok(schedule)
    }
}

impl Default for ScheduleOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
