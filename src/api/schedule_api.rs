// ==========================================
// 地铁车队运营排程系统 - 排程服务 API
// ==========================================
// 职责: 持有唯一的当前排程 (带版本),对外提供排程/干预/查询/报表
// 并发: 新周期与干预取写锁;查询取读锁并返回快照
// 红线: 干预日志持久化失败只通知,不回滚内存状态
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::SchedulerConfigReader;
use crate::domain::capacity::AllocationJustification;
use crate::domain::modification::{ModificationLog, ModificationLogEntry};
use crate::domain::report::{FleetAlert, FleetReport};
use crate::domain::schedule::Schedule;
use crate::domain::train::TrainFeatureRecord;
use crate::domain::types::TrainStatus;
use crate::engine::estimator::Estimator;
use crate::engine::events::{OptionalEventPublisher, ScheduleEvent, ScheduleEventPublisher};
use crate::engine::orchestrator::ScheduleOrchestrator;
use crate::engine::override_controller::{
    OverrideController, OverrideNotice, OverrideOutcome, OverrideRequest,
};
use crate::engine::report::ReportAggregator;
use crate::engine::what_if::{WhatIfAnalyzer, WhatIfOutcome, WhatIfScenario};
use crate::i18n;
use crate::repository::modification_log_repo::ModificationLogRepository;
use crate::repository::store::FeatureRecordStore;

// ==========================================
// ScheduleBoard - 排程看板 (锁内状态)
// ==========================================
#[derive(Debug, Default)]
struct ScheduleBoard {
    current: Option<Schedule>,
    /// 进程级干预日志,跨版本保留
    log: ModificationLog,
}

// ==========================================
// ScheduleService - 排程服务
// ==========================================
pub struct ScheduleService {
    board: RwLock<ScheduleBoard>,
    orchestrator: ScheduleOrchestrator,
    controller: OverrideController,
    reporter: ReportAggregator,
    what_if: WhatIfAnalyzer,
    estimator: Arc<dyn Estimator>,
    store: Arc<dyn FeatureRecordStore>,
    config: Arc<dyn SchedulerConfigReader>,
    log_repo: Option<Arc<ModificationLogRepository>>,
    event_publisher: OptionalEventPublisher,
}

impl ScheduleService {
    /// 创建排程服务
    ///
    /// # 参数
    /// - estimator: 估计器协作方
    /// - store: 特征记录存储协作方
    /// - config: 运力参数来源
    /// - log_repo: 干预日志持久化 (可选)
    /// - event_publisher: 事件发布者 (可选)
    pub fn new(
        estimator: Arc<dyn Estimator>,
        store: Arc<dyn FeatureRecordStore>,
        config: Arc<dyn SchedulerConfigReader>,
        log_repo: Option<Arc<ModificationLogRepository>>,
        event_publisher: Option<Arc<dyn ScheduleEventPublisher>>,
    ) -> Self {
        let event_publisher = match event_publisher {
            Some(p) => OptionalEventPublisher::with_publisher(p),
            None => OptionalEventPublisher::none(),
        };

        Self {
            board: RwLock::new(ScheduleBoard::default()),
            orchestrator: ScheduleOrchestrator::new(),
            controller: OverrideController::new(),
            reporter: ReportAggregator::new(),
            what_if: WhatIfAnalyzer::new(),
            estimator,
            store,
            config,
            log_repo,
            event_publisher,
        }
    }

    // ==========================================
    // 排程生成
    // ==========================================

    /// 对给定批次执行完整排程并发布为当前排程
    ///
    /// # 参数
    /// - date: 排程日期
    /// - records: 当日批次
    /// - previous: 昨日批次 (可选)
    ///
    /// # 返回
    /// - Ok(Schedule): 新发布的排程快照
    /// - Err(InputError / CollaboratorFailure): 旧排程保持不变
    #[instrument(skip(self, records, previous), fields(batch_size = records.len()))]
    pub async fn generate_schedule(
        &self,
        date: NaiveDate,
        records: Vec<TrainFeatureRecord>,
        previous: Option<Vec<TrainFeatureRecord>>,
    ) -> ApiResult<Schedule> {
        let params = self.config.get_planner_params().await.map_err(|e| {
            error!(error = %e, "运力参数读取失败");
            ApiError::from(e)
        })?;

        let mut board = self.board.write().await;
        let schedule = self
            .orchestrator
            .generate(
                date,
                &records,
                previous.as_deref(),
                self.estimator.as_ref(),
                &params,
            )
            .map_err(|e| {
                error!(error = %e, "排程生成失败,保留上一版本");
                ApiError::from(e)
            })?;

        board.current = Some(schedule.clone());
        drop(board);

        info!(
            version = %schedule.version,
            service = schedule.count_status(TrainStatus::Service),
            standby = schedule.count_status(TrainStatus::Standby),
            ibl = schedule.count_status(TrainStatus::Ibl),
            "新排程已发布"
        );
        self.event_publisher
            .publish_or_warn(ScheduleEvent::generated(schedule.version, schedule.date));
        Ok(schedule)
    }

    /// 每日周期: 从存储读取当日与昨日批次后排程
    #[instrument(skip(self))]
    pub async fn run_daily_cycle(&self, date: NaiveDate) -> ApiResult<Schedule> {
        let records = self.store.load_batch(date).await.map_err(|e| {
            error!(error = %e, "当日批次读取失败");
            ApiError::collaborator("feature_store", e)
        })?;
        let previous = match self.store.load_previous_batch(date).await {
            Ok(previous) => previous,
            Err(e) => {
                error!(error = %e, "昨日批次读取失败");
                return Err(ApiError::collaborator("feature_store", e));
            }
        };
        if previous.is_none() {
            info!("无昨日批次,跳过增量校验");
        }

        self.generate_schedule(date, records, previous).await
    }

    // ==========================================
    // 人工干预
    // ==========================================

    /// 执行人工干预
    ///
    /// # 返回
    /// - Ok(Applied): 已生效 (可能附带运力减少/持久化失败通知)
    /// - Ok(ConfirmationRequired): 高风险,需确认后重试
    /// - Err(SafetyViolation / NotFound / NoSchedule)
    #[instrument(skip(self), fields(train_id = %request.train_id, action = %request.action))]
    pub async fn apply_override(&self, request: OverrideRequest) -> ApiResult<OverrideOutcome> {
        let mut board = self.board.write().await;
        let ScheduleBoard { current, log } = &mut *board;
        let schedule = current.as_mut().ok_or(ApiError::NoSchedule)?;

        let mut outcome = self.controller.apply(schedule, log, &request)?;

        if let OverrideOutcome::Applied(applied) = &mut outcome {
            if let Some(repo) = &self.log_repo {
                if let Err(e) = repo.append(&applied.entry) {
                    warn!(error = %e, entry_id = %applied.entry.entry_id, "干预日志持久化失败");
                    let error_text = e.to_string();
                    applied.notices.push(OverrideNotice::PersistenceFailed {
                        message: i18n::t_with_args(
                            "override.persistence_failed",
                            &[("error", error_text.as_str())],
                        ),
                    });
                }
            }

            self.event_publisher.publish_or_warn(ScheduleEvent::override_applied(
                schedule.version,
                schedule.date,
                applied.entry.train_id.clone(),
                applied.entry.action,
                applied.entry.from_status,
                applied.entry.to_status,
            ));
        }

        Ok(outcome)
    }

    // ==========================================
    // 查询接口 (读锁)
    // ==========================================

    /// 按写入顺序返回干预日志
    pub async fn get_modification_log(&self) -> Vec<ModificationLogEntry> {
        self.board.read().await.log.entries().to_vec()
    }

    pub async fn get_allocation_justification(&self) -> ApiResult<AllocationJustification> {
        self.with_schedule(|s| s.justification.clone()).await
    }

    /// 当前排程快照
    pub async fn current_schedule(&self) -> ApiResult<Schedule> {
        self.with_schedule(Schedule::clone).await
    }

    pub async fn alerts(&self) -> ApiResult<Vec<FleetAlert>> {
        self.with_schedule(|s| self.reporter.alerts(&s.trains)).await
    }

    pub async fn fleet_report(&self) -> ApiResult<FleetReport> {
        self.with_schedule(|s| self.reporter.generate_report(s)).await
    }

    pub async fn what_if(&self, scenario: WhatIfScenario) -> ApiResult<WhatIfOutcome> {
        let board = self.board.read().await;
        let schedule = board.current.as_ref().ok_or(ApiError::NoSchedule)?;
        Ok(self.what_if.analyze(schedule, &scenario)?)
    }

    async fn with_schedule<T>(&self, f: impl FnOnce(&Schedule) -> T) -> ApiResult<T> {
        let board = self.board.read().await;
        board.current.as_ref().map(f).ok_or(ApiError::NoSchedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capacity::PlannerParams;
    use crate::domain::types::OverrideAction;
    use crate::engine::estimator::RuleBasedEstimator;
    use crate::repository::error::RepositoryResult;
    use async_trait::async_trait;

    struct DefaultConfig;

    #[async_trait]
    impl SchedulerConfigReader for DefaultConfig {
        async fn get_service_start(&self) -> Result<chrono::NaiveTime, crate::config::ConfigError> {
            Ok(PlannerParams::default().service_start)
        }
        async fn get_service_end(&self) -> Result<chrono::NaiveTime, crate::config::ConfigError> {
            Ok(PlannerParams::default().service_end)
        }
        async fn get_avg_headway_minutes(&self) -> Result<f64, crate::config::ConfigError> {
            Ok(7.5)
        }
        async fn get_revenue_per_train(&self) -> Result<f64, crate::config::ConfigError> {
            Ok(3750.0)
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl FeatureRecordStore for BrokenStore {
        async fn load_batch(&self, _date: NaiveDate) -> RepositoryResult<Vec<TrainFeatureRecord>> {
            Err(crate::repository::RepositoryError::DatabaseConnectionError(
                "离线".to_string(),
            ))
        }
        async fn load_previous_batch(
            &self,
            _date: NaiveDate,
        ) -> RepositoryResult<Option<Vec<TrainFeatureRecord>>> {
            Ok(None)
        }
        async fn save_batch(
            &self,
            _date: NaiveDate,
            records: Vec<TrainFeatureRecord>,
        ) -> RepositoryResult<usize> {
            Ok(records.len())
        }
    }

    fn create_test_service() -> ScheduleService {
        ScheduleService::new(
            Arc::new(RuleBasedEstimator::new()),
            Arc::new(BrokenStore),
            Arc::new(DefaultConfig),
            None,
            None,
        )
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn batch(n: usize) -> Vec<TrainFeatureRecord> {
        (0..n)
            .map(|i| TrainFeatureRecord::new(format!("T{}", i), day()))
            .collect()
    }

    #[tokio::test]
    async fn test_queries_without_schedule() {
        let service = create_test_service();
        assert!(matches!(service.current_schedule().await, Err(ApiError::NoSchedule)));
        assert!(matches!(
            service
                .apply_override(OverrideRequest::new("T1", OverrideAction::ForceIbl))
                .await,
            Err(ApiError::NoSchedule)
        ));
        assert!(service.get_modification_log().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_previous_schedule() {
        let service = create_test_service();
        let first = service.generate_schedule(day(), batch(5), None).await.unwrap();

        let empty = service.generate_schedule(day(), Vec::new(), None).await;
        assert!(matches!(empty, Err(ApiError::InputError(_))));

        let store_down = service.run_daily_cycle(day()).await;
        assert!(matches!(store_down, Err(ApiError::CollaboratorFailure { .. })));

        assert_eq!(service.current_schedule().await.unwrap().version, first.version);
    }

    #[tokio::test]
    async fn test_log_spans_versions() {
        let service = create_test_service();
        let first = service.generate_schedule(day(), batch(5), None).await.unwrap();
        service
            .apply_override(OverrideRequest::new("T1", OverrideAction::ForceIbl))
            .await
            .unwrap();

        let second = service.generate_schedule(day(), batch(5), None).await.unwrap();
        service
            .apply_override(OverrideRequest::new("T2", OverrideAction::ForceStandby))
            .await
            .unwrap();

        let log = service.get_modification_log().await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].schedule_version, first.version);
        assert_eq!(log[1].schedule_version, second.version);
    }
}
