// ==========================================
// 地铁车队运营排程系统 - 引擎层
// ==========================================
// 职责: 准入、运力、排序、分配、干预、报表等业务规则
// 红线: Engine 不拼 SQL, 不读写文件, 不持有锁
// ==========================================

pub mod allocator;
pub mod batch_validator;
pub mod capacity_planner;
pub mod eligibility;
pub mod error;
pub mod estimator;
pub mod events;
pub mod orchestrator;
pub mod override_controller;
pub mod ranker;
pub mod report;
pub mod simulator;
pub mod what_if;

// 重导出核心引擎
pub use allocator::{resort_and_rank, SlotAllocator, SlotDecision};
pub use batch_validator::BatchValidator;
pub use capacity_planner::CapacityPlanner;
pub use eligibility::{Classification, EligibilityClassifier, ExcludedTrain};
pub use error::{
    EngineError, EngineResult, EstimatorError, EstimatorResult, OrchestratorError, OverrideError,
    OverrideResult,
};
pub use estimator::{check_contract, Estimator, RuleBasedEstimator};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, ScheduleEvent, ScheduleEventPublisher,
    ScheduleEventType,
};
pub use orchestrator::ScheduleOrchestrator;
pub use override_controller::{
    AppliedOverride, OverrideController, OverrideNotice, OverrideOutcome, OverrideRequest,
    RiskWarning, RISK_WARNING_THRESHOLD,
};
pub use ranker::{DesirabilityRanker, RankedCandidate, ScoreBreakdown};
pub use report::ReportAggregator;
pub use simulator::DaySimulator;
pub use what_if::{WhatIfAnalyzer, WhatIfError, WhatIfOutcome, WhatIfScenario};
