// ==========================================
// 地铁车队运营排程系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 纯计算只在输入不合法时失败;有状态失败只来自人工干预与协作方边界
// ==========================================

use crate::domain::types::TrainStatus;
use thiserror::Error;

/// 引擎输入错误 (整批拒绝,不发布部分排程)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("当日批次为空")]
    EmptyBatch,

    #[error("字段值非法 (train_id={train_id}, field={field}): {message}")]
    InvalidInput {
        train_id: String,
        field: String,
        message: String,
    },

    #[error("列车编号重复: {0}")]
    DuplicateTrainId(String),

    #[error("运营时段非法: start={start}, end={end} (不支持跨零点)")]
    InvalidServiceWindow { start: String, end: String },

    #[error("行车间隔非法: {0} 分钟")]
    InvalidHeadway(f64),

    #[error("转向架磨耗指数逆减 (train_id={train_id}): 昨日={previous}, 今日={current}")]
    MonotonicityViolation {
        train_id: String,
        previous: f64,
        current: f64,
    },
}

/// 估计器协作方错误
#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("估计器不可用: {0}")]
    Unavailable(String),

    #[error("估计器输出违反值域约定 (train_id={train_id}): {message}")]
    ContractViolation { train_id: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 人工干预错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverrideError {
    #[error("列车不存在于当前排程: {train_id}")]
    NotFound { train_id: String },

    #[error("安全约束拒绝: train_id={train_id} 当前为 {current},禁止转为 {attempted}")]
    SafetyViolation {
        train_id: String,
        current: TrainStatus,
        attempted: TrainStatus,
    },
}

/// 编排错误 (输入错误或协作方失败)
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Input(#[from] EngineError),

    #[error(transparent)]
    Estimator(#[from] EstimatorError),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
pub type EstimatorResult<T> = Result<T, EstimatorError>;
pub type OverrideResult<T> = Result<T, OverrideError>;
