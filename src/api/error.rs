// ==========================================
// 地铁车队运营排程系统 - API层错误类型
// ==========================================
// 职责: 统一调用方可见的错误分类,转换各层错误
// 分类: 输入错误 / 安全拒绝 / 目标不存在 / 协作方失败 / 无排程 / 内部错误
// 说明: 高风险确认不是错误,见 OverrideOutcome::ConfirmationRequired
// ==========================================

use crate::config::ConfigError;
use crate::domain::types::TrainStatus;
use crate::engine::error::{EngineError, EstimatorError, OrchestratorError, OverrideError};
use crate::engine::what_if::WhatIfError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 调用方可纠正的错误
    // ==========================================
    /// 批次/参数非法,整批拒绝
    #[error("无效输入: {0}")]
    InputError(String),

    /// 强制 IBL 列车转回运营,状态未变
    #[error("安全约束拒绝: train_id={train_id} 当前为 {current},禁止转为 {attempted}")]
    SafetyViolation {
        train_id: String,
        current: TrainStatus,
        attempted: TrainStatus,
    },

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("当前无可用排程")]
    NoSchedule,

    // ==========================================
    // 协作方失败 (估计器 / 存储 / 配置 / 文件)
    // ==========================================
    #[error("协作方失败 ({collaborator}): {message}")]
    CollaboratorFailure {
        collaborator: String,
        message: String,
    },

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn collaborator(collaborator: &str, message: impl ToString) -> Self {
        ApiError::CollaboratorFailure {
            collaborator: collaborator.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::InputError(err.to_string())
    }
}

impl From<EstimatorError> for ApiError {
    fn from(err: EstimatorError) -> Self {
        ApiError::collaborator("estimator", err)
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Input(e) => e.into(),
            OrchestratorError::Estimator(e) => e.into(),
        }
    }
}

impl From<OverrideError> for ApiError {
    fn from(err: OverrideError) -> Self {
        match err {
            OverrideError::NotFound { train_id } => {
                ApiError::NotFound(format!("列车 {} 不在当前排程中", train_id))
            }
            OverrideError::SafetyViolation {
                train_id,
                current,
                attempted,
            } => ApiError::SafetyViolation {
                train_id,
                current,
                attempted,
            },
        }
    }
}

impl From<WhatIfError> for ApiError {
    fn from(err: WhatIfError) -> Self {
        match err {
            WhatIfError::Input(e) => e.into(),
            WhatIfError::NotFound(e) => e.into(),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 存储层失败统一为协作方失败
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::collaborator("feature_store", other),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::MissingField { .. }
            | ImportError::TypeConversionError { .. }
            | ImportError::DateFormatError { .. }
            | ImportError::UnsupportedFormat(_) => ApiError::InputError(err.to_string()),
            ImportError::FileNotFound(path) => ApiError::NotFound(path),
            other => ApiError::collaborator("file", other),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::collaborator("config", err)
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_errors_map_to_taxonomy() {
        let not_found: ApiError = OverrideError::NotFound {
            train_id: "T9".to_string(),
        }
        .into();
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let refused: ApiError = OverrideError::SafetyViolation {
            train_id: "T1".to_string(),
            current: TrainStatus::Ibl,
            attempted: TrainStatus::Service,
        }
        .into();
        assert!(matches!(refused, ApiError::SafetyViolation { .. }));
    }

    #[test]
    fn test_collaborator_failures() {
        let estimator: ApiError = OrchestratorError::Estimator(EstimatorError::Unavailable(
            "模型未加载".to_string(),
        ))
        .into();
        assert!(matches!(
            estimator,
            ApiError::CollaboratorFailure { ref collaborator, .. } if collaborator == "estimator"
        ));

        let store: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(store, ApiError::CollaboratorFailure { .. }));

        let input: ApiError = OrchestratorError::Input(EngineError::EmptyBatch).into();
        assert!(matches!(input, ApiError::InputError(_)));
    }
}
