// ==========================================
// 地铁车队运营排程系统 - 领域类型定义
// ==========================================
// 职责: 运营状态、干预动作、告警等级等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 运营状态 (Train Status)
// ==========================================
// Service: 正线运营 / Standby: 热备 / Ibl: 库内封存 (In-Bay-Lockdown)
// Pending: 仅作为当日记录的初始工作状态,不会出现在最终排程中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainStatus {
    Service,
    Standby,
    Ibl,
    Pending,
}

impl TrainStatus {
    /// 排序秩: Service=0, Standby=1, IBL=2 (Pending 排在最后)
    pub fn sort_rank(&self) -> u8 {
        match self {
            TrainStatus::Service => 0,
            TrainStatus::Standby => 1,
            TrainStatus::Ibl => 2,
            TrainStatus::Pending => 3,
        }
    }

    /// 是否处于可运营状态 (正线或热备)
    pub fn is_operational(&self) -> bool {
        matches!(self, TrainStatus::Service | TrainStatus::Standby)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrainStatus::Service => "SERVICE",
            TrainStatus::Standby => "STANDBY",
            TrainStatus::Ibl => "IBL",
            TrainStatus::Pending => "PENDING",
        }
    }

    /// 从字符串解析 (兼容 "Service"/"IBL"/"service" 等写法)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SERVICE" => Some(TrainStatus::Service),
            "STANDBY" => Some(TrainStatus::Standby),
            "IBL" => Some(TrainStatus::Ibl),
            "PENDING" => Some(TrainStatus::Pending),
            _ => None,
        }
    }
}

impl fmt::Display for TrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 人工干预动作 (Override Action)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideAction {
    ForceService,
    ForceStandby,
    ForceIbl,
    Reset,
}

impl OverrideAction {
    /// 强制动作的目标状态 (Reset 的目标取决于预测状态,返回 None)
    pub fn target_status(&self) -> Option<TrainStatus> {
        match self {
            OverrideAction::ForceService => Some(TrainStatus::Service),
            OverrideAction::ForceStandby => Some(TrainStatus::Standby),
            OverrideAction::ForceIbl => Some(TrainStatus::Ibl),
            OverrideAction::Reset => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideAction::ForceService => "FORCE_SERVICE",
            OverrideAction::ForceStandby => "FORCE_STANDBY",
            OverrideAction::ForceIbl => "FORCE_IBL",
            OverrideAction::Reset => "RESET",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FORCE_SERVICE" => Some(OverrideAction::ForceService),
            "FORCE_STANDBY" => Some(OverrideAction::ForceStandby),
            "FORCE_IBL" => Some(OverrideAction::ForceIbl),
            "RESET" => Some(OverrideAction::Reset),
            _ => None,
        }
    }
}

impl fmt::Display for OverrideAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// IBL 成因 (IBL Cause)
// ==========================================
// 红线: 容量降级与安全排除必须在日志/告警中可区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IblCause {
    SafetyExclusion,  // 硬约束排除
    CapacityOverflow, // 超出正线+热备容量
    ManualOverride,   // 人工强制封存
    Predicted,        // 人工复位后回到估计器预测的 IBL
}

impl fmt::Display for IblCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IblCause::SafetyExclusion => write!(f, "SAFETY_EXCLUSION"),
            IblCause::CapacityOverflow => write!(f, "CAPACITY_OVERFLOW"),
            IblCause::ManualOverride => write!(f, "MANUAL_OVERRIDE"),
            IblCause::Predicted => write!(f, "PREDICTED"),
        }
    }
}

// ==========================================
// 硬排除原因 (Exclusion Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExclusionReason {
    CriticalJobOpen,     // 存在关键工单
    RollingStockExpired, // 车辆证书到期
    SignallingExpired,   // 信号证书到期
    TelecomExpired,      // 通信证书到期
    ManualFlag,          // 人工封存标记
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::CriticalJobOpen => write!(f, "CRITICAL_JOB_OPEN"),
            ExclusionReason::RollingStockExpired => write!(f, "RS_CERT_EXPIRED"),
            ExclusionReason::SignallingExpired => write!(f, "SIG_CERT_EXPIRED"),
            ExclusionReason::TelecomExpired => write!(f, "TEL_CERT_EXPIRED"),
            ExclusionReason::ManualFlag => write!(f, "MANUAL_FLAG"),
        }
    }
}

// ==========================================
// 告警等级 (Alert Severity)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Low => write!(f, "LOW"),
            AlertSeverity::Medium => write!(f, "MEDIUM"),
            AlertSeverity::High => write!(f, "HIGH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_sort_rank_order() {
        assert!(TrainStatus::Service.sort_rank() < TrainStatus::Standby.sort_rank());
        assert!(TrainStatus::Standby.sort_rank() < TrainStatus::Ibl.sort_rank());
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(TrainStatus::from_str("Service"), Some(TrainStatus::Service));
        assert_eq!(TrainStatus::from_str("ibl"), Some(TrainStatus::Ibl));
        assert_eq!(TrainStatus::from_str("unknown"), None);
    }

    #[test]
    fn test_status_serde_format() {
        let json = serde_json::to_string(&TrainStatus::Ibl).unwrap();
        assert_eq!(json, "\"IBL\"");
        let back: TrainStatus = serde_json::from_str("\"STANDBY\"").unwrap();
        assert_eq!(back, TrainStatus::Standby);
    }

    #[test]
    fn test_override_action_targets() {
        assert_eq!(OverrideAction::ForceIbl.target_status(), Some(TrainStatus::Ibl));
        assert_eq!(OverrideAction::Reset.target_status(), None);
        assert_eq!(OverrideAction::from_str("force_service"), Some(OverrideAction::ForceService));
    }
}
