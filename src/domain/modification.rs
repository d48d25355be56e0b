// ==========================================
// 地铁车队运营排程系统 - 人工干预日志领域模型
// ==========================================
// 红线: 每一次干预都必须记录,日志只追加,不重排,不裁剪
// 对齐: modification_log 表
// ==========================================

use crate::domain::types::{OverrideAction, TrainStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// ModificationLogEntry - 干预日志条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationLogEntry {
    pub entry_id: Uuid,
    pub schedule_version: Uuid, // 所作用的排程版本
    pub train_id: String,
    pub action: OverrideAction,
    pub from_status: TrainStatus,
    pub to_status: TrainStatus,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub risk_acknowledged: bool, // 是否经过高风险确认
}

impl ModificationLogEntry {
    pub fn new(
        schedule_version: Uuid,
        train_id: impl Into<String>,
        action: OverrideAction,
        from_status: TrainStatus,
        to_status: TrainStatus,
        reason: Option<String>,
        risk_acknowledged: bool,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            schedule_version,
            train_id: train_id.into(),
            action,
            from_status,
            to_status,
            reason,
            timestamp: Utc::now(),
            risk_acknowledged,
        }
    }
}

impl fmt::Display for ModificationLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match (&self.action, &self.reason) {
            (OverrideAction::Reset, _) => "Reset".to_string(),
            (_, Some(reason)) if !reason.is_empty() => reason.clone(),
            _ => "Manual override".to_string(),
        };
        write!(
            f,
            "[{}] {}: {} → {} ({})",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.train_id,
            self.from_status,
            self.to_status,
            label
        )
    }
}

// ==========================================
// ModificationLog - 干预日志 (只追加)
// ==========================================
// 进程级,跨排程版本保留;不提供删除/重排接口
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModificationLog {
    entries: Vec<ModificationLogEntry>,
}

impl ModificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: ModificationLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ModificationLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 指定列车的干预记录 (保持追加顺序)
    pub fn for_train(&self, train_id: &str) -> Vec<&ModificationLogEntry> {
        self.entries.iter().filter(|e| e.train_id == train_id).collect()
    }
}
