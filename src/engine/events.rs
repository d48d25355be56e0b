// ==========================================
// 地铁车队运营排程系统 - 排程事件发布
// ==========================================
// 职责: 定义排程事件发布 trait,下游 (看板/通知) 实现适配器
// 红线: 发布失败只记录日志,不影响排程
// ==========================================

use crate::domain::types::{OverrideAction, TrainStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// 排程事件类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEventType {
    /// 新版本排程已发布
    ScheduleGenerated,
    /// 人工干预已生效
    OverrideApplied,
}

impl ScheduleEventType {
    pub fn as_str(&self) -> &str {
        match self {
            ScheduleEventType::ScheduleGenerated => "ScheduleGenerated",
            ScheduleEventType::OverrideApplied => "OverrideApplied",
        }
    }
}

/// 排程事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub schedule_version: Uuid,
    pub date: NaiveDate,
    pub event_type: ScheduleEventType,
    /// 干预事件的目标列车
    pub train_id: Option<String>,
    /// 干预事件的动作与状态变化
    pub transition: Option<(OverrideAction, TrainStatus, TrainStatus)>,
}

impl ScheduleEvent {
    pub fn generated(schedule_version: Uuid, date: NaiveDate) -> Self {
        Self {
            schedule_version,
            date,
            event_type: ScheduleEventType::ScheduleGenerated,
            train_id: None,
            transition: None,
        }
    }

    pub fn override_applied(
        schedule_version: Uuid,
        date: NaiveDate,
        train_id: impl Into<String>,
        action: OverrideAction,
        from: TrainStatus,
        to: TrainStatus,
    ) -> Self {
        Self {
            schedule_version,
            date,
            event_type: ScheduleEventType::OverrideApplied,
            train_id: Some(train_id.into()),
            transition: Some((action, from, to)),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================
pub trait ScheduleEventPublisher: Send + Sync {
    /// 发布排程事件
    ///
    /// # 返回
    /// - `Ok(id)`: 下游回执 (不支持时为空字符串)
    /// - `Err`: 发布失败
    fn publish(&self, event: ScheduleEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl ScheduleEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: ScheduleEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - version={}, event_type={}",
            event.schedule_version,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn ScheduleEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn ScheduleEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件;失败只告警
    pub fn publish_or_warn(&self, event: ScheduleEvent) {
        let Some(publisher) = &self.inner else {
            tracing::debug!(
                event_type = event.event_type.as_str(),
                "未配置发布者,跳过事件"
            );
            return;
        };
        let event_type = event.event_type.as_str().to_string();
        if let Err(e) = publisher.publish(event) {
            tracing::warn!(event_type = %event_type, error = %e, "排程事件发布失败");
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
