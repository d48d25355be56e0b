// ==========================================
// 地铁车队运营排程系统 - 排程领域模型
// ==========================================
// 职责: 单一、带版本的"当前排程"值对象
// 红线: ranking 必须是 1..N 的稠密排列,Service < Standby < IBL
// ==========================================

use crate::domain::capacity::{AllocationJustification, CapacityTargets};
use crate::domain::train::ScheduledTrain;
use crate::domain::types::TrainStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Schedule - 每日排程
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub version: Uuid,
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub trains: Vec<ScheduledTrain>, // 按 ranking 升序
    pub justification: AllocationJustification,
    pub targets: CapacityTargets,
}

impl Schedule {
    pub fn fleet_size(&self) -> usize {
        self.trains.len()
    }

    /// 按列车编号查找
    pub fn find(&self, train_id: &str) -> Option<&ScheduledTrain> {
        self.trains.iter().find(|t| t.record.train_id == train_id)
    }

    /// 统计指定状态的列车数
    pub fn count_status(&self, status: TrainStatus) -> usize {
        self.trains.iter().filter(|t| t.final_status == status).count()
    }

    /// 指定状态的列车编号 (按 ranking 顺序)
    pub fn train_ids_with_status(&self, status: TrainStatus) -> Vec<String> {
        self.trains
            .iter()
            .filter(|t| t.final_status == status)
            .map(|t| t.record.train_id.clone())
            .collect()
    }

    /// (train_id, final_status, ranking) 三元组,用于幂等性比较
    pub fn assignment(&self) -> Vec<(String, TrainStatus, usize)> {
        self.trains
            .iter()
            .map(|t| (t.record.train_id.clone(), t.final_status, t.ranking))
            .collect()
    }
}
