// ==========================================
// 地铁车队运营排程系统 - 列车领域模型
// ==========================================
// 职责: 每日特征记录、估计器输出、排程结果行
// 红线: predicted_status 与 final_status 必须分离,分配器不得读取预测状态作为权威输入
// ==========================================

use crate::domain::types::{IblCause, TrainStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// TrainFeatureRecord - 每日特征记录
// ==========================================
// 生命周期: 上游每日生成一条 → 估计器富化 → 引擎排程 → 仅由人工干预修改
// 对齐: daily_data / daily_data_history 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainFeatureRecord {
    // ===== 标识 =====
    pub train_id: String,  // 列车编号 (当日唯一)
    pub date: NaiveDate,   // 记录日期

    // ===== 证书倒计时 (可为负数,表示已逾期) =====
    pub rs_days_from_plan: i32,  // 车辆 (Rolling Stock)
    pub sig_days_from_plan: i32, // 信号 (Signalling)
    pub tel_days_from_plan: i32, // 通信 (Telecom)

    // ===== 工单 =====
    pub job_open_count: u32,
    pub job_critical_count: u32,

    // ===== 广告 =====
    pub branding_req_hours: f64,
    pub branding_alloc_hours: f64,

    // ===== 走行与磨耗 =====
    pub mileage_km: f64,
    pub bogie_wear_index: f64, // [0,1],逐日单调不减

    // ===== 车辆段 =====
    pub depot: String,
    pub cleaning_slot: String,
    pub stabling_position: String,
    pub estimated_shunting_mins: u32,
    pub prev_night_shunting_count: u32,

    // ===== IoT =====
    pub iot_temp_avg_c: f64,
    pub hvac_alert: bool,

    // ===== 工作字段 =====
    pub manual_override_flag: bool,
    pub assigned_status: TrainStatus,
    pub last_maintenance_date: Option<NaiveDate>,
}

impl TrainFeatureRecord {
    /// 创建一条默认记录 (所有倒计时充足、无工单、无告警)
    ///
    /// 主要供导入映射与测试构造使用,字段随后按需覆盖
    pub fn new(train_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            train_id: train_id.into(),
            date,
            rs_days_from_plan: 30,
            sig_days_from_plan: 30,
            tel_days_from_plan: 30,
            job_open_count: 0,
            job_critical_count: 0,
            branding_req_hours: 0.0,
            branding_alloc_hours: 0.0,
            mileage_km: 0.0,
            bogie_wear_index: 0.0,
            depot: String::new(),
            cleaning_slot: String::new(),
            stabling_position: String::new(),
            estimated_shunting_mins: 0,
            prev_night_shunting_count: 0,
            iot_temp_avg_c: 25.0,
            hvac_alert: false,
            manual_override_flag: false,
            assigned_status: TrainStatus::Pending,
            last_maintenance_date: None,
        }
    }

    /// 证书倒计时中最小的一项
    pub fn min_cert_days(&self) -> i32 {
        self.rs_days_from_plan
            .min(self.sig_days_from_plan)
            .min(self.tel_days_from_plan)
    }
}

// ==========================================
// Estimate - 估计器原始输出
// ==========================================
// predicted_status 为 None 表示冷启动 (估计器无先验),由编排器以粗粒度规则状态替代
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub failure_risk: f64,
    pub next_day_mileage: f64,
    pub predicted_status: Option<TrainStatus>,
}

// ==========================================
// Prediction - 附着在记录上的派生字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_failure_risk: f64,     // [0,1]
    pub predicted_next_day_mileage: f64, // >= 0
    pub predicted_status: TrainStatus,   // Service / Standby / IBL
}

// ==========================================
// ScheduledTrain - 排程结果行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTrain {
    pub record: TrainFeatureRecord,
    pub prediction: Prediction,

    // ===== 排程结果 =====
    pub final_status: TrainStatus,
    pub ranking: usize, // 1-based,稠密排列
    pub manual_override_reason: Option<String>,

    // ===== 可解释性 =====
    pub composite_score: Option<f64>, // 仅合格池列车有评分
    pub ibl_cause: Option<IblCause>,  // 仅 IBL 列车有成因
}

impl ScheduledTrain {
    pub fn train_id(&self) -> &str {
        &self.record.train_id
    }

    pub fn manual_override_flag(&self) -> bool {
        self.record.manual_override_flag
    }

    pub fn failure_risk(&self) -> f64 {
        self.prediction.predicted_failure_risk
    }
}
