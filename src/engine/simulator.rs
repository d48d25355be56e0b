// ==========================================
// 地铁车队运营排程系统 - 每日数据模拟器
// ==========================================
// 职责: 在缺少上游数据时生成一天的车队特征批次 (演示/压测)
// 红线: 有昨日批次时必须保持 磨耗单调不减、倒计时逐日递减 (下限 -5)
// ==========================================

use crate::domain::train::TrainFeatureRecord;
use crate::domain::types::TrainStatus;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::{debug, info};

/// 默认车队规模
pub const DEFAULT_FLEET_SIZE: usize = 25;

/// 列车编号前缀与起始号
pub const TRAIN_ID_PREFIX: &str = "KM-T";
pub const TRAIN_ID_START: usize = 101;

/// 倒计时递减下限
pub const COUNTDOWN_FLOOR: i32 = -5;

pub const DEPOTS: [&str; 2] = ["Pettah Depot", "Tripunithura Depot"];
pub const CLEANING_SLOTS: [&str; 3] = ["Night-A", "Night-B", "No-Clean"];

const HVAC_ALERT_PROBABILITY: f64 = 0.15;
// 关键工单数 0/1/2 的累积概率
const CRITICAL_JOB_CUMULATIVE: [f64; 2] = [0.98, 0.995];

// ==========================================
// DaySimulator - 每日数据模拟器
// ==========================================
pub struct DaySimulator {
    fleet_size: usize,
    rng: StdRng,
}

impl DaySimulator {
    pub fn new() -> Self {
        Self {
            fleet_size: DEFAULT_FLEET_SIZE,
            rng: StdRng::from_entropy(),
        }
    }

    /// 固定种子 (测试/复现用)
    pub fn with_seed(seed: u64) -> Self {
        Self {
            fleet_size: DEFAULT_FLEET_SIZE,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_fleet_size(mut self, fleet_size: usize) -> Self {
        self.fleet_size = fleet_size;
        self
    }

    pub fn fleet_size(&self) -> usize {
        self.fleet_size
    }

    /// 车队列车编号 (KM-T101 起)
    pub fn train_ids(&self) -> Vec<String> {
        (0..self.fleet_size)
            .map(|i| format!("{}{}", TRAIN_ID_PREFIX, TRAIN_ID_START + i))
            .collect()
    }

    /// 生成某日批次
    ///
    /// # 参数
    /// - date: 模拟日期
    /// - previous: 昨日批次 (可选);存在同号列车时沿用其累积量
    ///
    /// # 返回
    /// - 每辆车一条记录,assigned_status = PENDING
    pub fn simulate_day(
        &mut self,
        date: NaiveDate,
        previous: Option<&[TrainFeatureRecord]>,
    ) -> Vec<TrainFeatureRecord> {
        let previous_by_id: HashMap<&str, &TrainFeatureRecord> = previous
            .unwrap_or_default()
            .iter()
            .map(|r| (r.train_id.as_str(), r))
            .collect();

        let records: Vec<TrainFeatureRecord> = self
            .train_ids()
            .into_iter()
            .map(|train_id| {
                let prev = previous_by_id.get(train_id.as_str()).copied();
                self.simulate_train(train_id, date, prev)
            })
            .collect();

        info!(
            %date,
            fleet_size = records.len(),
            carried_over = previous_by_id.len(),
            "模拟数据生成完成"
        );
        records
    }

    fn simulate_train(
        &mut self,
        train_id: String,
        date: NaiveDate,
        prev: Option<&TrainFeatureRecord>,
    ) -> TrainFeatureRecord {
        let mut record = TrainFeatureRecord::new(train_id, date);

        match prev {
            Some(prev) => {
                record.mileage_km = prev.mileage_km + self.rng.gen_range(100..500) as f64;
                record.bogie_wear_index = round_to(
                    (prev.bogie_wear_index + self.rng.gen_range(0.001..0.01)).min(1.0),
                    4,
                )
                .max(prev.bogie_wear_index);
                record.rs_days_from_plan = (prev.rs_days_from_plan - 1).max(COUNTDOWN_FLOOR);
                record.sig_days_from_plan = (prev.sig_days_from_plan - 1).max(COUNTDOWN_FLOOR);
                record.tel_days_from_plan = (prev.tel_days_from_plan - 1).max(COUNTDOWN_FLOOR);
                record.last_maintenance_date = prev.last_maintenance_date;
            }
            None => {
                record.mileage_km = self.rng.gen_range(1500..10000) as f64;
                record.bogie_wear_index = round_to(self.rng.gen_range(0.1..0.8), 4);
                record.rs_days_from_plan = self.rng.gen_range(1..90);
                record.sig_days_from_plan = self.rng.gen_range(1..90);
                record.tel_days_from_plan = self.rng.gen_range(1..90);
                record.last_maintenance_date =
                    Some(date - Duration::days(self.rng.gen_range(1..90)));
            }
        }

        record.prev_night_shunting_count = self.rng.gen_range(0..4);
        record.depot = DEPOTS[self.rng.gen_range(0..DEPOTS.len())].to_string();
        record.job_open_count = self.rng.gen_range(0..10);
        record.job_critical_count = self.critical_job_count();
        record.branding_req_hours = round_to(self.rng.gen_range(5.0..18.0), 2);
        record.branding_alloc_hours = round_to(self.rng.gen_range(0.0..20.0), 2);
        record.cleaning_slot = CLEANING_SLOTS[self.rng.gen_range(0..CLEANING_SLOTS.len())].to_string();
        record.stabling_position = format!("Bay-{}", self.rng.gen_range(1..16));
        record.estimated_shunting_mins = self.rng.gen_range(15..45);
        record.iot_temp_avg_c = round_to(self.rng.gen_range(25.0..28.5), 2);
        record.hvac_alert = self.rng.gen_bool(HVAC_ALERT_PROBABILITY);
        record.manual_override_flag = false;
        record.assigned_status = TrainStatus::Pending;

        debug!(
            train_id = %record.train_id,
            carried_over = prev.is_some(),
            "模拟列车记录"
        );
        record
    }

    fn critical_job_count(&mut self) -> u32 {
        let roll: f64 = self.rng.gen();
        CRITICAL_JOB_CUMULATIVE
            .iter()
            .position(|&threshold| roll < threshold)
            .unwrap_or(CRITICAL_JOB_CUMULATIVE.len()) as u32
    }
}

impl Default for DaySimulator {
    fn default() -> Self {
        Self::new()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
