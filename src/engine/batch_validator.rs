// ==========================================
// 地铁车队运营排程系统 - 批次校验器
// ==========================================
// 职责: 当日特征记录批次的完整性与值域校验
// 红线: 任一记录非法即整批拒绝,不发布部分排程
// ==========================================

use crate::domain::train::TrainFeatureRecord;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::{HashMap, HashSet};
use tracing::{instrument, warn};

// ==========================================
// BatchValidator - 批次校验器
// ==========================================
pub struct BatchValidator {
    // 无状态
}

impl BatchValidator {
    pub fn new() -> Self {
        Self {}
    }

    /// 校验当日批次
    ///
    /// # 参数
    /// - records: 当日批次
    /// - previous: 昨日批次 (可选,存在时校验磨耗单调性)
    ///
    /// # 返回
    /// - Err(EngineError): 第一个违规项
    #[instrument(skip_all, fields(batch_size = records.len()))]
    pub fn validate(
        &self,
        records: &[TrainFeatureRecord],
        previous: Option<&[TrainFeatureRecord]>,
    ) -> EngineResult<()> {
        if records.is_empty() {
            warn!("当日批次为空,拒绝排程");
            return Err(EngineError::EmptyBatch);
        }

        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            Self::validate_record(record)?;
            if !seen.insert(record.train_id.as_str()) {
                warn!(train_id = %record.train_id, "列车编号重复");
                return Err(EngineError::DuplicateTrainId(record.train_id.clone()));
            }
        }

        if let Some(previous) = previous {
            let previous_wear: HashMap<&str, f64> = previous
                .iter()
                .map(|r| (r.train_id.as_str(), r.bogie_wear_index))
                .collect();
            for record in records {
                if let Some(&prev) = previous_wear.get(record.train_id.as_str()) {
                    if record.bogie_wear_index < prev {
                        warn!(
                            train_id = %record.train_id,
                            previous = prev,
                            current = record.bogie_wear_index,
                            "转向架磨耗指数逆减"
                        );
                        return Err(EngineError::MonotonicityViolation {
                            train_id: record.train_id.clone(),
                            previous: prev,
                            current: record.bogie_wear_index,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// 单条记录的字段校验
    pub fn validate_record(record: &TrainFeatureRecord) -> EngineResult<()> {
        let invalid = |field: &str, message: String| EngineError::InvalidInput {
            train_id: record.train_id.clone(),
            field: field.to_string(),
            message,
        };

        if record.train_id.trim().is_empty() {
            return Err(invalid("train_id", "列车编号为空".to_string()));
        }
        if !record.mileage_km.is_finite() || record.mileage_km < 0.0 {
            return Err(invalid(
                "mileage_km",
                format!("里程必须为非负有限值: {}", record.mileage_km),
            ));
        }
        if !record.bogie_wear_index.is_finite() || !(0.0..=1.0).contains(&record.bogie_wear_index)
        {
            return Err(invalid(
                "bogie_wear_index",
                format!("磨耗指数必须在 [0,1]: {}", record.bogie_wear_index),
            ));
        }
        for (field, value) in [
            ("branding_req_hours", record.branding_req_hours),
            ("branding_alloc_hours", record.branding_alloc_hours),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("广告时长必须为非负有限值: {}", value)));
            }
        }
        if !record.iot_temp_avg_c.is_finite() {
            return Err(invalid(
                "iot_temp_avg_c",
                format!("温度必须为有限值: {}", record.iot_temp_avg_c),
            ));
        }
        Ok(())
    }
}

impl Default for BatchValidator {
    fn default() -> Self {
        Self::new()
    }
}
