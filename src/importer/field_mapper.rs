// ==========================================
// 地铁车队运营排程系统 - 字段映射器实现
// ==========================================
// 职责: 原始行 → TrainFeatureRecord (列名即字段名) + 类型转换
// 红线: 必填字段缺失或无法解析即报错并带行号,不静默补默认值
// ==========================================

use crate::domain::train::TrainFeatureRecord;
use crate::domain::types::TrainStatus;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRow;
use chrono::NaiveDate;
use std::str::FromStr;

/// 必填列 (数值/标记列取值不可为空)
pub const REQUIRED_COLUMNS: [&str; 16] = [
    "train_id",
    "rs_days_from_plan",
    "sig_days_from_plan",
    "tel_days_from_plan",
    "job_open_count",
    "job_critical_count",
    "branding_req_hours",
    "branding_alloc_hours",
    "mileage_km",
    "bogie_wear_index",
    "depot",
    "cleaning_slot",
    "stabling_position",
    "estimated_shunting_mins",
    "iot_temp_avg_c",
    "hvac_alert",
];

/// 类别列: 列必须存在,单元格允许为空
const CATEGORICAL_COLUMNS: [&str; 3] = ["depot", "cleaning_slot", "stabling_position"];

pub struct FeatureRecordMapper;

impl FeatureRecordMapper {
    /// 映射整张表
    ///
    /// # 参数
    /// - rows: 原始行
    /// - default_date: 行内无 date 列时使用的批次日期
    ///
    /// # 返回
    /// - 第一个出错行的 ImportError (行号从 2 起,对应表头之后的数据行)
    pub fn map_all(&self, rows: Vec<RawRow>, default_date: NaiveDate) -> ImportResult<Vec<TrainFeatureRecord>> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.map_row(row, idx + 2, default_date))
            .collect()
    }

    /// 映射单行
    pub fn map_row(
        &self,
        row: &RawRow,
        row_number: usize,
        default_date: NaiveDate,
    ) -> ImportResult<TrainFeatureRecord> {
        let train_id = self.require_string(row, "train_id", row_number)?;
        let date = self
            .parse_date(row, "date", row_number)?
            .unwrap_or(default_date);

        let mut record = TrainFeatureRecord::new(train_id, date);

        // ===== 必填 =====
        record.rs_days_from_plan = self.require(row, "rs_days_from_plan", row_number)?;
        record.sig_days_from_plan = self.require(row, "sig_days_from_plan", row_number)?;
        record.tel_days_from_plan = self.require(row, "tel_days_from_plan", row_number)?;
        record.job_open_count = self.require(row, "job_open_count", row_number)?;
        record.job_critical_count = self.require(row, "job_critical_count", row_number)?;
        record.branding_req_hours = self.require(row, "branding_req_hours", row_number)?;
        record.branding_alloc_hours = self.require(row, "branding_alloc_hours", row_number)?;
        record.mileage_km = self.require(row, "mileage_km", row_number)?;
        record.bogie_wear_index = self.require(row, "bogie_wear_index", row_number)?;
        record.estimated_shunting_mins = self.require(row, "estimated_shunting_mins", row_number)?;
        record.iot_temp_avg_c = self.require(row, "iot_temp_avg_c", row_number)?;
        record.hvac_alert = self
            .parse_flag(row, "hvac_alert", row_number)?
            .ok_or_else(|| ImportError::MissingField {
                row: row_number,
                field: "hvac_alert".to_string(),
            })?;

        for column in CATEGORICAL_COLUMNS {
            if !row.contains_key(column) {
                return Err(ImportError::MissingField {
                    row: row_number,
                    field: column.to_string(),
                });
            }
        }
        record.depot = self.get_string(row, "depot").unwrap_or_default();
        record.cleaning_slot = self.get_string(row, "cleaning_slot").unwrap_or_default();
        record.stabling_position = self.get_string(row, "stabling_position").unwrap_or_default();

        // ===== 可选 =====
        if let Some(v) = self.parse(row, "prev_night_shunting_count", row_number)? {
            record.prev_night_shunting_count = v;
        }
        if let Some(v) = self.parse_flag(row, "manual_override_flag", row_number)? {
            record.manual_override_flag = v;
        }
        if let Some(v) = self.get_string(row, "assigned_status") {
            record.assigned_status =
                TrainStatus::from_str(&v).ok_or_else(|| ImportError::TypeConversionError {
                    row: row_number,
                    field: "assigned_status".to_string(),
                    message: format!("未知状态: {}", v),
                })?;
        }
        record.last_maintenance_date = self.parse_date(row, "last_maintenance_date", row_number)?;

        Ok(record)
    }

    /// 提取字符串字段（空白视为缺失）
    fn get_string(&self, row: &RawRow, key: &str) -> Option<String> {
        row.get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    fn require_string(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<String> {
        self.get_string(row, key).ok_or_else(|| ImportError::MissingField {
            row: row_number,
            field: key.to_string(),
        })
    }

    /// 解析数值 (整数列兼容 "3.0" 这类 Excel 导出的写法)
    fn parse<T: FromStr>(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<Option<T>> {
        let Some(value) = self.get_string(row, key) else {
            return Ok(None);
        };
        let normalized = value.strip_suffix(".0").unwrap_or(&value);
        value
            .parse::<T>()
            .or_else(|_| normalized.parse::<T>())
            .map(Some)
            .map_err(|_| ImportError::TypeConversionError {
                row: row_number,
                field: key.to_string(),
                message: format!("无法解析为数值: {}", value),
            })
    }

    fn require<T: FromStr>(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<T> {
        self.parse(row, key, row_number)?
            .ok_or_else(|| ImportError::MissingField {
                row: row_number,
                field: key.to_string(),
            })
    }

    /// 解析布尔标记（0/1/true/false）
    fn parse_flag(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<Option<bool>> {
        let Some(value) = self.get_string(row, key) else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().as_str() {
            "1" | "1.0" | "true" => Ok(Some(true)),
            "0" | "0.0" | "false" => Ok(Some(false)),
            _ => Err(ImportError::TypeConversionError {
                row: row_number,
                field: key.to_string(),
                message: format!("无法解析为布尔值: {}", value),
            }),
        }
    }

    /// 解析日期（YYYY-MM-DD，兼容 YYYYMMDD）
    fn parse_date(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<Option<NaiveDate>> {
        let Some(value) = self.get_string(row, key) else {
            return Ok(None);
        };
        NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&value, "%Y%m%d"))
            .map(Some)
            .map_err(|_| ImportError::DateFormatError {
                row: row_number,
                field: key.to_string(),
                value,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn make_row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete_row() -> RawRow {
        make_row(&[
            ("train_id", " KM-T101 "),
            ("rs_days_from_plan", "12"),
            ("sig_days_from_plan", "-1"),
            ("tel_days_from_plan", "30"),
            ("mileage_km", "4500"),
            ("bogie_wear_index", "0.35"),
            ("job_open_count", "3"),
            ("job_critical_count", "1.0"),
            ("branding_req_hours", "6"),
            ("branding_alloc_hours", "4.5"),
            ("estimated_shunting_mins", "12"),
            ("iot_temp_avg_c", "27.5"),
            ("hvac_alert", "1"),
            ("cleaning_slot", ""),
            ("stabling_position", "Bay-3"),
            ("manual_override_flag", "false"),
            ("depot", "Pettah Depot"),
            ("assigned_status", "Pending"),
            ("last_maintenance_date", "2024-12-20"),
        ])
    }

    #[test]
    fn test_map_complete_row() {
        let record = FeatureRecordMapper.map_row(&complete_row(), 2, day()).unwrap();

        assert_eq!(record.train_id, "KM-T101");
        assert_eq!(record.date, day());
        assert_eq!(record.sig_days_from_plan, -1);
        assert_eq!(record.job_critical_count, 1);
        assert!(record.hvac_alert);
        assert!(!record.manual_override_flag);
        assert_eq!(record.depot, "Pettah Depot");
        assert_eq!(
            record.last_maintenance_date,
            Some(NaiveDate::from_ymd_opt(2024, 12, 20).unwrap())
        );
    }

    #[test]
    fn test_missing_required_field() {
        let mut row = complete_row();
        row.remove("mileage_km");
        let err = FeatureRecordMapper.map_all(vec![complete_row(), row], day()).unwrap_err();
        assert!(matches!(err, ImportError::MissingField { row: 3, ref field } if field == "mileage_km"));
    }

    #[test]
    fn test_missing_safety_columns_are_not_defaulted() {
        for column in REQUIRED_COLUMNS {
            let mut row = complete_row();
            row.remove(column);
            let err = FeatureRecordMapper.map_row(&row, 2, day()).unwrap_err();
            assert!(
                matches!(err, ImportError::MissingField { row: 2, ref field } if field == column),
                "缺少 {} 应报错",
                column
            );
        }
    }

    #[test]
    fn test_blank_categorical_cell_is_allowed() {
        let record = FeatureRecordMapper.map_row(&complete_row(), 2, day()).unwrap();
        assert_eq!(record.cleaning_slot, "");
        assert_eq!(record.stabling_position, "Bay-3");
        assert_eq!(record.job_open_count, 3);
        assert!((record.iot_temp_avg_c - 27.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_flag() {
        let mut row = complete_row();
        row.insert("hvac_alert".to_string(), "maybe".to_string());
        let err = FeatureRecordMapper.map_row(&row, 5, day()).unwrap_err();
        assert!(matches!(err, ImportError::TypeConversionError { row: 5, .. }));
    }

    #[test]
    fn test_date_column_overrides_default() {
        let mut row = complete_row();
        row.insert("date".to_string(), "20250111".to_string());
        let record = FeatureRecordMapper.map_row(&row, 2, day()).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 1, 11).unwrap());
    }
}
