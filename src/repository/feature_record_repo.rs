// ==========================================
// 地铁车队运营排程系统 - 每日特征记录仓储
// ==========================================
// 对齐: daily_data (按日覆盖) / daily_data_history (只追加)
// 红线: Repository 不含业务逻辑,只做数据映射
// ==========================================

use crate::domain::train::TrainFeatureRecord;
use crate::domain::types::TrainStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str = r#"
    train_id, date, rs_days_from_plan, sig_days_from_plan, tel_days_from_plan,
    job_open_count, job_critical_count, branding_req_hours, branding_alloc_hours,
    mileage_km, bogie_wear_index, depot, cleaning_slot, stabling_position,
    estimated_shunting_mins, prev_night_shunting_count, iot_temp_avg_c, hvac_alert,
    manual_override_flag, assigned_status, last_maintenance_date
"#;

// ==========================================
// FeatureRecordRepository - 特征记录仓储
// ==========================================
pub struct FeatureRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FeatureRecordRepository {
    /// 创建新的特征记录仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 覆盖写入某日批次
    ///
    /// # 参数
    /// - `date`: 批次日期 (daily_data 中该日旧数据先删除)
    /// - `records`: 当日记录
    ///
    /// # 返回
    /// - `Ok(count)`: 写入条数
    pub fn replace_day(&self, date: NaiveDate, records: &[TrainFeatureRecord]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let date_text = date.format(DATE_FORMAT).to_string();

        tx.execute("DELETE FROM daily_data WHERE date = ?1", params![date_text])?;

        for table in ["daily_data", "daily_data_history"] {
            let sql = format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
                table, SELECT_COLUMNS
            );
            let mut stmt = tx.prepare(&sql)?;
            for record in records {
                stmt.execute(params![
                    record.train_id,
                    date_text,
                    record.rs_days_from_plan,
                    record.sig_days_from_plan,
                    record.tel_days_from_plan,
                    record.job_open_count,
                    record.job_critical_count,
                    record.branding_req_hours,
                    record.branding_alloc_hours,
                    record.mileage_km,
                    record.bogie_wear_index,
                    record.depot,
                    record.cleaning_slot,
                    record.stabling_position,
                    record.estimated_shunting_mins,
                    record.prev_night_shunting_count,
                    record.iot_temp_avg_c,
                    record.hvac_alert,
                    record.manual_override_flag,
                    record.assigned_status.as_str(),
                    record
                        .last_maintenance_date
                        .map(|d| d.format(DATE_FORMAT).to_string()),
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(%date, count = records.len(), "特征记录已写入");
        Ok(records.len())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询某日批次 (按 train_id 排序)
    pub fn find_by_date(&self, date: NaiveDate) -> RepositoryResult<Vec<TrainFeatureRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM daily_data WHERE date = ?1 ORDER BY train_id",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![date.format(DATE_FORMAT).to_string()], |row| {
                Self::map_row(row)
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 严格早于指定日期的最近一个批次日期
    pub fn latest_date_before(&self, date: NaiveDate) -> RepositoryResult<Option<NaiveDate>> {
        let conn = self.get_conn()?;
        let latest: Option<String> = conn.query_row(
            "SELECT MAX(date) FROM daily_data WHERE date < ?1",
            params![date.format(DATE_FORMAT).to_string()],
            |row| row.get(0),
        )?;
        latest.map(|text| parse_date("date", &text)).transpose()
    }

    /// 查询某列车的历史记录 (按日期升序)
    pub fn find_history(&self, train_id: &str) -> RepositoryResult<Vec<TrainFeatureRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM daily_data_history WHERE train_id = ?1 ORDER BY date, history_id",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![train_id], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn map_row(row: &Row) -> SqliteResult<TrainFeatureRecord> {
        let date_text: String = row.get(1)?;
        let status_text: String = row.get(19)?;
        let maintenance_text: Option<String> = row.get(20)?;

        Ok(TrainFeatureRecord {
            train_id: row.get(0)?,
            date: parse_date_sql(1, &date_text)?,
            rs_days_from_plan: row.get(2)?,
            sig_days_from_plan: row.get(3)?,
            tel_days_from_plan: row.get(4)?,
            job_open_count: row.get(5)?,
            job_critical_count: row.get(6)?,
            branding_req_hours: row.get(7)?,
            branding_alloc_hours: row.get(8)?,
            mileage_km: row.get(9)?,
            bogie_wear_index: row.get(10)?,
            depot: row.get(11)?,
            cleaning_slot: row.get(12)?,
            stabling_position: row.get(13)?,
            estimated_shunting_mins: row.get(14)?,
            prev_night_shunting_count: row.get(15)?,
            iot_temp_avg_c: row.get(16)?,
            hvac_alert: row.get(17)?,
            manual_override_flag: row.get(18)?,
            assigned_status: TrainStatus::from_str(&status_text).ok_or_else(|| {
                invalid_column(19, format!("未知状态: {}", status_text))
            })?,
            last_maintenance_date: maintenance_text
                .as_deref()
                .map(|text| parse_date_sql(20, text))
                .transpose()?,
        })
    }
}

fn parse_date(field: &str, text: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("{}: {}", text, e),
    })
}

fn parse_date_sql(index: usize, text: &str) -> SqliteResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| invalid_column(index, format!("{}: {}", text, e)))
}

fn invalid_column(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn make_test_record(train_id: &str, date: NaiveDate) -> TrainFeatureRecord {
        let mut record = TrainFeatureRecord::new(train_id, date);
        record.depot = "Pettah Depot".to_string();
        record.mileage_km = 4_321.0;
        record.bogie_wear_index = 0.4321;
        record.rs_days_from_plan = -2;
        record.hvac_alert = true;
        record.last_maintenance_date = Some(day(1));
        record
    }

    #[test]
    fn test_replace_and_find_by_date() {
        let repo = FeatureRecordRepository::new(setup_test_db());
        let records = vec![make_test_record("T2", day(10)), make_test_record("T1", day(10))];
        assert_eq!(repo.replace_day(day(10), &records).unwrap(), 2);

        let found = repo.find_by_date(day(10)).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].train_id, "T1");
        assert_eq!(found[0], records[1]);
    }

    #[test]
    fn test_replace_day_overwrites_but_history_appends() {
        let repo = FeatureRecordRepository::new(setup_test_db());
        repo.replace_day(day(10), &[make_test_record("T1", day(10))]).unwrap();

        let mut updated = make_test_record("T1", day(10));
        updated.mileage_km = 5_000.0;
        repo.replace_day(day(10), &[updated]).unwrap();

        let found = repo.find_by_date(day(10)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].mileage_km, 5_000.0);
        assert_eq!(repo.find_history("T1").unwrap().len(), 2);
    }

    #[test]
    fn test_latest_date_before() {
        let repo = FeatureRecordRepository::new(setup_test_db());
        assert_eq!(repo.latest_date_before(day(10)).unwrap(), None);

        repo.replace_day(day(7), &[make_test_record("T1", day(7))]).unwrap();
        repo.replace_day(day(9), &[make_test_record("T1", day(9))]).unwrap();
        repo.replace_day(day(10), &[make_test_record("T1", day(10))]).unwrap();

        assert_eq!(repo.latest_date_before(day(10)).unwrap(), Some(day(9)));
    }
}
