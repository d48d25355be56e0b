// ==========================================
// 地铁车队运营排程系统 - 人工干预日志仓储
// ==========================================
// 对齐: modification_log 表
// 红线: 只追加;读取顺序与写入顺序一致
// ==========================================

use crate::domain::modification::ModificationLogEntry;
use crate::domain::types::{OverrideAction, TrainStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// ModificationLogRepository - 干预日志仓储
// ==========================================
pub struct ModificationLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ModificationLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加一条干预日志
    ///
    /// # 返回
    /// - `Ok(entry_id)`: 成功插入
    pub fn append(&self, entry: &ModificationLogEntry) -> RepositoryResult<Uuid> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO modification_log (
                entry_id, seq, schedule_version, train_id, action,
                from_status, to_status, reason, risk_acknowledged, timestamp
            ) VALUES (
                ?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM modification_log),
                ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9
            )
            "#,
            params![
                entry.entry_id.to_string(),
                entry.schedule_version.to_string(),
                entry.train_id,
                entry.action.as_str(),
                entry.from_status.as_str(),
                entry.to_status.as_str(),
                entry.reason,
                entry.risk_acknowledged,
                entry.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(entry.entry_id)
    }

    /// 按写入顺序读取全部日志
    pub fn list_all(&self) -> RepositoryResult<Vec<ModificationLogEntry>> {
        self.query("", params![])
    }

    /// 按写入顺序读取某列车的日志
    pub fn find_by_train(&self, train_id: &str) -> RepositoryResult<Vec<ModificationLogEntry>> {
        self.query("WHERE train_id = ?1", params![train_id])
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM modification_log", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn query(
        &self,
        filter: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<Vec<ModificationLogEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT entry_id, schedule_version, train_id, action, from_status,
                   to_status, reason, risk_acknowledged, timestamp
            FROM modification_log
            {}
            ORDER BY seq
            "#,
            filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params, |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    fn map_row(row: &Row) -> SqliteResult<ModificationLogEntry> {
        let entry_id: String = row.get(0)?;
        let schedule_version: String = row.get(1)?;
        let action: String = row.get(3)?;
        let from_status: String = row.get(4)?;
        let to_status: String = row.get(5)?;
        let timestamp: String = row.get(8)?;

        Ok(ModificationLogEntry {
            entry_id: parse_uuid(0, &entry_id)?,
            schedule_version: parse_uuid(1, &schedule_version)?,
            train_id: row.get(2)?,
            action: OverrideAction::from_str(&action)
                .ok_or_else(|| invalid_column(3, format!("未知动作: {}", action)))?,
            from_status: parse_status(4, &from_status)?,
            to_status: parse_status(5, &to_status)?,
            reason: row.get(6)?,
            risk_acknowledged: row.get(7)?,
            timestamp: DateTime::parse_from_rfc3339(&timestamp)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| invalid_column(8, format!("{}: {}", timestamp, e)))?,
        })
    }
}

fn parse_uuid(index: usize, text: &str) -> SqliteResult<Uuid> {
    Uuid::parse_str(text).map_err(|e| invalid_column(index, format!("{}: {}", text, e)))
}

fn parse_status(index: usize, text: &str) -> SqliteResult<TrainStatus> {
    TrainStatus::from_str(text).ok_or_else(|| invalid_column(index, format!("未知状态: {}", text)))
}

fn invalid_column(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        message.into(),
    )
}
