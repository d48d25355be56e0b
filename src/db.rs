// ==========================================
// 地铁车队运营排程系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表 (daily_data / daily_data_history / modification_log / config_kv)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// daily_data 每日覆盖,daily_data_history 只追加
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    const FEATURE_COLUMNS: &str = "
        train_id TEXT NOT NULL,
        date TEXT NOT NULL,
        rs_days_from_plan INTEGER NOT NULL,
        sig_days_from_plan INTEGER NOT NULL,
        tel_days_from_plan INTEGER NOT NULL,
        job_open_count INTEGER NOT NULL,
        job_critical_count INTEGER NOT NULL,
        branding_req_hours REAL NOT NULL,
        branding_alloc_hours REAL NOT NULL,
        mileage_km REAL NOT NULL,
        bogie_wear_index REAL NOT NULL,
        depot TEXT NOT NULL,
        cleaning_slot TEXT NOT NULL,
        stabling_position TEXT NOT NULL,
        estimated_shunting_mins INTEGER NOT NULL,
        prev_night_shunting_count INTEGER NOT NULL,
        iot_temp_avg_c REAL NOT NULL,
        hvac_alert INTEGER NOT NULL,
        manual_override_flag INTEGER NOT NULL,
        assigned_status TEXT NOT NULL,
        last_maintenance_date TEXT";

    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS daily_data (
            {FEATURE_COLUMNS},
            PRIMARY KEY (date, train_id)
        );

        CREATE TABLE IF NOT EXISTS daily_data_history (
            history_id INTEGER PRIMARY KEY AUTOINCREMENT,
            {FEATURE_COLUMNS},
            recorded_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_history_train_date
            ON daily_data_history (train_id, date);

        CREATE TABLE IF NOT EXISTS modification_log (
            entry_id TEXT PRIMARY KEY,
            seq INTEGER NOT NULL,
            schedule_version TEXT NOT NULL,
            train_id TEXT NOT NULL,
            action TEXT NOT NULL,
            from_status TEXT NOT NULL,
            to_status TEXT NOT NULL,
            reason TEXT,
            risk_acknowledged INTEGER NOT NULL DEFAULT 0,
            timestamp TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_modification_log_train
            ON modification_log (train_id);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "
    ))?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
