// ==========================================
// 供需产能对账系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供建表脚本 (外部存储的本地实现)
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

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// 说明：
/// - linked_capacity_group_material_demand.material_demand_id 不设外键，
///   需求删除后允许残留关联（检测器跳过）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS app_user (
            user_id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            role TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS capacity_group (
            capacity_group_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            user_id TEXT NOT NULL REFERENCES app_user(user_id),
            actual_capacity REAL NOT NULL DEFAULT 0 CHECK (actual_capacity >= 0),
            max_capacity REAL NOT NULL DEFAULT 0 CHECK (max_capacity >= 0),
            link_status TEXT NOT NULL DEFAULT 'UN_LINKED'
        );

        CREATE TABLE IF NOT EXISTS capacity_time_series (
            capacity_group_id TEXT NOT NULL REFERENCES capacity_group(capacity_group_id) ON DELETE CASCADE,
            calendar_week TEXT NOT NULL,
            actual_capacity REAL NOT NULL,
            maximum_capacity REAL NOT NULL,
            PRIMARY KEY (capacity_group_id, calendar_week)
        );

        CREATE TABLE IF NOT EXISTS material_demand (
            material_demand_id TEXT PRIMARY KEY,
            material_number TEXT NOT NULL,
            description TEXT,
            customer_id TEXT NOT NULL,
            supplier_id TEXT,
            link_status TEXT NOT NULL DEFAULT 'UN_LINKED'
        );

        CREATE TABLE IF NOT EXISTS demand_series (
            demand_series_id TEXT PRIMARY KEY,
            material_demand_id TEXT NOT NULL REFERENCES material_demand(material_demand_id) ON DELETE CASCADE,
            customer_location TEXT,
            demand_category TEXT
        );

        CREATE TABLE IF NOT EXISTS demand_series_value (
            value_id TEXT PRIMARY KEY,
            demand_series_id TEXT NOT NULL REFERENCES demand_series(demand_series_id) ON DELETE CASCADE,
            calendar_week TEXT NOT NULL,
            demand REAL NOT NULL,
            ruled INTEGER NOT NULL DEFAULT 0,
            week_color TEXT
        );

        CREATE TABLE IF NOT EXISTS linked_capacity_group_material_demand (
            link_id TEXT PRIMARY KEY,
            capacity_group_id TEXT NOT NULL REFERENCES capacity_group(capacity_group_id) ON DELETE CASCADE,
            material_demand_id TEXT NOT NULL,
            linked INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS status_counters (
            user_id TEXT PRIMARY KEY,
            status_improvement_count INTEGER NOT NULL DEFAULT 0,
            status_degradation_count INTEGER NOT NULL DEFAULT 0,
            todos_count INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS alert_rule (
            alert_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            alert_name TEXT NOT NULL,
            monitored_objects TEXT NOT NULL,
            threshold_type TEXT NOT NULL,
            threshold REAL NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS triggered_alert (
            triggered_alert_id TEXT PRIMARY KEY,
            alert_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            triggered_by TEXT NOT NULL,
            alert_name TEXT NOT NULL,
            monitored_objects TEXT NOT NULL,
            threshold_type TEXT NOT NULL,
            threshold REAL NOT NULL,
            description TEXT,
            old_value REAL NOT NULL,
            new_value REAL NOT NULL,
            delta REAL NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS logging_history (
            log_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            capacity_group_id TEXT,
            material_demand_id TEXT,
            calendar_week TEXT,
            description TEXT NOT NULL,
            logged_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_capacity_group_user ON capacity_group(user_id);
        CREATE INDEX IF NOT EXISTS idx_link_group ON linked_capacity_group_material_demand(capacity_group_id);
        CREATE INDEX IF NOT EXISTS idx_series_value_series ON demand_series_value(demand_series_id);
        CREATE INDEX IF NOT EXISTS idx_logging_history_user ON logging_history(user_id, logged_at);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
