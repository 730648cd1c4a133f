// ==========================================
// 建筑工作室 S 曲线引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供幂等建表（宿主层持久化：指标库/项目/进度安排/曲线快照/配置）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
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

CREATE TABLE IF NOT EXISTS cost_catalog (
    building_class TEXT NOT NULL,
    code TEXT NOT NULL,
    parent_code TEXT,
    title TEXT NOT NULL,
    rate_per_area REAL NOT NULL DEFAULT 0,
    sort_order INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (building_class, code)
);

CREATE TABLE IF NOT EXISTS project (
    project_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    area_m2 REAL NOT NULL,
    building_class TEXT NOT NULL,
    multiplier REAL NOT NULL DEFAULT 1.0,
    adjustment_pct REAL NOT NULL DEFAULT 0,
    cost_mode TEXT NOT NULL DEFAULT 'BALLPARK',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS estimate_adjustment (
    project_id TEXT NOT NULL REFERENCES project(project_id) ON DELETE CASCADE,
    seq_no INTEGER NOT NULL,
    code TEXT NOT NULL,
    parent_code TEXT,
    title TEXT,
    action TEXT NOT NULL,
    rate REAL,
    PRIMARY KEY (project_id, seq_no)
);

CREATE TABLE IF NOT EXISTS detail_item (
    project_id TEXT NOT NULL REFERENCES project(project_id) ON DELETE CASCADE,
    code TEXT NOT NULL,
    parent_code TEXT NOT NULL,
    title TEXT NOT NULL,
    quantity REAL NOT NULL,
    unit_price REAL NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (project_id, code)
);

CREATE TABLE IF NOT EXISTS schedule_assignment (
    project_id TEXT NOT NULL REFERENCES project(project_id) ON DELETE CASCADE,
    code TEXT NOT NULL,
    start_date TEXT,
    duration_days INTEGER,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (project_id, code)
);

CREATE TABLE IF NOT EXISTS projection_snapshot (
    snapshot_id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES project(project_id) ON DELETE CASCADE,
    cost_mode TEXT NOT NULL,
    total_cost REAL NOT NULL,
    project_start TEXT,
    points_json TEXT NOT NULL,
    summary_json TEXT NOT NULL,
    config_json TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_snapshot_project ON projection_snapshot(project_id, created_at);
"#;

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

/// 打开 SQLite 连接并应用统一配置（含 SQL 追踪）
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    crate::perf::install_sqlite_tracing(&mut conn);
    Ok(conn)
}

/// 幂等建表，并写入当前 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
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

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
