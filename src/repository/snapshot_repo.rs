// ==========================================
// 建筑工作室 S 曲线引擎 - 曲线快照仓储
// ==========================================
// 采样点、摘要与配置快照以 JSON 存储（points_json / summary_json / config_json）
// ==========================================

use crate::domain::curve::{CurveSummary, WeeklyPoint};
use crate::domain::snapshot::ProjectionSnapshot;
use crate::domain::types::CostMode;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_parse::{format_date, format_timestamp, parse_enum, parse_opt_date, parse_timestamp};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT snapshot_id, project_id, cost_mode, total_cost, project_start,
           points_json, summary_json, config_json, created_at
    FROM projection_snapshot
"#;

/// 未反序列化的快照行
struct SnapshotRow {
    snapshot_id: String,
    project_id: String,
    cost_mode: CostMode,
    total_cost: f64,
    project_start: Option<chrono::NaiveDate>,
    points_json: String,
    summary_json: String,
    config_json: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl SnapshotRow {
    fn into_snapshot(self) -> RepositoryResult<ProjectionSnapshot> {
        let points: Vec<WeeklyPoint> = serde_json::from_str(&self.points_json)?;
        let summary: CurveSummary = serde_json::from_str(&self.summary_json)?;
        Ok(ProjectionSnapshot {
            snapshot_id: self.snapshot_id,
            project_id: self.project_id,
            cost_mode: self.cost_mode,
            total_cost: self.total_cost,
            project_start: self.project_start,
            points,
            summary,
            config_json: self.config_json,
            created_at: self.created_at,
        })
    }
}

pub struct ProjectionSnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectionSnapshotRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存快照
    pub fn insert(&self, snapshot: &ProjectionSnapshot) -> RepositoryResult<()> {
        let points_json = serde_json::to_string(&snapshot.points)?;
        let summary_json = serde_json::to_string(&snapshot.summary)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO projection_snapshot (
                snapshot_id, project_id, cost_mode, total_cost, project_start,
                points_json, summary_json, config_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                snapshot.snapshot_id,
                snapshot.project_id,
                snapshot.cost_mode.to_db_str(),
                snapshot.total_cost,
                snapshot.project_start.map(format_date),
                points_json,
                summary_json,
                snapshot.config_json,
                format_timestamp(&snapshot.created_at),
            ],
        )?;
        Ok(())
    }

    /// 按快照 ID 查询
    pub fn find_by_id(&self, snapshot_id: &str) -> RepositoryResult<Option<ProjectionSnapshot>> {
        let row = {
            let conn = self.get_conn()?;
            let sql = format!("{} WHERE snapshot_id = ?1", SELECT_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            match stmt.query_row(params![snapshot_id], map_row) {
                Ok(row) => Some(row),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            }
        };
        row.map(SnapshotRow::into_snapshot).transpose()
    }

    /// 查询项目的快照（最新在前）
    pub fn list_by_project(&self, project_id: &str) -> RepositoryResult<Vec<ProjectionSnapshot>> {
        let rows = {
            let conn = self.get_conn()?;
            let sql = format!(
                "{} WHERE project_id = ?1 ORDER BY created_at DESC, rowid DESC",
                SELECT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![project_id], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };
        rows.into_iter().map(SnapshotRow::into_snapshot).collect()
    }

    /// 删除快照
    pub fn delete(&self, snapshot_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM projection_snapshot WHERE snapshot_id = ?1",
            params![snapshot_id],
        )?;
        Ok(affected)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<SnapshotRow> {
    Ok(SnapshotRow {
        snapshot_id: row.get(0)?,
        project_id: row.get(1)?,
        cost_mode: parse_enum(2, &row.get::<_, String>(2)?, CostMode::from_db_str)?,
        total_cost: row.get(3)?,
        project_start: parse_opt_date(4, row.get(4)?)?,
        points_json: row.get(5)?,
        summary_json: row.get(6)?,
        config_json: row.get(7)?,
        created_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
    })
}
