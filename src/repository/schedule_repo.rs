// ==========================================
// 建筑工作室 S 曲线引擎 - 进度安排仓储
// ==========================================
// schedule_assignment 表: (project_id, code) → 开始日期 + 工期
// ==========================================

use crate::domain::schedule::{ScheduleAssignment, ScheduleEntry};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_parse::{format_date, format_timestamp, parse_opt_date, parse_timestamp};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct ScheduleAssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleAssignmentRepository {
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

    /// 新增或覆盖一条进度安排
    pub fn upsert(&self, assignment: &ScheduleAssignment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO schedule_assignment (project_id, code, start_date, duration_days, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(project_id, code) DO UPDATE SET
                start_date = excluded.start_date,
                duration_days = excluded.duration_days,
                updated_at = excluded.updated_at
            "#,
            params![
                assignment.project_id,
                assignment.code,
                assignment.start.map(format_date),
                assignment.duration_days.map(i64::from),
                format_timestamp(&assignment.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 删除一条进度安排
    ///
    /// # 返回
    /// - Ok(usize): 删除行数（0 表示原本不存在）
    pub fn delete(&self, project_id: &str, code: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM schedule_assignment WHERE project_id = ?1 AND code = ?2",
            params![project_id, code],
        )?;
        Ok(affected)
    }

    /// 查询项目的全部进度安排（按编码排序）
    pub fn list_by_project(&self, project_id: &str) -> RepositoryResult<Vec<ScheduleAssignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT project_id, code, start_date, duration_days, updated_at
            FROM schedule_assignment
            WHERE project_id = ?1
            ORDER BY code ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![project_id], map_assignment)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 读取投影用的进度快照（编码 → 安排）
    pub fn load_store(&self, project_id: &str) -> RepositoryResult<HashMap<String, ScheduleEntry>> {
        Ok(self
            .list_by_project(project_id)?
            .into_iter()
            .map(|a| {
                let entry = a.entry();
                (a.code, entry)
            })
            .collect())
    }
}

fn map_assignment(row: &Row<'_>) -> SqliteResult<ScheduleAssignment> {
    let duration_days = row
        .get::<_, Option<i64>>(3)?
        .map(|d| {
            u32::try_from(d).map_err(|_| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    Type::Integer,
                    format!("工期超出范围: {}", d).into(),
                )
            })
        })
        .transpose()?;

    Ok(ScheduleAssignment {
        project_id: row.get(0)?,
        code: row.get(1)?,
        start: parse_opt_date(2, row.get(2)?)?,
        duration_days,
        updated_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
    })
}
