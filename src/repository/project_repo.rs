// ==========================================
// 建筑工作室 S 曲线引擎 - 项目仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::project::Project;
use crate::domain::types::{BuildingClass, CostMode};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_parse::{format_timestamp, parse_enum, parse_timestamp};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT project_id, name, area_m2, building_class, multiplier,
           adjustment_pct, cost_mode, created_at, updated_at
    FROM project
"#;

// ==========================================
// ProjectRepository - 项目仓储
// ==========================================
/// 职责: 管理 project 表的 CRUD 操作
pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectRepository {
    /// 创建新的 ProjectRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或更新项目（created_at 以首次写入为准）
    pub fn upsert(&self, project: &Project) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO project (
                project_id, name, area_m2, building_class, multiplier,
                adjustment_pct, cost_mode, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(project_id) DO UPDATE SET
                name = excluded.name,
                area_m2 = excluded.area_m2,
                building_class = excluded.building_class,
                multiplier = excluded.multiplier,
                adjustment_pct = excluded.adjustment_pct,
                cost_mode = excluded.cost_mode,
                updated_at = excluded.updated_at
            "#,
            params![
                project.project_id,
                project.name,
                project.area_m2,
                project.building_class.to_db_str(),
                project.multiplier,
                project.adjustment_pct,
                project.cost_mode.to_db_str(),
                format_timestamp(&project.created_at),
                format_timestamp(&project.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 按主键查询
    ///
    /// # 返回
    /// - Ok(Some(Project)): 找到项目
    /// - Ok(None): 未找到
    pub fn find_by_id(&self, project_id: &str) -> RepositoryResult<Option<Project>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE project_id = ?1", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![project_id], map_project) {
            Ok(project) => Ok(Some(project)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按主键查询，不存在时返回 NotFound
    pub fn get(&self, project_id: &str) -> RepositoryResult<Project> {
        self.find_by_id(project_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Project".to_string(),
                id: project_id.to_string(),
            })
    }

    /// 查询全部项目，按名称排序
    pub fn list_all(&self) -> RepositoryResult<Vec<Project>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY name ASC, project_id ASC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let projects = stmt
            .query_map([], map_project)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(projects)
    }

    /// 删除项目（级联删除调整、清单、进度与快照）
    pub fn delete(&self, project_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM project WHERE project_id = ?1", params![project_id])?;
        Ok(affected)
    }
}

fn map_project(row: &Row<'_>) -> SqliteResult<Project> {
    Ok(Project {
        project_id: row.get(0)?,
        name: row.get(1)?,
        area_m2: row.get(2)?,
        building_class: parse_enum(3, &row.get::<_, String>(3)?, BuildingClass::from_db_str)?,
        multiplier: row.get(4)?,
        adjustment_pct: row.get(5)?,
        cost_mode: parse_enum(6, &row.get::<_, String>(6)?, CostMode::from_db_str)?,
        created_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
        updated_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
    })
}
