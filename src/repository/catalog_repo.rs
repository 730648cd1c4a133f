// ==========================================
// 建筑工作室 S 曲线引擎 - 造价数据仓储
// ==========================================
// 覆盖三张表:
// - cost_catalog: 估算指标库（按建筑类别）
// - estimate_adjustment: 项目级概算调整（按录入顺序）
// - detail_item: 项目级预算清单
// ==========================================
// 红线: Repository 不含业务逻辑（调整的合并在 CostTreeBuilder 中完成）
// ==========================================

use crate::domain::catalog::{AdjustmentAction, CatalogEntry, DetailItem, EstimateAdjustment};
use crate::domain::types::BuildingClass;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_parse::parse_enum;
use rusqlite::{params, Connection, Result as SqliteResult, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// CostCatalogRepository
// ==========================================
pub struct CostCatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CostCatalogRepository {
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

    // ==========================================
    // 估算指标库
    // ==========================================

    /// 批量写入指标（主键冲突时覆盖）
    ///
    /// # 返回
    /// - Ok(usize): 写入行数
    pub fn upsert_entries(&self, entries: &[CatalogEntry]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let count = write_entries(&tx, entries)?;
        tx.commit()?;
        Ok(count)
    }

    /// 整体替换某一建筑类别的指标（先删后插，单事务）
    pub fn replace_class(
        &self,
        building_class: BuildingClass,
        entries: &[CatalogEntry],
    ) -> RepositoryResult<usize> {
        check_class(building_class, entries)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let count = rewrite_class(&tx, building_class, entries)?;
        tx.commit()?;
        Ok(count)
    }

    /// 一次替换多个建筑类别；任一类别失败则全部回滚
    ///
    /// # 返回
    /// - Ok(Vec<usize>): 与输入顺序一致的每类写入行数
    pub fn replace_classes(
        &self,
        groups: &[(BuildingClass, Vec<CatalogEntry>)],
    ) -> RepositoryResult<Vec<usize>> {
        for (class, entries) in groups {
            check_class(*class, entries)?;
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let counts = groups
            .iter()
            .map(|(class, entries)| rewrite_class(&tx, *class, entries))
            .collect::<RepositoryResult<Vec<_>>>()?;
        tx.commit()?;
        Ok(counts)
    }

    /// 查询某一建筑类别的全部指标（按 sort_order、code 排序）
    pub fn list_by_class(&self, building_class: BuildingClass) -> RepositoryResult<Vec<CatalogEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT building_class, code, parent_code, title, rate_per_area, sort_order
            FROM cost_catalog
            WHERE building_class = ?1
            ORDER BY sort_order ASC, code ASC
            "#,
        )?;

        let entries = stmt
            .query_map(params![building_class.to_db_str()], |row| {
                Ok(CatalogEntry {
                    building_class: parse_enum(0, &row.get::<_, String>(0)?, BuildingClass::from_db_str)?,
                    code: row.get(1)?,
                    parent_code: row.get(2)?,
                    title: row.get(3)?,
                    rate_per_area: row.get(4)?,
                    sort_order: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(entries)
    }

    /// 已有指标的建筑类别
    pub fn list_classes(&self) -> RepositoryResult<Vec<BuildingClass>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT building_class FROM cost_catalog ORDER BY building_class")?;
        let classes = stmt
            .query_map([], |row| parse_enum(0, &row.get::<_, String>(0)?, BuildingClass::from_db_str))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(classes)
    }

    // ==========================================
    // 概算调整
    // ==========================================

    /// 整体替换项目的概算调整（顺序即应用顺序）
    pub fn replace_adjustments(
        &self,
        project_id: &str,
        adjustments: &[EstimateAdjustment],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM estimate_adjustment WHERE project_id = ?1",
            params![project_id],
        )?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO estimate_adjustment (
                    project_id, seq_no, code, parent_code, title, action, rate
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for (seq_no, adj) in adjustments.iter().enumerate() {
                stmt.execute(params![
                    project_id,
                    seq_no as i64,
                    adj.code,
                    adj.parent_code,
                    adj.title,
                    adj.action.to_db_str(),
                    adj.action.rate(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(adjustments.len())
    }

    /// 查询项目的概算调整（按录入顺序）
    pub fn list_adjustments(&self, project_id: &str) -> RepositoryResult<Vec<EstimateAdjustment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT project_id, code, parent_code, title, action, rate
            FROM estimate_adjustment
            WHERE project_id = ?1
            ORDER BY seq_no ASC
            "#,
        )?;

        let adjustments = stmt
            .query_map(params![project_id], |row| {
                let action_raw: String = row.get(4)?;
                let rate: Option<f64> = row.get(5)?;
                Ok(EstimateAdjustment {
                    project_id: row.get(0)?,
                    code: row.get(1)?,
                    parent_code: row.get(2)?,
                    title: row.get(3)?,
                    action: parse_enum(4, &action_raw, |s| AdjustmentAction::from_db(s, rate))?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(adjustments)
    }

    // ==========================================
    // 预算清单
    // ==========================================

    /// 整体替换项目的预算清单
    pub fn replace_detail_items(&self, project_id: &str, items: &[DetailItem]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM detail_item WHERE project_id = ?1", params![project_id])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO detail_item (
                    project_id, code, parent_code, title, quantity, unit_price, sort_order
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for item in items {
                stmt.execute(params![
                    project_id,
                    item.code,
                    item.parent_code,
                    item.title,
                    item.quantity,
                    item.unit_price,
                    item.sort_order,
                ])?;
            }
        }
        tx.commit()?;
        Ok(items.len())
    }

    /// 查询项目的预算清单
    pub fn list_detail_items(&self, project_id: &str) -> RepositoryResult<Vec<DetailItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT project_id, parent_code, code, title, quantity, unit_price, sort_order
            FROM detail_item
            WHERE project_id = ?1
            ORDER BY parent_code ASC, sort_order ASC, code ASC
            "#,
        )?;

        let items = stmt
            .query_map(params![project_id], |row| {
                Ok(DetailItem {
                    project_id: row.get(0)?,
                    parent_code: row.get(1)?,
                    code: row.get(2)?,
                    title: row.get(3)?,
                    quantity: row.get(4)?,
                    unit_price: row.get(5)?,
                    sort_order: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(items)
    }
}

fn check_class(building_class: BuildingClass, entries: &[CatalogEntry]) -> RepositoryResult<()> {
    match entries.iter().find(|e| e.building_class != building_class) {
        Some(bad) => Err(RepositoryError::FieldValueError {
            field: "building_class".to_string(),
            message: format!(
                "条目 {} 的类别 {} 与目标类别 {} 不一致",
                bad.code, bad.building_class, building_class
            ),
        }),
        None => Ok(()),
    }
}

fn rewrite_class(
    tx: &Transaction<'_>,
    building_class: BuildingClass,
    entries: &[CatalogEntry],
) -> RepositoryResult<usize> {
    tx.execute(
        "DELETE FROM cost_catalog WHERE building_class = ?1",
        params![building_class.to_db_str()],
    )?;
    write_entries(tx, entries)
}

fn write_entries(tx: &Transaction<'_>, entries: &[CatalogEntry]) -> RepositoryResult<usize> {
    let mut stmt = tx.prepare(
        r#"
        INSERT INTO cost_catalog (
            building_class, code, parent_code, title, rate_per_area, sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(building_class, code) DO UPDATE SET
            parent_code = excluded.parent_code,
            title = excluded.title,
            rate_per_area = excluded.rate_per_area,
            sort_order = excluded.sort_order
        "#,
    )?;
    let mut count = 0;
    for e in entries {
        count += stmt.execute(params![
            e.building_class.to_db_str(),
            e.code,
            e.parent_code,
            e.title,
            e.rate_per_area,
            e.sort_order,
        ])?;
    }
    Ok(count)
}
