// ==========================================
// 建筑工作室 S 曲线引擎 - 曲线快照领域模型
// ==========================================
// 宿主保存的计划曲线，引擎本身不落库
// ==========================================

use crate::domain::curve::{CurveProjection, CurveSummary, WeeklyPoint};
use crate::domain::types::CostMode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// ProjectionSnapshot - S 曲线快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSnapshot {
    pub snapshot_id: String,
    pub project_id: String,
    pub cost_mode: CostMode,
    pub total_cost: f64,
    pub project_start: Option<NaiveDate>,
    pub points: Vec<WeeklyPoint>,
    pub summary: CurveSummary,
    /// 保存时生效的 config_kv 配置（JSON 对象）
    pub config_json: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProjectionSnapshot {
    /// 由投影结果生成新快照
    pub fn from_projection(project_id: &str, projection: &CurveProjection) -> Self {
        Self {
            snapshot_id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            cost_mode: projection.cost_mode,
            total_cost: projection.total_cost,
            project_start: projection.project_start,
            points: projection.points.clone(),
            summary: projection.summary.clone(),
            config_json: None,
            created_at: Utc::now(),
        }
    }

    /// 附带配置快照
    pub fn with_config_json(mut self, config_json: String) -> Self {
        self.config_json = Some(config_json);
        self
    }
}
