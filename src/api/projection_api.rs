// ==========================================
// 建筑工作室 S 曲线引擎 - 投影 API
// ==========================================
// 职责: 项目维护、权重树查询、S 曲线投影、曲线快照
// 红线: API 只做参数校验与编排，计算全部交给引擎
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::runtime_bridge::run_blocking;
use crate::api::tree_source::CostTreeSource;
use crate::config::{load_projection_config, ConfigManager};
use crate::domain::catalog::{DetailItem, EstimateAdjustment};
use crate::domain::curve::CurveProjection;
use crate::domain::project::Project;
use crate::domain::snapshot::ProjectionSnapshot;
use crate::domain::types::CostMode;
use crate::domain::weighted::{flatten, WeightRow, WeightedNode};
use crate::engine::cost_tree::CostTreeBuilder;
use crate::engine::projector::{ProjectionConfig, ScheduleProjector};
use crate::i18n::{t, t_with_args};
use crate::perf::PerfGuard;
use crate::repository::{
    CostCatalogRepository, ProjectRepository, ProjectionSnapshotRepository,
    ScheduleAssignmentRepository,
};

// ==========================================
// 响应结构
// ==========================================

/// 权重树响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedTreeResponse {
    pub project_id: String,
    pub cost_mode: CostMode,
    pub total_cost: f64,
    /// 嵌套结构（树形展示）
    pub nodes: Vec<WeightedNode>,
    /// 先序展开（表格展示）
    pub rows: Vec<WeightRow>,
}

/// S 曲线投影响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionResponse {
    pub project_id: String,
    pub projection: CurveProjection,
    /// 面向用户的提示（无进度数据、未排期、超出分摊上限）
    pub notices: Vec<String>,
}

// ==========================================
// ProjectionApi
// ==========================================
pub struct ProjectionApi {
    project_repo: Arc<ProjectRepository>,
    catalog_repo: Arc<CostCatalogRepository>,
    schedule_repo: Arc<ScheduleAssignmentRepository>,
    snapshot_repo: Arc<ProjectionSnapshotRepository>,
    config_manager: Arc<ConfigManager>,
    tree_source: Arc<CostTreeSource>,
}

impl ProjectionApi {
    pub fn new(
        project_repo: Arc<ProjectRepository>,
        catalog_repo: Arc<CostCatalogRepository>,
        schedule_repo: Arc<ScheduleAssignmentRepository>,
        snapshot_repo: Arc<ProjectionSnapshotRepository>,
        config_manager: Arc<ConfigManager>,
        tree_source: Arc<CostTreeSource>,
    ) -> Self {
        Self {
            project_repo,
            catalog_repo,
            schedule_repo,
            snapshot_repo,
            config_manager,
            tree_source,
        }
    }

    // ==========================================
    // 项目
    // ==========================================

    /// 新增或更新项目
    ///
    /// # 校验
    /// - 名称非空
    /// - 面积为非负有限数
    /// - 系数为正有限数
    pub fn upsert_project(&self, mut project: Project) -> ApiResult<Project> {
        let _perf = PerfGuard::for_project("upsert_project", &project.project_id);

        if project.project_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("项目ID不能为空".to_string()));
        }
        if project.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("项目名称不能为空".to_string()));
        }
        if !project.area_m2.is_finite() || project.area_m2 < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "建筑面积无效: {}",
                project.area_m2
            )));
        }
        if !project.multiplier.is_finite() || project.multiplier <= 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "指标系数无效: {}",
                project.multiplier
            )));
        }
        if !project.adjustment_pct.is_finite() {
            return Err(ApiError::InvalidInput(format!(
                "调整百分比无效: {}",
                project.adjustment_pct
            )));
        }

        if let Some(existing) = self.project_repo.find_by_id(&project.project_id)? {
            project.created_at = existing.created_at;
        }
        project.updated_at = Utc::now();

        self.project_repo.upsert(&project)?;
        info!(project_id = %project.project_id, mode = %project.cost_mode, "项目已保存");
        Ok(project)
    }

    /// 查询项目
    pub fn get_project(&self, project_id: &str) -> ApiResult<Project> {
        self.project_repo.find_by_id(project_id)?.ok_or_else(|| {
            ApiError::NotFound(t_with_args(
                "projection.project_not_found",
                &[("project_id", project_id)],
            ))
        })
    }

    /// 整体替换项目的概算调整（先以新调整组装概算树，通过后才落库）
    pub fn replace_adjustments(
        &self,
        project_id: &str,
        adjustments: Vec<EstimateAdjustment>,
    ) -> ApiResult<usize> {
        let _perf = PerfGuard::for_project("replace_adjustments", project_id);
        let project = self.get_project(project_id)?;

        let entries = self.catalog_repo.list_by_class(project.building_class)?;
        CostTreeBuilder::new().build_estimates(
            &entries,
            project.building_class,
            project.multiplier,
            &adjustments,
            project.area_m2,
            project.adjustment_pct,
        )?;

        Ok(self.catalog_repo.replace_adjustments(project_id, &adjustments)?)
    }

    /// 整体替换项目的预算清单（先组装预算树校验，通过后才落库）
    pub fn replace_detail_items(&self, project_id: &str, items: Vec<DetailItem>) -> ApiResult<usize> {
        let _perf = PerfGuard::for_project("replace_detail_items", project_id);
        let project = self.get_project(project_id)?;

        if let Some(bad) = items
            .iter()
            .find(|i| !i.quantity.is_finite() || !i.unit_price.is_finite())
        {
            return Err(ApiError::InvalidInput(format!("清单 {} 的数量或单价无效", bad.code)));
        }

        let estimates = self.tree_source.load(&project, CostMode::Estimates)?;
        CostTreeBuilder::new().build_detail(&estimates, &items)?;

        Ok(self.catalog_repo.replace_detail_items(project_id, &items)?)
    }

    // ==========================================
    // 投影
    // ==========================================

    /// 读取投影配置（异步配置读取器经同步桥接）
    pub fn load_config(&self) -> ApiResult<ProjectionConfig> {
        let reader = Arc::clone(&self.config_manager);
        let loaded = run_blocking(async move { load_projection_config(reader.as_ref()).await })?;
        loaded.map_err(|e| ApiError::InternalError(format!("读取投影配置失败: {}", e)))
    }

    fn projector(&self) -> ApiResult<ScheduleProjector> {
        Ok(ScheduleProjector::new(self.load_config()?))
    }

    /// 查询权重树（mode 为空时使用项目当前模式）
    pub fn get_weighted_tree(
        &self,
        project_id: &str,
        mode: Option<CostMode>,
    ) -> ApiResult<WeightedTreeResponse> {
        let _perf = PerfGuard::for_project("get_weighted_tree", project_id);
        let project = self.get_project(project_id)?;
        let mode = mode.unwrap_or(project.cost_mode);

        let tree = self.tree_source.load(&project, mode)?;
        let store = self.schedule_repo.load_store(project_id)?;
        let projector = self.projector()?;

        let nodes = projector.weighted_tree(&tree, project.area_m2, &store)?;
        let total_cost = projector.total_cost(&tree, project.area_m2)?;
        let rows = flatten(&nodes);

        Ok(WeightedTreeResponse {
            project_id: project_id.to_string(),
            cost_mode: mode,
            total_cost,
            nodes,
            rows,
        })
    }

    /// 生成 S 曲线（mode 为空时使用项目当前模式）
    pub fn project_curve(&self, project_id: &str, mode: Option<CostMode>) -> ApiResult<ProjectionResponse> {
        let _perf = PerfGuard::for_project("project_curve", project_id);
        let project = self.get_project(project_id)?;
        let mode = mode.unwrap_or(project.cost_mode);

        let tree = self.tree_source.load(&project, mode)?;
        let store = self.schedule_repo.load_store(project_id)?;
        let projector = self.projector()?;
        let projection = projector.project(&tree, project.area_m2, &store)?;

        let notices = build_notices(&projection, projector.config());
        if projection.is_empty() {
            warn!(project_id, mode = %mode, "项目无进度数据，曲线为空");
        }

        Ok(ProjectionResponse {
            project_id: project_id.to_string(),
            projection,
            notices,
        })
    }

    // ==========================================
    // 快照
    // ==========================================

    /// 以当前数据生成并保存曲线快照
    pub fn save_snapshot(&self, project_id: &str, mode: Option<CostMode>) -> ApiResult<ProjectionSnapshot> {
        let _perf = PerfGuard::for_project("save_snapshot", project_id);
        let response = self.project_curve(project_id, mode)?;
        let config_json = self
            .config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::InternalError(format!("读取配置快照失败: {}", e)))?;
        let snapshot = ProjectionSnapshot::from_projection(project_id, &response.projection)
            .with_config_json(config_json);
        self.snapshot_repo.insert(&snapshot)?;

        info!(
            project_id,
            snapshot_id = %snapshot.snapshot_id,
            weeks = snapshot.points.len(),
            "曲线快照已保存"
        );
        Ok(snapshot)
    }

    pub fn get_snapshot(&self, snapshot_id: &str) -> ApiResult<ProjectionSnapshot> {
        self.snapshot_repo
            .find_by_id(snapshot_id)?
            .ok_or_else(|| ApiError::NotFound(format!("快照(id={})不存在", snapshot_id)))
    }

    /// 项目快照列表（最新在前）
    pub fn list_snapshots(&self, project_id: &str) -> ApiResult<Vec<ProjectionSnapshot>> {
        self.get_project(project_id)?;
        Ok(self.snapshot_repo.list_by_project(project_id)?)
    }
}

/// 组装面向用户的提示
fn build_notices(projection: &CurveProjection, config: &ProjectionConfig) -> Vec<String> {
    let mut notices = Vec::new();
    let summary = &projection.summary;

    if projection.is_empty() {
        notices.push(t("projection.no_schedule_data"));
        return notices;
    }

    if summary.unscheduled_leaf_count > 0 {
        let count = summary.unscheduled_leaf_count.to_string();
        let weight = format!("{:.2}", summary.unscheduled_weight);
        notices.push(t_with_args(
            "projection.unscheduled_leaves",
            &[("count", count.as_str()), ("weight", weight.as_str())],
        ));
    }

    if summary.truncated_weight > 0.0 {
        let days = config.horizon_days.to_string();
        let weight = format!("{:.2}", summary.truncated_weight);
        notices.push(t_with_args(
            "projection.truncated",
            &[("days", days.as_str()), ("weight", weight.as_str())],
        ));
    }

    notices
}
