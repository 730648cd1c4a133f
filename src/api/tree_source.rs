// ==========================================
// 建筑工作室 S 曲线引擎 - 造价树数据源
// ==========================================
// 职责: 按项目与造价模式从仓储读取数据并组装造价树
// 估算: 指标库 × 系数
// 概算: 指标库 + 项目调整 → 总价
// 预算: 概算树 + 清单细化
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::cost_tree::CostTree;
use crate::domain::project::Project;
use crate::domain::types::CostMode;
use crate::engine::cost_tree::CostTreeBuilder;
use crate::repository::CostCatalogRepository;
use std::sync::Arc;
use tracing::debug;

pub struct CostTreeSource {
    catalog_repo: Arc<CostCatalogRepository>,
    builder: CostTreeBuilder,
}

impl CostTreeSource {
    pub fn new(catalog_repo: Arc<CostCatalogRepository>) -> Self {
        Self {
            catalog_repo,
            builder: CostTreeBuilder::new(),
        }
    }

    /// 组装项目在指定模式下的造价树
    pub fn load(&self, project: &Project, mode: CostMode) -> ApiResult<CostTree> {
        let entries = self.catalog_repo.list_by_class(project.building_class)?;

        let tree = match mode {
            CostMode::Ballpark => {
                self.builder
                    .build_ballpark(&entries, project.building_class, project.multiplier)?
            }
            CostMode::Estimates => self.estimates(project, &entries)?,
            CostMode::Detail => {
                let estimates = self.estimates(project, &entries)?;
                let items = self.catalog_repo.list_detail_items(&project.project_id)?;
                self.builder.build_detail(&estimates, &items)?
            }
        };

        debug!(
            project_id = %project.project_id,
            mode = %mode,
            leaf_count = tree.leaf_count(),
            "造价树已组装"
        );
        Ok(tree)
    }

    fn estimates(
        &self,
        project: &Project,
        entries: &[crate::domain::catalog::CatalogEntry],
    ) -> ApiResult<CostTree> {
        let adjustments = self.catalog_repo.list_adjustments(&project.project_id)?;
        Ok(self.builder.build_estimates(
            entries,
            project.building_class,
            project.multiplier,
            &adjustments,
            project.area_m2,
            project.adjustment_pct,
        )?)
    }
}
