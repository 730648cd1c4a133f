// ==========================================
// 建筑工作室 S 曲线引擎 - 投影编排器
// ==========================================
// 用途: 协调三个纯函数引擎的执行顺序
// 权重计算 → 挂接进度 → 日分摊 → 周聚合 → 摘要
// ==========================================
// 红线: 无缓存、无状态；相同输入重复调用结果一致
// ==========================================

use crate::domain::cost_tree::CostTree;
use crate::domain::curve::CurveProjection;
use crate::domain::schedule::ScheduleAssignmentStore;
use crate::domain::types::NegativeCostPolicy;
use crate::domain::weighted::WeightedNode;
use crate::engine::curve_sampler::{CurveSampler, DEFAULT_TRAILING_BUFFER_WEEKS};
use crate::engine::error::EngineResult;
use crate::engine::schedule_spreader::{DailyAllocationSpreader, DEFAULT_HORIZON_DAYS};
use crate::engine::weight_calculator::WeightCalculator;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

// ==========================================
// ProjectionConfig - 投影配置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub horizon_days: usize,             // 日分摊上限: 730 天
    pub trailing_buffer_weeks: u32,      // 尾部空周: 4 周
    pub negative_cost_policy: NegativeCostPolicy,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            trailing_buffer_weeks: DEFAULT_TRAILING_BUFFER_WEEKS,
            negative_cost_policy: NegativeCostPolicy::Permissive,
        }
    }
}

// ==========================================
// ScheduleProjector - 投影编排器
// ==========================================
pub struct ScheduleProjector {
    config: ProjectionConfig,
    calculator: WeightCalculator,
    spreader: DailyAllocationSpreader,
    sampler: CurveSampler,
}

impl ScheduleProjector {
    pub fn new(config: ProjectionConfig) -> Self {
        Self {
            calculator: WeightCalculator::with_policy(config.negative_cost_policy),
            spreader: DailyAllocationSpreader::new(config.horizon_days),
            sampler: CurveSampler::new(config.trailing_buffer_weeks),
            config,
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// 树的总造价（与权重同口径）
    pub fn total_cost(&self, tree: &CostTree, project_area: f64) -> EngineResult<f64> {
        self.calculator.total_cost(&tree.nodes, tree.mode, project_area)
    }

    /// 计算权重树并挂接进度安排
    pub fn weighted_tree<S: ScheduleAssignmentStore + ?Sized>(
        &self,
        tree: &CostTree,
        project_area: f64,
        store: &S,
    ) -> EngineResult<Vec<WeightedNode>> {
        let weighted = self
            .calculator
            .compute_weights(&tree.nodes, tree.mode, project_area)?;
        Ok(self.calculator.attach_schedules(&weighted, store))
    }

    /// 执行完整投影
    ///
    /// # 参数
    /// - `tree`: 造价树（模式取自树本身）
    /// - `project_area`: 项目面积（㎡）
    /// - `store`: 进度安排快照
    ///
    /// # 返回
    /// 曲线 + 摘要；无进度数据时 points 为空、project_start 为 None
    #[instrument(skip(self, tree, store), fields(mode = %tree.mode, leaf_count = tree.leaf_count()))]
    pub fn project<S: ScheduleAssignmentStore + ?Sized>(
        &self,
        tree: &CostTree,
        project_area: f64,
        store: &S,
    ) -> EngineResult<CurveProjection> {
        // 1. 权重
        let total_cost = self.total_cost(tree, project_area)?;
        let weighted = self.weighted_tree(tree, project_area, store)?;

        // 2. 日分摊
        let allocation = self.spreader.spread_leaves(&weighted, store);
        if allocation.stats.truncated_weight > 0.0 {
            warn!(
                truncated_weight = allocation.stats.truncated_weight,
                horizon_days = self.config.horizon_days,
                "部分进度超出分摊上限，已丢弃"
            );
        }

        // 3. 周聚合
        let points = self.sampler.build_from_allocation(&allocation);
        let summary = self.sampler.summarize(&points, &allocation);

        info!(
            total_cost,
            weeks = summary.total_weeks,
            final_cumulative = summary.final_cumulative,
            unscheduled_leaves = summary.unscheduled_leaf_count,
            "S 曲线投影完成"
        );

        Ok(CurveProjection {
            cost_mode: tree.mode,
            total_cost,
            project_start: allocation.project_start,
            points,
            summary,
        })
    }
}

impl Default for ScheduleProjector {
    fn default() -> Self {
        Self::new(ProjectionConfig::default())
    }
}
