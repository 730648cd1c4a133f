// ==========================================
// 建筑工作室 S 曲线引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod cost_tree;
pub mod curve;
pub mod project;
pub mod schedule;
pub mod snapshot;
pub mod types;
pub mod weighted;

// 重导出核心类型
pub use catalog::{
    AdjustmentAction, CatalogEntry, CatalogImportResult, DetailItem, EstimateAdjustment,
    RejectedRow,
};
pub use cost_tree::{CostNode, CostTree};
pub use curve::{CurveProjection, CurveSummary, DailyAllocation, SpreadStats, WeeklyPoint};
pub use project::Project;
pub use schedule::{ScheduleAssignment, ScheduleAssignmentStore, ScheduleEntry};
pub use snapshot::ProjectionSnapshot;
pub use types::{BuildingClass, CostBasis, CostBasisKind, CostMode, NegativeCostPolicy};
pub use weighted::{WeightRow, WeightedNode};
