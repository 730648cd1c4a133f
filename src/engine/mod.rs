// ==========================================
// 建筑工作室 S 曲线引擎 - 引擎层
// ==========================================
// 职责: 造价树构建、权重计算、日分摊、周聚合
// 红线: Engine 不拼 SQL，不落库，全部为纯函数
// ==========================================

pub mod cost_tree;
pub mod curve_sampler;
pub mod error;
pub mod projector;
pub mod schedule_spreader;
pub mod weight_calculator;

// 重导出核心引擎
pub use cost_tree::CostTreeBuilder;
pub use curve_sampler::{CurveSampler, DEFAULT_TRAILING_BUFFER_WEEKS};
pub use error::{EngineError, EngineResult};
pub use projector::{ProjectionConfig, ScheduleProjector};
pub use schedule_spreader::{DailyAllocationSpreader, DEFAULT_HORIZON_DAYS};
pub use weight_calculator::WeightCalculator;
