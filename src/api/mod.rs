// ==========================================
// 建筑工作室 S 曲线引擎 - API 层
// ==========================================
// 职责: 提供宿主调用的业务接口（CLI / 桌面端）
// ==========================================

pub mod error;
pub mod import_api;
pub mod projection_api;
pub(crate) mod runtime_bridge;
pub mod schedule_api;
pub mod tree_source;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse};
pub use projection_api::{ProjectionApi, ProjectionResponse, WeightedTreeResponse};
pub use schedule_api::ScheduleApi;
pub use tree_source::CostTreeSource;
