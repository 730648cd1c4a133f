// ==========================================
// 建筑工作室 S 曲线引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod catalog_repo;
pub mod error;
pub mod project_repo;
pub(crate) mod row_parse;
pub mod schedule_repo;
pub mod snapshot_repo;

// 重导出核心仓储
pub use catalog_repo::CostCatalogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use project_repo::ProjectRepository;
pub use schedule_repo::ScheduleAssignmentRepository;
pub use snapshot_repo::ProjectionSnapshotRepository;
