// ==========================================
// 建筑工作室 S 曲线引擎 - 核心库
// ==========================================
// 职责: WBS 造价树 → 权重 → 日分摊 → 周 S 曲线
// 技术栈: Rust + SQLite
// 系统定位: 计划辅助（计划员维护进度，引擎只读计算）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 纯函数计算
pub mod engine;

// 导入层 - 估算指标库
pub mod importer;

// 配置层 - 投影参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 性能埋点
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BuildingClass, CostBasis, CostBasisKind, CostMode, NegativeCostPolicy};

// 领域实体
pub use domain::{
    CatalogEntry, CostNode, CostTree, CurveProjection, CurveSummary, DetailItem,
    EstimateAdjustment, Project, ProjectionSnapshot, ScheduleEntry, WeeklyPoint, WeightedNode,
};

// 引擎
pub use engine::{
    CostTreeBuilder, CurveSampler, DailyAllocationSpreader, EngineError, ProjectionConfig,
    ScheduleProjector, WeightCalculator,
};

// API
pub use api::{ImportApi, ProjectionApi, ScheduleApi};

// 应用状态
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "建筑工作室 S 曲线引擎";

// 数据库版本
pub const DB_VERSION: &str = "v1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(db::CURRENT_SCHEMA_VERSION, 1);
    }
}
