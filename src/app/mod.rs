// ==========================================
// 建筑工作室 S 曲线引擎 - 应用层
// ==========================================
// 职责: 组装仓储、配置与 API，供 CLI / 宿主使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
