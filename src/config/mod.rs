// ==========================================
// 建筑工作室 S 曲线引擎 - 配置层
// ==========================================
// 职责: 投影参数（分摊上限/尾部空周/负造价策略）的读取与覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod projection_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use projection_config_trait::{load_projection_config, ProjectionConfigReader};
