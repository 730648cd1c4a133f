// ==========================================
// 建筑工作室 S 曲线引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{CostTreeSource, ImportApi, ProjectionApi, ScheduleApi};
use crate::config::ConfigManager;
use crate::repository::{
    CostCatalogRepository, ProjectRepository, ProjectionSnapshotRepository,
    ScheduleAssignmentRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "STUDIO_SCURVE_DB_PATH";

/// 应用状态
///
/// 所有仓储共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 投影API（项目/权重树/曲线/快照）
    pub projection_api: Arc<ProjectionApi>,

    /// 进度安排API
    pub schedule_api: Arc<ScheduleApi>,

    /// 指标库导入API
    pub import_api: Arc<ImportApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并幂等建表
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let project_repo = Arc::new(ProjectRepository::from_connection(conn.clone()));
        let catalog_repo = Arc::new(CostCatalogRepository::from_connection(conn.clone()));
        let schedule_repo = Arc::new(ScheduleAssignmentRepository::from_connection(conn.clone()));
        let snapshot_repo = Arc::new(ProjectionSnapshotRepository::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let tree_source = Arc::new(CostTreeSource::new(catalog_repo.clone()));

        let projection_api = Arc::new(ProjectionApi::new(
            project_repo.clone(),
            catalog_repo.clone(),
            schedule_repo.clone(),
            snapshot_repo,
            config_manager.clone(),
            tree_source.clone(),
        ));
        let schedule_api = Arc::new(ScheduleApi::new(project_repo, schedule_repo, tree_source));
        let import_api = Arc::new(ImportApi::new(catalog_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            projection_api,
            schedule_api,
            import_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 STUDIO_SCURVE_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./studio_scurve.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        let dir = if cfg!(debug_assertions) {
            data_dir.join("studio-scurve-dev")
        } else {
            data_dir.join("studio-scurve")
        };

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("studio_scurve.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_initializes_schema() {
        let temp = NamedTempFile::new().unwrap();
        let state = AppState::new(temp.path().to_str().unwrap().to_string()).unwrap();

        let config = state.projection_api.load_config().unwrap();
        assert_eq!(config.horizon_days, crate::engine::DEFAULT_HORIZON_DAYS);
    }
}
