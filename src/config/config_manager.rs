// ==========================================
// 建筑工作室 S 曲线引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::projection_config_trait::ProjectionConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::types::NegativeCostPolicy;
use crate::engine::curve_sampler::DEFAULT_TRAILING_BUFFER_WEEKS;
use crate::engine::projector::ProjectionConfig;
use crate::engine::schedule_spreader::DEFAULT_HORIZON_DAYS;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 分摊上限允许的最大值（天），防止误配置导致超大数组
const MAX_HORIZON_DAYS: usize = 3_650;

/// 尾部空周允许的最大值（周）
const MAX_TRAILING_BUFFER_WEEKS: u32 = 520;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::debug!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 保存曲线快照时一并记录当时生效的配置，便于事后比对
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 同步读取完整投影配置（缺失或格式错误的键回退默认值）
    pub fn load_projection_config(&self) -> Result<ProjectionConfig, Box<dyn Error>> {
        Ok(ProjectionConfig {
            horizon_days: self.read_horizon_days()?,
            trailing_buffer_weeks: self.read_trailing_buffer_weeks()?,
            negative_cost_policy: self.read_negative_cost_policy()?,
        })
    }

    // ===== 单项读取（同步） =====

    fn read_horizon_days(&self) -> Result<usize, Box<dyn Error>> {
        let default = DEFAULT_HORIZON_DAYS.to_string();
        let value = self.get_config_or_default(config_keys::PROJECTION_HORIZON_DAYS, &default)?;
        match value.trim().parse::<usize>() {
            Ok(days) if days > 0 && days <= MAX_HORIZON_DAYS => Ok(days),
            _ => {
                tracing::warn!(
                    config_key = config_keys::PROJECTION_HORIZON_DAYS,
                    raw_value = %value,
                    "分摊上限配置无效，使用默认值"
                );
                Ok(DEFAULT_HORIZON_DAYS)
            }
        }
    }

    fn read_trailing_buffer_weeks(&self) -> Result<u32, Box<dyn Error>> {
        let default = DEFAULT_TRAILING_BUFFER_WEEKS.to_string();
        let value =
            self.get_config_or_default(config_keys::PROJECTION_TRAILING_BUFFER_WEEKS, &default)?;
        match value.trim().parse::<u32>() {
            Ok(weeks) if weeks <= MAX_TRAILING_BUFFER_WEEKS => Ok(weeks),
            _ => {
                tracing::warn!(
                    config_key = config_keys::PROJECTION_TRAILING_BUFFER_WEEKS,
                    raw_value = %value,
                    "尾部空周配置无效，使用默认值"
                );
                Ok(DEFAULT_TRAILING_BUFFER_WEEKS)
            }
        }
    }

    fn read_negative_cost_policy(&self) -> Result<NegativeCostPolicy, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::NEGATIVE_COST_POLICY, "PERMISSIVE")?;
        Ok(NegativeCostPolicy::from_db_str(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::NEGATIVE_COST_POLICY,
                raw_value = %value,
                "负造价策略配置无效，使用 PERMISSIVE"
            );
            NegativeCostPolicy::default()
        }))
    }
}

// ==========================================
// ProjectionConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ProjectionConfigReader for ConfigManager {
    async fn get_horizon_days(&self) -> Result<usize, Box<dyn Error>> {
        self.read_horizon_days()
    }

    async fn get_trailing_buffer_weeks(&self) -> Result<u32, Box<dyn Error>> {
        self.read_trailing_buffer_weeks()
    }

    async fn get_negative_cost_policy(&self) -> Result<NegativeCostPolicy, Box<dyn Error>> {
        self.read_negative_cost_policy()
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 投影
    pub const PROJECTION_HORIZON_DAYS: &str = "projection_horizon_days";
    pub const PROJECTION_TRAILING_BUFFER_WEEKS: &str = "projection_trailing_buffer_weeks";

    // 造价
    pub const NEGATIVE_COST_POLICY: &str = "negative_cost_policy";
}
