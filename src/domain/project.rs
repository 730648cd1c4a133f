// ==========================================
// 建筑工作室 S 曲线引擎 - 项目上下文领域模型
// ==========================================
// 提供投影所需的建筑面积、建筑类别与当前造价模式
// ==========================================

use crate::domain::types::{BuildingClass, CostMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Project - 项目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub name: String,

    // ===== 造价参数 =====
    pub area_m2: f64,                  // 建筑面积（㎡）
    pub building_class: BuildingClass, // 估算指标类别
    pub multiplier: f64,               // 指标系数（档次/地区）
    pub adjustment_pct: f64,           // 概算统一调整百分比（如 5 表示 +5%）
    pub cost_mode: CostMode,           // 当前造价模式

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// 以默认系数创建项目（系数 1.0，无调整，估算模式）
    pub fn new(project_id: &str, name: &str, area_m2: f64, building_class: BuildingClass) -> Self {
        let now = Utc::now();
        Self {
            project_id: project_id.to_string(),
            name: name.to_string(),
            area_m2,
            building_class,
            multiplier: 1.0,
            adjustment_pct: 0.0,
            cost_mode: CostMode::Ballpark,
            created_at: now,
            updated_at: now,
        }
    }
}
