// ==========================================
// 建筑工作室 S 曲线引擎 - 造价指标库领域模型
// ==========================================
// 估算指标库 (cost_catalog) → 概算调整 (estimate_adjustment) → 预算清单 (detail_item)
// ==========================================

use crate::domain::types::BuildingClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CatalogEntry - 估算指标（按建筑类别）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub building_class: BuildingClass,
    pub code: String,
    pub parent_code: Option<String>, // 顶层为 None
    pub title: String,
    pub rate_per_area: f64,          // 单方造价（元/㎡），仅叶子生效
    pub sort_order: i32,
}

// ==========================================
// AdjustmentAction - 概算调整动作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "rate", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentAction {
    Delta(f64),    // 在原单方造价上增减
    Override(f64), // 替换单方造价
    Add(f64),      // 新增条目
    Remove,        // 删除条目（含子树）
}

impl AdjustmentAction {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AdjustmentAction::Delta(_) => "DELTA",
            AdjustmentAction::Override(_) => "OVERRIDE",
            AdjustmentAction::Add(_) => "ADD",
            AdjustmentAction::Remove => "REMOVE",
        }
    }

    pub fn rate(&self) -> Option<f64> {
        match self {
            AdjustmentAction::Delta(r) | AdjustmentAction::Override(r) | AdjustmentAction::Add(r) => {
                Some(*r)
            }
            AdjustmentAction::Remove => None,
        }
    }

    /// 由数据库字段组装
    pub fn from_db(action: &str, rate: Option<f64>) -> Option<Self> {
        match (action.trim().to_uppercase().as_str(), rate) {
            ("DELTA", Some(r)) => Some(AdjustmentAction::Delta(r)),
            ("OVERRIDE", Some(r)) => Some(AdjustmentAction::Override(r)),
            ("ADD", Some(r)) => Some(AdjustmentAction::Add(r)),
            ("REMOVE", _) => Some(AdjustmentAction::Remove),
            _ => None,
        }
    }
}

impl fmt::Display for AdjustmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rate() {
            Some(r) => write!(f, "{}({})", self.to_db_str(), r),
            None => write!(f, "{}", self.to_db_str()),
        }
    }
}

// ==========================================
// EstimateAdjustment - 项目级概算调整
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateAdjustment {
    pub project_id: String,
    pub code: String,
    pub parent_code: Option<String>, // 仅 Add 使用
    pub title: Option<String>,       // 仅 Add 使用
    pub action: AdjustmentAction,
}

// ==========================================
// DetailItem - 预算细化清单项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    pub project_id: String,
    pub parent_code: String, // 所属概算叶子
    pub code: String,
    pub title: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub sort_order: i32,
}

impl DetailItem {
    pub fn total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

// ==========================================
// CatalogImportResult - 指标库导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogImportResult {
    pub batch_id: String,
    pub file_name: String,
    pub total_rows: usize,
    pub imported_rows: usize,
    pub rejected_rows: Vec<RejectedRow>,
    pub building_classes: Vec<BuildingClass>,
    pub elapsed_ms: u64,
    pub imported_at: DateTime<Utc>,
}

/// 被拒绝的行（行号从 1 开始，不含表头）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRow {
    pub row: usize,
    pub reason: String,
}
