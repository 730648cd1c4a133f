// ==========================================
// 建筑工作室 S 曲线引擎 - 领域类型定义
// ==========================================
// 造价模式 / 建筑类别 / 造价口径 / 负造价策略
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 造价模式 (Cost Mode)
// ==========================================
// 每次计算指定一种模式，不按节点区分
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostMode {
    Ballpark,  // 估算（单方指标）
    Estimates, // 概算（调整后总价）
    Detail,    // 预算（细化清单）
}

impl fmt::Display for CostMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CostMode {
    /// 从字符串解析（大小写不敏感），无法识别时返回 None
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BALLPARK" => Some(CostMode::Ballpark),
            "ESTIMATES" => Some(CostMode::Estimates),
            "DETAIL" => Some(CostMode::Detail),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CostMode::Ballpark => "BALLPARK",
            CostMode::Estimates => "ESTIMATES",
            CostMode::Detail => "DETAIL",
        }
    }

    /// 该模式下叶子节点应采用的造价口径
    pub fn expected_basis(&self) -> CostBasisKind {
        match self {
            CostMode::Ballpark => CostBasisKind::PerArea,
            CostMode::Estimates | CostMode::Detail => CostBasisKind::Absolute,
        }
    }
}

// ==========================================
// 造价口径 (Cost Basis)
// ==========================================
// 每个叶子节点显式携带自身口径，不依赖外部模式标记
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostBasis {
    /// 单方造价（元/㎡），绝对造价 = rate × 项目面积
    PerArea { rate: f64 },
    /// 绝对造价（元）
    Absolute { amount: f64 },
}

impl CostBasis {
    pub fn kind(&self) -> CostBasisKind {
        match self {
            CostBasis::PerArea { .. } => CostBasisKind::PerArea,
            CostBasis::Absolute { .. } => CostBasisKind::Absolute,
        }
    }

    /// 原始数值（单方造价或总价）
    pub fn raw_value(&self) -> f64 {
        match self {
            CostBasis::PerArea { rate } => *rate,
            CostBasis::Absolute { amount } => *amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostBasisKind {
    PerArea,
    Absolute,
}

impl fmt::Display for CostBasisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostBasisKind::PerArea => write!(f, "PER_AREA"),
            CostBasisKind::Absolute => write!(f, "ABSOLUTE"),
        }
    }
}

// ==========================================
// 建筑类别 (Building Class)
// ==========================================
// 估算指标库按建筑类别分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildingClass {
    Residential,   // 住宅
    Commercial,    // 商业
    Office,        // 办公
    Industrial,    // 工业厂房
    Institutional, // 公共建筑
}

impl fmt::Display for BuildingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl BuildingClass {
    /// 从字符串解析，支持英文代码与中文名称
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "RESIDENTIAL" | "住宅" => Some(BuildingClass::Residential),
            "COMMERCIAL" | "商业" => Some(BuildingClass::Commercial),
            "OFFICE" | "办公" => Some(BuildingClass::Office),
            "INDUSTRIAL" | "工业" | "工业厂房" => Some(BuildingClass::Industrial),
            "INSTITUTIONAL" | "公建" | "公共建筑" => Some(BuildingClass::Institutional),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            BuildingClass::Residential => "RESIDENTIAL",
            BuildingClass::Commercial => "COMMERCIAL",
            BuildingClass::Office => "OFFICE",
            BuildingClass::Industrial => "INDUSTRIAL",
            BuildingClass::Institutional => "INSTITUTIONAL",
        }
    }
}

// ==========================================
// 负造价处理策略 (Negative Cost Policy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegativeCostPolicy {
    /// 按算术传播（负造价得到负权重）
    #[default]
    Permissive,
    /// 拒绝含负造价叶子的树
    Reject,
}

impl NegativeCostPolicy {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PERMISSIVE" => Some(NegativeCostPolicy::Permissive),
            "REJECT" => Some(NegativeCostPolicy::Reject),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            NegativeCostPolicy::Permissive => "PERMISSIVE",
            NegativeCostPolicy::Reject => "REJECT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_mode_round_trip_and_basis() {
        assert_eq!(CostMode::from_db_str("ballpark"), Some(CostMode::Ballpark));
        assert_eq!(CostMode::from_db_str(" DETAIL "), Some(CostMode::Detail));
        assert_eq!(CostMode::from_db_str("unknown"), None);
        assert_eq!(CostMode::Estimates.to_string(), "ESTIMATES");

        assert_eq!(CostMode::Ballpark.expected_basis(), CostBasisKind::PerArea);
        assert_eq!(CostMode::Detail.expected_basis(), CostBasisKind::Absolute);
    }

    #[test]
    fn test_building_class_accepts_chinese_names() {
        assert_eq!(BuildingClass::from_db_str("住宅"), Some(BuildingClass::Residential));
        assert_eq!(BuildingClass::from_db_str("office"), Some(BuildingClass::Office));
        assert_eq!(BuildingClass::from_db_str("公共建筑"), Some(BuildingClass::Institutional));
        assert_eq!(BuildingClass::from_db_str(""), None);
    }

    #[test]
    fn test_cost_basis_serde_is_tagged() {
        let basis = CostBasis::PerArea { rate: 1200.0 };
        let json = serde_json::to_string(&basis).unwrap();
        assert_eq!(json, r#"{"kind":"PER_AREA","rate":1200.0}"#);

        let parsed: CostBasis = serde_json::from_str(r#"{"kind":"ABSOLUTE","amount":5.5}"#).unwrap();
        assert_eq!(parsed, CostBasis::Absolute { amount: 5.5 });
        assert_eq!(parsed.kind(), CostBasisKind::Absolute);
    }
}
