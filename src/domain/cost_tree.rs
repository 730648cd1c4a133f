// ==========================================
// 建筑工作室 S 曲线引擎 - 造价树领域模型
// ==========================================
// 红线: 叶子节点 ⇔ children 为空
// 红线: 非叶子节点造价恒等于后代造价之和，不单独取值
// ==========================================

use crate::domain::types::{CostBasis, CostMode};
use serde::{Deserialize, Serialize};

// ==========================================
// CostNode - WBS 造价节点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostNode {
    pub code: String,           // 树内唯一编码（与进度安排关联的键）
    pub title: String,          // 显示名称
    pub cost: Option<CostBasis>, // 叶子造价；非叶子为 None
    #[serde(default)]
    pub children: Vec<CostNode>,
}

impl CostNode {
    /// 创建叶子节点
    pub fn leaf(code: &str, title: &str, cost: CostBasis) -> Self {
        Self {
            code: code.to_string(),
            title: title.to_string(),
            cost: Some(cost),
            children: Vec::new(),
        }
    }

    /// 创建分组节点
    pub fn group(code: &str, title: &str, children: Vec<CostNode>) -> Self {
        Self {
            code: code.to_string(),
            title: title.to_string(),
            cost: None,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// 单方造价（仅 PerArea 口径的叶子有值）
    pub fn unit_price(&self) -> Option<f64> {
        match self.cost {
            Some(CostBasis::PerArea { rate }) if self.is_leaf() => Some(rate),
            _ => None,
        }
    }

    /// 总价（仅 Absolute 口径的叶子有值）
    pub fn total(&self) -> Option<f64> {
        match self.cost {
            Some(CostBasis::Absolute { amount }) if self.is_leaf() => Some(amount),
            _ => None,
        }
    }

    /// 按编码深度优先查找
    pub fn find(&self, code: &str) -> Option<&CostNode> {
        if self.code == code {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(code))
    }

    /// 叶子数量
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(|c| c.leaf_count()).sum()
        }
    }

    fn collect_leaf_codes<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.is_leaf() {
            out.push(&self.code);
        } else {
            for child in &self.children {
                child.collect_leaf_codes(out);
            }
        }
    }
}

// ==========================================
// CostTree - 造价树（含生成模式）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTree {
    pub mode: CostMode,
    pub nodes: Vec<CostNode>,
}

impl CostTree {
    pub fn new(mode: CostMode, nodes: Vec<CostNode>) -> Self {
        Self { mode, nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, code: &str) -> Option<&CostNode> {
        self.nodes.iter().find_map(|n| n.find(code))
    }

    /// 所有叶子编码（深度优先顺序）
    pub fn leaf_codes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.collect_leaf_codes(&mut out);
        }
        out
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().map(|n| n.leaf_count()).sum()
    }
}
