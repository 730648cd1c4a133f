// ==========================================
// 建筑工作室 S 曲线引擎 - 权重树领域模型
// ==========================================
// 权重 = 节点造价 / 项目总造价 × 100（相对全项目，而非同级小计）
// ==========================================

use crate::domain::schedule::ScheduleEntry;
use serde::{Deserialize, Serialize};

// ==========================================
// WeightedNode - 带权重与进度安排的造价节点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedNode {
    pub code: String,
    pub title: String,
    pub cost: f64,                       // 绝对造价（已按面积换算）
    pub weight: f64,                     // 占项目总造价百分比
    pub schedule: Option<ScheduleEntry>, // 计划员填写的进度安排
    #[serde(default)]
    pub children: Vec<WeightedNode>,
}

impl WeightedNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn find(&self, code: &str) -> Option<&WeightedNode> {
        if self.code == code {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(code))
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a WeightedNode>) {
        if self.is_leaf() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }
}

/// 深度优先收集叶子节点
pub fn leaves(nodes: &[WeightedNode]) -> Vec<&WeightedNode> {
    let mut out = Vec::new();
    for node in nodes {
        node.collect_leaves(&mut out);
    }
    out
}

/// 在森林中按编码查找
pub fn find_node<'a>(nodes: &'a [WeightedNode], code: &str) -> Option<&'a WeightedNode> {
    nodes.iter().find_map(|n| n.find(code))
}

// ==========================================
// WeightRow - 扁平化展示行（供表格渲染）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRow {
    pub code: String,
    pub title: String,
    pub depth: usize,
    pub is_leaf: bool,
    pub cost: f64,
    pub weight: f64,
    pub schedule: Option<ScheduleEntry>,
}

/// 按前序遍历展开为表格行
pub fn flatten(nodes: &[WeightedNode]) -> Vec<WeightRow> {
    fn walk(node: &WeightedNode, depth: usize, out: &mut Vec<WeightRow>) {
        out.push(WeightRow {
            code: node.code.clone(),
            title: node.title.clone(),
            depth,
            is_leaf: node.is_leaf(),
            cost: node.cost,
            weight: node.weight,
            schedule: node.schedule,
        });
        for child in &node.children {
            walk(child, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    for node in nodes {
        walk(node, 0, &mut out);
    }
    out
}
