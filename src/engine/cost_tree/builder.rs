use super::assemble::{assemble, FlatRow};
use crate::domain::catalog::{AdjustmentAction, CatalogEntry, DetailItem, EstimateAdjustment};
use crate::domain::cost_tree::{CostNode, CostTree};
use crate::domain::types::{BuildingClass, CostBasis, CostMode};
use crate::engine::error::{EngineError, EngineResult};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

// ==========================================
// CostTreeBuilder - 造价树构建引擎
// ==========================================
// 无状态引擎，输入为指标库快照
pub struct CostTreeBuilder;

impl CostTreeBuilder {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 估算 (Ballpark)
    // ==========================================

    /// 由估算指标库构建造价树
    ///
    /// # 参数
    /// - `entries`: 指标库（可含多个建筑类别，仅取 `building_class`）
    /// - `building_class`: 建筑类别
    /// - `multiplier`: 指标系数（> 0）
    ///
    /// # 返回
    /// 叶子为 PerArea(单方造价 × 系数) 的造价树
    #[instrument(skip(self, entries), fields(entries = entries.len(), building_class = %building_class))]
    pub fn build_ballpark(
        &self,
        entries: &[CatalogEntry],
        building_class: BuildingClass,
        multiplier: f64,
    ) -> EngineResult<CostTree> {
        validate_multiplier(multiplier)?;

        let rows = class_rows(entries, building_class);
        let nodes = assemble(&rows, |row| CostBasis::PerArea {
            rate: row.rate * multiplier,
        })?;

        let tree = CostTree::new(CostMode::Ballpark, nodes);
        info!(leaf_count = tree.leaf_count(), "估算造价树构建完成");
        Ok(tree)
    }

    // ==========================================
    // 概算 (Estimates)
    // ==========================================

    /// 在估算指标上叠加项目调整，并换算为总价
    ///
    /// 叶子总价 = (单方造价 + 调整) × 系数 × 面积 × (1 + adjustment_pct / 100)
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, entries, adjustments), fields(
        entries = entries.len(),
        adjustments = adjustments.len(),
        building_class = %building_class
    ))]
    pub fn build_estimates(
        &self,
        entries: &[CatalogEntry],
        building_class: BuildingClass,
        multiplier: f64,
        adjustments: &[EstimateAdjustment],
        project_area: f64,
        adjustment_pct: f64,
    ) -> EngineResult<CostTree> {
        validate_multiplier(multiplier)?;
        if !project_area.is_finite() || project_area < 0.0 {
            return Err(EngineError::InvalidProjectArea(project_area));
        }

        let mut rows = class_rows(entries, building_class);
        apply_adjustments(&mut rows, adjustments)?;

        let factor = multiplier * project_area * (1.0 + adjustment_pct / 100.0);
        let nodes = assemble(&rows, |row| CostBasis::Absolute {
            amount: row.rate * factor,
        })?;

        let tree = CostTree::new(CostMode::Estimates, nodes);
        info!(leaf_count = tree.leaf_count(), factor, "概算造价树构建完成");
        Ok(tree)
    }

    // ==========================================
    // 预算 (Detail)
    // ==========================================

    /// 将概算叶子细化为清单项
    ///
    /// # 规则
    /// - 有清单的叶子变为分组，子项总价 = 数量 × 单价
    /// - 无清单的叶子保留概算总价
    /// - 清单只能挂在概算叶子下
    #[instrument(skip(self, estimates, items), fields(items = items.len()))]
    pub fn build_detail(&self, estimates: &CostTree, items: &[DetailItem]) -> EngineResult<CostTree> {
        if estimates.mode != CostMode::Estimates {
            return Err(EngineError::UnexpectedTreeMode {
                expected: CostMode::Estimates,
                actual: estimates.mode,
            });
        }

        let existing: HashSet<String> = collect_all_codes(&estimates.nodes);
        let mut seen_items: HashSet<&str> = HashSet::new();
        let mut by_parent: HashMap<&str, Vec<(usize, &DetailItem)>> = HashMap::new();

        for (idx, item) in items.iter().enumerate() {
            let parent = estimates
                .find(&item.parent_code)
                .ok_or_else(|| EngineError::UnknownDetailParent(item.parent_code.clone()))?;
            if !parent.is_leaf() {
                return Err(EngineError::DetailParentNotLeaf(item.parent_code.clone()));
            }
            if existing.contains(&item.code) || !seen_items.insert(item.code.as_str()) {
                return Err(EngineError::DuplicateCode(item.code.clone()));
            }
            by_parent
                .entry(item.parent_code.as_str())
                .or_default()
                .push((idx, item));
        }

        for list in by_parent.values_mut() {
            list.sort_by_key(|(idx, item)| (item.sort_order, *idx));
        }

        let nodes = estimates
            .nodes
            .iter()
            .map(|n| refine(n, &by_parent))
            .collect();

        let tree = CostTree::new(CostMode::Detail, nodes);
        info!(
            leaf_count = tree.leaf_count(),
            refined = by_parent.len(),
            "预算造价树构建完成"
        );
        Ok(tree)
    }
}

impl Default for CostTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn validate_multiplier(multiplier: f64) -> EngineResult<()> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(EngineError::InvalidMultiplier(multiplier));
    }
    Ok(())
}

fn class_rows(entries: &[CatalogEntry], building_class: BuildingClass) -> Vec<FlatRow> {
    entries
        .iter()
        .filter(|e| e.building_class == building_class)
        .map(|e| FlatRow {
            code: e.code.clone(),
            parent_code: e.parent_code.clone(),
            title: e.title.clone(),
            rate: e.rate_per_area,
            sort_order: e.sort_order,
        })
        .collect()
}

/// 按顺序应用概算调整
fn apply_adjustments(rows: &mut Vec<FlatRow>, adjustments: &[EstimateAdjustment]) -> EngineResult<()> {
    let mut removed: HashSet<String> = HashSet::new();

    for adj in adjustments {
        match adj.action {
            AdjustmentAction::Add(rate) => {
                let sort_order = rows.iter().map(|r| r.sort_order).max().unwrap_or(0).saturating_add(1);
                rows.push(FlatRow {
                    code: adj.code.clone(),
                    parent_code: adj.parent_code.clone(),
                    title: adj.title.clone().unwrap_or_else(|| adj.code.clone()),
                    rate,
                    sort_order,
                });
            }
            AdjustmentAction::Delta(delta) => {
                target(rows, &adj.code)?.rate += delta;
            }
            AdjustmentAction::Override(rate) => {
                target(rows, &adj.code)?.rate = rate;
            }
            AdjustmentAction::Remove => {
                if !rows.iter().any(|r| r.code == adj.code) {
                    return Err(EngineError::UnknownAdjustmentTarget(adj.code.clone()));
                }
                removed.insert(adj.code.clone());
            }
        }
    }

    if removed.is_empty() {
        return Ok(());
    }

    // 连带删除子树
    loop {
        let before = removed.len();
        for row in rows.iter() {
            if let Some(parent) = &row.parent_code {
                if removed.contains(parent) {
                    removed.insert(row.code.clone());
                }
            }
        }
        if removed.len() == before {
            break;
        }
    }

    debug!(removed = removed.len(), "概算调整删除条目");
    rows.retain(|r| !removed.contains(&r.code));
    Ok(())
}

fn target<'a>(rows: &'a mut [FlatRow], code: &str) -> EngineResult<&'a mut FlatRow> {
    rows.iter_mut()
        .find(|r| r.code == code)
        .ok_or_else(|| EngineError::UnknownAdjustmentTarget(code.to_string()))
}

fn collect_all_codes(nodes: &[CostNode]) -> HashSet<String> {
    let mut out = HashSet::new();
    let mut stack: Vec<&CostNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        out.insert(node.code.clone());
        stack.extend(node.children.iter());
    }
    out
}

fn refine(node: &CostNode, by_parent: &HashMap<&str, Vec<(usize, &DetailItem)>>) -> CostNode {
    if !node.is_leaf() {
        return CostNode {
            code: node.code.clone(),
            title: node.title.clone(),
            cost: None,
            children: node.children.iter().map(|c| refine(c, by_parent)).collect(),
        };
    }

    match by_parent.get(node.code.as_str()) {
        Some(items) => CostNode::group(
            &node.code,
            &node.title,
            items
                .iter()
                .map(|(_, item)| {
                    CostNode::leaf(&item.code, &item.title, CostBasis::Absolute { amount: item.total() })
                })
                .collect(),
        ),
        None => node.clone(),
    }
}
