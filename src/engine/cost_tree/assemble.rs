// ==========================================
// 扁平行 → 造价树
// ==========================================
// 同级排序: sort_order 升序，其次保持输入顺序
// ==========================================

use crate::domain::cost_tree::CostNode;
use crate::domain::types::CostBasis;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::{HashMap, HashSet};

/// 构建用的扁平行
#[derive(Debug, Clone)]
pub(super) struct FlatRow {
    pub code: String,
    pub parent_code: Option<String>,
    pub title: String,
    pub rate: f64,
    pub sort_order: i32,
}

/// 组装造价树
///
/// # 参数
/// - `rows`: 扁平行（顺序即同 sort_order 下的输出顺序）
/// - `leaf_cost`: 叶子造价口径换算
///
/// # 错误
/// - DuplicateCode: 编码重复
/// - OrphanNode: 上级编码不存在
/// - ParentCycle: 上级关系成环（无法从顶层到达）
pub(super) fn assemble<F>(rows: &[FlatRow], leaf_cost: F) -> EngineResult<Vec<CostNode>>
where
    F: Fn(&FlatRow) -> CostBasis,
{
    let mut seen: HashSet<&str> = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.code.as_str()) {
            return Err(EngineError::DuplicateCode(row.code.clone()));
        }
    }

    let mut roots: Vec<usize> = Vec::new();
    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        match row.parent_code.as_deref().filter(|p| !p.is_empty()) {
            None => roots.push(idx),
            Some(parent) => {
                if !seen.contains(parent) {
                    return Err(EngineError::OrphanNode {
                        code: row.code.clone(),
                        parent_code: parent.to_string(),
                    });
                }
                children.entry(parent).or_default().push(idx);
            }
        }
    }

    let order = |indices: &mut Vec<usize>| {
        indices.sort_by_key(|&i| (rows[i].sort_order, i));
    };
    order(&mut roots);
    for list in children.values_mut() {
        order(list);
    }

    let mut visited = 0_usize;
    let nodes = roots
        .iter()
        .map(|&idx| build_node(rows, idx, &children, &leaf_cost, &mut visited))
        .collect::<Vec<_>>();

    if visited < rows.len() {
        let reachable = collect_codes(&nodes);
        let stuck = rows
            .iter()
            .find(|r| !reachable.contains(r.code.as_str()))
            .map(|r| r.code.clone())
            .unwrap_or_default();
        return Err(EngineError::ParentCycle(stuck));
    }

    Ok(nodes)
}

fn build_node<F>(
    rows: &[FlatRow],
    idx: usize,
    children: &HashMap<&str, Vec<usize>>,
    leaf_cost: &F,
    visited: &mut usize,
) -> CostNode
where
    F: Fn(&FlatRow) -> CostBasis,
{
    *visited += 1;
    let row = &rows[idx];
    match children.get(row.code.as_str()) {
        Some(child_indices) if !child_indices.is_empty() => CostNode::group(
            &row.code,
            &row.title,
            child_indices
                .iter()
                .map(|&c| build_node(rows, c, children, leaf_cost, visited))
                .collect(),
        ),
        _ => CostNode::leaf(&row.code, &row.title, leaf_cost(row)),
    }
}

fn collect_codes(nodes: &[CostNode]) -> HashSet<&str> {
    fn walk<'a>(node: &'a CostNode, out: &mut HashSet<&'a str>) {
        out.insert(node.code.as_str());
        for child in &node.children {
            walk(child, out);
        }
    }
    let mut out = HashSet::new();
    for node in nodes {
        walk(node, &mut out);
    }
    out
}
