// ==========================================
// 建筑工作室 S 曲线引擎 - 权重计算引擎
// ==========================================
// 职责: 由造价树计算每个节点占项目总造价的百分比
// 输入: 造价节点森林 + 造价模式 + 项目面积
// 输出: 权重树（结构与顺序保持不变）
// ==========================================
// 两次遍历:
// 1) 造价遍历: 自底向上汇总（估算模式汇总单方造价，使用时统一乘面积）
// 2) 权重遍历: weight = cost / total × 100，total ≤ 0 时全部为 0
// ==========================================

use crate::domain::cost_tree::CostNode;
use crate::domain::schedule::ScheduleAssignmentStore;
use crate::domain::types::{CostMode, NegativeCostPolicy};
use crate::domain::weighted::WeightedNode;
use crate::engine::error::{EngineError, EngineResult};
use tracing::{debug, instrument};

// ==========================================
// CostedNode - 造价遍历的中间结果
// ==========================================
// value: 估算模式下为单方造价汇总，其余模式为总价汇总
struct CostedNode<'a> {
    node: &'a CostNode,
    value: f64,
    children: Vec<CostedNode<'a>>,
}

// ==========================================
// WeightCalculator - 权重计算引擎
// ==========================================
// 无状态引擎,所有方法都是纯函数
#[derive(Debug, Clone, Default)]
pub struct WeightCalculator {
    negative_cost_policy: NegativeCostPolicy,
}

impl WeightCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(negative_cost_policy: NegativeCostPolicy) -> Self {
        Self {
            negative_cost_policy,
        }
    }

    pub fn negative_cost_policy(&self) -> NegativeCostPolicy {
        self.negative_cost_policy
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算权重树
    ///
    /// # 参数
    /// - `nodes`: 造价节点森林（可为空）
    /// - `mode`: 造价模式，决定叶子应采用的造价口径
    /// - `project_area`: 项目面积（㎡），必须为非负有限数
    ///
    /// # 返回
    /// 每个节点都带 weight 的新树；总造价为 0 时所有权重为 0
    #[instrument(skip(self, nodes), fields(node_count = nodes.len(), mode = %mode))]
    pub fn compute_weights(
        &self,
        nodes: &[CostNode],
        mode: CostMode,
        project_area: f64,
    ) -> EngineResult<Vec<WeightedNode>> {
        validate_area(project_area)?;

        let costed = self.cost_pass(nodes, mode)?;
        let total_cost: f64 = costed
            .iter()
            .map(|c| scale(c.value, mode, project_area))
            .sum();

        debug!(total_cost, "造价遍历完成");

        Ok(costed
            .iter()
            .map(|c| weight_pass(c, mode, project_area, total_cost))
            .collect())
    }

    /// 计算项目总造价（绝对值）
    pub fn total_cost(
        &self,
        nodes: &[CostNode],
        mode: CostMode,
        project_area: f64,
    ) -> EngineResult<f64> {
        validate_area(project_area)?;
        let costed = self.cost_pass(nodes, mode)?;
        Ok(costed
            .iter()
            .map(|c| scale(c.value, mode, project_area))
            .sum())
    }

    /// 将进度安排挂到权重树上（生成新树，原树不变）
    pub fn attach_schedules<S: ScheduleAssignmentStore + ?Sized>(
        &self,
        nodes: &[WeightedNode],
        store: &S,
    ) -> Vec<WeightedNode> {
        nodes
            .iter()
            .map(|node| WeightedNode {
                code: node.code.clone(),
                title: node.title.clone(),
                cost: node.cost,
                weight: node.weight,
                schedule: store.entry(&node.code),
                children: self.attach_schedules(&node.children, store),
            })
            .collect()
    }

    // ==========================================
    // 造价遍历
    // ==========================================

    fn cost_pass<'a>(&self, nodes: &'a [CostNode], mode: CostMode) -> EngineResult<Vec<CostedNode<'a>>> {
        nodes.iter().map(|n| self.cost_node(n, mode)).collect()
    }

    fn cost_node<'a>(&self, node: &'a CostNode, mode: CostMode) -> EngineResult<CostedNode<'a>> {
        if node.is_leaf() {
            let value = match node.cost {
                None => 0.0,
                Some(basis) => {
                    let expected = mode.expected_basis();
                    if basis.kind() != expected {
                        return Err(EngineError::CostBasisMismatch {
                            code: node.code.clone(),
                            mode,
                            expected,
                            actual: basis.kind(),
                        });
                    }
                    let raw = basis.raw_value();
                    if raw < 0.0 && self.negative_cost_policy == NegativeCostPolicy::Reject {
                        return Err(EngineError::NegativeLeafCost {
                            code: node.code.clone(),
                            cost: raw,
                        });
                    }
                    raw
                }
            };
            return Ok(CostedNode {
                node,
                value,
                children: Vec::new(),
            });
        }

        let children = self.cost_pass(&node.children, mode)?;
        let value = children.iter().map(|c| c.value).sum();
        Ok(CostedNode {
            node,
            value,
            children,
        })
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn validate_area(project_area: f64) -> EngineResult<()> {
    if !project_area.is_finite() || project_area < 0.0 {
        return Err(EngineError::InvalidProjectArea(project_area));
    }
    Ok(())
}

/// 汇总值 → 绝对造价（估算模式在此处统一乘面积）
fn scale(value: f64, mode: CostMode, project_area: f64) -> f64 {
    match mode {
        CostMode::Ballpark => value * project_area,
        CostMode::Estimates | CostMode::Detail => value,
    }
}

fn weight_pass(costed: &CostedNode<'_>, mode: CostMode, project_area: f64, total_cost: f64) -> WeightedNode {
    let cost = scale(costed.value, mode, project_area);
    let weight = if total_cost > 0.0 {
        cost / total_cost * 100.0
    } else {
        0.0
    };

    WeightedNode {
        code: costed.node.code.clone(),
        title: costed.node.title.clone(),
        cost,
        weight,
        schedule: None,
        children: costed
            .children
            .iter()
            .map(|c| weight_pass(c, mode, project_area, total_cost))
            .collect(),
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::ScheduleEntry;
    use crate::domain::types::CostBasis;
    use crate::domain::weighted::leaves;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    const EPS: f64 = 1e-6;

    fn absolute(code: &str, amount: f64) -> CostNode {
        CostNode::leaf(code, code, CostBasis::Absolute { amount })
    }

    fn per_area(code: &str, rate: f64) -> CostNode {
        CostNode::leaf(code, code, CostBasis::PerArea { rate })
    }

    fn nested_estimates() -> Vec<CostNode> {
        vec![
            CostNode::group(
                "A",
                "土建",
                vec![
                    absolute("A.1", 100.0),
                    CostNode::group("A.2", "主体", vec![absolute("A.2.1", 150.0), absolute("A.2.2", 250.0)]),
                ],
            ),
            absolute("B", 500.0),
        ]
    }

    #[test]
    fn test_empty_tree_yields_empty_result() {
        let calc = WeightCalculator::new();
        let weighted = calc.compute_weights(&[], CostMode::Estimates, 100.0).unwrap();
        assert!(weighted.is_empty());
    }

    #[test]
    fn test_weights_are_relative_to_grand_total() {
        let calc = WeightCalculator::new();
        let weighted = calc
            .compute_weights(&nested_estimates(), CostMode::Estimates, 0.0)
            .unwrap();

        let top_sum: f64 = weighted.iter().map(|n| n.weight).sum();
        assert!((top_sum - 100.0).abs() < EPS);

        let leaf_sum: f64 = leaves(&weighted).iter().map(|n| n.weight).sum();
        assert!((leaf_sum - 100.0).abs() < EPS);

        // A.2.2 = 250 / 1000
        let deep = weighted[0].find("A.2.2").unwrap();
        assert!((deep.weight - 25.0).abs() < EPS);
        assert!((deep.cost - 250.0).abs() < EPS);
        assert!((weighted[0].weight - 50.0).abs() < EPS);
    }

    #[test]
    fn test_ballpark_scales_by_area_once() {
        let calc = WeightCalculator::new();
        let nodes = vec![CostNode::group("G", "G", vec![per_area("L1", 300.0), per_area("L2", 100.0)])];
        let weighted = calc.compute_weights(&nodes, CostMode::Ballpark, 2000.0).unwrap();

        assert!((weighted[0].cost - 800_000.0).abs() < EPS);
        assert!((weighted[0].children[0].cost - 600_000.0).abs() < EPS);
        assert!((weighted[0].children[0].weight - 75.0).abs() < EPS);

        let total = calc.total_cost(&nodes, CostMode::Ballpark, 2000.0).unwrap();
        assert!((total - 800_000.0).abs() < EPS);
    }

    #[test]
    fn test_zero_area_ballpark_gives_zero_weights() {
        let calc = WeightCalculator::new();
        let nodes = vec![per_area("L1", 300.0), per_area("L2", 100.0)];
        let weighted = calc.compute_weights(&nodes, CostMode::Ballpark, 0.0).unwrap();
        assert!(weighted.iter().all(|n| n.weight == 0.0 && n.cost == 0.0));
    }

    #[test]
    fn test_invalid_area_is_rejected() {
        let calc = WeightCalculator::new();
        let err = calc
            .compute_weights(&nested_estimates(), CostMode::Estimates, -1.0)
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidProjectArea(-1.0));
        assert!(calc.compute_weights(&[], CostMode::Ballpark, f64::NAN).is_err());
    }

    #[test]
    fn test_basis_mismatch_is_rejected() {
        let calc = WeightCalculator::new();
        let nodes = vec![absolute("A", 10.0), per_area("B", 5.0)];
        let err = calc.compute_weights(&nodes, CostMode::Estimates, 1.0).unwrap_err();
        assert!(matches!(err, EngineError::CostBasisMismatch { ref code, .. } if code == "B"));
    }

    #[test]
    fn test_negative_cost_policies() {
        let nodes = vec![absolute("A", 120.0), absolute("B", -20.0)];

        let permissive = WeightCalculator::new();
        let weighted = permissive.compute_weights(&nodes, CostMode::Detail, 0.0).unwrap();
        assert!((weighted[0].weight - 120.0).abs() < EPS);
        assert!((weighted[1].weight + 20.0).abs() < EPS);

        let strict = WeightCalculator::with_policy(NegativeCostPolicy::Reject);
        let err = strict.compute_weights(&nodes, CostMode::Detail, 0.0).unwrap_err();
        assert_eq!(
            err,
            EngineError::NegativeLeafCost {
                code: "B".to_string(),
                cost: -20.0
            }
        );
    }

    #[test]
    fn test_attach_schedules_builds_new_tree() {
        let calc = WeightCalculator::new();
        let weighted = calc
            .compute_weights(&nested_estimates(), CostMode::Estimates, 0.0)
            .unwrap();

        let mut store = HashMap::new();
        let start = NaiveDate::from_ymd_opt(2026, 4, 6).unwrap();
        store.insert("A.2.1".to_string(), ScheduleEntry::new(start, 14));

        let attached = calc.attach_schedules(&weighted, &store);
        assert_eq!(attached[0].find("A.2.1").unwrap().schedule, Some(ScheduleEntry::new(start, 14)));
        assert!(attached[1].schedule.is_none());
        assert!(weighted[0].find("A.2.1").unwrap().schedule.is_none());
    }
}
