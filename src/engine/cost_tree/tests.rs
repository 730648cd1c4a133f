use super::*;
use crate::domain::catalog::{AdjustmentAction, CatalogEntry, DetailItem, EstimateAdjustment};
use crate::domain::types::{BuildingClass, CostBasis, CostMode};
use crate::engine::error::EngineError;

// ==========================================
// 测试辅助函数
// ==========================================

fn entry(code: &str, parent: Option<&str>, rate: f64, sort_order: i32) -> CatalogEntry {
    CatalogEntry {
        building_class: BuildingClass::Residential,
        code: code.to_string(),
        parent_code: parent.map(|p| p.to_string()),
        title: format!("条目{}", code),
        rate_per_area: rate,
        sort_order,
    }
}

/// 住宅指标库
/// 01 土建 ─ 01.01 基础(300) / 01.02 主体(900)
/// 02 机电(500)
/// 03 装饰(300)
fn residential_catalog() -> Vec<CatalogEntry> {
    vec![
        entry("02", None, 500.0, 2),
        entry("01", None, 0.0, 1),
        entry("01.02", Some("01"), 900.0, 2),
        entry("01.01", Some("01"), 300.0, 1),
        entry("03", None, 300.0, 3),
    ]
}

fn adjustment(code: &str, action: AdjustmentAction) -> EstimateAdjustment {
    EstimateAdjustment {
        project_id: "P1".to_string(),
        code: code.to_string(),
        parent_code: None,
        title: None,
        action,
    }
}

fn detail(parent: &str, code: &str, quantity: f64, unit_price: f64, sort_order: i32) -> DetailItem {
    DetailItem {
        project_id: "P1".to_string(),
        parent_code: parent.to_string(),
        code: code.to_string(),
        title: format!("清单{}", code),
        quantity,
        unit_price,
        sort_order,
    }
}

// ==========================================
// 估算
// ==========================================

#[test]
fn test_ballpark_orders_by_sort_order_and_applies_multiplier() {
    let tree = CostTreeBuilder::new()
        .build_ballpark(&residential_catalog(), BuildingClass::Residential, 1.5)
        .unwrap();

    assert_eq!(tree.mode, CostMode::Ballpark);
    let top: Vec<&str> = tree.nodes.iter().map(|n| n.code.as_str()).collect();
    assert_eq!(top, vec!["01", "02", "03"]);
    assert_eq!(tree.leaf_codes(), vec!["01.01", "01.02", "02", "03"]);

    assert_eq!(tree.find("01").unwrap().cost, None);
    assert_eq!(tree.find("01.02").unwrap().unit_price(), Some(1350.0));
    assert_eq!(tree.find("02").unwrap().total(), None);
}

#[test]
fn test_ballpark_filters_building_class() {
    let mut catalog = residential_catalog();
    catalog.push(CatalogEntry {
        building_class: BuildingClass::Office,
        code: "99".to_string(),
        parent_code: None,
        title: "办公专项".to_string(),
        rate_per_area: 80.0,
        sort_order: 0,
    });

    let office = CostTreeBuilder::new()
        .build_ballpark(&catalog, BuildingClass::Office, 1.0)
        .unwrap();
    assert_eq!(office.leaf_codes(), vec!["99"]);

    let empty = CostTreeBuilder::new()
        .build_ballpark(&catalog, BuildingClass::Industrial, 1.0)
        .unwrap();
    assert!(empty.is_empty());
}

#[test]
fn test_ballpark_rejects_bad_structure() {
    let builder = CostTreeBuilder::new();

    let mut dup = residential_catalog();
    dup.push(entry("02", None, 1.0, 9));
    assert_eq!(
        builder.build_ballpark(&dup, BuildingClass::Residential, 1.0).unwrap_err(),
        EngineError::DuplicateCode("02".to_string())
    );

    let orphan = vec![entry("A.1", Some("A"), 10.0, 1)];
    assert!(matches!(
        builder.build_ballpark(&orphan, BuildingClass::Residential, 1.0),
        Err(EngineError::OrphanNode { .. })
    ));

    let cycle = vec![
        entry("ROOT", None, 1.0, 1),
        entry("X", Some("Y"), 1.0, 2),
        entry("Y", Some("X"), 1.0, 3),
    ];
    assert!(matches!(
        builder.build_ballpark(&cycle, BuildingClass::Residential, 1.0),
        Err(EngineError::ParentCycle(_))
    ));

    assert_eq!(
        builder
            .build_ballpark(&residential_catalog(), BuildingClass::Residential, 0.0)
            .unwrap_err(),
        EngineError::InvalidMultiplier(0.0)
    );
}

// ==========================================
// 概算
// ==========================================

#[test]
fn test_estimates_resolve_absolute_totals() {
    let tree = CostTreeBuilder::new()
        .build_estimates(
            &residential_catalog(),
            BuildingClass::Residential,
            1.0,
            &[],
            100.0,
            10.0,
        )
        .unwrap();

    assert_eq!(tree.mode, CostMode::Estimates);
    // 900 × 100 × 1.1
    let total = tree.find("01.02").unwrap().total().unwrap();
    assert!((total - 99_000.0).abs() < 1e-6);
    assert!(tree.find("01.02").unwrap().unit_price().is_none());
}

#[test]
fn test_estimates_overlay_adjustments() {
    let adjustments = vec![
        adjustment("01.01", AdjustmentAction::Delta(-100.0)),
        adjustment("02", AdjustmentAction::Override(650.0)),
        adjustment("03", AdjustmentAction::Remove),
        EstimateAdjustment {
            project_id: "P1".to_string(),
            code: "01.03".to_string(),
            parent_code: Some("01".to_string()),
            title: Some("地下室".to_string()),
            action: AdjustmentAction::Add(400.0),
        },
    ];

    let tree = CostTreeBuilder::new()
        .build_estimates(
            &residential_catalog(),
            BuildingClass::Residential,
            1.0,
            &adjustments,
            10.0,
            0.0,
        )
        .unwrap();

    assert_eq!(tree.leaf_codes(), vec!["01.01", "01.02", "01.03", "02"]);
    assert_eq!(tree.find("01.01").unwrap().cost, Some(CostBasis::Absolute { amount: 2000.0 }));
    assert_eq!(tree.find("02").unwrap().total(), Some(6500.0));
    assert_eq!(tree.find("01.03").unwrap().title, "地下室");
    assert!(tree.find("03").is_none());
}

#[test]
fn test_estimates_remove_drops_subtree() {
    let tree = CostTreeBuilder::new()
        .build_estimates(
            &residential_catalog(),
            BuildingClass::Residential,
            1.0,
            &[adjustment("01", AdjustmentAction::Remove)],
            10.0,
            0.0,
        )
        .unwrap();
    assert_eq!(tree.leaf_codes(), vec!["02", "03"]);
}

#[test]
fn test_estimates_unknown_adjustment_target() {
    let err = CostTreeBuilder::new()
        .build_estimates(
            &residential_catalog(),
            BuildingClass::Residential,
            1.0,
            &[adjustment("77", AdjustmentAction::Delta(1.0))],
            10.0,
            0.0,
        )
        .unwrap_err();
    assert_eq!(err, EngineError::UnknownAdjustmentTarget("77".to_string()));
}

// ==========================================
// 预算
// ==========================================

fn estimates_tree() -> crate::domain::cost_tree::CostTree {
    CostTreeBuilder::new()
        .build_estimates(
            &residential_catalog(),
            BuildingClass::Residential,
            1.0,
            &[],
            10.0,
            0.0,
        )
        .unwrap()
}

#[test]
fn test_detail_refines_leaves() {
    let items = vec![
        detail("02", "02.02", 10.0, 200.0, 2),
        detail("02", "02.01", 4.0, 500.0, 1),
    ];
    let tree = CostTreeBuilder::new().build_detail(&estimates_tree(), &items).unwrap();

    assert_eq!(tree.mode, CostMode::Detail);
    let mech = tree.find("02").unwrap();
    assert!(!mech.is_leaf());
    assert_eq!(mech.cost, None);
    let codes: Vec<&str> = mech.children.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["02.01", "02.02"]);
    assert_eq!(mech.children[1].total(), Some(2000.0));

    // 未细化的叶子保留概算总价
    assert_eq!(tree.find("03").unwrap().total(), Some(3000.0));
}

#[test]
fn test_detail_rejects_invalid_parents() {
    let builder = CostTreeBuilder::new();
    let tree = estimates_tree();

    assert_eq!(
        builder.build_detail(&tree, &[detail("88", "88.1", 1.0, 1.0, 1)]).unwrap_err(),
        EngineError::UnknownDetailParent("88".to_string())
    );
    assert_eq!(
        builder.build_detail(&tree, &[detail("01", "01.9", 1.0, 1.0, 1)]).unwrap_err(),
        EngineError::DetailParentNotLeaf("01".to_string())
    );
    assert_eq!(
        builder.build_detail(&tree, &[detail("02", "03", 1.0, 1.0, 1)]).unwrap_err(),
        EngineError::DuplicateCode("03".to_string())
    );

    let ballpark = builder
        .build_ballpark(&residential_catalog(), BuildingClass::Residential, 1.0)
        .unwrap();
    assert!(matches!(
        builder.build_detail(&ballpark, &[]),
        Err(EngineError::UnexpectedTreeMode { .. })
    ));
}
