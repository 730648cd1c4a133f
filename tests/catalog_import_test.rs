// ==========================================
// 指标库导入集成测试
// ==========================================
// 测试目标: CSV（中文表头）→ 映射 → 结构校验 → 按类别落库
// ==========================================


use std::sync::Arc;
use studio_scurve::api::{ApiError, ImportApi};
use studio_scurve::domain::BuildingClass;
use studio_scurve::importer::{CatalogImporter, CatalogImporterImpl, CsvParser, ImportError};
use studio_scurve::logging;
use studio_scurve::repository::CostCatalogRepository;

const CATALOG_CSV: &str = "\u{feff}建筑类别,编码,上级编码,名称,单方造价,排序
住宅,01,,土建,,1
住宅,01.01,01,基础,300,1
住宅,01.02,01,主体,\"1,500\",2
办公,A,,办公整体,4200,1
住宅,02,,机电,abc,3
";

fn create_importer(db_path: &str) -> (Arc<CostCatalogRepository>, CatalogImporterImpl) {
    let repo = Arc::new(CostCatalogRepository::new(db_path).expect("Failed to create catalog repo"));
    let importer = CatalogImporterImpl::new(repo.clone());
    (repo, importer)
}

#[tokio::test]
async fn test_import_csv_with_chinese_headers() {
    logging::init_test();
    println!("\n=== 测试：中文表头 CSV 导入 ===");

    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let csv = test_helpers::write_temp_file(".csv", CATALOG_CSV).unwrap();
    let (repo, importer) = create_importer(&db_path);

    let result = importer.import_catalog(csv.path(), None).await.unwrap();
    println!(
        "✓ 导入完成: total={}, imported={}, rejected={}",
        result.total_rows,
        result.imported_rows,
        result.rejected_rows.len()
    );

    assert_eq!(result.total_rows, 5);
    assert_eq!(result.imported_rows, 4);
    assert_eq!(result.rejected_rows.len(), 1);
    assert_eq!(result.rejected_rows[0].row, 5, "非数值单方造价所在行应被拒绝");
    assert_eq!(
        result.building_classes,
        vec![BuildingClass::Residential, BuildingClass::Office]
    );

    let residential = repo.list_by_class(BuildingClass::Residential).unwrap();
    assert_eq!(residential.len(), 3);
    let main = residential.iter().find(|e| e.code == "01.02").unwrap();
    assert_eq!(main.rate_per_area, 1500.0);
    assert_eq!(main.parent_code.as_deref(), Some("01"));

    let office = repo.list_by_class(BuildingClass::Office).unwrap();
    assert_eq!(office.len(), 1);
    assert_eq!(office[0].rate_per_area, 4200.0);
}

#[tokio::test]
async fn test_import_replaces_only_listed_classes() {
    println!("\n=== 测试：再次导入只替换文件中的类别 ===");

    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let (repo, importer) = create_importer(&db_path);

    let first = test_helpers::write_temp_file(".csv", CATALOG_CSV).unwrap();
    importer.import_catalog(first.path(), None).await.unwrap();

    // 仅含住宅，且以类别参数覆盖
    let second = test_helpers::write_temp_file(
        ".csv",
        "code,title,rate\nR1,住宅整体,3100\n",
    )
    .unwrap();
    let result = importer
        .import_catalog(second.path(), Some(BuildingClass::Residential))
        .await
        .unwrap();
    assert_eq!(result.imported_rows, 1);

    let residential = repo.list_by_class(BuildingClass::Residential).unwrap();
    assert_eq!(residential.len(), 1);
    assert_eq!(residential[0].code, "R1");
    assert_eq!(repo.list_by_class(BuildingClass::Office).unwrap().len(), 1, "办公指标应保留");
    println!("✓ 类别级替换正确");
}

#[tokio::test]
async fn test_structure_error_aborts_without_writes() {
    println!("\n=== 测试：结构错误整体回退 ===");

    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let (repo, importer) = create_importer(&db_path);

    let csv = test_helpers::write_temp_file(
        ".csv",
        "类别,编码,上级编码,名称,单方造价\n办公,A,,办公整体,4200\n住宅,01.09,99,孤儿,100\n",
    )
    .unwrap();

    let result = importer.import_catalog(csv.path(), None).await;
    assert!(
        matches!(result, Err(ImportError::CatalogStructureError { ref building_class, .. }) if building_class == "RESIDENTIAL"),
        "上级编码不存在应报结构错误"
    );
    assert!(repo.list_classes().unwrap().is_empty(), "任何类别都不应落库");
    println!("✓ 未写入任何数据");
}

#[tokio::test]
async fn test_database_error_keeps_every_class_unchanged() {
    println!("\n=== 测试：落库失败时所有类别保持原样 ===");

    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let (repo, importer) = create_importer(&db_path);
    let first = test_helpers::write_temp_file(".csv", CATALOG_CSV).unwrap();
    importer.import_catalog(first.path(), None).await.unwrap();

    test_helpers::open_test_connection(&db_path)
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER fail_on_boom BEFORE INSERT ON cost_catalog
             WHEN NEW.code = 'BOOM'
             BEGIN SELECT RAISE(ABORT, 'boom'); END;",
        )
        .unwrap();

    // 办公在前（可写入），住宅在后（触发错误）
    let csv = test_helpers::write_temp_file(
        ".csv",
        "类别,编码,上级编码,名称,单方造价\n办公,B,,新办公,3900\n住宅,BOOM,,坏行,100\n",
    )
    .unwrap();
    let result = importer.import_catalog(csv.path(), None).await;
    assert!(matches!(result, Err(ImportError::DatabaseError(_))));

    let office = repo.list_by_class(BuildingClass::Office).unwrap();
    assert_eq!(office.len(), 1);
    assert_eq!(office[0].code, "A", "办公类别不应被部分替换");
    assert_eq!(repo.list_by_class(BuildingClass::Residential).unwrap().len(), 3);
    println!("✓ 整体回滚");
}

#[tokio::test]
async fn test_missing_required_column() {
    println!("\n=== 测试：缺少必需列 ===");

    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = Arc::new(CostCatalogRepository::new(&db_path).unwrap());
    let importer = CatalogImporterImpl::with_parser(repo, Box::new(CsvParser));

    let csv = test_helpers::write_temp_file(".csv", "编码,名称\n01,土建\n").unwrap();
    let result = importer.import_catalog(csv.path(), None).await;
    assert!(matches!(result, Err(ImportError::MissingColumn(col)) if col == "building_class"));
}

#[tokio::test]
async fn test_batch_import_reports_each_file() {
    println!("\n=== 测试：批量导入 ===");

    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let (_repo, importer) = create_importer(&db_path);

    let good = test_helpers::write_temp_file(".csv", CATALOG_CSV).unwrap();
    let paths = vec![
        good.path().to_path_buf(),
        std::path::PathBuf::from("does_not_exist.csv"),
    ];

    let results = importer.batch_import(paths).await;
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].as_ref().unwrap_err().contains("does_not_exist.csv"));
    println!("✓ 成功 1 个，失败 1 个");
}

#[tokio::test]
async fn test_import_api_maps_file_errors() {
    println!("\n=== 测试：导入 API 错误映射 ===");

    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let api = ImportApi::new(Arc::new(CostCatalogRepository::new(&db_path).unwrap()));

    let missing = api.import_catalog("/tmp/__no_such_catalog__.csv", None).await;
    assert!(
        matches!(missing, Err(ApiError::InvalidInput(ref msg)) if msg.contains("__no_such_catalog__.csv")),
        "文件不存在应返回输入错误"
    );

    let pdf = test_helpers::write_temp_file(".pdf", "x").unwrap();
    let unsupported = api.import_catalog(pdf.path().to_str().unwrap(), None).await;
    assert!(matches!(unsupported, Err(ApiError::InvalidInput(ref msg)) if msg.contains("pdf")));

    let bad_class = api.import_catalog("whatever.csv", Some("船坞")).await;
    assert!(matches!(bad_class, Err(ApiError::InvalidInput(_))));

    let csv = test_helpers::write_temp_file(".csv", CATALOG_CSV).unwrap();
    let response = api
        .import_catalog(csv.path().to_str().unwrap(), None)
        .await
        .unwrap();
    assert_eq!(response.result.imported_rows, 4);
    assert!(!response.message.is_empty());
    println!("✓ 错误映射与成功响应正确");
}
