// ==========================================
// 建筑工作室 S 曲线引擎 - 指标库导入器
// ==========================================
// 流程: 解析 → 表头校验 → 字段映射（坏行拒绝）→ 按类别分组
//       → 结构校验（重复/孤儿/循环）→ 按类别整体替换落库
// ==========================================
// 红线: 结构校验失败时任何类别都不落库
// ==========================================

use crate::domain::catalog::{CatalogEntry, CatalogImportResult, RejectedRow};
use crate::domain::types::BuildingClass;
use crate::engine::cost_tree::CostTreeBuilder;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::CatalogFieldMapper;
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use crate::repository::CostCatalogRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// CatalogImporter Trait
// ==========================================
// 实现者: CatalogImporterImpl
#[async_trait]
pub trait CatalogImporter: Send + Sync {
    /// 导入单个指标库文件（.csv/.xlsx/.xls）
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - building_class_override: 指定后所有行归入该类别，忽略类别列
    async fn import_catalog<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        building_class_override: Option<BuildingClass>,
    ) -> ImportResult<CatalogImportResult>;

    /// 批量导入多个文件（并发执行，单个文件失败不影响其他文件）
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<Result<CatalogImportResult, String>>;
}

// ==========================================
// CatalogImporterImpl
// ==========================================
pub struct CatalogImporterImpl {
    catalog_repo: Arc<CostCatalogRepository>,
    file_parser: Box<dyn FileParser>,
    field_mapper: CatalogFieldMapper,
    tree_builder: CostTreeBuilder,
}

impl CatalogImporterImpl {
    pub fn new(catalog_repo: Arc<CostCatalogRepository>) -> Self {
        Self::with_parser(catalog_repo, Box::new(UniversalFileParser))
    }

    pub fn with_parser(catalog_repo: Arc<CostCatalogRepository>, file_parser: Box<dyn FileParser>) -> Self {
        Self {
            catalog_repo,
            file_parser,
            field_mapper: CatalogFieldMapper,
            tree_builder: CostTreeBuilder::new(),
        }
    }

    /// 按类别分组（保持首次出现的顺序）
    fn group_by_class(entries: Vec<CatalogEntry>) -> Vec<(BuildingClass, Vec<CatalogEntry>)> {
        let mut groups: Vec<(BuildingClass, Vec<CatalogEntry>)> = Vec::new();
        for entry in entries {
            match groups.iter_mut().find(|(class, _)| *class == entry.building_class) {
                Some((_, list)) => list.push(entry),
                None => groups.push((entry.building_class, vec![entry])),
            }
        }
        groups
    }

    fn import_sync(
        &self,
        file_path: &Path,
        building_class_override: Option<BuildingClass>,
    ) -> ImportResult<CatalogImportResult> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.display().to_string());

        info!(batch_id = %batch_id, file = %file_name, "开始导入指标库");

        // 1. 解析
        let records = self.file_parser.parse_to_raw_records(file_path)?;
        if let Some(first) = records.first() {
            self.field_mapper
                .check_headers(first.fields.keys(), building_class_override)?;
        }

        // 2. 映射（坏行记录后跳过）
        let mut entries = Vec::with_capacity(records.len());
        let mut rejected_rows = Vec::new();
        for record in &records {
            match self.field_mapper.map_to_entry(record, building_class_override) {
                Ok(entry) => entries.push(entry),
                Err(e) if e.row().is_none() => return Err(e),
                Err(e) => {
                    warn!(row = record.row, error = %e, "拒绝导入行");
                    rejected_rows.push(RejectedRow {
                        row: record.row,
                        reason: e.to_string(),
                    });
                }
            }
        }
        let imported_rows = entries.len();

        // 3. 结构校验（全部类别通过后才落库）
        let groups = Self::group_by_class(entries);
        for (class, list) in &groups {
            self.tree_builder
                .build_ballpark(list, *class, 1.0)
                .map_err(|e| ImportError::CatalogStructureError {
                    building_class: class.to_string(),
                    message: e.to_string(),
                })?;
        }

        // 4. 落库（全部类别同一事务）
        let written = self.catalog_repo.replace_classes(&groups)?;
        for ((class, _), rows) in groups.iter().zip(&written) {
            info!(building_class = %class, rows, "指标库类别已替换");
        }

        let result = CatalogImportResult {
            batch_id,
            file_name,
            total_rows: records.len(),
            imported_rows,
            rejected_rows,
            building_classes: groups.iter().map(|(class, _)| *class).collect(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            imported_at: Utc::now(),
        };

        info!(
            batch_id = %result.batch_id,
            total = result.total_rows,
            imported = result.imported_rows,
            rejected = result.rejected_rows.len(),
            elapsed_ms = result.elapsed_ms,
            "指标库导入完成"
        );

        Ok(result)
    }
}

#[async_trait]
impl CatalogImporter for CatalogImporterImpl {
    #[instrument(skip(self, file_path))]
    async fn import_catalog<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        building_class_override: Option<BuildingClass>,
    ) -> ImportResult<CatalogImportResult> {
        self.import_sync(file_path.as_ref(), building_class_override)
    }

    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<Result<CatalogImportResult, String>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入指标库");

        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().display().to_string();
            async move {
                match self.import_catalog(path, None).await {
                    Ok(result) => Ok(result),
                    Err(e) => {
                        error!(file = %path_str, error = %e, "文件导入失败");
                        Err(format!("文件 {} 导入失败: {}", path_str, e))
                    }
                }
            }
        });

        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}
