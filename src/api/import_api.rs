// ==========================================
// 建筑工作室 S 曲线引擎 - 指标库导入 API
// ==========================================
// 职责: 封装指标库文件导入（.csv/.xlsx/.xls）
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::catalog::CatalogImportResult;
use crate::domain::types::BuildingClass;
use crate::i18n::t_with_args;
use crate::importer::{CatalogImporter, CatalogImporterImpl};
use crate::repository::CostCatalogRepository;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    pub result: CatalogImportResult,
    /// 本地化的结果摘要
    pub message: String,
}

pub struct ImportApi {
    importer: CatalogImporterImpl,
}

impl ImportApi {
    pub fn new(catalog_repo: Arc<CostCatalogRepository>) -> Self {
        Self {
            importer: CatalogImporterImpl::new(catalog_repo),
        }
    }

    /// 导入指标库文件
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - building_class_override: 可选建筑类别（英文代码或中文名称）；指定后忽略类别列
    pub async fn import_catalog(
        &self,
        file_path: &str,
        building_class_override: Option<&str>,
    ) -> ApiResult<ImportApiResponse> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }

        let class_override = match building_class_override.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => Some(BuildingClass::from_db_str(raw).ok_or_else(|| {
                ApiError::InvalidInput(format!("无法识别的建筑类别: {}", raw))
            })?),
        };

        let result = self.importer.import_catalog(file_path, class_override).await?;

        let imported = result.imported_rows.to_string();
        let rejected = result.rejected_rows.len().to_string();
        let message = t_with_args(
            "import.completed",
            &[("imported", imported.as_str()), ("rejected", rejected.as_str())],
        );

        Ok(ImportApiResponse { result, message })
    }
}
