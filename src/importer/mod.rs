// ==========================================
// 建筑工作室 S 曲线引擎 - 导入层
// ==========================================
// 职责: 外部估算指标库导入
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

pub mod catalog_importer;
pub mod error;
pub mod field_mapper;
pub mod file_parser;

// 重导出核心类型
pub use catalog_importer::{CatalogImporter, CatalogImporterImpl};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{CatalogField, CatalogFieldMapper};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
