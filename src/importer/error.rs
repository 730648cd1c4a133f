// ==========================================
// 建筑工作室 S 曲线引擎 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("缺少必需列: {0}")]
    MissingColumn(String),

    // ===== 数据映射错误 =====
    #[error("字段映射失败 (行 {row}): {message}")]
    FieldMappingError { row: usize, message: String },

    #[error("类型转换失败 (行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    // ===== 结构错误 =====
    #[error("指标库结构错误 (类别 {building_class}): {message}")]
    CatalogStructureError {
        building_class: String,
        message: String,
    },

    // ===== 数据库错误 =====
    #[error("数据库写入失败: {0}")]
    DatabaseError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::DatabaseError(err.to_string())
    }
}

impl ImportError {
    /// 行级错误的行号；文件级与结构错误返回 None
    pub fn row(&self) -> Option<usize> {
        match self {
            ImportError::FieldMappingError { row, .. }
            | ImportError::TypeConversionError { row, .. } => Some(*row),
            _ => None,
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_level_errors() {
        let err = ImportError::TypeConversionError {
            row: 3,
            field: "rate_per_area".to_string(),
            message: "abc".to_string(),
        };
        assert_eq!(err.row(), Some(3));
        assert!(err.to_string().contains("rate_per_area"));

        let structure = ImportError::CatalogStructureError {
            building_class: "OFFICE".to_string(),
            message: "重复编码".to_string(),
        };
        assert_eq!(structure.row(), None);
        assert_eq!(ImportError::MissingColumn("code".to_string()).row(), None);
    }
}
