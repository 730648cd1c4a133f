// ==========================================
// 建筑工作室 S 曲线引擎 - API层错误类型
// ==========================================
// 职责: 将仓储/引擎/导入错误转换为面向用户的错误消息
// ==========================================

use crate::engine::error::EngineError;
use crate::i18n::t_with_args;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 造价树无法投影（模式不符、结构错误等）
    #[error("造价数据错误: {0}")]
    CostModelError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidProjectArea(_) | EngineError::InvalidMultiplier(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            EngineError::UnexpectedTreeMode { .. } => ApiError::InternalError(err.to_string()),
            _ => ApiError::CostModelError(err.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换（文件类错误使用本地化文案）
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => ApiError::InvalidInput(t_with_args(
                "import.file_not_found",
                &[("path", path.as_str())],
            )),
            ImportError::UnsupportedFormat(ext) => ApiError::InvalidInput(t_with_args(
                "import.unsupported_format",
                &[("ext", ext.as_str())],
            )),
            ImportError::DatabaseError(msg) => ApiError::DatabaseError(msg),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
