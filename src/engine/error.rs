// ==========================================
// 建筑工作室 S 曲线引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 缺少进度数据/总造价为 0 等属于正常状态，不在此列
// ==========================================

use crate::domain::types::{CostBasisKind, CostMode};
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    // ===== 输入参数错误 =====
    #[error("项目面积无效: {0}（必须为非负有限数）")]
    InvalidProjectArea(f64),

    #[error("指标系数无效: {0}（必须为正有限数）")]
    InvalidMultiplier(f64),

    // ===== 造价口径错误 =====
    #[error("造价口径不一致: code={code}, mode={mode}, expected={expected}, actual={actual}")]
    CostBasisMismatch {
        code: String,
        mode: CostMode,
        expected: CostBasisKind,
        actual: CostBasisKind,
    },

    #[error("叶子造价为负: code={code}, cost={cost}")]
    NegativeLeafCost { code: String, cost: f64 },

    // ===== 树结构错误 =====
    #[error("编码重复: {0}")]
    DuplicateCode(String),

    #[error("上级编码不存在: code={code}, parent_code={parent_code}")]
    OrphanNode { code: String, parent_code: String },

    #[error("上级关系存在环: {0}")]
    ParentCycle(String),

    #[error("调整条目不存在: {0}")]
    UnknownAdjustmentTarget(String),

    #[error("清单所属条目不存在: {0}")]
    UnknownDetailParent(String),

    #[error("清单只能挂在叶子条目下: {0}")]
    DetailParentNotLeaf(String),

    #[error("造价模式不匹配: expected={expected}, actual={actual}")]
    UnexpectedTreeMode { expected: CostMode, actual: CostMode },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
