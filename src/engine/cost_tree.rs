// ==========================================
// 建筑工作室 S 曲线引擎 - 造价树构建引擎
// ==========================================
// 职责: 由指标库构建三种模式的造价树
// - 估算 (Ballpark): 指标库 × 系数，叶子为单方造价
// - 概算 (Estimates): 估算 + 项目调整 → 统一调整系数 → 叶子为总价
// - 预算 (Detail): 概算叶子细化为清单项（数量 × 单价）
// ==========================================
// 红线: 同一棵树的叶子口径一致
// ==========================================

mod assemble;
mod builder;

#[cfg(test)]
mod tests;

pub use builder::CostTreeBuilder;
