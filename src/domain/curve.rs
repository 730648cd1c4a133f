// ==========================================
// 建筑工作室 S 曲线引擎 - 计划进度曲线领域模型
// ==========================================
// 红线: cumulative 单调不减且不超过 100
// ==========================================

use crate::domain::types::CostMode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// SpreadStats - 日分摊统计
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SpreadStats {
    pub scheduled_leaf_count: usize,   // 有完整安排的叶子数
    pub unscheduled_leaf_count: usize, // 无完整安排的叶子数
    pub unscheduled_weight: f64,       // 未安排叶子的权重合计
    pub skipped_leaf_count: usize,     // 权重 ≤ 0 或早于起点而跳过的叶子数
    pub truncated_weight: f64,         // 超出分摊上限被丢弃的权重
}

// ==========================================
// DailyAllocation - 日分摊累加器
// ==========================================
// 每次投影重新构建，聚合后丢弃
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAllocation {
    pub daily_weights: Vec<f64>,          // 下标 = 距 project_start 的天数
    pub project_start: Option<NaiveDate>, // 最早开始日期；None 表示无进度数据
    pub total_scheduled_days: usize,      // 最晚结束日（不含），受分摊上限约束
    pub stats: SpreadStats,
}

impl DailyAllocation {
    /// 无进度数据
    pub fn empty(stats: SpreadStats) -> Self {
        Self {
            daily_weights: Vec::new(),
            project_start: None,
            total_scheduled_days: 0,
            stats,
        }
    }

    /// 已分摊的权重合计
    pub fn allocated_weight(&self) -> f64 {
        self.daily_weights.iter().sum()
    }
}

// ==========================================
// WeeklyPoint - S 曲线采样点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPoint {
    pub week: u32,             // 第几周（从 1 开始）
    pub week_start: NaiveDate, // 本周第一天
    pub date_label: String,    // 本周第一天（YYYY-MM-DD）
    pub planned: f64,          // 本周计划完成 %
    pub cumulative: f64,       // 累计计划完成 %（≤ 100）
}

// ==========================================
// CurveSummary - 曲线摘要
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CurveSummary {
    pub total_weeks: u32,
    pub final_cumulative: f64,
    pub completion_week: Option<u32>,        // 首次达到最终累计值的周
    pub completion_date: Option<NaiveDate>,  // 该周第一天
    pub scheduled_leaf_count: usize,
    pub unscheduled_leaf_count: usize,
    pub unscheduled_weight: f64,
    pub truncated_weight: f64,
}

// ==========================================
// CurveProjection - 一次完整投影的结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveProjection {
    pub cost_mode: CostMode,
    pub total_cost: f64,
    pub project_start: Option<NaiveDate>,
    pub points: Vec<WeeklyPoint>,
    pub summary: CurveSummary,
}

impl CurveProjection {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
