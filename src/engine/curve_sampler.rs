// ==========================================
// 建筑工作室 S 曲线引擎 - 周聚合 / 曲线采样引擎
// ==========================================
// 职责: 将日累加数组按 7 天分桶，生成计划进度 S 曲线
// 输入: 日累加数组 + 最早开始日 + 排期总天数
// 输出: 按周升序的采样点（本周计划 % + 累计 %）
// ==========================================
// 红线: 累计值单调不减，且封顶 100
// 红线: 周起始日超出可表示日期范围时停止采样
// ==========================================

use crate::domain::curve::{CurveSummary, DailyAllocation, WeeklyPoint};
use chrono::{Days, NaiveDate};
use tracing::{instrument, warn};

/// 默认尾部空周数
pub const DEFAULT_TRAILING_BUFFER_WEEKS: u32 = 4;

const DAYS_PER_WEEK: usize = 7;
const MAX_CUMULATIVE: f64 = 100.0;
const COMPLETION_EPS: f64 = 1e-9;

// ==========================================
// CurveSampler - 周聚合引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct CurveSampler {
    trailing_buffer_weeks: u32,
}

impl CurveSampler {
    pub fn new(trailing_buffer_weeks: u32) -> Self {
        Self {
            trailing_buffer_weeks,
        }
    }

    pub fn trailing_buffer_weeks(&self) -> u32 {
        self.trailing_buffer_weeks
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 生成周采样曲线
    ///
    /// # 参数
    /// - `daily_weights`: 日累加数组（下标为距 project_start 的天数）
    /// - `project_start`: 第 1 周第一天
    /// - `total_scheduled_days`: 排期总天数
    ///
    /// # 返回
    /// 共 ceil(total_scheduled_days / 7) + 尾部空周 个点；total_scheduled_days 为 0 时为空
    /// 起始日接近日期上限时，只返回可表示的周
    #[instrument(skip(self, daily_weights), fields(days = daily_weights.len()))]
    pub fn build_curve(
        &self,
        daily_weights: &[f64],
        project_start: NaiveDate,
        total_scheduled_days: usize,
    ) -> Vec<WeeklyPoint> {
        if total_scheduled_days == 0 {
            return Vec::new();
        }

        let active_weeks = (total_scheduled_days + DAYS_PER_WEEK - 1) / DAYS_PER_WEEK;
        let total_weeks = active_weeks + self.trailing_buffer_weeks as usize;

        let mut points = Vec::with_capacity(total_weeks);
        let mut cumulative = 0.0_f64;

        for w in 0..total_weeks {
            let from = w * DAYS_PER_WEEK;
            let Some(week_start) = project_start.checked_add_days(Days::new(from as u64)) else {
                warn!(
                    project_start = %project_start,
                    week = w + 1,
                    total_weeks,
                    "周起始日超出日期范围，停止采样"
                );
                break;
            };

            let planned: f64 = daily_weights
                .iter()
                .skip(from)
                .take(DAYS_PER_WEEK)
                .sum();

            cumulative = (cumulative + planned).min(MAX_CUMULATIVE);

            points.push(WeeklyPoint {
                week: (w + 1) as u32,
                week_start,
                date_label: week_start.format("%Y-%m-%d").to_string(),
                planned,
                cumulative,
            });
        }

        points
    }

    /// 由日分摊结果直接生成曲线；无进度数据时为空
    pub fn build_from_allocation(&self, allocation: &DailyAllocation) -> Vec<WeeklyPoint> {
        match allocation.project_start {
            Some(start) => self.build_curve(
                &allocation.daily_weights,
                start,
                allocation.total_scheduled_days,
            ),
            None => Vec::new(),
        }
    }

    /// 曲线摘要
    pub fn summarize(&self, points: &[WeeklyPoint], allocation: &DailyAllocation) -> CurveSummary {
        let final_cumulative = points.last().map_or(0.0, |p| p.cumulative);
        let completion = points
            .iter()
            .find(|p| p.cumulative >= final_cumulative - COMPLETION_EPS);

        CurveSummary {
            total_weeks: points.len() as u32,
            final_cumulative,
            completion_week: completion.map(|p| p.week),
            completion_date: completion.map(|p| p.week_start),
            scheduled_leaf_count: allocation.stats.scheduled_leaf_count,
            unscheduled_leaf_count: allocation.stats.unscheduled_leaf_count,
            unscheduled_weight: allocation.stats.unscheduled_weight,
            truncated_weight: allocation.stats.truncated_weight,
        }
    }
}

impl Default for CurveSampler {
    fn default() -> Self {
        Self::new(DEFAULT_TRAILING_BUFFER_WEEKS)
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::curve::SpreadStats;

    const EPS: f64 = 1e-9;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn test_single_leaf_weekly_buckets() {
        let daily = vec![4.0; 10];
        let points = CurveSampler::default().build_curve(&daily, start(), 10);

        // ceil(10/7) = 2 + 4 周尾部
        assert_eq!(points.len(), 6);
        assert!((points[0].planned - 28.0).abs() < EPS);
        assert!((points[1].planned - 12.0).abs() < EPS);
        assert!((points[1].cumulative - 40.0).abs() < EPS);
        assert!(points[2..].iter().all(|p| (p.cumulative - 40.0).abs() < EPS && p.planned == 0.0));

        assert_eq!(points[0].week, 1);
        assert_eq!(points[1].date_label, "2026-03-09");
        assert_eq!(points[5].week_start, NaiveDate::from_ymd_opt(2026, 4, 6).unwrap());
    }

    #[test]
    fn test_cumulative_is_capped() {
        let daily = vec![20.0; 7];
        let points = CurveSampler::new(1).build_curve(&daily, start(), 7);
        assert_eq!(points.len(), 2);
        assert!((points[0].planned - 140.0).abs() < EPS);
        assert_eq!(points[0].cumulative, 100.0);
        assert_eq!(points[1].cumulative, 100.0);
    }

    #[test]
    fn test_zero_days_is_empty() {
        assert!(CurveSampler::default().build_curve(&[], start(), 0).is_empty());
        let allocation = DailyAllocation::empty(SpreadStats::default());
        assert!(CurveSampler::default().build_from_allocation(&allocation).is_empty());
    }

    #[test]
    fn test_stops_at_last_representable_week() {
        let near_max = NaiveDate::MAX - Days::new(3);
        let points = CurveSampler::default().build_curve(&[50.0, 50.0], near_max, 2);

        // 第 2 周起始日已超出 NaiveDate::MAX
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].week_start, near_max);
        assert!((points[0].cumulative - 100.0).abs() < EPS);
    }

    #[test]
    fn test_summary_completion_week() {
        let mut daily = vec![0.0; 21];
        for slot in daily.iter_mut().take(14) {
            *slot = 5.0;
        }
        let allocation = DailyAllocation {
            daily_weights: daily,
            project_start: Some(start()),
            total_scheduled_days: 21,
            stats: SpreadStats {
                scheduled_leaf_count: 2,
                unscheduled_leaf_count: 1,
                unscheduled_weight: 30.0,
                skipped_leaf_count: 0,
                truncated_weight: 0.0,
            },
        };

        let sampler = CurveSampler::new(2);
        let points = sampler.build_from_allocation(&allocation);
        let summary = sampler.summarize(&points, &allocation);

        assert_eq!(summary.total_weeks, 5);
        assert!((summary.final_cumulative - 70.0).abs() < EPS);
        assert_eq!(summary.completion_week, Some(2));
        assert_eq!(summary.completion_date, Some(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()));
        assert_eq!(summary.unscheduled_leaf_count, 1);
    }
}
