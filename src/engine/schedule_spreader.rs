// ==========================================
// 建筑工作室 S 曲线引擎 - 日分摊引擎
// ==========================================
// 职责: 把每个已排期叶子的权重平均分摊到工期内每一天
// 输入: 权重树 + 进度安排快照
// 输出: 以最早开始日为零点的日累加数组
// ==========================================
// 红线: 只有叶子参与分摊，分组节点上的安排忽略
// 红线: 同一天多个叶子叠加（并行作业同时贡献进度）
// 红线: 超出分摊上限的天数直接丢弃，不扩容
// ==========================================

use crate::domain::curve::{DailyAllocation, SpreadStats};
use crate::domain::schedule::ScheduleAssignmentStore;
use crate::domain::weighted::{leaves, WeightedNode};
use chrono::NaiveDate;
use tracing::{debug, instrument};

/// 默认分摊上限（天），约两年
pub const DEFAULT_HORIZON_DAYS: usize = 730;

// ==========================================
// DailyAllocationSpreader - 日分摊引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct DailyAllocationSpreader {
    horizon_days: usize,
}

impl DailyAllocationSpreader {
    pub fn new(horizon_days: usize) -> Self {
        Self { horizon_days }
    }

    pub fn horizon_days(&self) -> usize {
        self.horizon_days
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 分摊叶子权重
    ///
    /// # 参数
    /// - `nodes`: 权重树
    /// - `store`: 进度安排（以编码查询）
    ///
    /// # 返回
    /// - 有完整安排的叶子时: 日累加数组 + 最早开始日
    /// - 否则: 空数组 + project_start = None（正常状态，不是错误）
    #[instrument(skip(self, nodes, store), fields(horizon_days = self.horizon_days))]
    pub fn spread_leaves<S: ScheduleAssignmentStore + ?Sized>(
        &self,
        nodes: &[WeightedNode],
        store: &S,
    ) -> DailyAllocation {
        let mut stats = SpreadStats::default();

        // 1. 叶子与其完整安排
        let mut scheduled: Vec<(&WeightedNode, NaiveDate, u32)> = Vec::new();
        for leaf in leaves(nodes) {
            match store.entry(&leaf.code).and_then(|e| e.window()) {
                Some((start, days)) => scheduled.push((leaf, start, days)),
                None => {
                    stats.unscheduled_leaf_count += 1;
                    stats.unscheduled_weight += leaf.weight;
                }
            }
        }
        stats.scheduled_leaf_count = scheduled.len();

        // 2. 最早开始日
        let project_start = match scheduled.iter().map(|(_, start, _)| *start).min() {
            Some(start) => start,
            None => {
                debug!("无完整进度安排");
                return DailyAllocation::empty(stats);
            }
        };

        // 3. 分摊
        let mut daily_weights = vec![0.0_f64; self.horizon_days];
        let mut total_scheduled_days = 0_usize;

        for (leaf, start, days) in scheduled {
            let start_day = (start - project_start).num_days();
            if start_day < 0 {
                stats.skipped_leaf_count += 1;
                continue;
            }
            let start_day = start_day as usize;
            let end_day = start_day.saturating_add(days as usize);
            total_scheduled_days = total_scheduled_days.max(end_day.min(self.horizon_days));

            if leaf.weight <= 0.0 {
                stats.skipped_leaf_count += 1;
                continue;
            }

            // 只遍历上限内的天数，上限外整体计入截断
            let per_day = leaf.weight / f64::from(days);
            let kept_end = end_day.min(self.horizon_days);
            if start_day < kept_end {
                for slot in &mut daily_weights[start_day..kept_end] {
                    *slot += per_day;
                }
            }
            let dropped_days = end_day - kept_end.max(start_day);
            if dropped_days > 0 {
                stats.truncated_weight += per_day * dropped_days as f64;
            }
        }

        daily_weights.truncate(total_scheduled_days);

        debug!(
            project_start = %project_start,
            total_scheduled_days,
            scheduled = stats.scheduled_leaf_count,
            unscheduled = stats.unscheduled_leaf_count,
            "日分摊完成"
        );

        DailyAllocation {
            daily_weights,
            project_start: Some(project_start),
            total_scheduled_days,
            stats,
        }
    }
}

impl Default for DailyAllocationSpreader {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON_DAYS)
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::ScheduleEntry;
    use std::collections::HashMap;

    const EPS: f64 = 1e-9;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn leaf(code: &str, weight: f64) -> WeightedNode {
        WeightedNode {
            code: code.to_string(),
            title: code.to_string(),
            cost: weight,
            weight,
            schedule: None,
            children: Vec::new(),
        }
    }

    fn group(code: &str, children: Vec<WeightedNode>) -> WeightedNode {
        let weight = children.iter().map(|c| c.weight).sum();
        WeightedNode {
            code: code.to_string(),
            title: code.to_string(),
            cost: weight,
            weight,
            schedule: None,
            children,
        }
    }

    #[test]
    fn test_no_schedule_returns_empty() {
        let nodes = vec![leaf("A", 60.0), leaf("B", 40.0)];
        let store: HashMap<String, ScheduleEntry> = HashMap::new();

        let allocation = DailyAllocationSpreader::default().spread_leaves(&nodes, &store);
        assert!(allocation.project_start.is_none());
        assert!(allocation.daily_weights.is_empty());
        assert_eq!(allocation.stats.unscheduled_leaf_count, 2);
        assert!((allocation.stats.unscheduled_weight - 100.0).abs() < EPS);
    }

    #[test]
    fn test_single_leaf_spreads_evenly() {
        let nodes = vec![leaf("A", 40.0), leaf("B", 60.0)];
        let mut store = HashMap::new();
        store.insert("A".to_string(), ScheduleEntry::new(d(2026, 3, 2), 10));

        let allocation = DailyAllocationSpreader::default().spread_leaves(&nodes, &store);
        assert_eq!(allocation.project_start, Some(d(2026, 3, 2)));
        assert_eq!(allocation.total_scheduled_days, 10);
        assert_eq!(allocation.daily_weights.len(), 10);
        assert!(allocation.daily_weights.iter().all(|w| (w - 4.0).abs() < EPS));
        assert_eq!(allocation.stats.unscheduled_leaf_count, 1);
    }

    #[test]
    fn test_overlapping_leaves_accumulate() {
        let nodes = vec![leaf("A", 10.0), leaf("B", 6.0)];
        let mut store = HashMap::new();
        store.insert("A".to_string(), ScheduleEntry::new(d(2026, 3, 2), 5)); // 2.0/天
        store.insert("B".to_string(), ScheduleEntry::new(d(2026, 3, 4), 3)); // 2.0/天

        let allocation = DailyAllocationSpreader::default().spread_leaves(&nodes, &store);
        assert!((allocation.daily_weights[1] - 2.0).abs() < EPS);
        assert!((allocation.daily_weights[2] - 4.0).abs() < EPS);
        assert!((allocation.daily_weights[4] - 4.0).abs() < EPS);
        assert_eq!(allocation.total_scheduled_days, 5);
    }

    #[test]
    fn test_group_schedule_is_ignored() {
        let nodes = vec![group("G", vec![leaf("G.1", 50.0), leaf("G.2", 50.0)])];
        let mut store = HashMap::new();
        store.insert("G".to_string(), ScheduleEntry::new(d(2026, 1, 1), 30));

        let allocation = DailyAllocationSpreader::default().spread_leaves(&nodes, &store);
        assert!(allocation.project_start.is_none());
        assert_eq!(allocation.stats.unscheduled_leaf_count, 2);
    }

    #[test]
    fn test_zero_duration_and_zero_weight_contribute_nothing() {
        let nodes = vec![leaf("A", 30.0), leaf("B", 0.0), leaf("C", 70.0)];
        let mut store = HashMap::new();
        store.insert("A".to_string(), ScheduleEntry::new(d(2026, 1, 5), 0));
        store.insert("B".to_string(), ScheduleEntry::new(d(2026, 1, 5), 4));
        store.insert("C".to_string(), ScheduleEntry::new(d(2026, 1, 6), 7));

        let allocation = DailyAllocationSpreader::default().spread_leaves(&nodes, &store);
        assert_eq!(allocation.project_start, Some(d(2026, 1, 5)));
        assert!((allocation.daily_weights[0]).abs() < EPS);
        assert!((allocation.allocated_weight() - 70.0).abs() < 1e-6);
        assert_eq!(allocation.stats.skipped_leaf_count, 1);
        assert_eq!(allocation.stats.unscheduled_leaf_count, 1);
        assert_eq!(allocation.total_scheduled_days, 8);
    }

    #[test]
    fn test_horizon_truncates_tail() {
        let nodes = vec![leaf("A", 20.0)];
        let mut store = HashMap::new();
        store.insert("A".to_string(), ScheduleEntry::new(d(2026, 1, 1), 20));

        let allocation = DailyAllocationSpreader::new(15).spread_leaves(&nodes, &store);
        assert_eq!(allocation.daily_weights.len(), 15);
        assert_eq!(allocation.total_scheduled_days, 15);
        assert!((allocation.allocated_weight() - 15.0).abs() < 1e-9);
        assert!((allocation.stats.truncated_weight - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_duration_truncates_in_one_step() {
        let nodes = vec![leaf("A", 100.0), leaf("B", 0.0)];
        let mut store = HashMap::new();
        store.insert("A".to_string(), ScheduleEntry::new(d(2026, 1, 1), u32::MAX));

        let allocation = DailyAllocationSpreader::default().spread_leaves(&nodes, &store);
        let per_day = 100.0 / f64::from(u32::MAX);
        assert_eq!(allocation.total_scheduled_days, DEFAULT_HORIZON_DAYS);
        assert!((allocation.allocated_weight() - per_day * 730.0).abs() < 1e-12);
        let expected = per_day * (f64::from(u32::MAX) - 730.0);
        assert!((allocation.stats.truncated_weight - expected).abs() < 1e-9);
    }

    #[test]
    fn test_start_beyond_horizon_is_fully_truncated() {
        let nodes = vec![leaf("A", 60.0), leaf("B", 40.0)];
        let mut store = HashMap::new();
        store.insert("A".to_string(), ScheduleEntry::new(d(2026, 1, 1), 10));
        store.insert("B".to_string(), ScheduleEntry::new(d(2026, 3, 1), 8));

        let allocation = DailyAllocationSpreader::new(30).spread_leaves(&nodes, &store);
        assert!((allocation.allocated_weight() - 60.0).abs() < 1e-9);
        assert!((allocation.stats.truncated_weight - 40.0).abs() < 1e-9);
        assert_eq!(allocation.total_scheduled_days, 30);
    }
}
