// ==========================================
// 建筑工作室 S 曲线引擎 - 进度安排领域模型
// ==========================================
// 进度安排由计划员维护，引擎只读取快照
// ==========================================

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ==========================================
// ScheduleEntry - 单个节点的开始日期与工期
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScheduleEntry {
    pub start: Option<NaiveDate>,
    pub duration_days: Option<u32>,
}

impl ScheduleEntry {
    pub fn new(start: NaiveDate, duration_days: u32) -> Self {
        Self {
            start: Some(start),
            duration_days: Some(duration_days),
        }
    }

    /// 开始日期已填且工期 > 0
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.duration_days.map_or(false, |d| d > 0)
    }

    /// (开始日期, 工期)，仅完整安排返回
    pub fn window(&self) -> Option<(NaiveDate, u32)> {
        match (self.start, self.duration_days) {
            (Some(start), Some(days)) if days > 0 => Some((start, days)),
            _ => None,
        }
    }

    /// 最后一个施工日（含）；超出可表示日期范围时为 None
    pub fn finish(&self) -> Option<NaiveDate> {
        self.window()
            .and_then(|(start, days)| start.checked_add_days(Days::new(u64::from(days) - 1)))
    }
}

// ==========================================
// ScheduleAssignment - 持久化的进度安排记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    pub project_id: String,
    pub code: String,
    pub start: Option<NaiveDate>,
    pub duration_days: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleAssignment {
    pub fn entry(&self) -> ScheduleEntry {
        ScheduleEntry {
            start: self.start,
            duration_days: self.duration_days,
        }
    }
}

// ==========================================
// Trait: ScheduleAssignmentStore
// ==========================================
// 用途: 以编码读取进度安排（只读）
// 实现者: HashMap / BTreeMap 快照
pub trait ScheduleAssignmentStore {
    fn entry(&self, code: &str) -> Option<ScheduleEntry>;
}

impl ScheduleAssignmentStore for HashMap<String, ScheduleEntry> {
    fn entry(&self, code: &str) -> Option<ScheduleEntry> {
        self.get(code).copied()
    }
}

impl ScheduleAssignmentStore for BTreeMap<String, ScheduleEntry> {
    fn entry(&self, code: &str) -> Option<ScheduleEntry> {
        self.get(code).copied()
    }
}
