// ==========================================
// 建筑工作室 S 曲线引擎 - 进度安排 API
// ==========================================
// 职责: 维护叶子项的开始日期与工期
// 校验: 编码必须是项目当前造价树的叶子；工期在 0 ~ 36500 天之间
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::tree_source::CostTreeSource;
use crate::domain::schedule::ScheduleAssignment;
use crate::i18n::t_with_args;
use crate::perf::PerfGuard;
use crate::repository::{ProjectRepository, ScheduleAssignmentRepository};

/// 单项工期上限（天），约 100 年
pub const MAX_DURATION_DAYS: u32 = 36_500;

pub struct ScheduleApi {
    project_repo: Arc<ProjectRepository>,
    schedule_repo: Arc<ScheduleAssignmentRepository>,
    tree_source: Arc<CostTreeSource>,
}

impl ScheduleApi {
    pub fn new(
        project_repo: Arc<ProjectRepository>,
        schedule_repo: Arc<ScheduleAssignmentRepository>,
        tree_source: Arc<CostTreeSource>,
    ) -> Self {
        Self {
            project_repo,
            schedule_repo,
            tree_source,
        }
    }

    /// 设置叶子项的进度安排
    ///
    /// # 参数
    /// - start: 开始日期（可为空，表示暂未排期）
    /// - duration_days: 工期（天，可为空；0 表示不参与分摊）
    pub fn upsert_assignment(
        &self,
        project_id: &str,
        code: &str,
        start: Option<NaiveDate>,
        duration_days: Option<i64>,
    ) -> ApiResult<ScheduleAssignment> {
        let _perf = PerfGuard::for_project("upsert_assignment", project_id);

        let duration_days = match duration_days {
            None => None,
            Some(d) => {
                let value = d.to_string();
                let days = u32::try_from(d).map_err(|_| {
                    ApiError::InvalidInput(t_with_args(
                        "schedule.invalid_duration",
                        &[("value", value.as_str())],
                    ))
                })?;
                if days > MAX_DURATION_DAYS {
                    let max = MAX_DURATION_DAYS.to_string();
                    return Err(ApiError::InvalidInput(t_with_args(
                        "schedule.duration_too_long",
                        &[("value", value.as_str()), ("max", max.as_str())],
                    )));
                }
                Some(days)
            }
        };

        let project = self.project_repo.get(project_id)?;
        let tree = self.tree_source.load(&project, project.cost_mode)?;
        let is_leaf = tree.find(code).map_or(false, |node| node.is_leaf());
        if !is_leaf {
            return Err(ApiError::InvalidInput(t_with_args(
                "schedule.not_a_leaf",
                &[("code", code)],
            )));
        }

        let assignment = ScheduleAssignment {
            project_id: project_id.to_string(),
            code: code.to_string(),
            start,
            duration_days,
            updated_at: Utc::now(),
        };
        self.schedule_repo.upsert(&assignment)?;

        info!(
            project_id,
            code,
            start = ?assignment.start,
            duration_days = ?assignment.duration_days,
            "进度安排已更新"
        );
        Ok(assignment)
    }

    /// 清除进度安排
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 原本不存在
    pub fn clear_assignment(&self, project_id: &str, code: &str) -> ApiResult<bool> {
        let _perf = PerfGuard::for_project("clear_assignment", project_id);
        let affected = self.schedule_repo.delete(project_id, code)?;
        Ok(affected > 0)
    }

    /// 项目的全部进度安排
    pub fn list_assignments(&self, project_id: &str) -> ApiResult<Vec<ScheduleAssignment>> {
        self.project_repo.get(project_id)?;
        Ok(self.schedule_repo.list_by_project(project_id)?)
    }
}
