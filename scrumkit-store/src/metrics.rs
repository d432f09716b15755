//! Derived counters and progress percentages.
//!
//! Nothing here is stored: every figure is recomputed from live membership
//! on each call, so it cannot go stale after a move or delete.

use crate::ScrumStore;
use scrumkit_core::{EntityIdType, EntityType, ProjectId, ScrumError, ScrumResult, SprintId};

/// Integer percentage of `closed` over `total`, rounded half up.
///
/// Returns 0 when `total` is 0.
pub fn percent(closed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let closed = closed.min(total) as u128;
    let total = total as u128;
    ((closed * 200 + total) / (total * 2)) as u8
}

/// Sprint card and taskboard figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SprintStats {
    pub story_count: usize,
    pub closed_story_count: usize,
    pub total_points: u64,
    pub closed_points: u64,
    pub open_tasks: usize,
    pub closed_tasks: usize,
}

impl SprintStats {
    /// Closed stories over stories, as shown on the sprint card.
    pub fn story_progress(&self) -> u8 {
        percent(self.closed_story_count, self.story_count)
    }

    /// Closed tasks over tasks, as shown on the taskboard.
    pub fn task_progress(&self) -> u8 {
        percent(self.closed_tasks, self.open_tasks + self.closed_tasks)
    }

    pub fn task_count(&self) -> usize {
        self.open_tasks + self.closed_tasks
    }
}

/// Backlog header figures, computed over every story of the project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BacklogStats {
    pub story_count: usize,
    pub closed_story_count: usize,
    pub defined_points: u64,
    pub closed_points: u64,
    pub points_in_sprints: u64,
}

impl BacklogStats {
    pub fn progress(&self) -> u8 {
        percent(self.closed_story_count, self.story_count)
    }
}

/// Project dashboard figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectStats {
    pub backlog: BacklogStats,
    pub task_count: usize,
    pub closed_task_count: usize,
    pub open_issues: usize,
    pub closed_issues: usize,
    pub sprint_count: usize,
    pub open_sprint_count: usize,
}

impl ScrumStore {
    pub fn sprint_stats(&self, sprint_id: SprintId) -> ScrumResult<SprintStats> {
        if !self.sprints.contains_key(&sprint_id) {
            return Err(ScrumError::not_found(
                EntityType::Sprint,
                sprint_id.as_uuid(),
            ));
        }

        let mut stats = SprintStats::default();
        for story in self.user_stories_by_sprint(sprint_id) {
            stats.story_count += 1;
            stats.total_points += u64::from(story.total_points);
            if story.status.is_closed() {
                stats.closed_story_count += 1;
                stats.closed_points += u64::from(story.total_points);
            }
        }
        for task in self.tasks_by_sprint(sprint_id) {
            if task.status.is_closed() {
                stats.closed_tasks += 1;
            } else {
                stats.open_tasks += 1;
            }
        }
        Ok(stats)
    }

    /// Story-based progress of a sprint.
    pub fn sprint_story_progress(&self, sprint_id: SprintId) -> ScrumResult<u8> {
        Ok(self.sprint_stats(sprint_id)?.story_progress())
    }

    /// Task-based progress of a sprint.
    pub fn sprint_task_progress(&self, sprint_id: SprintId) -> ScrumResult<u8> {
        Ok(self.sprint_stats(sprint_id)?.task_progress())
    }

    pub fn backlog_stats(&self, project_id: ProjectId) -> ScrumResult<BacklogStats> {
        self.require_project(project_id)?;

        let mut stats = BacklogStats::default();
        for story in self.user_stories_for_project(project_id) {
            stats.story_count += 1;
            stats.defined_points += u64::from(story.total_points);
            if story.status.is_closed() {
                stats.closed_story_count += 1;
                stats.closed_points += u64::from(story.total_points);
            }
            if story.sprint_id.is_some() {
                stats.points_in_sprints += u64::from(story.total_points);
            }
        }
        Ok(stats)
    }

    pub fn project_stats(&self, project_id: ProjectId) -> ScrumResult<ProjectStats> {
        let backlog = self.backlog_stats(project_id)?;
        let tasks = self.tasks_for_project(project_id);
        let issues = self.issues_for_project(project_id);
        let sprints = self.sprints_for_project(project_id);

        let closed_task_count = tasks.iter().filter(|t| t.status.is_closed()).count();
        let closed_issues = issues.iter().filter(|i| i.status.is_closed()).count();
        let open_sprint_count = sprints.iter().filter(|s| !s.is_closed).count();

        Ok(ProjectStats {
            backlog,
            task_count: tasks.len(),
            closed_task_count,
            open_issues: issues.len() - closed_issues,
            closed_issues,
            sprint_count: sprints.len(),
            open_sprint_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_zero_total() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        assert_eq!(percent(2, 5), 40);
        assert_eq!(percent(10, 20), 50);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn test_sprint_stats_progress_is_independent() {
        let stats = SprintStats {
            story_count: 5,
            closed_story_count: 2,
            total_points: 0,
            closed_points: 0,
            open_tasks: 10,
            closed_tasks: 10,
        };
        assert_eq!(stats.story_progress(), 40);
        assert_eq!(stats.task_progress(), 50);
        assert_eq!(stats.task_count(), 20);
        assert_eq!(SprintStats::default().task_progress(), 0);
    }
}
