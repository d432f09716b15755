//! Mutation layer
//!
//! Every operation validates first and writes second: a rejected call leaves
//! the store, the ref counters and the activity log untouched.

pub mod attachments;
pub mod issues;
pub mod projects;
pub mod sprints;
pub mod stories;
pub mod tags;
pub mod tasks;
pub mod wiki;

use crate::ScrumStore;
use chrono::NaiveDate;
use scrumkit_core::{
    checked_total_points, EntityIdType, EntityType, ProjectId, ScrumError, ScrumResult, SprintDatePolicy, SprintId,
    StoryPoint, TaskId, UserStoryId, ValidationError,
};
use std::collections::HashSet;

/// Trimmed copy of a required text field.
pub(crate) fn require_text(value: &str, field: &str) -> ScrumResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ScrumError::missing(field));
    }
    Ok(trimmed.to_string())
}

/// Orders are persisted as JSON numbers, which cannot hold NaN or infinity.
pub(crate) fn require_finite(value: f64, field: &str) -> ScrumResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScrumError::invalid(
            field,
            format!("{} is not a finite number", value),
        ))
    }
}

pub(crate) fn constraint(constraint: &str, reason: impl Into<String>) -> ScrumError {
    ScrumError::Validation(ValidationError::ConstraintViolation {
        constraint: constraint.to_string(),
        reason: reason.into(),
    })
}

impl ScrumStore {
    /// The sprint must exist and belong to `project`.
    pub(crate) fn check_sprint_in_project(
        &self,
        sprint_id: SprintId,
        project: ProjectId,
    ) -> ScrumResult<()> {
        let sprint = self.require_sprint(sprint_id)?;
        if sprint.project_id != project {
            return Err(ScrumError::invalid(
                "sprint_id",
                format!("sprint {} belongs to another project", sprint_id),
            ));
        }
        Ok(())
    }

    /// The story must exist and belong to `project`.
    pub(crate) fn check_story_in_project(
        &self,
        story_id: UserStoryId,
        project: ProjectId,
    ) -> ScrumResult<()> {
        let story = self.require_user_story(story_id)?;
        if story.project_id != project {
            return Err(ScrumError::invalid(
                "user_story_id",
                format!("user story {} belongs to another project", story_id),
            ));
        }
        Ok(())
    }

    /// Each estimate must name a category of the project, at most once.
    pub(crate) fn check_points(&self, project: ProjectId, points: &[StoryPoint]) -> ScrumResult<()> {
        let project = self.require_project(project)?;
        let mut seen = HashSet::new();
        for point in points {
            if !project.has_category(point.category) {
                return Err(ScrumError::invalid(
                    "points",
                    format!("unknown point category {}", point.category),
                ));
            }
            if !seen.insert(point.category) {
                return Err(ScrumError::invalid(
                    "points",
                    format!("point category {} estimated twice", point.category),
                ));
            }
        }
        if checked_total_points(points).is_none() {
            return Err(ScrumError::invalid(
                "points",
                format!("point total exceeds {}", u32::MAX),
            ));
        }
        Ok(())
    }

    /// Apply the configured sprint date policy to a candidate range.
    pub(crate) fn check_sprint_dates(
        &self,
        project: ProjectId,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<SprintId>,
    ) -> ScrumResult<()> {
        let Some(reason) = self.sprint_date_conflict(project, start, end, exclude) else {
            return Ok(());
        };
        match self.config.sprint_date_policy {
            SprintDatePolicy::Enforced => Err(constraint("sprint_dates", reason)),
            SprintDatePolicy::Advisory => {
                tracing::warn!(
                    project_id = %project,
                    %start,
                    %end,
                    reason = %reason,
                    "sprint dates accepted despite conflict"
                );
                Ok(())
            }
        }
    }

    // === Mirror maintenance ===

    /// Keep `Sprint::user_story_ids` in step with a story's sprint change.
    pub(crate) fn mirror_story_sprint(
        &mut self,
        story: UserStoryId,
        old: Option<SprintId>,
        new: Option<SprintId>,
    ) {
        if old == new {
            return;
        }
        if let Some(sprint) = old.and_then(|id| self.sprints.get_mut(&id)) {
            sprint.user_story_ids.retain(|id| *id != story);
        }
        if let Some(sprint) = new.and_then(|id| self.sprints.get_mut(&id)) {
            if !sprint.user_story_ids.contains(&story) {
                sprint.user_story_ids.push(story);
            }
        }
    }

    /// Keep `UserStory::task_ids` in step with a task's story change.
    pub(crate) fn mirror_task_story(
        &mut self,
        task: TaskId,
        old: Option<UserStoryId>,
        new: Option<UserStoryId>,
    ) {
        if old == new {
            return;
        }
        if let Some(story) = old.and_then(|id| self.user_stories.get_mut(&id)) {
            story.task_ids.retain(|id| *id != task);
        }
        if let Some(story) = new.and_then(|id| self.user_stories.get_mut(&id)) {
            if !story.task_ids.contains(&task) {
                story.task_ids.push(task);
            }
        }
    }

    /// Not-found error for an entity type and typed id.
    pub(crate) fn missing_entity<I: EntityIdType>(entity_type: EntityType, id: I) -> ScrumError {
        ScrumError::not_found(entity_type, id.as_uuid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("  Login ", "title").unwrap(), "Login");
        assert_eq!(require_text("   ", "title"), Err(ScrumError::missing("title")));
    }

    #[test]
    fn test_constraint_error_shape() {
        let err = constraint("sprint_dates", "overlap");
        assert!(matches!(
            err,
            ScrumError::Validation(ValidationError::ConstraintViolation { constraint, .. })
                if constraint == "sprint_dates"
        ));
    }
}
