//! Sprint mutations.

use super::require_text;
use crate::activity::describe;
use crate::input::{NewSprint, SprintUpdate};
use crate::ScrumStore;
use scrumkit_core::{
    ActivityDetail, ActivityKind, ActivityTarget, EntityIdType, EntityType, ScrumError,
    ScrumResult, Sprint, SprintId,
};
use std::collections::HashSet;
use tracing::debug;

fn sprint_target(sprint: &Sprint) -> ActivityTarget {
    ActivityTarget {
        entity_type: EntityType::Sprint,
        entity_id: sprint.sprint_id.as_uuid(),
        reference: None,
        title: sprint.name.clone(),
    }
}

impl ScrumStore {
    /// Create a sprint and move the listed stories into it.
    pub fn create_sprint(&mut self, input: NewSprint) -> ScrumResult<SprintId> {
        let name = require_text(&input.name, "name")?;
        let project_name = self.require_project(input.project_id)?.name.clone();
        self.check_sprint_dates(input.project_id, input.start_date, input.end_date, None)?;

        let mut seen = HashSet::new();
        for story_id in &input.user_story_ids {
            self.check_story_in_project(*story_id, input.project_id)?;
            if !seen.insert(*story_id) {
                return Err(ScrumError::invalid(
                    "user_story_ids",
                    format!("user story {} listed twice", story_id),
                ));
            }
        }

        let order = input.order.unwrap_or_else(|| {
            self.sprints
                .values()
                .filter(|s| s.project_id == input.project_id)
                .count() as u32
                + 1
        });
        let sprint_id = SprintId::now_v7();
        let now = self.clock.now();

        let sprint = Sprint {
            sprint_id,
            project_id: input.project_id,
            name,
            start_date: input.start_date,
            end_date: input.end_date,
            user_story_ids: Vec::new(),
            is_closed: false,
            created_at: now,
            updated_at: now,
            order,
        };
        let target = sprint_target(&sprint);
        self.sprints.insert(sprint_id, sprint);

        for story_id in &input.user_story_ids {
            let previous = match self.user_stories.get_mut(story_id) {
                Some(story) => {
                    let previous = story.sprint_id;
                    story.sprint_id = Some(sprint_id);
                    story.updated_at = now;
                    previous
                }
                None => continue,
            };
            self.mirror_story_sprint(*story_id, previous, Some(sprint_id));
        }

        let description = describe::sprint_created(&target.title, &project_name);
        let detail = ActivityDetail {
            sprint_name: Some(target.title.clone()),
            project_name: Some(project_name),
            ..ActivityDetail::default()
        };
        self.emit(
            ActivityKind::CreateSprint,
            input.project_id,
            Some(target),
            description,
            Some(detail),
        );

        debug!(
            sprint_id = %sprint_id,
            stories = input.user_story_ids.len(),
            "sprint created"
        );
        Ok(sprint_id)
    }

    /// Apply a sprint patch. New dates are checked against the project's
    /// other sprints.
    pub fn update_sprint(&mut self, id: SprintId, patch: SprintUpdate) -> ScrumResult<()> {
        let before = self.require_sprint(id)?.clone();
        let mut after = before.clone();

        if let Some(name) = patch.name {
            after.name = require_text(&name, "name")?;
        }
        if let Some(start) = patch.start_date {
            after.start_date = start;
        }
        if let Some(end) = patch.end_date {
            after.end_date = end;
        }
        if after.start_date != before.start_date || after.end_date != before.end_date {
            self.check_sprint_dates(after.project_id, after.start_date, after.end_date, Some(id))?;
        }
        if let Some(is_closed) = patch.is_closed {
            after.is_closed = is_closed;
        }
        if let Some(order) = patch.order {
            after.order = order;
        }

        after.updated_at = self.clock.now();
        let target = sprint_target(&after);
        let toggled = before.is_closed != after.is_closed;
        let changed = toggled
            || before.name != after.name
            || before.start_date != after.start_date
            || before.end_date != after.end_date;
        self.sprints.insert(id, after.clone());

        if changed {
            let (description, detail) = if toggled {
                (
                    describe::sprint_closed(&after.name, after.is_closed),
                    Some(ActivityDetail::field_change(
                        "Closed",
                        before.is_closed.to_string(),
                        after.is_closed.to_string(),
                    )),
                )
            } else {
                (describe::sprint_updated(&after.name), None)
            };
            self.emit(
                ActivityKind::UpdateSprint,
                after.project_id,
                Some(target),
                description,
                detail,
            );
        }

        debug!(sprint_id = %id, changed, "sprint updated");
        Ok(())
    }

    /// Remove a sprint. Its stories return to the backlog and its tasks
    /// lose their sprint; nothing else is deleted.
    pub fn delete_sprint(&mut self, id: SprintId) -> ScrumResult<()> {
        if self.sprints.remove(&id).is_none() {
            return Err(Self::missing_entity(EntityType::Sprint, id));
        }

        let mut stories = 0usize;
        for story in self.user_stories.values_mut() {
            if story.sprint_id == Some(id) {
                story.sprint_id = None;
                stories += 1;
            }
        }
        let mut tasks = 0usize;
        for task in self.tasks.values_mut() {
            if task.sprint_id == Some(id) {
                task.sprint_id = None;
                tasks += 1;
            }
        }

        debug!(sprint_id = %id, stories, tasks, "sprint deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{NewProject, NewTask, NewUserStory};
    use chrono::NaiveDate;
    use scrumkit_core::{
        ProjectId, SprintDatePolicy, StoreConfig, User, UserId, ValidationError,
    };

    fn user() -> User {
        User {
            id: UserId::now_v7(),
            username: "demo".to_string(),
            full_name: "Demo User".to_string(),
            email: "demo@example.com".to_string(),
            registered_at: chrono::Utc::now(),
        }
    }

    fn setup_with(config: StoreConfig) -> (ScrumStore, ProjectId) {
        let mut store = ScrumStore::with_config(user(), config).unwrap();
        let owner = store.current_user().id;
        let project = store.create_project(NewProject::new("Demo", owner)).unwrap();
        (store, project)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_create_sprint_records_activity_and_assigns_stories() {
        let (mut store, project) = setup_with(StoreConfig::default());
        let story = store
            .create_user_story(NewUserStory::new(project, "Login"))
            .unwrap();

        let sprint = store
            .create_sprint(
                NewSprint::new(project, "Sprint 1", date(2026, 1, 1), date(2026, 1, 14))
                    .with_user_stories(vec![story]),
            )
            .unwrap();

        assert_eq!(store.sprint(sprint).unwrap().user_story_ids, vec![story]);
        assert_eq!(store.user_story(story).unwrap().sprint_id, Some(sprint));
        assert_eq!(store.sprint(sprint).unwrap().order, 1);
        let latest = store.activities_for_project(project)[0];
        assert_eq!(latest.kind, ActivityKind::CreateSprint);
        assert_eq!(
            latest.description,
            "has created a new sprint <strong>Sprint 1</strong> in <strong>Demo</strong>"
        );
    }

    #[test]
    fn test_enforced_policy_rejects_overlap_and_inverted_dates() {
        let (mut store, project) = setup_with(StoreConfig::default());
        store
            .create_sprint(NewSprint::new(
                project,
                "Sprint 1",
                date(2026, 1, 1),
                date(2026, 1, 14),
            ))
            .unwrap();

        let overlap = store.create_sprint(NewSprint::new(
            project,
            "Sprint 2",
            date(2026, 1, 10),
            date(2026, 1, 20),
        ));
        assert!(matches!(
            overlap,
            Err(ScrumError::Validation(ValidationError::ConstraintViolation { ref constraint, .. }))
                if constraint == "sprint_dates"
        ));

        let inverted = store.create_sprint(NewSprint::new(
            project,
            "Sprint 2",
            date(2026, 1, 20),
            date(2026, 1, 15),
        ));
        assert!(inverted.unwrap_err().is_validation());

        store
            .create_sprint(NewSprint::new(
                project,
                "Sprint 2",
                date(2026, 1, 15),
                date(2026, 1, 28),
            ))
            .unwrap();
        assert_eq!(store.sprints_for_project(project).len(), 2);
    }

    #[test]
    fn test_advisory_policy_accepts_overlap() {
        let config = StoreConfig {
            sprint_date_policy: SprintDatePolicy::Advisory,
            ..StoreConfig::default()
        };
        let (mut store, project) = setup_with(config);
        store
            .create_sprint(NewSprint::new(
                project,
                "Sprint 1",
                date(2026, 1, 1),
                date(2026, 1, 14),
            ))
            .unwrap();
        assert!(store
            .create_sprint(NewSprint::new(
                project,
                "Sprint 2",
                date(2026, 1, 10),
                date(2026, 1, 20),
            ))
            .is_ok());
    }

    #[test]
    fn test_update_sprint_excludes_itself_from_overlap() {
        let (mut store, project) = setup_with(StoreConfig::default());
        let sprint = store
            .create_sprint(NewSprint::new(
                project,
                "Sprint 1",
                date(2026, 1, 1),
                date(2026, 1, 14),
            ))
            .unwrap();

        store
            .update_sprint(
                sprint,
                SprintUpdate {
                    end_date: Some(date(2026, 1, 16)),
                    ..SprintUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(store.sprint(sprint).unwrap().duration_days(), 16);

        store
            .update_sprint(
                sprint,
                SprintUpdate {
                    is_closed: Some(true),
                    ..SprintUpdate::default()
                },
            )
            .unwrap();
        let latest = store.activities_for_project(project)[0];
        assert_eq!(latest.kind, ActivityKind::UpdateSprint);
        assert_eq!(
            latest.description,
            "has closed the sprint <strong>Sprint 1</strong>"
        );
    }

    #[test]
    fn test_delete_sprint_unlinks_without_deleting() {
        let (mut store, project) = setup_with(StoreConfig::default());
        let story = store
            .create_user_story(NewUserStory::new(project, "Login"))
            .unwrap();
        let sprint = store
            .create_sprint(
                NewSprint::new(project, "Sprint 1", date(2026, 1, 1), date(2026, 1, 14))
                    .with_user_stories(vec![story]),
            )
            .unwrap();
        let task = store
            .create_task(NewTask::new(project, "Storyless").in_sprint(sprint))
            .unwrap();

        store.delete_sprint(sprint).unwrap();

        assert_eq!(store.user_story(story).unwrap().sprint_id, None);
        assert_eq!(store.task(task).unwrap().sprint_id, None);
        assert_eq!(store.backlog(project).len(), 1);
        assert!(store.delete_sprint(sprint).unwrap_err().is_not_found());
    }
}
