//! Task mutations.

use super::{require_finite, require_text};
use crate::activity::describe;
use crate::input::{NewTask, TaskUpdate};
use crate::ScrumStore;
use scrumkit_core::{
    ActivityDetail, ActivityKind, ActivityTarget, EntityIdType, EntityType, ProjectId,
    RefNumber, ScrumResult, Task, TaskId, UserStoryId,
};
use tracing::debug;

fn task_target(task: &Task) -> ActivityTarget {
    ActivityTarget {
        entity_type: EntityType::Task,
        entity_id: task.task_id.as_uuid(),
        reference: Some(task.reference),
        title: task.title.clone(),
    }
}

fn tracked_change(before: &Task, after: &Task) -> bool {
    before.title != after.title
        || before.description != after.description
        || before.user_story_id != after.user_story_id
        || before.sprint_id != after.sprint_id
        || before.tags != after.tags
        || before.assignee != after.assignee
        || before.watchers != after.watchers
}

impl ScrumStore {
    fn next_task_order(&self, project: ProjectId) -> f64 {
        self.tasks
            .values()
            .filter(|t| t.project_id == project)
            .map(|t| t.order)
            .fold(0.0, f64::max)
            + 1.0
    }

    fn story_label(&self, story: Option<UserStoryId>) -> Option<(RefNumber, String)> {
        story
            .and_then(|id| self.user_stories.get(&id))
            .map(|s| (s.reference, s.title.clone()))
    }

    /// Create a task, optionally under a story and in a sprint. Tasks share
    /// the project's ref counter with stories and issues.
    pub fn create_task(&mut self, input: NewTask) -> ScrumResult<TaskId> {
        let title = require_text(&input.title, "title")?;
        self.require_project(input.project_id)?;
        if let Some(story) = input.user_story_id {
            self.check_story_in_project(story, input.project_id)?;
        }
        if let Some(sprint) = input.sprint_id {
            self.check_sprint_in_project(sprint, input.project_id)?;
        }

        let order = match input.order {
            Some(order) => require_finite(order, "order")?,
            None => self.next_task_order(input.project_id),
        };
        let reference = self.refs.next_ref(input.project_id);
        let task_id = TaskId::now_v7();
        let now = self.clock.now();

        let task = Task {
            task_id,
            project_id: input.project_id,
            reference,
            title,
            description: input.description,
            user_story_id: input.user_story_id,
            sprint_id: input.sprint_id,
            status: input.status,
            tags: input.tags,
            attachments: Vec::new(),
            assignee: input.assignee,
            watchers: input.watchers,
            created_by: self.current_user.id,
            created_at: now,
            updated_at: now,
            order,
        };
        let target = task_target(&task);
        self.tasks.insert(task_id, task);
        self.mirror_task_story(task_id, None, input.user_story_id);

        let story = self.story_label(input.user_story_id);
        let description = describe::task_created(
            reference,
            &target.title,
            story.as_ref().map(|(r, t)| (*r, t.as_str())),
        );
        self.emit(
            ActivityKind::CreateTask,
            input.project_id,
            Some(target),
            description,
            None,
        );

        debug!(task_id = %task_id, reference, "task created");
        Ok(task_id)
    }

    /// Apply a task patch.
    ///
    /// A status change records `update-task-status` with the old and new
    /// status; any other tracked change records `update-task`.
    pub fn update_task(&mut self, id: TaskId, patch: TaskUpdate) -> ScrumResult<()> {
        let before = self.require_task(id)?.clone();
        let mut after = before.clone();

        if let Some(title) = patch.title {
            after.title = require_text(&title, "title")?;
        }
        if let Some(description) = patch.description {
            after.description = description;
        }
        if let Some(status) = patch.status {
            after.status = status;
        }
        if let Some(story) = patch.user_story_id {
            if let Some(story) = story {
                self.check_story_in_project(story, before.project_id)?;
            }
            after.user_story_id = story;
        }
        if let Some(sprint) = patch.sprint_id {
            if let Some(sprint) = sprint {
                self.check_sprint_in_project(sprint, before.project_id)?;
            }
            after.sprint_id = sprint;
        }
        if let Some(tags) = patch.tags {
            after.tags = tags;
        }
        if let Some(assignee) = patch.assignee {
            after.assignee = assignee;
        }
        if let Some(watchers) = patch.watchers {
            after.watchers = watchers;
        }
        if let Some(order) = patch.order {
            after.order = require_finite(order, "order")?;
        }

        after.updated_at = self.clock.now();
        let target = task_target(&after);
        let changed = tracked_change(&before, &after);
        self.tasks.insert(id, after.clone());
        self.mirror_task_story(id, before.user_story_id, after.user_story_id);

        if before.status != after.status {
            let story = self.story_label(after.user_story_id);
            let description = describe::task_status_changed(
                after.reference,
                &after.title,
                story.as_ref().map(|(r, t)| (*r, t.as_str())),
                after.status.label(),
            );
            let detail = ActivityDetail::field_change(
                "Status",
                before.status.as_db_str(),
                after.status.as_db_str(),
            );
            self.emit(
                ActivityKind::UpdateTaskStatus,
                after.project_id,
                Some(target),
                description,
                Some(detail),
            );
        } else if changed {
            let description = describe::task_updated(after.reference, &after.title);
            self.emit(
                ActivityKind::UpdateTask,
                after.project_id,
                Some(target),
                description,
                None,
            );
        }

        debug!(task_id = %id, changed, "task updated");
        Ok(())
    }

    pub fn delete_task(&mut self, id: TaskId) -> ScrumResult<()> {
        let task = self
            .tasks
            .remove(&id)
            .ok_or_else(|| Self::missing_entity(EntityType::Task, id))?;
        self.mirror_task_story(id, task.user_story_id, None);

        debug!(task_id = %id, reference = task.reference, "task deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{NewProject, NewUserStory};
    use scrumkit_core::{User, UserId, WorkStatus};

    fn setup() -> (ScrumStore, ProjectId) {
        let mut store = ScrumStore::new(User {
            id: UserId::now_v7(),
            username: "demo".to_string(),
            full_name: "Demo User".to_string(),
            email: "demo@example.com".to_string(),
            registered_at: chrono::Utc::now(),
        });
        let owner = store.current_user().id;
        let project = store.create_project(NewProject::new("Demo", owner)).unwrap();
        (store, project)
    }

    #[test]
    fn test_create_task_under_story_updates_mirror() {
        let (mut store, project) = setup();
        let story = store
            .create_user_story(NewUserStory::new(project, "Login"))
            .unwrap();
        let task = store
            .create_task(NewTask::new(project, "Build form").for_story(story))
            .unwrap();

        assert_eq!(store.task(task).unwrap().reference, 2);
        assert_eq!(store.user_story(story).unwrap().task_ids, vec![task]);
        let latest = store.activities_for_project(project)[0];
        assert_eq!(latest.kind, ActivityKind::CreateTask);
        assert_eq!(
            latest.description,
            "has created the task <strong>#2 Build form</strong> for user story <strong>#1 Login</strong>"
        );
    }

    #[test]
    fn test_create_task_rejects_story_of_other_project() {
        let (mut store, project) = setup();
        let owner = store.current_user().id;
        let other = store.create_project(NewProject::new("Other", owner)).unwrap();
        let foreign = store
            .create_user_story(NewUserStory::new(other, "Elsewhere"))
            .unwrap();

        let result = store.create_task(NewTask::new(project, "Build form").for_story(foreign));
        assert!(result.unwrap_err().is_validation());
        assert_eq!(store.refs().current(project), 0);
    }

    #[test]
    fn test_non_finite_order_is_rejected() {
        let (mut store, project) = setup();
        let mut input = NewTask::new(project, "Build form");
        input.order = Some(f64::NAN);
        assert!(store.create_task(input).unwrap_err().is_validation());
        assert_eq!(store.refs().current(project), 0);

        let task = store.create_task(NewTask::new(project, "Build form")).unwrap();
        let patch = TaskUpdate {
            order: Some(f64::INFINITY),
            ..TaskUpdate::default()
        };
        assert!(store.update_task(task, patch).unwrap_err().is_validation());
        assert!(store.task(task).unwrap().order.is_finite());
    }

    #[test]
    fn test_status_change_records_detail() {
        let (mut store, project) = setup();
        let task = store.create_task(NewTask::new(project, "Build form")).unwrap();

        store
            .update_task(
                task,
                TaskUpdate {
                    status: Some(WorkStatus::Closed),
                    ..TaskUpdate::default()
                },
            )
            .unwrap();

        let latest = store.activities_for_project(project)[0];
        assert_eq!(latest.kind, ActivityKind::UpdateTaskStatus);
        let detail = latest.detail.as_ref().unwrap();
        assert_eq!(detail.field.as_deref(), Some("Status"));
        assert_eq!(detail.old_value.as_deref(), Some("new"));
        assert_eq!(detail.new_value.as_deref(), Some("closed"));
        assert_eq!(
            latest.description,
            "has updated the status of task <strong>#1 Build form</strong> to <strong>Closed</strong>"
        );
    }

    #[test]
    fn test_relinking_task_moves_mirror() {
        let (mut store, project) = setup();
        let a = store.create_user_story(NewUserStory::new(project, "A")).unwrap();
        let b = store.create_user_story(NewUserStory::new(project, "B")).unwrap();
        let task = store
            .create_task(NewTask::new(project, "Work").for_story(a))
            .unwrap();

        store
            .update_task(
                task,
                TaskUpdate {
                    user_story_id: Some(Some(b)),
                    ..TaskUpdate::default()
                },
            )
            .unwrap();

        assert!(store.user_story(a).unwrap().task_ids.is_empty());
        assert_eq!(store.user_story(b).unwrap().task_ids, vec![task]);
        assert_eq!(store.activities_for_project(project)[0].kind, ActivityKind::UpdateTask);
    }

    #[test]
    fn test_delete_task_and_missing_ids() {
        let (mut store, project) = setup();
        let story = store.create_user_story(NewUserStory::new(project, "A")).unwrap();
        let task = store
            .create_task(NewTask::new(project, "Work").for_story(story))
            .unwrap();
        let records = store.activity_log().len();

        store.delete_task(task).unwrap();

        assert!(store.user_story(story).unwrap().task_ids.is_empty());
        assert_eq!(store.activity_log().len(), records);
        assert!(store.delete_task(task).unwrap_err().is_not_found());
        assert!(store
            .update_task(task, TaskUpdate::default())
            .unwrap_err()
            .is_not_found());
    }
}
