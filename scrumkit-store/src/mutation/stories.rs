//! User story mutations.

use super::{require_finite, require_text};
use crate::activity::describe;
use crate::input::{NewUserStory, UserStoryUpdate};
use crate::ScrumStore;
use scrumkit_core::{
    total_points, ActivityDetail, ActivityKind, ActivityTarget, EntityIdType, EntityType,
    ProjectId, ScrumResult, SprintId, StoryPoint, UserStory, UserStoryId,
};
use tracing::debug;

fn story_target(story: &UserStory) -> ActivityTarget {
    ActivityTarget {
        entity_type: EntityType::UserStory,
        entity_id: story.user_story_id.as_uuid(),
        reference: Some(story.reference),
        title: story.title.clone(),
    }
}

/// Whether anything besides ordering and timestamps differs.
fn tracked_change(before: &UserStory, after: &UserStory) -> bool {
    before.title != after.title
        || before.description != after.description
        || before.status != after.status
        || before.points != after.points
        || before.tags != after.tags
        || before.assignees != after.assignees
        || before.watchers != after.watchers
}

impl ScrumStore {
    fn next_backlog_order(&self, project: ProjectId) -> f64 {
        self.user_stories
            .values()
            .filter(|s| s.project_id == project)
            .map(|s| s.backlog_order)
            .fold(0.0, f64::max)
            + 1.0
    }

    fn sprint_name(&self, sprint: Option<SprintId>) -> Option<String> {
        sprint
            .and_then(|id| self.sprints.get(&id))
            .map(|s| s.name.clone())
    }

    /// Create a user story and allocate its ref.
    ///
    /// Without explicit points the story gets one unknown estimate per
    /// project category.
    pub fn create_user_story(&mut self, input: NewUserStory) -> ScrumResult<UserStoryId> {
        let title = require_text(&input.title, "title")?;
        let project = self.require_project(input.project_id)?;
        let points = match input.points {
            Some(points) => {
                self.check_points(input.project_id, &points)?;
                points
            }
            None => project
                .ordered_categories()
                .into_iter()
                .map(|c| StoryPoint::new(c.id, None))
                .collect(),
        };
        if let Some(sprint) = input.sprint_id {
            self.check_sprint_in_project(sprint, input.project_id)?;
        }

        let backlog_order = match input.backlog_order {
            Some(order) => require_finite(order, "backlog_order")?,
            None => self.next_backlog_order(input.project_id),
        };
        let kanban_order = match input.kanban_order {
            Some(order) => require_finite(order, "kanban_order")?,
            None => backlog_order,
        };
        let reference = self.refs.next_ref(input.project_id);
        let user_story_id = UserStoryId::now_v7();
        let now = self.clock.now();

        let story = UserStory {
            user_story_id,
            project_id: input.project_id,
            reference,
            title,
            description: input.description,
            status: input.status,
            total_points: total_points(&points),
            points,
            sprint_id: input.sprint_id,
            task_ids: Vec::new(),
            tags: input.tags,
            attachments: Vec::new(),
            assignees: input.assignees,
            watchers: input.watchers,
            created_by: self.current_user.id,
            created_at: now,
            updated_at: now,
            backlog_order,
            kanban_order,
        };
        let target = story_target(&story);
        self.user_stories.insert(user_story_id, story);
        self.mirror_story_sprint(user_story_id, None, input.sprint_id);

        let sprint_name = self.sprint_name(input.sprint_id);
        let description =
            describe::story_created(reference, &target.title, sprint_name.as_deref());
        let detail = sprint_name.map(|name| ActivityDetail {
            sprint_name: Some(name),
            ..ActivityDetail::default()
        });
        self.emit(
            ActivityKind::CreateStory,
            input.project_id,
            Some(target),
            description,
            detail,
        );

        debug!(user_story_id = %user_story_id, reference, "user story created");
        Ok(user_story_id)
    }

    /// Apply a story patch.
    ///
    /// A sprint change records `move-story`; any other tracked change records
    /// `update-story`. Reordering alone records nothing.
    pub fn update_user_story(&mut self, id: UserStoryId, patch: UserStoryUpdate) -> ScrumResult<()> {
        let before = self.require_user_story(id)?.clone();
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
        if let Some(points) = patch.points {
            self.check_points(before.project_id, &points)?;
            after.total_points = total_points(&points);
            after.points = points;
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
        if let Some(assignees) = patch.assignees {
            after.assignees = assignees;
        }
        if let Some(watchers) = patch.watchers {
            after.watchers = watchers;
        }
        if let Some(order) = patch.backlog_order {
            after.backlog_order = require_finite(order, "backlog_order")?;
        }
        if let Some(order) = patch.kanban_order {
            after.kanban_order = require_finite(order, "kanban_order")?;
        }

        after.updated_at = self.clock.now();
        let target = story_target(&after);
        let moved = before.sprint_id != after.sprint_id;
        let changed = tracked_change(&before, &after);
        self.user_stories.insert(id, after.clone());
        self.mirror_story_sprint(id, before.sprint_id, after.sprint_id);

        if moved {
            let sprint_name = self.sprint_name(after.sprint_id);
            let description =
                describe::story_moved(after.reference, &after.title, sprint_name.as_deref());
            let detail = ActivityDetail {
                sprint_name,
                ..ActivityDetail::default()
            };
            self.emit(
                ActivityKind::MoveStory,
                after.project_id,
                Some(target),
                description,
                Some(detail),
            );
        } else if before.status != after.status {
            let description = describe::story_status_changed(
                after.reference,
                &after.title,
                after.status.label(),
            );
            let detail = ActivityDetail::field_change(
                "Status",
                before.status.as_db_str(),
                after.status.as_db_str(),
            );
            self.emit(
                ActivityKind::UpdateStory,
                after.project_id,
                Some(target),
                description,
                Some(detail),
            );
        } else if changed {
            let description = describe::story_updated(after.reference, &after.title);
            self.emit(
                ActivityKind::UpdateStory,
                after.project_id,
                Some(target),
                description,
                None,
            );
        }

        debug!(user_story_id = %id, moved, changed, "user story updated");
        Ok(())
    }

    /// Remove a story. Its tasks stay, now storyless, in whatever sprint
    /// they were in.
    pub fn delete_user_story(&mut self, id: UserStoryId) -> ScrumResult<()> {
        let story = self
            .user_stories
            .remove(&id)
            .ok_or_else(|| Self::missing_entity(EntityType::UserStory, id))?;

        for task in self.tasks.values_mut() {
            if task.user_story_id == Some(id) {
                task.user_story_id = None;
            }
        }
        self.mirror_story_sprint(id, story.sprint_id, None);

        debug!(user_story_id = %id, reference = story.reference, "user story deleted");
        Ok(())
    }

    /// Copy a story into the backlog right after the original.
    ///
    /// The copy gets a new ref, " (copy)" appended to its title and no
    /// sprint, tasks or watchers.
    pub fn duplicate_user_story(&mut self, id: UserStoryId) -> ScrumResult<UserStoryId> {
        let source = self.require_user_story(id)?;
        let input = NewUserStory {
            project_id: source.project_id,
            title: format!("{} (copy)", source.title),
            description: source.description.clone(),
            status: source.status,
            points: Some(source.points.clone()),
            sprint_id: None,
            tags: source.tags.clone(),
            assignees: source.assignees.clone(),
            watchers: Vec::new(),
            backlog_order: Some(source.backlog_order + 0.5),
            kanban_order: Some(source.kanban_order + 0.5),
        };
        self.create_user_story(input)
    }

    /// Put a story in front of every other backlog story.
    pub fn move_user_story_to_backlog_top(&mut self, id: UserStoryId) -> ScrumResult<()> {
        let story = self.require_user_story(id)?;
        let order = self
            .backlog(story.project_id)
            .into_iter()
            .filter(|s| s.user_story_id != id)
            .map(|s| s.backlog_order)
            .reduce(f64::min)
            .map_or(story.backlog_order, |min| min - 1.0);
        self.update_user_story(
            id,
            UserStoryUpdate {
                backlog_order: Some(order),
                ..UserStoryUpdate::default()
            },
        )
    }

    /// Put a story after every other backlog story.
    pub fn move_user_story_to_backlog_bottom(&mut self, id: UserStoryId) -> ScrumResult<()> {
        let story = self.require_user_story(id)?;
        let order = self
            .backlog(story.project_id)
            .into_iter()
            .filter(|s| s.user_story_id != id)
            .map(|s| s.backlog_order)
            .reduce(f64::max)
            .map_or(story.backlog_order, |max| max + 1.0);
        self.update_user_story(
            id,
            UserStoryUpdate {
                backlog_order: Some(order),
                ..UserStoryUpdate::default()
            },
        )
    }

    /// Move several stories into a sprint, or back to the backlog with
    /// `None`. All ids are checked before any story moves.
    pub fn move_user_stories_to_sprint(
        &mut self,
        ids: &[UserStoryId],
        sprint: Option<SprintId>,
    ) -> ScrumResult<()> {
        for id in ids {
            let story = self.require_user_story(*id)?;
            if let Some(sprint) = sprint {
                self.check_sprint_in_project(sprint, story.project_id)?;
            }
        }
        for id in ids {
            self.update_user_story(
                *id,
                UserStoryUpdate {
                    sprint_id: Some(sprint),
                    ..UserStoryUpdate::default()
                },
            )?;
        }
        Ok(())
    }
}
