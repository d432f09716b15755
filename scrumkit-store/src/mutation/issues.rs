//! Issue and issue comment mutations.

use super::{require_finite, require_text};
use crate::activity::describe;
use crate::input::{IssueUpdate, NewIssue};
use crate::ScrumStore;
use scrumkit_core::{
    ActivityDetail, ActivityKind, ActivityTarget, Comment, CommentId, EntityIdType, EntityType,
    Issue, IssueId, ProjectId, ScrumResult,
};
use tracing::debug;

pub(crate) fn issue_target(issue: &Issue) -> ActivityTarget {
    ActivityTarget {
        entity_type: EntityType::Issue,
        entity_id: issue.issue_id.as_uuid(),
        reference: Some(issue.reference),
        title: issue.title.clone(),
    }
}

fn tracked_change(before: &Issue, after: &Issue) -> bool {
    before.title != after.title
        || before.description != after.description
        || before.issue_type != after.issue_type
        || before.severity != after.severity
        || before.priority != after.priority
        || before.status != after.status
        || before.tags != after.tags
        || before.assignee != after.assignee
        || before.watchers != after.watchers
}

impl ScrumStore {
    fn next_issue_order(&self, project: ProjectId) -> f64 {
        self.issues
            .values()
            .filter(|i| i.project_id == project)
            .map(|i| i.order)
            .fold(0.0, f64::max)
            + 1.0
    }

    pub fn create_issue(&mut self, input: NewIssue) -> ScrumResult<IssueId> {
        let title = require_text(&input.title, "title")?;
        self.require_project(input.project_id)?;

        let order = match input.order {
            Some(order) => require_finite(order, "order")?,
            None => self.next_issue_order(input.project_id),
        };
        let reference = self.refs.next_ref(input.project_id);
        let issue_id = IssueId::now_v7();
        let now = self.clock.now();

        let issue = Issue {
            issue_id,
            project_id: input.project_id,
            reference,
            title,
            description: input.description,
            issue_type: input.issue_type,
            severity: input.severity,
            priority: input.priority,
            status: input.status,
            tags: input.tags,
            attachments: Vec::new(),
            comments: Vec::new(),
            assignee: input.assignee,
            watchers: input.watchers,
            created_by: self.current_user.id,
            created_at: now,
            updated_at: now,
            order,
        };
        let target = issue_target(&issue);
        self.issues.insert(issue_id, issue);

        let description = describe::issue_created(reference, &target.title);
        self.emit(
            ActivityKind::CreateIssue,
            input.project_id,
            Some(target),
            description,
            None,
        );

        debug!(issue_id = %issue_id, reference, "issue created");
        Ok(issue_id)
    }

    /// Apply an issue patch. Any tracked change records one `update-issue`.
    pub fn update_issue(&mut self, id: IssueId, patch: IssueUpdate) -> ScrumResult<()> {
        let before = self.require_issue(id)?.clone();
        let mut after = before.clone();

        if let Some(title) = patch.title {
            after.title = require_text(&title, "title")?;
        }
        if let Some(description) = patch.description {
            after.description = description;
        }
        if let Some(issue_type) = patch.issue_type {
            after.issue_type = issue_type;
        }
        if let Some(severity) = patch.severity {
            after.severity = severity;
        }
        if let Some(priority) = patch.priority {
            after.priority = priority;
        }
        if let Some(status) = patch.status {
            after.status = status;
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
        let target = issue_target(&after);
        let changed = tracked_change(&before, &after);
        self.issues.insert(id, after.clone());

        if changed {
            let (description, detail) = if before.status != after.status {
                (
                    describe::issue_status_changed(
                        after.reference,
                        &after.title,
                        after.status.label(),
                    ),
                    Some(ActivityDetail::field_change(
                        "Status",
                        before.status.as_db_str(),
                        after.status.as_db_str(),
                    )),
                )
            } else {
                (describe::issue_updated(after.reference, &after.title), None)
            };
            self.emit(
                ActivityKind::UpdateIssue,
                after.project_id,
                Some(target),
                description,
                detail,
            );
        }

        debug!(issue_id = %id, changed, "issue updated");
        Ok(())
    }

    pub fn delete_issue(&mut self, id: IssueId) -> ScrumResult<()> {
        let issue = self
            .issues
            .remove(&id)
            .ok_or_else(|| Self::missing_entity(EntityType::Issue, id))?;
        debug!(issue_id = %id, reference = issue.reference, "issue deleted");
        Ok(())
    }

    /// Append a comment by the current user.
    pub fn add_comment(&mut self, issue_id: IssueId, content: &str) -> ScrumResult<CommentId> {
        let content = require_text(content, "content")?;
        self.require_issue(issue_id)?;

        let comment_id = CommentId::now_v7();
        let now = self.clock.now();
        let author = self.current_user.id;
        let Some(issue) = self.issues.get_mut(&issue_id) else {
            return Err(Self::missing_entity(EntityType::Issue, issue_id));
        };
        issue.comments.push(Comment {
            comment_id,
            content,
            author,
            created_at: now,
            updated_at: None,
            is_edited: false,
        });
        issue.updated_at = now;
        let project_id = issue.project_id;
        let target = issue_target(issue);

        let phrase = format!(
            "the issue {}",
            describe::strong_ref(issue.reference, &issue.title)
        );
        self.emit(
            ActivityKind::AddComment,
            project_id,
            Some(target),
            describe::comment_added(&phrase),
            None,
        );

        debug!(issue_id = %issue_id, comment_id = %comment_id, "comment added");
        Ok(comment_id)
    }

    /// Replace a comment's content and mark it edited.
    pub fn edit_comment(
        &mut self,
        issue_id: IssueId,
        comment_id: CommentId,
        content: &str,
    ) -> ScrumResult<()> {
        let content = require_text(content, "content")?;
        let now = self.clock.now();
        let issue = self
            .issues
            .get_mut(&issue_id)
            .ok_or_else(|| Self::missing_entity(EntityType::Issue, issue_id))?;
        let comment = issue
            .comments
            .iter_mut()
            .find(|c| c.comment_id == comment_id)
            .ok_or_else(|| Self::missing_entity(EntityType::Comment, comment_id))?;

        comment.content = content;
        comment.updated_at = Some(now);
        comment.is_edited = true;

        debug!(issue_id = %issue_id, comment_id = %comment_id, "comment edited");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NewProject;
    use scrumkit_core::{IssueStatus, IssueType, Severity, User, UserId};

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
    fn test_create_issue_defaults() {
        let (mut store, project) = setup();
        let id = store
            .create_issue(NewIssue::new(project, "Crash on save"))
            .unwrap();
        let issue = store.issue(id).unwrap();
        assert_eq!(issue.reference, 1);
        assert_eq!(issue.issue_type, IssueType::Bug);
        assert_eq!(issue.severity, Severity::Normal);
        assert_eq!(issue.status, IssueStatus::New);
        assert_eq!(
            store.activities_for_project(project)[0].kind,
            ActivityKind::CreateIssue
        );
    }

    #[test]
    fn test_non_finite_order_is_rejected() {
        let (mut store, project) = setup();
        let mut input = NewIssue::new(project, "Crash");
        input.order = Some(f64::INFINITY);
        assert!(store.create_issue(input).unwrap_err().is_validation());
        assert_eq!(store.refs().current(project), 0);

        let id = store.create_issue(NewIssue::new(project, "Crash")).unwrap();
        let patch = IssueUpdate {
            order: Some(f64::NAN),
            ..IssueUpdate::default()
        };
        assert!(store.update_issue(id, patch).unwrap_err().is_validation());
        assert_eq!(store.issue(id).unwrap().order, 1.0);
    }

    #[test]
    fn test_update_issue_records_one_activity() {
        let (mut store, project) = setup();
        let id = store.create_issue(NewIssue::new(project, "Crash")).unwrap();
        let before = store.activity_log().len();

        store
            .update_issue(
                id,
                IssueUpdate {
                    status: Some(IssueStatus::Rejected),
                    severity: Some(Severity::Critical),
                    ..IssueUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(store.activity_log().len(), before + 1);
        let latest = store.activities_for_project(project)[0];
        assert_eq!(latest.kind, ActivityKind::UpdateIssue);
        assert_eq!(
            latest.detail.as_ref().unwrap().new_value.as_deref(),
            Some("rejected")
        );

        store.update_issue(id, IssueUpdate::default()).unwrap();
        assert_eq!(store.activity_log().len(), before + 1);
    }

    #[test]
    fn test_comments() {
        let (mut store, project) = setup();
        let id = store.create_issue(NewIssue::new(project, "Teste")).unwrap();

        assert_eq!(
            store.add_comment(id, "   "),
            Err(scrumkit_core::ScrumError::missing("content"))
        );
        let comment = store.add_comment(id, "Reproduced on 1.2").unwrap();
        let latest = store.activities_for_project(project)[0];
        assert_eq!(latest.kind, ActivityKind::AddComment);
        assert_eq!(
            latest.description,
            "has commented on the issue <strong>#1 Teste</strong>"
        );

        store.edit_comment(id, comment, "Reproduced on 1.3").unwrap();
        let stored = &store.issue(id).unwrap().comments[0];
        assert!(stored.is_edited);
        assert!(stored.updated_at.is_some());
        assert_eq!(stored.content, "Reproduced on 1.3");

        assert!(store
            .edit_comment(id, CommentId::now_v7(), "x")
            .unwrap_err()
            .is_not_found());
    }
}
