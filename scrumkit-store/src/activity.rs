//! Activity recording
//!
//! Append-only timeline of tracked mutations. The log never fails: a record
//! with no actor or target is still accepted and kept as-is.

use crate::ScrumStore;
use scrumkit_core::{
    ActivityDetail, ActivityId, ActivityKind, ActivityRecord, ActivityTarget, EntityIdType,
    ProjectId, Timestamp, UserId,
};
use std::collections::VecDeque;
use uuid::Uuid;

/// Input for [`ActivityLog::record`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub kind: ActivityKind,
    pub project_id: ProjectId,
    pub actor_id: Option<UserId>,
    pub actor_name: String,
    pub target: Option<ActivityTarget>,
    pub description: String,
    pub detail: Option<ActivityDetail>,
}

/// In-memory activity log, most recent record first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityLog {
    records: VecDeque<ActivityRecord>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from records stored most recent first.
    pub fn from_records(records: Vec<ActivityRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Mint an id, stamp the record and push it to the front.
    pub fn record(&mut self, entry: NewActivity, at: Timestamp) -> ActivityId {
        let activity_id = ActivityId::now_v7();
        self.records.push_front(ActivityRecord {
            activity_id,
            kind: entry.kind,
            project_id: entry.project_id,
            actor_id: entry.actor_id,
            actor_name: entry.actor_name,
            target: entry.target,
            description: entry.description,
            detail: entry.detail,
            created_at: at,
        });
        activity_id
    }

    /// Records of a project, newest first. Records sharing a timestamp keep
    /// their insertion recency.
    pub fn for_project(&self, project: ProjectId) -> Vec<&ActivityRecord> {
        let mut records: Vec<&ActivityRecord> = self
            .records
            .iter()
            .filter(|r| r.project_id == project)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Records whose target is the given entity, newest first.
    pub fn for_entity(&self, entity_id: Uuid) -> Vec<&ActivityRecord> {
        let mut records: Vec<&ActivityRecord> = self
            .records
            .iter()
            .filter(|r| r.target.as_ref().is_some_and(|t| t.entity_id == entity_id))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ScrumStore {
    /// Append a record attributed to the current user, unless recording is
    /// switched off.
    pub(crate) fn emit(
        &mut self,
        kind: ActivityKind,
        project_id: ProjectId,
        target: Option<ActivityTarget>,
        description: String,
        detail: Option<ActivityDetail>,
    ) {
        if !self.config.record_activity {
            return;
        }
        let entry = NewActivity {
            kind,
            project_id,
            actor_id: Some(self.current_user.id),
            actor_name: self.current_user.display_name().to_string(),
            target,
            description,
            detail,
        };
        let at = self.clock.now();
        self.activity.record(entry, at);
    }
}

/// Rendered activity descriptions. Output may embed `<strong>` markup.
pub mod describe {
    use scrumkit_core::RefNumber;

    /// `<strong>#R Title</strong>`
    pub fn strong_ref(reference: RefNumber, title: &str) -> String {
        format!("<strong>#{} {}</strong>", reference, title)
    }

    pub fn strong(text: &str) -> String {
        format!("<strong>{}</strong>", text)
    }

    pub fn story_created(reference: RefNumber, title: &str, sprint: Option<&str>) -> String {
        match sprint {
            Some(sprint) => format!(
                "has added the user story {} to {}",
                strong_ref(reference, title),
                strong(sprint)
            ),
            None => format!(
                "has created a new user story {}",
                strong_ref(reference, title)
            ),
        }
    }

    pub fn story_updated(reference: RefNumber, title: &str) -> String {
        format!("has updated the user story {}", strong_ref(reference, title))
    }

    pub fn story_status_changed(reference: RefNumber, title: &str, status: &str) -> String {
        format!(
            "has updated the attribute \"Status\" of the user story {} to {}",
            strong_ref(reference, title),
            strong(status)
        )
    }

    pub fn story_moved(reference: RefNumber, title: &str, sprint: Option<&str>) -> String {
        match sprint {
            Some(sprint) => format!(
                "has moved the user story {} to {}",
                strong_ref(reference, title),
                strong(sprint)
            ),
            None => format!(
                "has moved the user story {} to the backlog",
                strong_ref(reference, title)
            ),
        }
    }

    pub fn task_created(
        reference: RefNumber,
        title: &str,
        story: Option<(RefNumber, &str)>,
    ) -> String {
        match story {
            Some((story_ref, story_title)) => format!(
                "has created the task {} for user story {}",
                strong_ref(reference, title),
                strong_ref(story_ref, story_title)
            ),
            None => format!("has created a new task {}", strong_ref(reference, title)),
        }
    }

    pub fn task_updated(reference: RefNumber, title: &str) -> String {
        format!("has updated the task {}", strong_ref(reference, title))
    }

    pub fn task_status_changed(
        reference: RefNumber,
        title: &str,
        story: Option<(RefNumber, &str)>,
        status: &str,
    ) -> String {
        match story {
            Some((story_ref, story_title)) => format!(
                "has updated the attribute \"Status\" of the task {} which belongs to the user story {} to {}",
                strong_ref(reference, title),
                strong_ref(story_ref, story_title),
                strong(status)
            ),
            None => format!(
                "has updated the status of task {} to {}",
                strong_ref(reference, title),
                strong(status)
            ),
        }
    }

    pub fn issue_created(reference: RefNumber, title: &str) -> String {
        format!("has created a new issue {}", strong_ref(reference, title))
    }

    pub fn issue_updated(reference: RefNumber, title: &str) -> String {
        format!("has updated the issue {}", strong_ref(reference, title))
    }

    pub fn issue_status_changed(reference: RefNumber, title: &str, status: &str) -> String {
        format!(
            "has updated the status of issue {} to {}",
            strong_ref(reference, title),
            strong(status)
        )
    }

    pub fn sprint_created(sprint: &str, project: &str) -> String {
        format!(
            "has created a new sprint {} in {}",
            strong(sprint),
            strong(project)
        )
    }

    pub fn sprint_updated(sprint: &str) -> String {
        format!("has updated the sprint {}", strong(sprint))
    }

    pub fn sprint_closed(sprint: &str, closed: bool) -> String {
        if closed {
            format!("has closed the sprint {}", strong(sprint))
        } else {
            format!("has reopened the sprint {}", strong(sprint))
        }
    }

    pub fn wiki_created(title: &str) -> String {
        format!("has created the wiki page {}", strong(title))
    }

    pub fn wiki_updated(title: &str) -> String {
        format!("has updated the wiki page {}", strong(title))
    }

    /// `target` is an already rendered phrase such as `the issue <strong>#3 Crash</strong>`.
    pub fn comment_added(target: &str) -> String {
        format!("has commented on {}", target)
    }

    pub fn attachment_added(filename: &str, target: &str) -> String {
        format!("has attached {} to {}", strong(filename), target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use scrumkit_core::EntityType;

    fn entry(project: ProjectId, description: &str) -> NewActivity {
        NewActivity {
            kind: ActivityKind::CreateStory,
            project_id: project,
            actor_id: None,
            actor_name: String::new(),
            target: None,
            description: description.to_string(),
            detail: None,
        }
    }

    #[test]
    fn test_record_pushes_to_front() {
        let mut log = ActivityLog::new();
        let project = ProjectId::now_v7();
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();

        log.record(entry(project, "first"), t0);
        log.record(entry(project, "second"), t0 + Duration::seconds(1));

        let descriptions: Vec<&str> = log.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, vec!["second", "first"]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_for_project_filters_and_keeps_recency_on_ties() {
        let mut log = ActivityLog::new();
        let a = ProjectId::now_v7();
        let b = ProjectId::now_v7();
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();

        log.record(entry(a, "a1"), at);
        log.record(entry(b, "b1"), at);
        log.record(entry(a, "a2"), at);

        let records = log.for_project(a);
        let descriptions: Vec<&str> = records.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, vec!["a2", "a1"]);
    }

    #[test]
    fn test_record_without_actor_or_target_is_accepted() {
        let mut log = ActivityLog::new();
        let project = ProjectId::now_v7();
        let id = log.record(entry(project, "anonymous"), Utc::now());

        let record = log.iter().next().unwrap();
        assert_eq!(record.activity_id, id);
        assert!(record.actor_id.is_none());
        assert!(record.target.is_none());
    }

    #[test]
    fn test_for_entity() {
        let mut log = ActivityLog::new();
        let project = ProjectId::now_v7();
        let entity = Uuid::now_v7();
        let mut targeted = entry(project, "targeted");
        targeted.target = Some(ActivityTarget {
            entity_type: EntityType::Issue,
            entity_id: entity,
            reference: Some(3),
            title: "Crash".to_string(),
        });
        log.record(entry(project, "other"), Utc::now());
        log.record(targeted, Utc::now());

        let records = log.for_entity(entity);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "targeted");
    }

    #[test]
    fn test_describe_phrasings() {
        assert_eq!(
            describe::story_created(1, "Login", None),
            "has created a new user story <strong>#1 Login</strong>"
        );
        assert_eq!(
            describe::story_created(1, "Login", Some("Sprint 1")),
            "has added the user story <strong>#1 Login</strong> to <strong>Sprint 1</strong>"
        );
        assert_eq!(
            describe::task_created(2, "Build form", Some((1, "Login"))),
            "has created the task <strong>#2 Build form</strong> for user story <strong>#1 Login</strong>"
        );
        assert_eq!(
            describe::task_status_changed(2, "Build form", None, "Closed"),
            "has updated the status of task <strong>#2 Build form</strong> to <strong>Closed</strong>"
        );
        assert_eq!(
            describe::sprint_created("Sprint 1", "Demo"),
            "has created a new sprint <strong>Sprint 1</strong> in <strong>Demo</strong>"
        );
    }
}
