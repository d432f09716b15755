//! Core entity structures

use crate::{
    ActivityId, ActivityKind, AttachmentId, CommentId, EntityType, IssueId, IssueStatus,
    IssueType, PointCategoryId, Priority, ProjectId, RefNumber, Severity, SprintId, TagId,
    TaskId, Timestamp, UserId, UserStoryId, WikiLinkId, WikiPageId, WorkStatus,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// USERS
// ============================================================================

/// The pre-authenticated current user injected into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub registered_at: Timestamp,
}

impl User {
    /// Name shown in activity records; falls back to the username.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

// ============================================================================
// PROJECT
// ============================================================================

/// Estimation axis for user story points (UX, Design, Front, Back...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCategory {
    pub id: PointCategoryId,
    pub name: String,
    pub order: u32,
}

/// Which project modules are switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModules {
    pub scrum: bool,
    pub issues: bool,
    pub wiki: bool,
}

impl Default for ProjectModules {
    fn default() -> Self {
        Self {
            scrum: true,
            issues: true,
            wiki: true,
        }
    }
}

/// Project - root scope for every other entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    pub name: String,
    pub description: String,
    pub slug: String,
    pub owner: UserId,
    pub is_private: bool,
    pub is_archived: bool,
    pub modules: ProjectModules,
    pub point_categories: Vec<PointCategory>,
    /// Stored for the UI; the store never evaluates permissions.
    pub public_permissions: Vec<String>,
    pub anonymous_permissions: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn has_category(&self, id: PointCategoryId) -> bool {
        self.point_categories.iter().any(|c| c.id == id)
    }

    /// Point categories sorted by their display order.
    pub fn ordered_categories(&self) -> Vec<&PointCategory> {
        let mut categories: Vec<&PointCategory> = self.point_categories.iter().collect();
        categories.sort_by_key(|c| c.order);
        categories
    }
}

// ============================================================================
// SHARED VALUE OBJECTS
// ============================================================================

/// Tag snapshot; entities carry copies rather than foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub tag_id: TagId,
    pub name: String,
    pub color: String,
}

/// Attachment metadata. Bytes live with an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub attachment_id: AttachmentId,
    pub filename: String,
    /// URL or opaque handle understood by the blob collaborator.
    pub url: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub description: Option<String>,
    pub is_deprecated: bool,
    pub uploaded_by: UserId,
    pub uploaded_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: CommentId,
    pub content: String,
    pub author: UserId,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub is_edited: bool,
}

// ============================================================================
// SCRUM ENTITIES
// ============================================================================

/// Estimate of one story for one point category. `None` renders as "?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryPoint {
    pub category: PointCategoryId,
    pub value: Option<u32>,
}

impl StoryPoint {
    pub fn new(category: PointCategoryId, value: Option<u32>) -> Self {
        Self { category, value }
    }
}

/// Sum of the non-null point values, saturating at `u32::MAX`.
pub fn total_points(points: &[StoryPoint]) -> u32 {
    points
        .iter()
        .filter_map(|p| p.value)
        .fold(0u32, u32::saturating_add)
}

/// Sum of the non-null point values, or `None` if it does not fit a `u32`.
pub fn checked_total_points(points: &[StoryPoint]) -> Option<u32> {
    points
        .iter()
        .filter_map(|p| p.value)
        .try_fold(0u32, u32::checked_add)
}

/// User story - backlog item estimated in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    pub user_story_id: UserStoryId,
    pub project_id: ProjectId,
    pub reference: RefNumber,
    pub title: String,
    pub description: String,
    pub status: WorkStatus,
    pub points: Vec<StoryPoint>,
    /// Always equal to `total_points(&self.points)`.
    pub total_points: u32,
    pub sprint_id: Option<SprintId>,
    /// Mirror of `Task::user_story_id`, maintained by the store.
    pub task_ids: Vec<TaskId>,
    pub tags: Vec<Tag>,
    pub attachments: Vec<Attachment>,
    pub assignees: Vec<UserId>,
    pub watchers: Vec<UserId>,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub backlog_order: f64,
    pub kanban_order: f64,
}

/// Task - unit of sprint work, optionally under a user story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub project_id: ProjectId,
    pub reference: RefNumber,
    pub title: String,
    pub description: String,
    /// `None` makes this a storyless task.
    pub user_story_id: Option<UserStoryId>,
    pub sprint_id: Option<SprintId>,
    pub status: WorkStatus,
    pub tags: Vec<Tag>,
    pub attachments: Vec<Attachment>,
    pub assignee: Option<UserId>,
    pub watchers: Vec<UserId>,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub order: f64,
}

/// Sprint (milestone). Point and task totals are derived on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    pub sprint_id: SprintId,
    pub project_id: ProjectId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Mirror of `UserStory::sprint_id`, maintained by the store.
    pub user_story_ids: Vec<UserStoryId>,
    pub is_closed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub order: u32,
}

impl Sprint {
    /// Inclusive length in days.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Inclusive date-range overlap test.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        (start >= self.start_date && start <= self.end_date)
            || (end >= self.start_date && end <= self.end_date)
            || (start <= self.start_date && end >= self.end_date)
    }

    pub fn phase_on(&self, today: NaiveDate) -> SprintPhase {
        if self.is_closed || today > self.end_date {
            SprintPhase::Finished
        } else if today >= self.start_date {
            SprintPhase::Active
        } else {
            SprintPhase::Upcoming
        }
    }
}

/// Where a sprint sits relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SprintPhase {
    Upcoming,
    Active,
    Finished,
}

/// Issue - bug, enhancement, question or support request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub issue_id: IssueId,
    pub project_id: ProjectId,
    pub reference: RefNumber,
    pub title: String,
    pub description: String,
    pub issue_type: IssueType,
    pub severity: Severity,
    pub priority: Priority,
    pub status: IssueStatus,
    pub tags: Vec<Tag>,
    pub attachments: Vec<Attachment>,
    pub comments: Vec<Comment>,
    pub assignee: Option<UserId>,
    pub watchers: Vec<UserId>,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub order: f64,
}

// ============================================================================
// WIKI
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiPage {
    pub wiki_page_id: WikiPageId,
    pub project_id: ProjectId,
    pub slug: String,
    pub title: String,
    /// Raw rich text; sanitize at the rendering boundary.
    pub content: String,
    pub owner: UserId,
    pub last_editor: UserId,
    pub edits: u32,
    pub version: u32,
    pub watchers: Vec<UserId>,
    pub attachments: Vec<Attachment>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Sidebar bookmark pointing at a wiki page slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiLink {
    pub wiki_link_id: WikiLinkId,
    pub project_id: ProjectId,
    pub title: String,
    pub href: String,
    pub order: u32,
}

// ============================================================================
// ACTIVITY
// ============================================================================

/// The entity an activity record talks about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTarget {
    pub entity_type: EntityType,
    /// Uuid of the target, whatever its type.
    pub entity_id: uuid::Uuid,
    pub reference: Option<RefNumber>,
    pub title: String,
}

/// Structured before/after detail of an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDetail {
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub sprint_name: Option<String>,
    pub project_name: Option<String>,
}

impl ActivityDetail {
    pub fn field_change(
        field: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            field: Some(field.into()),
            old_value: Some(old_value.into()),
            new_value: Some(new_value.into()),
            ..Self::default()
        }
    }
}

/// Immutable timeline entry. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_id: ActivityId,
    pub kind: ActivityKind,
    pub project_id: ProjectId,
    pub actor_id: Option<UserId>,
    pub actor_name: String,
    pub target: Option<ActivityTarget>,
    /// Rendered description; may embed `<strong>` markup.
    pub description: String,
    pub detail: Option<ActivityDetail>,
    pub created_at: Timestamp,
}
