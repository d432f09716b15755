//! Read-only views over the store.
//!
//! Every listing is sorted deterministically so callers can render it as-is.

use crate::metrics::SprintStats;
use crate::search::parse_ref_query;
use crate::ScrumStore;
use chrono::{Days, NaiveDate};
use scrumkit_core::{
    ActivityRecord, EntityIdType, EntityType, Issue, IssueId, IssueStatus, IssueType, Priority,
    Project, ProjectId, RefNumber, ScrumError, ScrumResult, Severity, Sprint, SprintId, Tag,
    TagId, Task, TaskId, UserId, UserStory, UserStoryId, WikiLink, WikiLinkId, WikiPage,
    WikiPageId, WorkStatus,
};
use std::cmp::Ordering;

// ============================================================================
// FILTERS
// ============================================================================

/// Backlog filter. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct BacklogFilter {
    /// Title substring, ref digits, or `#<ref>`.
    pub text: String,
    pub statuses: Vec<WorkStatus>,
    pub tag_ids: Vec<TagId>,
    pub assignees: Vec<UserId>,
}

impl BacklogFilter {
    pub fn matches(&self, story: &UserStory) -> bool {
        text_matches(&self.text, story.reference, &story.title)
            && (self.statuses.is_empty() || self.statuses.contains(&story.status))
            && tags_match(&self.tag_ids, &story.tags)
            && (self.assignees.is_empty()
                || story.assignees.iter().any(|a| self.assignees.contains(a)))
    }
}

/// Issue list filter. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub text: String,
    pub types: Vec<IssueType>,
    pub severities: Vec<Severity>,
    pub priorities: Vec<Priority>,
    pub statuses: Vec<IssueStatus>,
    pub assignees: Vec<UserId>,
    pub tag_ids: Vec<TagId>,
}

impl IssueFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        text_matches(&self.text, issue.reference, &issue.title)
            && (self.types.is_empty() || self.types.contains(&issue.issue_type))
            && (self.severities.is_empty() || self.severities.contains(&issue.severity))
            && (self.priorities.is_empty() || self.priorities.contains(&issue.priority))
            && (self.statuses.is_empty() || self.statuses.contains(&issue.status))
            && (self.assignees.is_empty()
                || issue.assignee.is_some_and(|a| self.assignees.contains(&a)))
            && tags_match(&self.tag_ids, &issue.tags)
    }
}

fn text_matches(text: &str, reference: RefNumber, title: &str) -> bool {
    let text = text.trim();
    text.is_empty()
        || title.to_lowercase().contains(&text.to_lowercase())
        || reference.to_string().contains(text)
        || parse_ref_query(text) == Some(reference)
}

fn tags_match(wanted: &[TagId], tags: &[Tag]) -> bool {
    wanted.is_empty() || tags.iter().any(|t| wanted.contains(&t.tag_id))
}

// ============================================================================
// TASKBOARD
// ============================================================================

/// Tasks of one row, one column per status in `WorkStatus::ALL` order.
pub type TaskColumns<'a> = Vec<(WorkStatus, Vec<&'a Task>)>;

#[derive(Debug, Clone)]
pub struct TaskboardRow<'a> {
    pub user_story: &'a UserStory,
    pub columns: TaskColumns<'a>,
}

/// Sprint board: one row per story, plus a row of storyless tasks.
#[derive(Debug, Clone)]
pub struct Taskboard<'a> {
    pub sprint: &'a Sprint,
    pub rows: Vec<TaskboardRow<'a>>,
    pub storyless: TaskColumns<'a>,
    pub stats: SprintStats,
}

fn columns<'a>(tasks: &[&'a Task]) -> TaskColumns<'a> {
    WorkStatus::ALL
        .iter()
        .map(|status| {
            let column = tasks
                .iter()
                .copied()
                .filter(|t| t.status == *status)
                .collect();
            (*status, column)
        })
        .collect()
}

// ============================================================================
// ORDERING
// ============================================================================

fn by_backlog_order(a: &&UserStory, b: &&UserStory) -> Ordering {
    a.backlog_order
        .total_cmp(&b.backlog_order)
        .then(a.reference.cmp(&b.reference))
}

fn by_task_order(a: &&Task, b: &&Task) -> Ordering {
    a.order.total_cmp(&b.order).then(a.reference.cmp(&b.reference))
}

fn by_issue_order(a: &&Issue, b: &&Issue) -> Ordering {
    a.order.total_cmp(&b.order).then(a.reference.cmp(&b.reference))
}

fn by_sprint_order(a: &&Sprint, b: &&Sprint) -> Ordering {
    a.order
        .cmp(&b.order)
        .then(a.start_date.cmp(&b.start_date))
        .then(a.sprint_id.cmp(&b.sprint_id))
}

// ============================================================================
// LOOKUPS
// ============================================================================

impl ScrumStore {
    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn user_story(&self, id: UserStoryId) -> Option<&UserStory> {
        self.user_stories.get(&id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn sprint(&self, id: SprintId) -> Option<&Sprint> {
        self.sprints.get(&id)
    }

    pub fn issue(&self, id: IssueId) -> Option<&Issue> {
        self.issues.get(&id)
    }

    pub fn wiki_page(&self, id: WikiPageId) -> Option<&WikiPage> {
        self.wiki_pages.get(&id)
    }

    pub fn wiki_link(&self, id: WikiLinkId) -> Option<&WikiLink> {
        self.wiki_links.get(&id)
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.iter().find(|t| t.tag_id == id)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub(crate) fn require_project(&self, id: ProjectId) -> ScrumResult<&Project> {
        self.projects
            .get(&id)
            .ok_or_else(|| ScrumError::not_found(EntityType::Project, id.as_uuid()))
    }

    pub(crate) fn require_user_story(&self, id: UserStoryId) -> ScrumResult<&UserStory> {
        self.user_stories
            .get(&id)
            .ok_or_else(|| ScrumError::not_found(EntityType::UserStory, id.as_uuid()))
    }

    pub(crate) fn require_task(&self, id: TaskId) -> ScrumResult<&Task> {
        self.tasks
            .get(&id)
            .ok_or_else(|| ScrumError::not_found(EntityType::Task, id.as_uuid()))
    }

    pub(crate) fn require_sprint(&self, id: SprintId) -> ScrumResult<&Sprint> {
        self.sprints
            .get(&id)
            .ok_or_else(|| ScrumError::not_found(EntityType::Sprint, id.as_uuid()))
    }

    pub(crate) fn require_issue(&self, id: IssueId) -> ScrumResult<&Issue> {
        self.issues
            .get(&id)
            .ok_or_else(|| ScrumError::not_found(EntityType::Issue, id.as_uuid()))
    }

    pub(crate) fn require_wiki_page(&self, id: WikiPageId) -> ScrumResult<&WikiPage> {
        self.wiki_pages
            .get(&id)
            .ok_or_else(|| ScrumError::not_found(EntityType::WikiPage, id.as_uuid()))
    }

    pub fn user_story_by_ref(&self, project: ProjectId, reference: RefNumber) -> Option<&UserStory> {
        self.user_stories
            .values()
            .find(|s| s.project_id == project && s.reference == reference)
    }

    pub fn task_by_ref(&self, project: ProjectId, reference: RefNumber) -> Option<&Task> {
        self.tasks
            .values()
            .find(|t| t.project_id == project && t.reference == reference)
    }

    pub fn issue_by_ref(&self, project: ProjectId, reference: RefNumber) -> Option<&Issue> {
        self.issues
            .values()
            .find(|i| i.project_id == project && i.reference == reference)
    }

    // === Projects ===

    /// All projects, oldest first.
    pub fn projects(&self) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self.projects.values().collect();
        projects.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.project_id.cmp(&b.project_id))
        });
        projects
    }

    pub fn project_by_slug(&self, slug: &str) -> Option<&Project> {
        self.projects.values().find(|p| p.slug == slug)
    }

    /// Projects whose name or description contains `text`, case-insensitively.
    pub fn filter_projects(&self, text: &str, include_archived: bool) -> Vec<&Project> {
        let needle = text.trim().to_lowercase();
        self.projects()
            .into_iter()
            .filter(|p| include_archived || !p.is_archived)
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    // === User stories ===

    pub fn user_stories_for_project(&self, project: ProjectId) -> Vec<&UserStory> {
        let mut stories: Vec<&UserStory> = self
            .user_stories
            .values()
            .filter(|s| s.project_id == project)
            .collect();
        stories.sort_by(by_backlog_order);
        stories
    }

    /// Stories of the project not assigned to any sprint.
    pub fn backlog(&self, project: ProjectId) -> Vec<&UserStory> {
        let mut stories: Vec<&UserStory> = self
            .user_stories
            .values()
            .filter(|s| s.project_id == project && s.sprint_id.is_none())
            .collect();
        stories.sort_by(by_backlog_order);
        stories
    }

    pub fn filter_backlog(&self, project: ProjectId, filter: &BacklogFilter) -> Vec<&UserStory> {
        self.backlog(project)
            .into_iter()
            .filter(|s| filter.matches(s))
            .collect()
    }

    pub fn user_stories_by_sprint(&self, sprint: SprintId) -> Vec<&UserStory> {
        let mut stories: Vec<&UserStory> = self
            .user_stories
            .values()
            .filter(|s| s.sprint_id == Some(sprint))
            .collect();
        stories.sort_by(|a, b| {
            a.kanban_order
                .total_cmp(&b.kanban_order)
                .then(a.reference.cmp(&b.reference))
        });
        stories
    }

    // === Tasks ===

    pub fn tasks_for_project(&self, project: ProjectId) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| t.project_id == project)
            .collect();
        tasks.sort_by(by_task_order);
        tasks
    }

    pub fn tasks_by_user_story(&self, story: UserStoryId) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| t.user_story_id == Some(story))
            .collect();
        tasks.sort_by(by_task_order);
        tasks
    }

    pub fn tasks_by_sprint(&self, sprint: SprintId) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| t.sprint_id == Some(sprint))
            .collect();
        tasks.sort_by(by_task_order);
        tasks
    }

    /// Tasks in the sprint that belong to no user story.
    pub fn storyless_tasks(&self, sprint: SprintId) -> Vec<&Task> {
        self.tasks_by_sprint(sprint)
            .into_iter()
            .filter(|t| t.user_story_id.is_none())
            .collect()
    }

    /// Board of a sprint. A story's row shows only its tasks in this sprint.
    pub fn taskboard(&self, sprint_id: SprintId) -> ScrumResult<Taskboard<'_>> {
        let sprint = self.require_sprint(sprint_id)?;
        let sprint_tasks = self.tasks_by_sprint(sprint_id);

        let rows = self
            .user_stories_by_sprint(sprint_id)
            .into_iter()
            .map(|story| {
                let tasks: Vec<&Task> = sprint_tasks
                    .iter()
                    .copied()
                    .filter(|t| t.user_story_id == Some(story.user_story_id))
                    .collect();
                TaskboardRow {
                    user_story: story,
                    columns: columns(&tasks),
                }
            })
            .collect();

        let storyless: Vec<&Task> = sprint_tasks
            .iter()
            .copied()
            .filter(|t| t.user_story_id.is_none())
            .collect();

        Ok(Taskboard {
            sprint,
            rows,
            storyless: columns(&storyless),
            stats: self.sprint_stats(sprint_id)?,
        })
    }

    // === Sprints ===

    pub fn sprints_for_project(&self, project: ProjectId) -> Vec<&Sprint> {
        let mut sprints: Vec<&Sprint> = self
            .sprints
            .values()
            .filter(|s| s.project_id == project)
            .collect();
        sprints.sort_by(by_sprint_order);
        sprints
    }

    /// Why `[start, end]` cannot be used for a sprint of the project, if it
    /// cannot. `exclude` skips the sprint being edited.
    pub fn sprint_date_conflict(
        &self,
        project: ProjectId,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<SprintId>,
    ) -> Option<String> {
        if end <= start {
            return Some("end date must be after the start date".to_string());
        }
        self.sprints_for_project(project)
            .into_iter()
            .filter(|s| Some(s.sprint_id) != exclude)
            .find(|s| s.overlaps(start, end))
            .map(|s| {
                format!(
                    "dates overlap sprint \"{}\" ({} to {})",
                    s.name, s.start_date, s.end_date
                )
            })
    }

    /// Dates for the next sprint: the day after the latest sprint ends, or
    /// `today` when the project has none, spanning `sprint_length_days`.
    pub fn suggested_sprint_dates(
        &self,
        project: ProjectId,
        today: NaiveDate,
    ) -> ScrumResult<(NaiveDate, NaiveDate)> {
        self.require_project(project)?;
        let start = self
            .sprints_for_project(project)
            .iter()
            .map(|s| s.end_date)
            .max()
            .and_then(|last_end| last_end.succ_opt())
            .unwrap_or(today);
        let span = u64::from(self.config.sprint_length_days.saturating_sub(1));
        let end = start.checked_add_days(Days::new(span)).unwrap_or(start);
        Ok((start, end))
    }

    // === Issues ===

    pub fn issues_for_project(&self, project: ProjectId) -> Vec<&Issue> {
        let mut issues: Vec<&Issue> = self
            .issues
            .values()
            .filter(|i| i.project_id == project)
            .collect();
        issues.sort_by(by_issue_order);
        issues
    }

    pub fn filter_issues(&self, project: ProjectId, filter: &IssueFilter) -> Vec<&Issue> {
        self.issues_for_project(project)
            .into_iter()
            .filter(|i| filter.matches(i))
            .collect()
    }

    // === Wiki ===

    pub fn wiki_pages_for_project(&self, project: ProjectId) -> Vec<&WikiPage> {
        let mut pages: Vec<&WikiPage> = self
            .wiki_pages
            .values()
            .filter(|p| p.project_id == project)
            .collect();
        pages.sort_by(|a, b| a.title.cmp(&b.title).then(a.slug.cmp(&b.slug)));
        pages
    }

    pub fn wiki_page_by_slug(&self, project: ProjectId, slug: &str) -> Option<&WikiPage> {
        self.wiki_pages
            .values()
            .find(|p| p.project_id == project && p.slug == slug)
    }

    pub fn wiki_links_for_project(&self, project: ProjectId) -> Vec<&WikiLink> {
        let mut links: Vec<&WikiLink> = self
            .wiki_links
            .values()
            .filter(|l| l.project_id == project)
            .collect();
        links.sort_by(|a, b| a.order.cmp(&b.order).then(a.wiki_link_id.cmp(&b.wiki_link_id)));
        links
    }

    // === Activity ===

    pub fn activities_for_project(&self, project: ProjectId) -> Vec<&ActivityRecord> {
        self.activity.for_project(project)
    }

    /// Timeline of one entity, whatever its type.
    pub fn activities_for_entity(&self, entity_id: uuid::Uuid) -> Vec<&ActivityRecord> {
        self.activity.for_entity(entity_id)
    }
}
