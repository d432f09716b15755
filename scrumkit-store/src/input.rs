//! Typed creation inputs and update patches.
//!
//! Patches use `Option<T>` for "leave unchanged" and `Option<Option<T>>` for
//! references that can be cleared.

use chrono::NaiveDate;
use scrumkit_core::{
    IssueStatus, IssueType, PointCategory, Priority, ProjectId, ProjectModules, Severity,
    SprintId, StoryPoint, Tag, UserId, UserStoryId, WorkStatus,
};

// ============================================================================
// CREATION INPUTS
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub owner: UserId,
    pub is_private: bool,
    pub modules: ProjectModules,
    /// Category names in display order. `None` uses the configured defaults.
    pub point_categories: Option<Vec<String>>,
}

impl NewProject {
    pub fn new(name: impl Into<String>, owner: UserId) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            owner,
            is_private: false,
            modules: ProjectModules::default(),
            point_categories: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn private(mut self) -> Self {
        self.is_private = true;
        self
    }

    pub fn with_point_categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.point_categories = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewUserStory {
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub status: WorkStatus,
    /// `None` gives one unknown estimate per project category.
    pub points: Option<Vec<StoryPoint>>,
    pub sprint_id: Option<SprintId>,
    pub tags: Vec<Tag>,
    pub assignees: Vec<UserId>,
    pub watchers: Vec<UserId>,
    /// `None` places the story after the last one in the project.
    pub backlog_order: Option<f64>,
    pub kanban_order: Option<f64>,
}

impl NewUserStory {
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: String::new(),
            status: WorkStatus::New,
            points: None,
            sprint_id: None,
            tags: Vec::new(),
            assignees: Vec::new(),
            watchers: Vec::new(),
            backlog_order: None,
            kanban_order: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: WorkStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_points(mut self, points: Vec<StoryPoint>) -> Self {
        self.points = Some(points);
        self
    }

    pub fn in_sprint(mut self, sprint_id: SprintId) -> Self {
        self.sprint_id = Some(sprint_id);
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_assignees(mut self, assignees: Vec<UserId>) -> Self {
        self.assignees = assignees;
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub user_story_id: Option<UserStoryId>,
    pub sprint_id: Option<SprintId>,
    pub status: WorkStatus,
    pub tags: Vec<Tag>,
    pub assignee: Option<UserId>,
    pub watchers: Vec<UserId>,
    pub order: Option<f64>,
}

impl NewTask {
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: String::new(),
            user_story_id: None,
            sprint_id: None,
            status: WorkStatus::New,
            tags: Vec::new(),
            assignee: None,
            watchers: Vec::new(),
            order: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn for_story(mut self, user_story_id: UserStoryId) -> Self {
        self.user_story_id = Some(user_story_id);
        self
    }

    pub fn in_sprint(mut self, sprint_id: SprintId) -> Self {
        self.sprint_id = Some(sprint_id);
        self
    }

    pub fn with_status(mut self, status: WorkStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assignee = Some(assignee);
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewSprint {
    pub project_id: ProjectId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Stories moved into the sprint on creation.
    pub user_story_ids: Vec<UserStoryId>,
    /// `None` appends after the project's existing sprints.
    pub order: Option<u32>,
}

impl NewSprint {
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            project_id,
            name: name.into(),
            start_date,
            end_date,
            user_story_ids: Vec::new(),
            order: None,
        }
    }

    pub fn with_user_stories(mut self, user_story_ids: Vec<UserStoryId>) -> Self {
        self.user_story_ids = user_story_ids;
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewIssue {
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub issue_type: IssueType,
    pub severity: Severity,
    pub priority: Priority,
    pub status: IssueStatus,
    pub tags: Vec<Tag>,
    pub assignee: Option<UserId>,
    pub watchers: Vec<UserId>,
    pub order: Option<f64>,
}

impl NewIssue {
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: String::new(),
            issue_type: IssueType::default(),
            severity: Severity::default(),
            priority: Priority::default(),
            status: IssueStatus::default(),
            tags: Vec::new(),
            assignee: None,
            watchers: Vec::new(),
            order: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = issue_type;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assignee = Some(assignee);
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewWikiPage {
    pub project_id: ProjectId,
    pub title: String,
    pub content: String,
    /// `None` derives the slug from the title.
    pub slug: Option<String>,
    pub watchers: Vec<UserId>,
}

impl NewWikiPage {
    pub fn new(project_id: ProjectId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            content: content.into(),
            slug: None,
            watchers: Vec::new(),
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewWikiLink {
    pub project_id: ProjectId,
    pub title: String,
    /// Slug of the page the link opens.
    pub href: String,
    pub order: Option<u32>,
}

impl NewWikiLink {
    pub fn new(project_id: ProjectId, title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            href: href.into(),
            order: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub color: String,
}

impl NewTag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub filename: String,
    pub url: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub description: Option<String>,
}

impl NewAttachment {
    pub fn new(filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            url: url.into(),
            mime_type: "application/octet-stream".to_string(),
            size_bytes: 0,
            description: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }
}

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for projects.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Renaming never re-slugs; the slug changes only through this field.
    pub slug: Option<String>,
    pub is_private: Option<bool>,
    pub is_archived: Option<bool>,
    pub modules: Option<ProjectModules>,
    pub point_categories: Option<Vec<PointCategory>>,
    pub public_permissions: Option<Vec<String>>,
    pub anonymous_permissions: Option<Vec<String>>,
}

/// Update payload for user stories.
#[derive(Debug, Clone, Default)]
pub struct UserStoryUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    /// Replaces the whole estimate; the cached total is recomputed.
    pub points: Option<Vec<StoryPoint>>,
    pub sprint_id: Option<Option<SprintId>>,
    pub tags: Option<Vec<Tag>>,
    pub assignees: Option<Vec<UserId>>,
    pub watchers: Option<Vec<UserId>>,
    pub backlog_order: Option<f64>,
    pub kanban_order: Option<f64>,
}

/// Update payload for tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub user_story_id: Option<Option<UserStoryId>>,
    pub sprint_id: Option<Option<SprintId>>,
    pub tags: Option<Vec<Tag>>,
    pub assignee: Option<Option<UserId>>,
    pub watchers: Option<Vec<UserId>>,
    pub order: Option<f64>,
}

/// Update payload for sprints.
#[derive(Debug, Clone, Default)]
pub struct SprintUpdate {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_closed: Option<bool>,
    pub order: Option<u32>,
}

/// Update payload for issues.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub issue_type: Option<IssueType>,
    pub severity: Option<Severity>,
    pub priority: Option<Priority>,
    pub status: Option<IssueStatus>,
    pub tags: Option<Vec<Tag>>,
    pub assignee: Option<Option<UserId>>,
    pub watchers: Option<Vec<UserId>>,
    pub order: Option<f64>,
}

/// Update payload for wiki pages.
#[derive(Debug, Clone, Default)]
pub struct WikiPageUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
    pub watchers: Option<Vec<UserId>>,
}

/// Update payload for wiki links.
#[derive(Debug, Clone, Default)]
pub struct WikiLinkUpdate {
    pub title: Option<String>,
    pub href: Option<String>,
    pub order: Option<u32>,
}
