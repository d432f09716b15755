//! scrumkit Store - In-memory project store
//!
//! Owns every entity collection, allocates refs, records activity and
//! answers the derived views (backlog, taskboard, progress, search).
//! Persistence goes through the [`SnapshotStore`] trait.

pub mod activity;
pub mod input;
pub mod metrics;
pub mod mutation;
pub mod query;
pub mod refs;
pub mod search;
pub mod shared;
pub mod snapshot;

pub use activity::{describe, ActivityLog, NewActivity};
pub use input::{
    IssueUpdate, NewAttachment, NewIssue, NewProject, NewSprint, NewTag, NewTask, NewUserStory,
    NewWikiLink, NewWikiPage, ProjectUpdate, SprintUpdate, TaskUpdate, UserStoryUpdate,
    WikiLinkUpdate, WikiPageUpdate,
};
pub use metrics::{percent, BacklogStats, ProjectStats, SprintStats};
pub use mutation::attachments::AttachmentTarget;
pub use query::{BacklogFilter, IssueFilter, TaskColumns, Taskboard, TaskboardRow};
pub use refs::{RefAllocator, RefCounter};
pub use search::{parse_ref_query, SearchHit, SearchHitId, SearchScope};
pub use shared::SharedStore;
pub use snapshot::{
    JsonFileSnapshotStore, MemorySnapshotStore, SnapshotStore, StoreSnapshot,
    SNAPSHOT_FORMAT_VERSION,
};

use scrumkit_core::{
    Clock, Issue, IssueId, Project, ProjectId, RefNumber, ScrumResult, Sprint, SprintId,
    StoreConfig, SystemClock, Tag, Task, TaskId, User, UserStory, UserStoryId, WikiLink,
    WikiLinkId, WikiPage, WikiPageId,
};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// STORE
// ============================================================================

/// The project store. One instance per session; tests create as many
/// isolated instances as they need.
#[derive(Debug)]
pub struct ScrumStore {
    pub(crate) config: StoreConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) current_user: User,
    pub(crate) current_project: Option<ProjectId>,
    pub(crate) projects: HashMap<ProjectId, Project>,
    pub(crate) user_stories: HashMap<UserStoryId, UserStory>,
    pub(crate) tasks: HashMap<TaskId, Task>,
    pub(crate) sprints: HashMap<SprintId, Sprint>,
    pub(crate) issues: HashMap<IssueId, Issue>,
    pub(crate) wiki_pages: HashMap<WikiPageId, WikiPage>,
    pub(crate) wiki_links: HashMap<WikiLinkId, WikiLink>,
    pub(crate) tags: Vec<Tag>,
    pub(crate) refs: RefAllocator,
    pub(crate) activity: ActivityLog,
}

impl ScrumStore {
    /// Create an empty store with the default configuration and system clock.
    pub fn new(current_user: User) -> Self {
        Self {
            config: StoreConfig::default(),
            clock: Arc::new(SystemClock),
            current_user,
            current_project: None,
            projects: HashMap::new(),
            user_stories: HashMap::new(),
            tasks: HashMap::new(),
            sprints: HashMap::new(),
            issues: HashMap::new(),
            wiki_pages: HashMap::new(),
            wiki_links: HashMap::new(),
            tags: Vec::new(),
            refs: RefAllocator::new(),
            activity: ActivityLog::new(),
        }
    }

    /// Create an empty store with a validated configuration.
    pub fn with_config(current_user: User, config: StoreConfig) -> ScrumResult<Self> {
        config.validate()?;
        let mut store = Self::new(current_user);
        store.config = config;
        Ok(store)
    }

    /// Replace the clock used for every timestamp the store writes.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn current_user(&self) -> &User {
        &self.current_user
    }

    /// Swap the acting user. Later records and creators use the new user.
    pub fn set_current_user(&mut self, user: User) {
        tracing::debug!(user_id = %user.id, username = %user.username, "current user changed");
        self.current_user = user;
    }

    pub fn current_project(&self) -> Option<ProjectId> {
        self.current_project
    }

    /// Allocate the next ref of a project. Refs are shared by user stories,
    /// tasks and issues.
    pub fn next_ref(&mut self, project: ProjectId) -> RefNumber {
        self.refs.next_ref(project)
    }

    pub fn refs(&self) -> &RefAllocator {
        &self.refs
    }

    pub fn activity_log(&self) -> &ActivityLog {
        &self.activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrumkit_core::{ConfigError, EntityIdType, FixedClock, ScrumError, UserId};

    fn user() -> User {
        User {
            id: UserId::now_v7(),
            username: "demo".to_string(),
            full_name: "Demo User".to_string(),
            email: "demo@example.com".to_string(),
            registered_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = ScrumStore::new(user());
        assert!(store.projects.is_empty());
        assert!(store.activity_log().is_empty());
        assert!(store.current_project().is_none());
        assert_eq!(store.current_user().username, "demo");
    }

    #[test]
    fn test_with_config_validates() {
        let config = StoreConfig {
            sprint_length_days: 0,
            ..StoreConfig::default()
        };
        let result = ScrumStore::with_config(user(), config);
        assert!(matches!(
            result,
            Err(ScrumError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_with_clock_drives_timestamps() {
        let at = chrono::DateTime::from_timestamp(1_767_225_600, 0).unwrap();
        let store = ScrumStore::new(user()).with_clock(Arc::new(FixedClock(at)));
        assert_eq!(store.clock().now(), at);
    }

    #[test]
    fn test_next_ref_is_per_project() {
        let mut store = ScrumStore::new(user());
        let a = ProjectId::now_v7();
        let b = ProjectId::now_v7();
        assert_eq!(store.next_ref(a), 1);
        assert_eq!(store.next_ref(a), 2);
        assert_eq!(store.next_ref(b), 1);
        assert_eq!(store.refs().current(a), 2);
    }
}
