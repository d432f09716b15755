//! Persistence boundary.
//!
//! The whole store serializes to a [`StoreSnapshot`]; a [`SnapshotStore`]
//! backend reads and writes it. Saving never touches in-memory state, so a
//! failed save leaves the store exactly as it was.

use crate::activity::ActivityLog;
use crate::refs::{RefAllocator, RefCounter};
use crate::ScrumStore;
use scrumkit_core::{
    total_points, ActivityRecord, Issue, Project, ProjectId, ScrumError, ScrumResult, Sprint,
    StorageError, StoreConfig, Tag, Task, User, UserStory, WikiLink, WikiPage,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::hash::Hash;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::info;

/// Version written into new snapshots.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Serialized form of a whole store. Collections are sorted by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub format_version: u32,
    pub projects: Vec<Project>,
    pub user_stories: Vec<UserStory>,
    pub tasks: Vec<Task>,
    pub sprints: Vec<Sprint>,
    pub issues: Vec<Issue>,
    pub wiki_pages: Vec<WikiPage>,
    pub wiki_links: Vec<WikiLink>,
    pub tags: Vec<Tag>,
    pub ref_counters: Vec<RefCounter>,
    pub current_user: User,
    pub current_project: Option<ProjectId>,
    /// Most recent first.
    pub activities: Vec<ActivityRecord>,
}

fn persistence(reason: impl Into<String>) -> ScrumError {
    ScrumError::Storage(StorageError::PersistenceFailed {
        reason: reason.into(),
    })
}

// ============================================================================
// BACKENDS
// ============================================================================

/// Where snapshots live.
pub trait SnapshotStore: Send + Sync {
    /// The last saved snapshot, or `None` if nothing was saved yet.
    fn load(&self) -> ScrumResult<Option<StoreSnapshot>>;

    fn save(&self, snapshot: &StoreSnapshot) -> ScrumResult<()>;
}

/// In-memory backend for tests.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: RwLock<Option<StoreSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.read().map(|slot| slot.is_none()).unwrap_or(true)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> ScrumResult<Option<StoreSnapshot>> {
        let slot = self.slot.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(slot.clone())
    }

    fn save(&self, snapshot: &StoreSnapshot) -> ScrumResult<()> {
        let mut slot = self.slot.write().map_err(|_| StorageError::LockPoisoned)?;
        *slot = Some(snapshot.clone());
        Ok(())
    }
}

/// JSON file backend. Writes go to a sibling temporary file that is then
/// renamed over the target, so readers never see a partial document.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> ScrumResult<Option<StoreSnapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(persistence(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        let snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| persistence(format!("parsing {}: {}", self.path.display(), e)))?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &StoreSnapshot) -> ScrumResult<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| persistence(format!("serializing snapshot: {}", e)))?;
        let temp = self.temp_path();
        if let Err(e) = write_synced(&temp, &bytes) {
            let _ = fs::remove_file(&temp);
            return Err(persistence(format!("writing {}: {}", temp.display(), e)));
        }
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(persistence(format!(
                "renaming {} to {}: {}",
                temp.display(),
                self.path.display(),
                e
            )));
        }
        Ok(())
    }
}

/// Write and fsync, so the rename never exposes a partial file.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

// ============================================================================
// STORE <-> SNAPSHOT
// ============================================================================

fn sorted<K: Ord + Copy + Hash, V: Clone>(map: &HashMap<K, V>) -> Vec<V> {
    let mut keys: Vec<&K> = map.keys().collect();
    keys.sort();
    keys.into_iter().filter_map(|k| map.get(k).cloned()).collect()
}

/// Mirror holding exactly `members`: stored order first, each id once,
/// then members the stored list was missing.
fn rebuild_mirror<T: Copy + Eq + Hash>(stored: &[T], members: &[T]) -> Vec<T> {
    let wanted: HashSet<T> = members.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut mirror: Vec<T> = stored
        .iter()
        .copied()
        .filter(|id| wanted.contains(id) && seen.insert(*id))
        .collect();
    mirror.extend(members.iter().copied().filter(|id| seen.insert(*id)));
    mirror
}

impl ScrumStore {
    /// Capture the full store state.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            projects: sorted(&self.projects),
            user_stories: sorted(&self.user_stories),
            tasks: sorted(&self.tasks),
            sprints: sorted(&self.sprints),
            issues: sorted(&self.issues),
            wiki_pages: sorted(&self.wiki_pages),
            wiki_links: sorted(&self.wiki_links),
            tags: self.tags.clone(),
            ref_counters: self.refs.counters(),
            current_user: self.current_user.clone(),
            current_project: self.current_project,
            activities: self.activity.iter().cloned().collect(),
        }
    }

    /// Rebuild a store from a snapshot.
    ///
    /// Mirror lists and cached point totals are recomputed from the
    /// authoritative fields, and each ref counter is raised to at least the
    /// highest ref present in its project.
    pub fn from_snapshot(snapshot: StoreSnapshot, config: StoreConfig) -> ScrumResult<Self> {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(persistence(format!(
                "unsupported snapshot format {} (expected {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        let mut store = ScrumStore::with_config(snapshot.current_user, config)?;
        store.projects = snapshot
            .projects
            .into_iter()
            .map(|p| (p.project_id, p))
            .collect();
        store.user_stories = snapshot
            .user_stories
            .into_iter()
            .map(|s| (s.user_story_id, s))
            .collect();
        store.tasks = snapshot.tasks.into_iter().map(|t| (t.task_id, t)).collect();
        store.sprints = snapshot
            .sprints
            .into_iter()
            .map(|s| (s.sprint_id, s))
            .collect();
        store.issues = snapshot
            .issues
            .into_iter()
            .map(|i| (i.issue_id, i))
            .collect();
        store.wiki_pages = snapshot
            .wiki_pages
            .into_iter()
            .map(|p| (p.wiki_page_id, p))
            .collect();
        store.wiki_links = snapshot
            .wiki_links
            .into_iter()
            .map(|l| (l.wiki_link_id, l))
            .collect();
        store.tags = snapshot.tags;
        store.refs = RefAllocator::from_counters(&snapshot.ref_counters);
        store.activity = ActivityLog::from_records(snapshot.activities);
        store.current_project = snapshot
            .current_project
            .filter(|id| store.projects.contains_key(id));

        store.rebuild_derived_fields();
        Ok(store)
    }

    fn rebuild_derived_fields(&mut self) {
        for story in self.user_stories.values_mut() {
            story.total_points = total_points(&story.points);
        }

        // References to entities missing from the snapshot are dropped.
        let sprint_ids: HashSet<_> = self.sprints.keys().copied().collect();
        for story in self.user_stories.values_mut() {
            story.sprint_id = story.sprint_id.filter(|id| sprint_ids.contains(id));
        }
        let story_ids: HashSet<_> = self.user_stories.keys().copied().collect();
        for task in self.tasks.values_mut() {
            task.sprint_id = task.sprint_id.filter(|id| sprint_ids.contains(id));
            task.user_story_id = task.user_story_id.filter(|id| story_ids.contains(id));
        }

        let mut story_sprints: Vec<_> = self
            .user_stories
            .values()
            .filter_map(|s| s.sprint_id.map(|sprint| (s.user_story_id, sprint)))
            .collect();
        story_sprints.sort();
        for sprint in self.sprints.values_mut() {
            let members: Vec<_> = story_sprints
                .iter()
                .filter(|(_, sprint_id)| *sprint_id == sprint.sprint_id)
                .map(|(id, _)| *id)
                .collect();
            sprint.user_story_ids = rebuild_mirror(&sprint.user_story_ids, &members);
        }

        let mut task_stories: Vec<_> = self
            .tasks
            .values()
            .filter_map(|t| t.user_story_id.map(|story| (t.task_id, story)))
            .collect();
        task_stories.sort();
        for story in self.user_stories.values_mut() {
            let members: Vec<_> = task_stories
                .iter()
                .filter(|(_, story_id)| *story_id == story.user_story_id)
                .map(|(id, _)| *id)
                .collect();
            story.task_ids = rebuild_mirror(&story.task_ids, &members);
        }

        let refs = self
            .user_stories
            .values()
            .map(|s| (s.project_id, s.reference))
            .chain(self.tasks.values().map(|t| (t.project_id, t.reference)))
            .chain(self.issues.values().map(|i| (i.project_id, i.reference)));
        for (project, reference) in refs {
            self.refs.seed(project, reference);
        }
    }

    /// Write the current state to a backend.
    pub fn save_to(&self, backend: &dyn SnapshotStore) -> ScrumResult<()> {
        let snapshot = self.snapshot();
        backend.save(&snapshot)?;
        info!(
            projects = snapshot.projects.len(),
            user_stories = snapshot.user_stories.len(),
            activities = snapshot.activities.len(),
            "store snapshot saved"
        );
        Ok(())
    }

    /// Rehydrate from a backend, or start empty when nothing was saved.
    ///
    /// The injected user replaces whichever user the snapshot recorded.
    pub fn open(
        backend: &dyn SnapshotStore,
        current_user: User,
        config: StoreConfig,
    ) -> ScrumResult<Self> {
        match backend.load()? {
            Some(snapshot) => {
                let mut store = Self::from_snapshot(snapshot, config)?;
                store.current_user = current_user;
                info!(
                    projects = store.projects.len(),
                    user_stories = store.user_stories.len(),
                    "store snapshot loaded"
                );
                Ok(store)
            }
            None => {
                info!("no snapshot found, starting empty");
                Self::with_config(current_user, config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{NewProject, NewSprint, NewTask, NewUserStory};
    use chrono::NaiveDate;
    use scrumkit_core::{EntityIdType, UserId};

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
    fn test_memory_backend_roundtrip() {
        let backend = MemorySnapshotStore::new();
        assert!(backend.is_empty());
        assert!(backend.load().unwrap().is_none());

        let mut store = ScrumStore::new(user());
        let owner = store.current_user().id;
        let project = store.create_project(NewProject::new("Demo", owner)).unwrap();
        store
            .create_user_story(NewUserStory::new(project, "Login"))
            .unwrap();
        store.save_to(&backend).unwrap();

        let restored =
            ScrumStore::open(&backend, store.current_user().clone(), StoreConfig::default())
                .unwrap();
        assert_eq!(restored.snapshot(), store.snapshot());
    }

    #[test]
    fn test_rejects_unknown_format_version() {
        let mut snapshot = ScrumStore::new(user()).snapshot();
        snapshot.format_version = 99;
        let err = ScrumStore::from_snapshot(snapshot, StoreConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ScrumError::Storage(StorageError::PersistenceFailed { .. })
        ));
    }

    #[test]
    fn test_load_repairs_mirrors_and_counters() {
        let mut store = ScrumStore::new(user());
        let owner = store.current_user().id;
        let project = store.create_project(NewProject::new("Demo", owner)).unwrap();
        let story = store
            .create_user_story(NewUserStory::new(project, "Login"))
            .unwrap();
        let task = store
            .create_task(NewTask::new(project, "Build form").for_story(story))
            .unwrap();

        let mut snapshot = store.snapshot();
        snapshot.ref_counters.clear();
        snapshot.user_stories[0].task_ids.clear();
        snapshot.user_stories[0].total_points = 999;

        let mut restored = ScrumStore::from_snapshot(snapshot, StoreConfig::default()).unwrap();
        let restored_story = restored.user_story(story).unwrap();
        assert_eq!(restored_story.task_ids, vec![task]);
        assert_eq!(restored_story.total_points, 0);
        assert_eq!(restored.next_ref(project), 3);
    }

    #[test]
    fn test_open_with_empty_backend_starts_fresh() {
        let backend = MemorySnapshotStore::new();
        let store = ScrumStore::open(&backend, user(), StoreConfig::default()).unwrap();
        assert!(store.projects().is_empty());
        assert!(store.refs().counters().is_empty());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let backend = JsonFileSnapshotStore::new("/tmp/data/store.json");
        assert_eq!(backend.temp_path(), PathBuf::from("/tmp/data/store.json.tmp"));
        assert_eq!(backend.path(), Path::new("/tmp/data/store.json"));
    }

    #[test]
    fn test_unknown_current_project_is_dropped() {
        let mut snapshot = ScrumStore::new(user()).snapshot();
        snapshot.current_project = Some(ProjectId::now_v7());
        let store = ScrumStore::from_snapshot(snapshot, StoreConfig::default()).unwrap();
        assert!(store.current_project().is_none());
    }

    #[test]
    fn test_load_collapses_duplicate_mirror_entries() {
        let mut store = ScrumStore::new(user());
        let owner = store.current_user().id;
        let project = store.create_project(NewProject::new("Demo", owner)).unwrap();
        let a = store
            .create_user_story(NewUserStory::new(project, "A"))
            .unwrap();
        let b = store
            .create_user_story(NewUserStory::new(project, "B"))
            .unwrap();
        let sprint = store
            .create_sprint(
                NewSprint::new(
                    project,
                    "Sprint 1",
                    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2026, 1, 14).unwrap(),
                )
                .with_user_stories(vec![a, b]),
            )
            .unwrap();

        let mut snapshot = store.snapshot();
        snapshot.sprints[0].user_story_ids = vec![a, b, a];

        let restored = ScrumStore::from_snapshot(snapshot, StoreConfig::default()).unwrap();
        assert_eq!(restored.sprint(sprint).unwrap().user_story_ids, vec![a, b]);
    }

    #[test]
    fn test_load_clears_references_to_missing_entities() {
        let mut store = ScrumStore::new(user());
        let owner = store.current_user().id;
        let project = store.create_project(NewProject::new("Demo", owner)).unwrap();
        let sprint = store
            .create_sprint(NewSprint::new(
                project,
                "Sprint 1",
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 14).unwrap(),
            ))
            .unwrap();
        let story = store
            .create_user_story(NewUserStory::new(project, "Login").in_sprint(sprint))
            .unwrap();
        store
            .create_user_story(NewUserStory::new(project, "Logout").in_sprint(sprint))
            .unwrap();
        let task = store
            .create_task(NewTask::new(project, "Form").for_story(story).in_sprint(sprint))
            .unwrap();

        let mut snapshot = store.snapshot();
        snapshot.sprints.clear();
        snapshot.user_stories.retain(|s| s.user_story_id != story);

        let restored = ScrumStore::from_snapshot(snapshot, StoreConfig::default()).unwrap();
        assert_eq!(restored.backlog(project).len(), 1);
        assert!(restored.user_stories.values().all(|s| s.sprint_id.is_none()));
        let task = restored.task(task).unwrap();
        assert_eq!(task.sprint_id, None);
        assert_eq!(task.user_story_id, None);
    }

    #[test]
    fn test_failed_file_save_leaves_no_temp_file() {
        let dir = std::env::temp_dir().join(format!("scrumkit-{}", ProjectId::now_v7()));
        let backend = JsonFileSnapshotStore::new(dir.join("store.json"));
        let err = backend.save(&ScrumStore::new(user()).snapshot()).unwrap_err();
        assert!(matches!(
            err,
            ScrumError::Storage(StorageError::PersistenceFailed { .. })
        ));
        assert!(!backend.temp_path().exists());
    }

    #[test]
    fn test_rebuild_mirror_keeps_stored_order() {
        assert_eq!(rebuild_mirror(&[3, 1, 3, 9], &[1, 2, 3]), vec![3, 1, 2]);
        assert!(rebuild_mirror::<u8>(&[4, 4], &[]).is_empty());
    }
}
