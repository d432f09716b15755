//! scrumkit Test Utilities
//!
//! Shared test infrastructure for the scrumkit workspace:
//! - Proptest generators for enums, estimates, dates and mutation sequences
//! - Fixtures for users, stores and the demo project
//! - Custom assertions for store errors and relational consistency
//! - A tracing subscriber for test output

pub use scrumkit_core::*;
pub use scrumkit_store::*;

use chrono::{NaiveDate, Utc};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

// ============================================================================
// TRACING
// ============================================================================

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process. Honors `RUST_LOG`,
/// defaulting to `warn`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for scrumkit types.

    use super::*;
    use proptest::prelude::*;

    // === Enum Generators ===

    pub fn arb_work_status() -> impl Strategy<Value = WorkStatus> {
        prop::sample::select(WorkStatus::ALL)
    }

    pub fn arb_issue_status() -> impl Strategy<Value = IssueStatus> {
        prop::sample::select(IssueStatus::ALL)
    }

    pub fn arb_issue_type() -> impl Strategy<Value = IssueType> {
        prop::sample::select(IssueType::ALL)
    }

    pub fn arb_severity() -> impl Strategy<Value = Severity> {
        prop::sample::select(Severity::ALL)
    }

    pub fn arb_priority() -> impl Strategy<Value = Priority> {
        prop::sample::select(Priority::ALL)
    }

    // === Value Generators ===

    /// Non-blank single-line title.
    pub fn arb_title() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,39}"
    }

    const POINT_SCALE: &[u32] = &[0, 1, 2, 3, 5, 8, 10, 13, 20, 40];

    /// One estimate slot: unknown about a third of the time.
    pub fn arb_point_value() -> impl Strategy<Value = Option<u32>> {
        prop_oneof![
            1 => Just(None),
            2 => prop::sample::select(POINT_SCALE).prop_map(Some),
        ]
    }

    /// One estimate per given category.
    pub fn arb_story_points(
        categories: Vec<PointCategoryId>,
    ) -> impl Strategy<Value = Vec<StoryPoint>> {
        let n = categories.len();
        prop::collection::vec(arb_point_value(), n).prop_map(move |values| {
            categories
                .iter()
                .zip(values)
                .map(|(category, value)| StoryPoint::new(*category, value))
                .collect()
        })
    }

    /// A valid (start, end) pair in 2026 with end after start.
    pub fn arb_sprint_range() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
        (0u64..300, 1u64..30).prop_map(|(offset, length)| {
            let base = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default();
            let start = base
                .checked_add_days(chrono::Days::new(offset))
                .unwrap_or(base);
            let end = start
                .checked_add_days(chrono::Days::new(length))
                .unwrap_or(start);
            (start, end)
        })
    }

    pub fn arb_valid_config() -> impl Strategy<Value = StoreConfig> {
        (
            2u32..60,
            prop_oneof![
                Just(SprintDatePolicy::Enforced),
                Just(SprintDatePolicy::Advisory)
            ],
            any::<bool>(),
            1usize..1000,
        )
            .prop_map(|(days, policy, record, snippet)| StoreConfig {
                sprint_length_days: days,
                sprint_date_policy: policy,
                record_activity: record,
                search_snippet_chars: snippet,
                ..StoreConfig::default()
            })
    }

    // === Mutation Sequences ===

    /// One step of a random workload. Indices pick among the entities
    /// created so far, modulo their count.
    #[derive(Debug, Clone)]
    pub enum StoreOp {
        CreateStory { sprint: Option<usize> },
        CreateTask { story: Option<usize>, sprint: Option<usize> },
        CreateSprint,
        MoveStory { story: usize, sprint: Option<usize> },
        RelinkTask { task: usize, story: Option<usize> },
        SetTaskStatus { task: usize, status: WorkStatus },
        DeleteStory { story: usize },
        DeleteTask { task: usize },
        DeleteSprint { sprint: usize },
    }

    pub fn arb_store_op() -> impl Strategy<Value = StoreOp> {
        let idx = || 0usize..16;
        prop_oneof![
            3 => prop::option::of(idx()).prop_map(|sprint| StoreOp::CreateStory { sprint }),
            3 => (prop::option::of(idx()), prop::option::of(idx()))
                .prop_map(|(story, sprint)| StoreOp::CreateTask { story, sprint }),
            1 => Just(StoreOp::CreateSprint),
            2 => (idx(), prop::option::of(idx()))
                .prop_map(|(story, sprint)| StoreOp::MoveStory { story, sprint }),
            2 => (idx(), prop::option::of(idx()))
                .prop_map(|(task, story)| StoreOp::RelinkTask { task, story }),
            2 => (idx(), arb_work_status())
                .prop_map(|(task, status)| StoreOp::SetTaskStatus { task, status }),
            1 => idx().prop_map(|story| StoreOp::DeleteStory { story }),
            1 => idx().prop_map(|task| StoreOp::DeleteTask { task }),
            1 => idx().prop_map(|sprint| StoreOp::DeleteSprint { sprint }),
        ]
    }

    pub fn arb_store_ops(max: usize) -> impl Strategy<Value = Vec<StoreOp>> {
        prop::collection::vec(arb_store_op(), 1..max)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;

    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    pub fn user(username: &str) -> User {
        User {
            id: UserId::now_v7(),
            username: username.to_string(),
            full_name: String::new(),
            email: format!("{}@example.com", username),
            registered_at: Utc::now(),
        }
    }

    pub fn demo_user() -> User {
        User {
            full_name: "Demo User".to_string(),
            ..user("demo")
        }
    }

    /// Empty store with default config and a stepping clock, so every
    /// timestamp it writes is distinct and increasing.
    pub fn store() -> ScrumStore {
        ScrumStore::new(demo_user()).with_clock(Arc::new(StepClock::starting_2026()))
    }

    pub fn store_with(config: StoreConfig) -> ScrumStore {
        ScrumStore::with_config(demo_user(), config)
            .unwrap_or_else(|e| panic!("invalid test config: {}", e))
            .with_clock(Arc::new(StepClock::starting_2026()))
    }

    /// Store holding one "Demo" project owned by the current user.
    pub fn store_with_demo_project() -> (ScrumStore, ProjectId) {
        let mut store = store();
        let owner = store.current_user().id;
        let project = store
            .create_project(NewProject::new("Demo", owner))
            .unwrap_or_else(|e| panic!("demo project: {}", e));
        (store, project)
    }

    /// Category id of the project by name.
    pub fn category(store: &ScrumStore, project: ProjectId, name: &str) -> PointCategoryId {
        store
            .project(project)
            .and_then(|p| p.point_categories.iter().find(|c| c.name == name))
            .map(|c| c.id)
            .unwrap_or_else(|| panic!("no point category named {}", name))
    }

    /// Estimates by category name; unlisted categories stay unknown.
    pub fn points(
        store: &ScrumStore,
        project: ProjectId,
        values: &[(&str, Option<u32>)],
    ) -> Vec<StoryPoint> {
        values
            .iter()
            .map(|(name, value)| StoryPoint::new(category(store, project, name), *value))
            .collect()
    }

    pub fn sprint_january(project: ProjectId) -> NewSprint {
        NewSprint::new(project, "Sprint 1", date(2026, 1, 1), date(2026, 1, 14))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for scrumkit results and store consistency.

    use super::*;
    use std::collections::HashSet;

    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &ScrumResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &ScrumResult<T>, entity_type: EntityType) {
        match result {
            Err(ScrumError::Storage(StorageError::NotFound {
                entity_type: et, ..
            })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!(
                "Expected NotFound error for {:?}, got: {:?}",
                entity_type, other
            ),
        }
    }

    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &ScrumResult<T>) {
        match result {
            Err(ScrumError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_constraint<T: std::fmt::Debug>(result: &ScrumResult<T>, name: &str) {
        match result {
            Err(ScrumError::Validation(ValidationError::ConstraintViolation {
                constraint, ..
            })) => {
                assert_eq!(constraint, name, "Wrong constraint in violation");
            }
            other => panic!("Expected {} constraint violation, got: {:?}", name, other),
        }
    }

    /// Mirror lists match the authoritative references, cached totals match
    /// the estimates, and no reference dangles.
    #[track_caller]
    pub fn assert_relations_consistent(store: &ScrumStore) {
        let snapshot = store.snapshot();
        let story_ids: HashSet<UserStoryId> = snapshot
            .user_stories
            .iter()
            .map(|s| s.user_story_id)
            .collect();
        let sprint_ids: HashSet<SprintId> =
            snapshot.sprints.iter().map(|s| s.sprint_id).collect();

        for sprint in &snapshot.sprints {
            let mut expected: Vec<UserStoryId> = snapshot
                .user_stories
                .iter()
                .filter(|s| s.sprint_id == Some(sprint.sprint_id))
                .map(|s| s.user_story_id)
                .collect();
            let mut actual = sprint.user_story_ids.clone();
            expected.sort();
            actual.sort();
            assert_eq!(actual, expected, "sprint {} mirror out of sync", sprint.name);
        }

        for story in &snapshot.user_stories {
            assert_eq!(
                story.total_points,
                total_points(&story.points),
                "story #{} cached total is stale",
                story.reference
            );
            if let Some(sprint) = story.sprint_id {
                assert!(
                    sprint_ids.contains(&sprint),
                    "story #{} points at a missing sprint",
                    story.reference
                );
            }
            let mut expected: Vec<TaskId> = snapshot
                .tasks
                .iter()
                .filter(|t| t.user_story_id == Some(story.user_story_id))
                .map(|t| t.task_id)
                .collect();
            let mut actual = story.task_ids.clone();
            expected.sort();
            actual.sort();
            assert_eq!(
                actual, expected,
                "story #{} task mirror out of sync",
                story.reference
            );
        }

        for task in &snapshot.tasks {
            if let Some(story) = task.user_story_id {
                assert!(
                    story_ids.contains(&story),
                    "task #{} points at a missing story",
                    task.reference
                );
            }
            if let Some(sprint) = task.sprint_id {
                assert!(
                    sprint_ids.contains(&sprint),
                    "task #{} points at a missing sprint",
                    task.reference
                );
            }
        }
    }

    /// No two stories, tasks or issues of the project share a ref, and none
    /// is above the counter.
    #[track_caller]
    pub fn assert_refs_unique(store: &ScrumStore, project: ProjectId) {
        let refs: Vec<RefNumber> = store
            .user_stories_for_project(project)
            .iter()
            .map(|s| s.reference)
            .chain(store.tasks_for_project(project).iter().map(|t| t.reference))
            .chain(store.issues_for_project(project).iter().map(|i| i.reference))
            .collect();
        let unique: HashSet<RefNumber> = refs.iter().copied().collect();
        assert_eq!(unique.len(), refs.len(), "duplicate refs in {:?}", refs);
        let counter = store.refs().current(project);
        assert!(
            refs.iter().all(|r| *r >= 1 && *r <= counter),
            "ref outside 1..={} in {:?}",
            counter,
            refs
        );
    }
}
