//! Property-Based Tests for Relational Consistency
//!
//! For any sequence of creates, moves, relinks and deletes:
//! - Every sprint's story list mirrors the stories pointing at it
//! - Every story's task list mirrors the tasks pointing at it
//! - No story or task points at a deleted sprint or story
//! - Refs within the project stay unique and never exceed the counter

use chrono::NaiveDate;
use proptest::prelude::*;
use scrumkit_test_utils::assertions::*;
use scrumkit_test_utils::fixtures::*;
use scrumkit_test_utils::generators::*;
use scrumkit_test_utils::*;

fn pick<T: Copy>(items: &[T], index: usize) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[index % items.len()])
    }
}

/// Apply one op; expected failures (empty pools) are skipped.
fn apply(
    store: &mut ScrumStore,
    project: ProjectId,
    op: &StoreOp,
    next_start: &mut NaiveDate,
) -> Result<(), TestCaseError> {
    let stories: Vec<UserStoryId> = store
        .user_stories_for_project(project)
        .iter()
        .map(|s| s.user_story_id)
        .collect();
    let tasks: Vec<TaskId> = store
        .tasks_for_project(project)
        .iter()
        .map(|t| t.task_id)
        .collect();
    let sprints: Vec<SprintId> = store
        .sprints_for_project(project)
        .iter()
        .map(|s| s.sprint_id)
        .collect();

    let result = match op {
        StoreOp::CreateStory { sprint } => {
            let mut input = NewUserStory::new(project, "Story");
            if let Some(sprint) = sprint.and_then(|i| pick(&sprints, i)) {
                input = input.in_sprint(sprint);
            }
            store.create_user_story(input).map(|_| ())
        }
        StoreOp::CreateTask { story, sprint } => {
            let mut input = NewTask::new(project, "Task");
            if let Some(story) = story.and_then(|i| pick(&stories, i)) {
                input = input.for_story(story);
            }
            if let Some(sprint) = sprint.and_then(|i| pick(&sprints, i)) {
                input = input.in_sprint(sprint);
            }
            store.create_task(input).map(|_| ())
        }
        StoreOp::CreateSprint => {
            let start = *next_start;
            let end = start + chrono::Days::new(13);
            *next_start = end + chrono::Days::new(1);
            store
                .create_sprint(NewSprint::new(project, "Sprint", start, end))
                .map(|_| ())
        }
        StoreOp::MoveStory { story, sprint } => match pick(&stories, *story) {
            Some(story) => {
                let sprint = sprint.and_then(|i| pick(&sprints, i));
                store.move_user_stories_to_sprint(&[story], sprint)
            }
            None => Ok(()),
        },
        StoreOp::RelinkTask { task, story } => match pick(&tasks, *task) {
            Some(task) => store.update_task(
                task,
                TaskUpdate {
                    user_story_id: Some(story.and_then(|i| pick(&stories, i))),
                    ..TaskUpdate::default()
                },
            ),
            None => Ok(()),
        },
        StoreOp::SetTaskStatus { task, status } => match pick(&tasks, *task) {
            Some(task) => store.update_task(
                task,
                TaskUpdate {
                    status: Some(*status),
                    ..TaskUpdate::default()
                },
            ),
            None => Ok(()),
        },
        StoreOp::DeleteStory { story } => match pick(&stories, *story) {
            Some(story) => store.delete_user_story(story),
            None => Ok(()),
        },
        StoreOp::DeleteTask { task } => match pick(&tasks, *task) {
            Some(task) => store.delete_task(task),
            None => Ok(()),
        },
        StoreOp::DeleteSprint { sprint } => match pick(&sprints, *sprint) {
            Some(sprint) => store.delete_sprint(sprint),
            None => Ok(()),
        },
    };
    result.map_err(|e| TestCaseError::fail(format!("{:?} failed: {}", op, e)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_mirrors_stay_consistent(ops in arb_store_ops(40)) {
        let (mut store, project) = store_with_demo_project();
        let mut next_start = date(2026, 1, 1);
        for op in &ops {
            apply(&mut store, project, op, &mut next_start)?;
        }
        assert_relations_consistent(&store);
        assert_refs_unique(&store, project);
    }

    #[test]
    fn prop_progress_is_bounded(ops in arb_store_ops(30)) {
        let (mut store, project) = store_with_demo_project();
        let mut next_start = date(2026, 1, 1);
        for op in &ops {
            apply(&mut store, project, op, &mut next_start)?;
        }
        let sprints: Vec<SprintId> = store
            .sprints_for_project(project)
            .iter()
            .map(|s| s.sprint_id)
            .collect();
        for sprint in sprints {
            prop_assert!(store.sprint_story_progress(sprint).unwrap() <= 100);
            prop_assert!(store.sprint_task_progress(sprint).unwrap() <= 100);
        }
        prop_assert!(store.backlog_stats(project).unwrap().progress() <= 100);
    }

    #[test]
    fn prop_snapshot_reload_is_lossless(ops in arb_store_ops(30)) {
        let (mut store, project) = store_with_demo_project();
        let mut next_start = date(2026, 1, 1);
        for op in &ops {
            apply(&mut store, project, op, &mut next_start)?;
        }
        let snapshot = store.snapshot();
        let reloaded = ScrumStore::from_snapshot(snapshot.clone(), StoreConfig::default()).unwrap();
        prop_assert_eq!(reloaded.snapshot(), snapshot);
    }
}
