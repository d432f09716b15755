//! Project-scoped reference allocation.
//!
//! User stories, tasks and issues of one project share a single counter, so
//! `#12` names exactly one entity in that project. Refs are never reused,
//! even after the entity that held them is deleted.

use scrumkit_core::{ProjectId, RefNumber};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Persisted form of one project counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefCounter {
    pub project_id: ProjectId,
    /// Last ref handed out. The next allocation returns `last_ref + 1`.
    pub last_ref: RefNumber,
}

/// Per-project monotonically increasing counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefAllocator {
    counters: HashMap<ProjectId, RefNumber>,
}

impl RefAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the project's counter and return the new value.
    ///
    /// An unseen project starts at 0, so its first ref is 1.
    pub fn next_ref(&mut self, project: ProjectId) -> RefNumber {
        let counter = self.counters.entry(project).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Last ref handed out for the project, 0 if none.
    pub fn current(&self, project: ProjectId) -> RefNumber {
        self.counters.get(&project).copied().unwrap_or(0)
    }

    /// Raise the counter to at least `value`. Never lowers it.
    pub fn seed(&mut self, project: ProjectId, value: RefNumber) {
        let counter = self.counters.entry(project).or_insert(0);
        if value > *counter {
            *counter = value;
        }
    }

    /// Counters sorted by project id, for snapshots.
    pub fn counters(&self) -> Vec<RefCounter> {
        let mut counters: Vec<RefCounter> = self
            .counters
            .iter()
            .map(|(project_id, last_ref)| RefCounter {
                project_id: *project_id,
                last_ref: *last_ref,
            })
            .collect();
        counters.sort_by_key(|c| c.project_id);
        counters
    }

    pub fn from_counters(counters: &[RefCounter]) -> Self {
        let mut allocator = Self::new();
        for counter in counters {
            allocator.seed(counter.project_id, counter.last_ref);
        }
        allocator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrumkit_core::EntityIdType;

    #[test]
    fn test_first_ref_is_one() {
        let mut refs = RefAllocator::new();
        let project = ProjectId::now_v7();
        assert_eq!(refs.current(project), 0);
        assert_eq!(refs.next_ref(project), 1);
        assert_eq!(refs.next_ref(project), 2);
        assert_eq!(refs.current(project), 2);
    }

    #[test]
    fn test_projects_have_independent_counters() {
        let mut refs = RefAllocator::new();
        let a = ProjectId::now_v7();
        let b = ProjectId::now_v7();
        refs.next_ref(a);
        refs.next_ref(a);
        assert_eq!(refs.next_ref(b), 1);
        assert_eq!(refs.next_ref(a), 3);
    }

    #[test]
    fn test_seed_never_lowers() {
        let mut refs = RefAllocator::new();
        let project = ProjectId::now_v7();
        refs.seed(project, 10);
        assert_eq!(refs.next_ref(project), 11);
        refs.seed(project, 3);
        assert_eq!(refs.next_ref(project), 12);
    }

    #[test]
    fn test_counters_roundtrip() {
        let mut refs = RefAllocator::new();
        let a = ProjectId::now_v7();
        let b = ProjectId::now_v7();
        refs.seed(a, 7);
        refs.next_ref(b);
        let restored = RefAllocator::from_counters(&refs.counters());
        assert_eq!(restored, refs);
    }
}
