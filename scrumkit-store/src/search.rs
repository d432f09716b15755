//! Project-scoped search across user stories, tasks, issues and wiki pages.

use crate::ScrumStore;
use scrumkit_core::{
    EntityType, IssueId, ProjectId, RefNumber, TaskId, Timestamp, UserStoryId, WikiPageId,
};

/// Which collections a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    #[default]
    All,
    UserStories,
    Tasks,
    Issues,
    Wiki,
}

impl SearchScope {
    fn includes(self, entity_type: EntityType) -> bool {
        match self {
            SearchScope::All => true,
            SearchScope::UserStories => entity_type == EntityType::UserStory,
            SearchScope::Tasks => entity_type == EntityType::Task,
            SearchScope::Issues => entity_type == EntityType::Issue,
            SearchScope::Wiki => entity_type == EntityType::WikiPage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchHitId {
    UserStory(UserStoryId),
    Task(TaskId),
    Issue(IssueId),
    WikiPage(WikiPageId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: SearchHitId,
    /// `None` for wiki pages.
    pub reference: Option<RefNumber>,
    pub title: String,
    pub snippet: String,
    /// Persisted status string, `None` for wiki pages.
    pub status: Option<&'static str>,
    pub updated_at: Timestamp,
}

impl SearchHit {
    pub fn entity_type(&self) -> EntityType {
        match self.id {
            SearchHitId::UserStory(_) => EntityType::UserStory,
            SearchHitId::Task(_) => EntityType::Task,
            SearchHitId::Issue(_) => EntityType::Issue,
            SearchHitId::WikiPage(_) => EntityType::WikiPage,
        }
    }
}

/// Parse `#<digits>` into a ref.
pub fn parse_ref_query(query: &str) -> Option<RefNumber> {
    query.trim().strip_prefix('#')?.parse().ok()
}

fn first_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

impl ScrumStore {
    /// Search one project.
    ///
    /// Work items match on exact ref for a `#N` query, or on a
    /// case-insensitive substring of title or description. Wiki pages match
    /// on title or content. Results are sorted by last modification, newest
    /// first. A blank query returns nothing.
    pub fn search(&self, project: ProjectId, query: &str, scope: SearchScope) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        let wanted_ref = parse_ref_query(query);
        let matches = |reference: Option<RefNumber>, title: &str, body: &str| {
            (wanted_ref.is_some() && reference == wanted_ref)
                || title.to_lowercase().contains(&needle)
                || body.to_lowercase().contains(&needle)
        };

        let mut hits = Vec::new();

        if scope.includes(EntityType::UserStory) {
            hits.extend(
                self.user_stories_for_project(project)
                    .into_iter()
                    .filter(|s| matches(Some(s.reference), &s.title, &s.description))
                    .map(|s| SearchHit {
                        id: SearchHitId::UserStory(s.user_story_id),
                        reference: Some(s.reference),
                        title: s.title.clone(),
                        snippet: s.description.clone(),
                        status: Some(s.status.as_db_str()),
                        updated_at: s.updated_at,
                    }),
            );
        }

        if scope.includes(EntityType::Task) {
            hits.extend(
                self.tasks_for_project(project)
                    .into_iter()
                    .filter(|t| matches(Some(t.reference), &t.title, &t.description))
                    .map(|t| SearchHit {
                        id: SearchHitId::Task(t.task_id),
                        reference: Some(t.reference),
                        title: t.title.clone(),
                        snippet: t.description.clone(),
                        status: Some(t.status.as_db_str()),
                        updated_at: t.updated_at,
                    }),
            );
        }

        if scope.includes(EntityType::Issue) {
            hits.extend(
                self.issues_for_project(project)
                    .into_iter()
                    .filter(|i| matches(Some(i.reference), &i.title, &i.description))
                    .map(|i| SearchHit {
                        id: SearchHitId::Issue(i.issue_id),
                        reference: Some(i.reference),
                        title: i.title.clone(),
                        snippet: i.description.clone(),
                        status: Some(i.status.as_db_str()),
                        updated_at: i.updated_at,
                    }),
            );
        }

        if scope.includes(EntityType::WikiPage) {
            let limit = self.config.search_snippet_chars;
            hits.extend(
                self.wiki_pages_for_project(project)
                    .into_iter()
                    .filter(|p| matches(None, &p.title, &p.content))
                    .map(|p| SearchHit {
                        id: SearchHitId::WikiPage(p.wiki_page_id),
                        reference: None,
                        title: p.title.clone(),
                        snippet: first_chars(&p.content, limit),
                        status: None,
                        updated_at: p.updated_at,
                    }),
            );
        }

        hits.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        hits
    }
}
