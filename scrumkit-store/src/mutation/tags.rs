//! Tag registry. Entities carry tag copies, so renaming or removing a
//! registered tag never rewrites existing stories, tasks or issues.

use super::{constraint, require_text};
use crate::input::NewTag;
use crate::ScrumStore;
use scrumkit_core::{EntityIdType, EntityType, ScrumResult, Tag, TagId};
use tracing::debug;

impl ScrumStore {
    /// Register a tag. Names are unique, ignoring case.
    pub fn create_tag(&mut self, input: NewTag) -> ScrumResult<TagId> {
        let name = require_text(&input.name, "name")?;
        let color = require_text(&input.color, "color")?;
        let lowered = name.to_lowercase();
        if self.tags.iter().any(|t| t.name.to_lowercase() == lowered) {
            return Err(constraint(
                "tag_name",
                format!("tag \"{}\" already exists", name),
            ));
        }

        let tag_id = TagId::now_v7();
        self.tags.push(Tag {
            tag_id,
            name,
            color,
        });
        debug!(tag_id = %tag_id, "tag created");
        Ok(tag_id)
    }

    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        let lowered = name.trim().to_lowercase();
        self.tags.iter().find(|t| t.name.to_lowercase() == lowered)
    }

    pub fn delete_tag(&mut self, id: TagId) -> ScrumResult<()> {
        let before = self.tags.len();
        self.tags.retain(|t| t.tag_id != id);
        if self.tags.len() == before {
            return Err(Self::missing_entity(EntityType::Tag, id));
        }
        debug!(tag_id = %id, "tag deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{NewProject, NewUserStory};
    use scrumkit_core::{EntityIdType, User, UserId};

    fn store() -> ScrumStore {
        ScrumStore::new(User {
            id: UserId::now_v7(),
            username: "demo".to_string(),
            full_name: "Demo User".to_string(),
            email: "demo@example.com".to_string(),
            registered_at: chrono::Utc::now(),
        })
    }

    #[test]
    fn test_create_tag_unique_names() {
        let mut store = store();
        let id = store.create_tag(NewTag::new("Backend", "#70728f")).unwrap();
        assert_eq!(store.tag(id).unwrap().name, "Backend");
        assert_eq!(store.tag_by_name("backend").unwrap().tag_id, id);
        assert!(store
            .create_tag(NewTag::new("BACKEND", "#000000"))
            .unwrap_err()
            .is_validation());
        assert!(store.create_tag(NewTag::new("UI", " ")).unwrap_err().is_validation());
    }

    #[test]
    fn test_deleting_tag_keeps_copies() {
        let mut store = store();
        let owner = store.current_user().id;
        let project = store.create_project(NewProject::new("Demo", owner)).unwrap();
        let tag_id = store.create_tag(NewTag::new("Backend", "#70728f")).unwrap();
        let tag = store.tag(tag_id).unwrap().clone();
        let story = store
            .create_user_story(NewUserStory::new(project, "API").with_tags(vec![tag]))
            .unwrap();

        store.delete_tag(tag_id).unwrap();

        assert!(store.tags().is_empty());
        assert_eq!(store.user_story(story).unwrap().tags[0].name, "Backend");
        assert!(store.delete_tag(tag_id).unwrap_err().is_not_found());
    }
}
