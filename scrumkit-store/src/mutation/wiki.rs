//! Wiki page and wiki link mutations.

use super::{constraint, require_text};
use crate::activity::describe;
use crate::input::{NewWikiLink, NewWikiPage, WikiLinkUpdate, WikiPageUpdate};
use crate::ScrumStore;
use scrumkit_core::{
    slugify, unique_slug, ActivityKind, ActivityTarget, EntityIdType, EntityType, ProjectId,
    ScrumError, ScrumResult, WikiLink, WikiLinkId, WikiPage, WikiPageId,
};
use tracing::debug;

fn page_target(page: &WikiPage) -> ActivityTarget {
    ActivityTarget {
        entity_type: EntityType::WikiPage,
        entity_id: page.wiki_page_id.as_uuid(),
        reference: None,
        title: page.title.clone(),
    }
}

impl ScrumStore {
    /// Normalized slug, free within the project (ignoring `exclude`).
    fn check_wiki_slug(
        &self,
        project: ProjectId,
        raw: &str,
        exclude: Option<WikiPageId>,
    ) -> ScrumResult<String> {
        let slug = slugify(raw);
        if slug.is_empty() {
            return Err(ScrumError::invalid(
                "slug",
                "slug must contain at least one letter or digit",
            ));
        }
        let taken = self.wiki_pages.values().any(|p| {
            p.project_id == project && p.slug == slug && Some(p.wiki_page_id) != exclude
        });
        if taken {
            return Err(constraint(
                "wiki_slug",
                format!("wiki page \"{}\" already exists in this project", slug),
            ));
        }
        Ok(slug)
    }

    /// Create a wiki page owned by the current user, at version 1.
    pub fn create_wiki_page(&mut self, input: NewWikiPage) -> ScrumResult<WikiPageId> {
        let title = require_text(&input.title, "title")?;
        self.require_project(input.project_id)?;
        let slug = match input.slug.as_deref() {
            Some(raw) => self.check_wiki_slug(input.project_id, raw, None)?,
            None if slugify(&title).is_empty() => unique_slug("page", |candidate| {
                self.wiki_pages
                    .values()
                    .any(|p| p.project_id == input.project_id && p.slug == candidate)
            }),
            None => self.check_wiki_slug(input.project_id, &title, None)?,
        };

        let wiki_page_id = WikiPageId::now_v7();
        let now = self.clock.now();
        let author = self.current_user.id;

        let page = WikiPage {
            wiki_page_id,
            project_id: input.project_id,
            slug: slug.clone(),
            title,
            content: input.content,
            owner: author,
            last_editor: author,
            edits: 0,
            version: 1,
            watchers: input.watchers,
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let target = page_target(&page);
        self.wiki_pages.insert(wiki_page_id, page);

        let description = describe::wiki_created(&target.title);
        self.emit(
            ActivityKind::CreateWiki,
            input.project_id,
            Some(target),
            description,
            None,
        );

        debug!(wiki_page_id = %wiki_page_id, slug = %slug, "wiki page created");
        Ok(wiki_page_id)
    }

    /// Apply a page patch.
    ///
    /// A call that changes the content bumps `edits` and `version` once and
    /// makes the current user the last editor.
    pub fn update_wiki_page(&mut self, id: WikiPageId, patch: WikiPageUpdate) -> ScrumResult<()> {
        let before = self.require_wiki_page(id)?.clone();
        let mut after = before.clone();

        if let Some(title) = patch.title {
            after.title = require_text(&title, "title")?;
        }
        if let Some(slug) = patch.slug {
            after.slug = self.check_wiki_slug(before.project_id, &slug, Some(id))?;
        }
        if let Some(content) = patch.content {
            after.content = content;
        }
        if let Some(watchers) = patch.watchers {
            after.watchers = watchers;
        }

        let edited = before.content != after.content;
        if edited {
            after.edits += 1;
            after.version += 1;
            after.last_editor = self.current_user.id;
        }
        after.updated_at = self.clock.now();
        let target = page_target(&after);
        let changed = edited || before.title != after.title || before.slug != after.slug;
        self.wiki_pages.insert(id, after.clone());

        if changed {
            self.emit(
                ActivityKind::UpdateWiki,
                after.project_id,
                Some(target),
                describe::wiki_updated(&after.title),
                None,
            );
        }

        debug!(wiki_page_id = %id, edited, version = after.version, "wiki page updated");
        Ok(())
    }

    /// Remove a page. Links pointing at its slug are bookmarks and stay.
    pub fn delete_wiki_page(&mut self, id: WikiPageId) -> ScrumResult<()> {
        let page = self
            .wiki_pages
            .remove(&id)
            .ok_or_else(|| Self::missing_entity(EntityType::WikiPage, id))?;
        debug!(wiki_page_id = %id, slug = %page.slug, "wiki page deleted");
        Ok(())
    }

    // === Links ===

    pub fn create_wiki_link(&mut self, input: NewWikiLink) -> ScrumResult<WikiLinkId> {
        let title = require_text(&input.title, "title")?;
        let href = require_text(&input.href, "href")?;
        self.require_project(input.project_id)?;

        let order = input.order.unwrap_or_else(|| {
            self.wiki_links
                .values()
                .filter(|l| l.project_id == input.project_id)
                .map(|l| l.order)
                .max()
                .unwrap_or(0)
                + 1
        });
        let wiki_link_id = WikiLinkId::now_v7();
        self.wiki_links.insert(
            wiki_link_id,
            WikiLink {
                wiki_link_id,
                project_id: input.project_id,
                title,
                href,
                order,
            },
        );

        debug!(wiki_link_id = %wiki_link_id, order, "wiki link created");
        Ok(wiki_link_id)
    }

    pub fn update_wiki_link(&mut self, id: WikiLinkId, patch: WikiLinkUpdate) -> ScrumResult<()> {
        let mut link = self
            .wiki_links
            .get(&id)
            .cloned()
            .ok_or_else(|| Self::missing_entity(EntityType::WikiLink, id))?;

        if let Some(title) = patch.title {
            link.title = require_text(&title, "title")?;
        }
        if let Some(href) = patch.href {
            link.href = require_text(&href, "href")?;
        }
        if let Some(order) = patch.order {
            link.order = order;
        }

        self.wiki_links.insert(id, link);
        debug!(wiki_link_id = %id, "wiki link updated");
        Ok(())
    }

    pub fn delete_wiki_link(&mut self, id: WikiLinkId) -> ScrumResult<()> {
        if self.wiki_links.remove(&id).is_none() {
            return Err(Self::missing_entity(EntityType::WikiLink, id));
        }
        debug!(wiki_link_id = %id, "wiki link deleted");
        Ok(())
    }
}
