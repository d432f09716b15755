//! Project mutations.

use super::{constraint, require_text};
use crate::input::{NewProject, ProjectUpdate};
use crate::ScrumStore;
use scrumkit_core::{
    slug_or, slugify, unique_slug, EntityIdType, EntityType, PointCategory, PointCategoryId,
    Project, ProjectId, ScrumError, ScrumResult,
};
use std::collections::HashSet;
use tracing::debug;

fn categories_from_names(names: &[String]) -> ScrumResult<Vec<PointCategory>> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let name = require_text(name, "point_categories")?;
            Ok(PointCategory {
                id: PointCategoryId::now_v7(),
                name,
                order: index as u32 + 1,
            })
        })
        .collect()
}

fn check_categories(categories: &[PointCategory]) -> ScrumResult<()> {
    let mut seen = HashSet::new();
    for category in categories {
        if category.name.trim().is_empty() {
            return Err(ScrumError::missing("point_categories"));
        }
        if !seen.insert(category.id) {
            return Err(ScrumError::invalid(
                "point_categories",
                format!("duplicate point category id {}", category.id),
            ));
        }
    }
    Ok(())
}

impl ScrumStore {
    /// Create a project. The slug is derived from the name and made unique
    /// across projects.
    pub fn create_project(&mut self, input: NewProject) -> ScrumResult<ProjectId> {
        let name = require_text(&input.name, "name")?;
        if input.owner.as_uuid().is_nil() {
            return Err(ScrumError::missing("owner"));
        }
        let base = slug_or(&name, "project");
        let point_categories = match &input.point_categories {
            Some(names) => categories_from_names(names)?,
            None => categories_from_names(&self.config.default_point_categories)?,
        };

        let slug = unique_slug(&base, |candidate| {
            self.projects.values().any(|p| p.slug == candidate)
        });
        let project_id = ProjectId::now_v7();
        let now = self.clock.now();

        self.projects.insert(
            project_id,
            Project {
                project_id,
                name,
                description: input.description,
                slug: slug.clone(),
                owner: input.owner,
                is_private: input.is_private,
                is_archived: false,
                modules: input.modules,
                point_categories,
                public_permissions: Vec::new(),
                anonymous_permissions: Vec::new(),
                created_at: now,
                updated_at: now,
            },
        );

        debug!(project_id = %project_id, slug = %slug, "project created");
        Ok(project_id)
    }

    /// Apply a project patch. Renaming keeps the slug.
    pub fn update_project(&mut self, id: ProjectId, patch: ProjectUpdate) -> ScrumResult<()> {
        let mut project = self.require_project(id)?.clone();

        if let Some(name) = patch.name {
            project.name = require_text(&name, "name")?;
        }
        if let Some(description) = patch.description {
            project.description = description;
        }
        if let Some(slug) = patch.slug {
            let slug = slugify(&slug);
            if slug.is_empty() {
                return Err(ScrumError::invalid(
                    "slug",
                    "slug must contain at least one letter or digit",
                ));
            }
            if self
                .projects
                .values()
                .any(|p| p.project_id != id && p.slug == slug)
            {
                return Err(constraint(
                    "project_slug",
                    format!("slug \"{}\" is already used by another project", slug),
                ));
            }
            project.slug = slug;
        }
        if let Some(is_private) = patch.is_private {
            project.is_private = is_private;
        }
        if let Some(is_archived) = patch.is_archived {
            project.is_archived = is_archived;
        }
        if let Some(modules) = patch.modules {
            project.modules = modules;
        }
        if let Some(categories) = patch.point_categories {
            check_categories(&categories)?;
            project.point_categories = categories;
        }
        if let Some(permissions) = patch.public_permissions {
            project.public_permissions = permissions;
        }
        if let Some(permissions) = patch.anonymous_permissions {
            project.anonymous_permissions = permissions;
        }

        project.updated_at = self.clock.now();
        self.projects.insert(id, project);
        debug!(project_id = %id, "project updated");
        Ok(())
    }

    /// Remove a project. Its stories, tasks, sprints and pages are left in
    /// place; the current project is cleared if it pointed here.
    pub fn delete_project(&mut self, id: ProjectId) -> ScrumResult<()> {
        if self.projects.remove(&id).is_none() {
            return Err(Self::missing_entity(EntityType::Project, id));
        }
        if self.current_project == Some(id) {
            self.current_project = None;
        }
        debug!(project_id = %id, "project deleted");
        Ok(())
    }

    /// Select the project the UI is working in.
    pub fn set_current_project(&mut self, id: Option<ProjectId>) -> ScrumResult<()> {
        if let Some(id) = id {
            self.require_project(id)?;
        }
        self.current_project = id;
        Ok(())
    }
}
