//! Attachment metadata on stories, tasks, issues and wiki pages.
//!
//! Only metadata is stored; the bytes belong to an external blob store
//! addressed by `Attachment::url`.

use super::require_text;
use crate::activity::describe;
use crate::input::NewAttachment;
use crate::ScrumStore;
use scrumkit_core::{
    ActivityKind, ActivityTarget, Attachment, AttachmentId, EntityIdType, EntityType, IssueId,
    ProjectId, ScrumResult, TaskId, Timestamp, UserStoryId, WikiPageId,
};
use tracing::debug;

/// Entity an attachment hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentTarget {
    UserStory(UserStoryId),
    Task(TaskId),
    Issue(IssueId),
    WikiPage(WikiPageId),
}

struct TargetInfo {
    project_id: ProjectId,
    target: ActivityTarget,
    /// e.g. `the issue <strong>#3 Crash</strong>`
    phrase: String,
}

impl ScrumStore {
    fn attachment_target_info(&self, target: AttachmentTarget) -> ScrumResult<TargetInfo> {
        let info = match target {
            AttachmentTarget::UserStory(id) => {
                let story = self.require_user_story(id)?;
                TargetInfo {
                    project_id: story.project_id,
                    target: ActivityTarget {
                        entity_type: EntityType::UserStory,
                        entity_id: id.as_uuid(),
                        reference: Some(story.reference),
                        title: story.title.clone(),
                    },
                    phrase: format!(
                        "the user story {}",
                        describe::strong_ref(story.reference, &story.title)
                    ),
                }
            }
            AttachmentTarget::Task(id) => {
                let task = self.require_task(id)?;
                TargetInfo {
                    project_id: task.project_id,
                    target: ActivityTarget {
                        entity_type: EntityType::Task,
                        entity_id: id.as_uuid(),
                        reference: Some(task.reference),
                        title: task.title.clone(),
                    },
                    phrase: format!(
                        "the task {}",
                        describe::strong_ref(task.reference, &task.title)
                    ),
                }
            }
            AttachmentTarget::Issue(id) => {
                let issue = self.require_issue(id)?;
                TargetInfo {
                    project_id: issue.project_id,
                    target: super::issues::issue_target(issue),
                    phrase: format!(
                        "the issue {}",
                        describe::strong_ref(issue.reference, &issue.title)
                    ),
                }
            }
            AttachmentTarget::WikiPage(id) => {
                let page = self.require_wiki_page(id)?;
                TargetInfo {
                    project_id: page.project_id,
                    target: ActivityTarget {
                        entity_type: EntityType::WikiPage,
                        entity_id: id.as_uuid(),
                        reference: None,
                        title: page.title.clone(),
                    },
                    phrase: format!("the wiki page {}", describe::strong(&page.title)),
                }
            }
        };
        Ok(info)
    }

    fn attachments_mut(
        &mut self,
        target: AttachmentTarget,
    ) -> ScrumResult<(&mut Vec<Attachment>, &mut Timestamp)> {
        match target {
            AttachmentTarget::UserStory(id) => self
                .user_stories
                .get_mut(&id)
                .map(|s| (&mut s.attachments, &mut s.updated_at))
                .ok_or_else(|| Self::missing_entity(EntityType::UserStory, id)),
            AttachmentTarget::Task(id) => self
                .tasks
                .get_mut(&id)
                .map(|t| (&mut t.attachments, &mut t.updated_at))
                .ok_or_else(|| Self::missing_entity(EntityType::Task, id)),
            AttachmentTarget::Issue(id) => self
                .issues
                .get_mut(&id)
                .map(|i| (&mut i.attachments, &mut i.updated_at))
                .ok_or_else(|| Self::missing_entity(EntityType::Issue, id)),
            AttachmentTarget::WikiPage(id) => self
                .wiki_pages
                .get_mut(&id)
                .map(|p| (&mut p.attachments, &mut p.updated_at))
                .ok_or_else(|| Self::missing_entity(EntityType::WikiPage, id)),
        }
    }

    /// Attachments of a target, in upload order.
    pub fn attachments(&self, target: AttachmentTarget) -> ScrumResult<&[Attachment]> {
        let attachments = match target {
            AttachmentTarget::UserStory(id) => &self.require_user_story(id)?.attachments,
            AttachmentTarget::Task(id) => &self.require_task(id)?.attachments,
            AttachmentTarget::Issue(id) => &self.require_issue(id)?.attachments,
            AttachmentTarget::WikiPage(id) => &self.require_wiki_page(id)?.attachments,
        };
        Ok(attachments)
    }

    /// Record attachment metadata uploaded by the current user.
    pub fn add_attachment(
        &mut self,
        target: AttachmentTarget,
        input: NewAttachment,
    ) -> ScrumResult<AttachmentId> {
        let filename = require_text(&input.filename, "filename")?;
        let url = require_text(&input.url, "url")?;
        let info = self.attachment_target_info(target)?;

        let attachment_id = AttachmentId::now_v7();
        let now = self.clock.now();
        let uploaded_by = self.current_user.id;
        let (attachments, updated_at) = self.attachments_mut(target)?;
        attachments.push(Attachment {
            attachment_id,
            filename: filename.clone(),
            url,
            mime_type: input.mime_type,
            size_bytes: input.size_bytes,
            description: input.description,
            is_deprecated: false,
            uploaded_by,
            uploaded_at: now,
        });
        *updated_at = now;

        self.emit(
            ActivityKind::AddAttachment,
            info.project_id,
            Some(info.target),
            describe::attachment_added(&filename, &info.phrase),
            None,
        );

        debug!(attachment_id = %attachment_id, ?target, "attachment added");
        Ok(attachment_id)
    }

    pub fn set_attachment_deprecated(
        &mut self,
        target: AttachmentTarget,
        attachment_id: AttachmentId,
        deprecated: bool,
    ) -> ScrumResult<()> {
        let now = self.clock.now();
        let (attachments, updated_at) = self.attachments_mut(target)?;
        let attachment = attachments
            .iter_mut()
            .find(|a| a.attachment_id == attachment_id)
            .ok_or_else(|| Self::missing_entity(EntityType::Attachment, attachment_id))?;
        attachment.is_deprecated = deprecated;
        *updated_at = now;

        debug!(attachment_id = %attachment_id, deprecated, "attachment flagged");
        Ok(())
    }

    pub fn remove_attachment(
        &mut self,
        target: AttachmentTarget,
        attachment_id: AttachmentId,
    ) -> ScrumResult<()> {
        let now = self.clock.now();
        let (attachments, updated_at) = self.attachments_mut(target)?;
        let before = attachments.len();
        attachments.retain(|a| a.attachment_id != attachment_id);
        if attachments.len() == before {
            return Err(Self::missing_entity(EntityType::Attachment, attachment_id));
        }
        *updated_at = now;

        debug!(attachment_id = %attachment_id, "attachment removed");
        Ok(())
    }
}
