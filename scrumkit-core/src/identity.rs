//! Identity types for scrumkit entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Project-scoped human-facing sequence number (`#123`).
pub type RefNumber = u64;

/// Common behaviour of the strongly-typed entity identifiers.
///
/// Every id wraps a UUIDv7, so ids minted by one process sort by creation time.
pub trait EntityIdType:
    Copy + Eq + Hash + Ord + fmt::Debug + fmt::Display + FromStr<Err = uuid::Error>
{
    /// Wrap an existing UUID.
    fn from_uuid(uuid: Uuid) -> Self;

    /// The underlying UUID.
    fn as_uuid(&self) -> Uuid;

    /// Mint a fresh timestamp-sortable id.
    fn now_v7() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }

    /// The nil id, used for placeholders in tests.
    fn nil() -> Self {
        Self::from_uuid(Uuid::nil())
    }
}

macro_rules! define_entity_id {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(Uuid);

            impl EntityIdType for $name {
                fn from_uuid(uuid: Uuid) -> Self {
                    Self(uuid)
                }

                fn as_uuid(&self) -> Uuid {
                    self.0
                }
            }

            impl From<Uuid> for $name {
                fn from(uuid: Uuid) -> Self {
                    Self(uuid)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Display::fmt(&self.0, f)
                }
            }

            impl FromStr for $name {
                type Err = uuid::Error;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Uuid::parse_str(s).map(Self)
                }
            }
        )+
    };
}

define_entity_id!(
    /// Identifier of a [`crate::Project`].
    ProjectId,
    /// Identifier of a [`crate::UserStory`].
    UserStoryId,
    /// Identifier of a [`crate::Task`].
    TaskId,
    /// Identifier of a [`crate::Sprint`].
    SprintId,
    /// Identifier of an [`crate::Issue`].
    IssueId,
    /// Identifier of a [`crate::WikiPage`].
    WikiPageId,
    /// Identifier of a [`crate::WikiLink`].
    WikiLinkId,
    /// Identifier of a [`crate::Tag`].
    TagId,
    /// Identifier of an [`crate::Attachment`].
    AttachmentId,
    /// Identifier of a [`crate::Comment`].
    CommentId,
    /// Identifier of an [`crate::ActivityRecord`].
    ActivityId,
    /// Identifier of a [`crate::User`].
    UserId,
    /// Identifier of a [`crate::PointCategory`].
    PointCategoryId,
);
