//! Enum types for scrumkit entities
//!
//! Status fields are flat enums: the store allows any transition between
//! any two states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error when parsing an unknown enum string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}

/// Generates `as_db_str`, `from_db_str`, `ALL`, `Display` and `FromStr`
/// from a single variant/string table.
macro_rules! db_str_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Convert to the persisted string representation.
            pub fn as_db_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $s,)+
                }
            }

            /// Parse from the persisted string representation.
            pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
                match s {
                    $($s => Ok($ty::$variant),)+
                    _ => Err(EnumParseError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_db_str())
            }
        }

        impl FromStr for $ty {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_db_str(s)
            }
        }
    };
}

// ============================================================================
// WORK ITEM STATUS
// ============================================================================

/// Status shared by user stories and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WorkStatus {
    #[default]
    New,
    InProgress,
    ReadyForTest,
    Closed,
    NeedsInfo,
}

db_str_enum!(WorkStatus, "work status", {
    New => "new",
    InProgress => "in-progress",
    ReadyForTest => "ready-for-test",
    Closed => "closed",
    NeedsInfo => "needs-info",
});

impl WorkStatus {
    /// Human-readable label used in activity descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            WorkStatus::New => "New",
            WorkStatus::InProgress => "In Progress",
            WorkStatus::ReadyForTest => "Ready for Test",
            WorkStatus::Closed => "Closed",
            WorkStatus::NeedsInfo => "Needs Info",
        }
    }

    /// Whether this status counts as done for progress metrics.
    pub fn is_closed(&self) -> bool {
        matches!(self, WorkStatus::Closed)
    }
}

/// Issue status: the shared work states plus `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    #[default]
    New,
    InProgress,
    ReadyForTest,
    Closed,
    NeedsInfo,
    Rejected,
}

db_str_enum!(IssueStatus, "issue status", {
    New => "new",
    InProgress => "in-progress",
    ReadyForTest => "ready-for-test",
    Closed => "closed",
    NeedsInfo => "needs-info",
    Rejected => "rejected",
});

impl IssueStatus {
    pub fn label(&self) -> &'static str {
        match self {
            IssueStatus::Rejected => "Rejected",
            IssueStatus::New => WorkStatus::New.label(),
            IssueStatus::InProgress => WorkStatus::InProgress.label(),
            IssueStatus::ReadyForTest => WorkStatus::ReadyForTest.label(),
            IssueStatus::Closed => WorkStatus::Closed.label(),
            IssueStatus::NeedsInfo => WorkStatus::NeedsInfo.label(),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, IssueStatus::Closed)
    }
}

impl From<WorkStatus> for IssueStatus {
    fn from(status: WorkStatus) -> Self {
        match status {
            WorkStatus::New => IssueStatus::New,
            WorkStatus::InProgress => IssueStatus::InProgress,
            WorkStatus::ReadyForTest => IssueStatus::ReadyForTest,
            WorkStatus::Closed => IssueStatus::Closed,
            WorkStatus::NeedsInfo => IssueStatus::NeedsInfo,
        }
    }
}

// ============================================================================
// ISSUE CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    #[default]
    Bug,
    Enhancement,
    Question,
    Support,
}

db_str_enum!(IssueType, "issue type", {
    Bug => "bug",
    Enhancement => "enhancement",
    Question => "question",
    Support => "support",
});

/// Five-level issue severity, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Wishlist,
    Minor,
    #[default]
    Normal,
    Important,
    Critical,
}

db_str_enum!(Severity, "severity", {
    Wishlist => "wishlist",
    Minor => "minor",
    Normal => "normal",
    Important => "important",
    Critical => "critical",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

db_str_enum!(Priority, "priority", {
    Low => "low",
    Normal => "normal",
    High => "high",
});

// ============================================================================
// ACTIVITY & ENTITY DISCRIMINATORS
// ============================================================================

/// Closed taxonomy of tracked mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityKind {
    CreateStory,
    UpdateStory,
    MoveStory,
    CreateTask,
    UpdateTask,
    UpdateTaskStatus,
    CreateIssue,
    UpdateIssue,
    CreateSprint,
    UpdateSprint,
    CreateWiki,
    UpdateWiki,
    AddComment,
    AddAttachment,
}

db_str_enum!(ActivityKind, "activity kind", {
    CreateStory => "create-story",
    UpdateStory => "update-story",
    MoveStory => "move-story",
    CreateTask => "create-task",
    UpdateTask => "update-task",
    UpdateTaskStatus => "update-task-status",
    CreateIssue => "create-issue",
    UpdateIssue => "update-issue",
    CreateSprint => "create-sprint",
    UpdateSprint => "update-sprint",
    CreateWiki => "create-wiki",
    UpdateWiki => "update-wiki",
    AddComment => "add-comment",
    AddAttachment => "add-attachment",
});

/// Entity type discriminator for polymorphic references and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    Project,
    UserStory,
    Task,
    Sprint,
    Issue,
    WikiPage,
    WikiLink,
    Tag,
    Attachment,
    Comment,
}

db_str_enum!(EntityType, "entity type", {
    Project => "project",
    UserStory => "user-story",
    Task => "task",
    Sprint => "sprint",
    Issue => "issue",
    WikiPage => "wiki-page",
    WikiLink => "wiki-link",
    Tag => "tag",
    Attachment => "attachment",
    Comment => "comment",
});
