//! scrumkit Core - Entity Types
//!
//! Pure data structures for the scrumkit project store: typed ids, status
//! enums, entity records, errors and configuration. Behaviour that touches
//! more than one entity lives in `scrumkit-store`.

pub mod clock;
pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod slug;

pub use clock::{Clock, FixedClock, StepClock, SystemClock};
pub use config::{SprintDatePolicy, StoreConfig};
pub use entities::{
    checked_total_points, total_points, ActivityDetail, ActivityRecord, ActivityTarget,
    Attachment, Comment, Issue, PointCategory, Project, ProjectModules, Sprint, SprintPhase,
    StoryPoint, Tag, Task, User, UserStory, WikiLink, WikiPage,
};
pub use enums::{
    ActivityKind, EntityType, EnumParseError, IssueStatus, IssueType, Priority, Severity,
    WorkStatus,
};
pub use error::{ConfigError, ScrumError, ScrumResult, StorageError, ValidationError};
pub use identity::{
    ActivityId, AttachmentId, CommentId, EntityIdType, IssueId, PointCategoryId, ProjectId,
    RefNumber, SprintId, TagId, TaskId, Timestamp, UserId, UserStoryId, WikiLinkId, WikiPageId,
};
pub use slug::{slug_or, slugify, unique_slug};
