//! Error types for scrumkit operations

use crate::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Persistence failed: {reason}")]
    PersistenceFailed { reason: String },
}

/// Validation errors. Raised before any id or ref is allocated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },
}

/// Master error type for all scrumkit errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScrumError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl ScrumError {
    /// Shorthand for a `StorageError::NotFound`.
    pub fn not_found(entity_type: EntityType, id: Uuid) -> Self {
        ScrumError::Storage(StorageError::NotFound { entity_type, id })
    }

    /// Shorthand for a `ValidationError::RequiredFieldMissing`.
    pub fn missing(field: &str) -> Self {
        ScrumError::Validation(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        })
    }

    /// Shorthand for a `ValidationError::InvalidValue`.
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ScrumError::Validation(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ScrumError::Storage(StorageError::NotFound { .. }))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ScrumError::Validation(_))
    }
}

/// Result type alias for scrumkit operations.
pub type ScrumResult<T> = Result<T, ScrumError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Sprint,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("Sprint"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_validation_error_display_constraint() {
        let err = ValidationError::ConstraintViolation {
            constraint: "sprint_dates".to_string(),
            reason: "dates conflict with sprint \"Sprint 1\"".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("sprint_dates"));
        assert!(msg.contains("Sprint 1"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "sprint_length_days".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("sprint_length_days"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn test_scrum_error_from_variants() {
        let storage = ScrumError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, ScrumError::Storage(_)));

        let validation = ScrumError::from(ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        });
        assert!(validation.is_validation());

        let config = ScrumError::from(ConfigError::Parse {
            reason: "bad toml".to_string(),
        });
        assert!(matches!(config, ScrumError::Config(_)));
    }

    #[test]
    fn test_shorthands() {
        assert!(ScrumError::not_found(EntityType::Task, Uuid::nil()).is_not_found());
        assert_eq!(
            ScrumError::missing("title"),
            ScrumError::Validation(ValidationError::RequiredFieldMissing {
                field: "title".to_string()
            })
        );
        assert!(ScrumError::invalid("sprint", "wrong project").is_validation());
    }
}
