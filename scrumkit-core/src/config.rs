//! Configuration types

use crate::{ConfigError, ScrumError, ScrumResult};
use serde::{Deserialize, Serialize};

/// How sprint date rules are applied by the mutation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SprintDatePolicy {
    /// Reject sprint writes whose dates are inverted or overlap another sprint.
    #[default]
    Enforced,
    /// Accept the write and log a warning; callers run the check themselves.
    Advisory,
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Point categories given to projects created without explicit ones.
    pub default_point_categories: Vec<String>,
    /// Inclusive length used when suggesting the next sprint's dates.
    /// At least 2, since a sprint must end after it starts.
    pub sprint_length_days: u32,
    pub sprint_date_policy: SprintDatePolicy,
    /// Emit activity records on tracked mutations.
    pub record_activity: bool,
    /// Characters of wiki content kept in search result snippets.
    pub search_snippet_chars: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_point_categories: ["UX", "Design", "Front", "Back"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sprint_length_days: 14,
            sprint_date_policy: SprintDatePolicy::Enforced,
            record_activity: true,
            search_snippet_chars: 200,
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document and validate the result.
    ///
    /// Missing keys take their default values.
    pub fn from_toml_str(source: &str) -> ScrumResult<Self> {
        let config: StoreConfig = toml::from_str(source).map_err(|e| {
            ScrumError::Config(ConfigError::Parse {
                reason: e.to_string(),
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ScrumResult<()> {
        if self.sprint_length_days < 2 {
            return Err(ScrumError::Config(ConfigError::InvalidValue {
                field: "sprint_length_days".to_string(),
                value: self.sprint_length_days.to_string(),
                reason: "sprint_length_days must be at least 2".to_string(),
            }));
        }

        if self.search_snippet_chars == 0 {
            return Err(ScrumError::Config(ConfigError::InvalidValue {
                field: "search_snippet_chars".to_string(),
                value: self.search_snippet_chars.to_string(),
                reason: "search_snippet_chars must be positive".to_string(),
            }));
        }

        if let Some(blank) = self
            .default_point_categories
            .iter()
            .position(|name| name.trim().is_empty())
        {
            return Err(ScrumError::Config(ConfigError::InvalidValue {
                field: format!("default_point_categories[{}]", blank),
                value: String::new(),
                reason: "category names must not be blank".to_string(),
            }));
        }

        Ok(())
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any sprint length of two days or more with a positive snippet size validates.
        #[test]
        fn prop_config_accepts_positive_lengths(days in 2u32..365, chars in 1usize..10_000) {
            let config = StoreConfig {
                sprint_length_days: days,
                search_snippet_chars: chars,
                ..StoreConfig::default()
            };
            prop_assert!(config.validate().is_ok());
        }

        /// TOML written from a valid config parses back to the same config.
        #[test]
        fn prop_config_toml_roundtrip(days in 2u32..365, record in any::<bool>()) {
            let config = StoreConfig {
                sprint_length_days: days,
                record_activity: record,
                ..StoreConfig::default()
            };
            let text = toml::to_string(&config).unwrap();
            prop_assert_eq!(StoreConfig::from_toml_str(&text).unwrap(), config);
        }
    }
}
