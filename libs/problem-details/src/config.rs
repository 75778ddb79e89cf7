//! Handler configuration and its loading from a raw JSON config tree.
//!
//! Two loaders are provided, mirroring how services read optional sections:
//!
//! 1. **Lenient** ([`config_or_default`]): a missing section yields the defaults.
//! 2. **Strict** ([`config_required`]): the section must be present.
//!
//! Both fail on a section that is present but malformed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the configuration section read by the loaders.
pub const CONFIG_SECTION: &str = "problem_details";

/// Data part of the problem handler options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProblemConfig {
    /// Prefix for generated type URIs: `<prefix>/<status-slug>`.
    pub type_prefix: Option<String>,
    /// Type URI used when no slug-based type can be built.
    pub default_type: Option<String>,
    /// Put the failure's diagnostic text into `detail` of generic 500s.
    pub include_stack: bool,
}

impl ProblemConfig {
    #[must_use]
    pub fn with_type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.type_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_default_type(mut self, type_url: impl Into<String>) -> Self {
        self.default_type = Some(type_url.into());
        self
    }

    #[must_use]
    pub fn with_include_stack(mut self, include_stack: bool) -> Self {
        self.include_stack = include_stack;
        self
    }

    /// The prefix without trailing slashes; an empty prefix counts as unset.
    #[must_use]
    pub fn type_prefix(&self) -> Option<&str> {
        self.type_prefix
            .as_deref()
            .map(|prefix| prefix.trim_end_matches('/'))
            .filter(|prefix| !prefix.is_empty())
    }

    #[must_use]
    pub fn default_type(&self) -> Option<&str> {
        self.default_type.as_deref()
    }
}

/// Configuration error for problem handler configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing '{section}' config section")]
    MissingSection { section: &'static str },
    #[error("'{section}' config section must be an object")]
    InvalidStructure { section: &'static str },
    #[error("invalid '{section}' config: {source}")]
    InvalidConfig {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Read [`CONFIG_SECTION`] from `root`, falling back to defaults when it is missing.
///
/// # Errors
/// Returns [`ConfigError`] if the section exists but is not a valid configuration.
pub fn config_or_default(root: &Value) -> Result<ProblemConfig, ConfigError> {
    match root.get(CONFIG_SECTION) {
        None | Some(Value::Null) => Ok(ProblemConfig::default()),
        Some(section) => parse_section(section),
    }
}

/// Read [`CONFIG_SECTION`] from `root`; the section must be present.
///
/// # Errors
/// Returns [`ConfigError::MissingSection`] when the section is absent, other
/// variants when it is malformed.
pub fn config_required(root: &Value) -> Result<ProblemConfig, ConfigError> {
    let section = root
        .get(CONFIG_SECTION)
        .filter(|section| !section.is_null())
        .ok_or(ConfigError::MissingSection {
            section: CONFIG_SECTION,
        })?;
    parse_section(section)
}

fn parse_section(section: &Value) -> Result<ProblemConfig, ConfigError> {
    if !section.is_object() {
        return Err(ConfigError::InvalidStructure {
            section: CONFIG_SECTION,
        });
    }
    ProblemConfig::deserialize(section).map_err(|source| ConfigError::InvalidConfig {
        section: CONFIG_SECTION,
        source,
    })
}
