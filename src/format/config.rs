//! Configuration for building a format factory.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};
use crate::format::resolver::CollisionPolicy;

/// Suffix shared by doc-values format type names.
pub const DEFAULT_NAME_SUFFIX: &str = "DocValuesFormat";

/// Settings applied while a [`FormatFactory`](crate::format::FormatFactory) scans its sources.
///
/// # Example
///
/// ```
/// use strata_formats::format::config::FormatFactoryConfig;
/// use strata_formats::format::CollisionPolicy;
///
/// let config = FormatFactoryConfig::from_json_str(r#"{"collision_policy": "warn"}"#).unwrap();
/// assert_eq!(config.collision_policy, CollisionPolicy::Warn);
/// assert!(config.include_builtins);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatFactoryConfig {
    /// How name overrides between sources are reported.
    pub collision_policy: CollisionPolicy,

    /// Scan the default source before any host-supplied ones.
    pub include_builtins: bool,

    /// Suffix stripped from type names by the default name derivation.
    pub name_suffix: String,

    /// Construct every registered format while building the factory.
    pub eager: bool,
}

impl Default for FormatFactoryConfig {
    fn default() -> Self {
        FormatFactoryConfig {
            collision_policy: CollisionPolicy::default(),
            include_builtins: true,
            name_suffix: DEFAULT_NAME_SUFFIX.to_string(),
            eager: false,
        }
    }
}

impl FormatFactoryConfig {
    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: FormatFactoryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |c: char| c.is_whitespace() || c == ':';
        if self.name_suffix.chars().any(invalid) {
            return Err(StrataError::invalid_config(format!(
                "name_suffix must be a plain identifier fragment, got {:?}",
                self.name_suffix
            )));
        }
        Ok(())
    }
}
