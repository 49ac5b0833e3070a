//! Assertion configuration via `indexcheck.toml`
//!
//! Holds the defaults every assertion chain starts from: the flush strategy
//! the action under test runs in, and an optional prefix applied to index
//! names. Test suites usually keep one file next to their fixtures and load
//! it once.

use indexcheck_capture::StrategyKind;
use indexcheck_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "indexcheck.toml";

/// Defaults for assertion chains loaded from `indexcheck.toml`.
///
/// # Example
///
/// ```toml
/// # Flush strategy: "atomic" (default), "atomic_no_refresh" or "urgent"
/// strategy = "atomic"
///
/// # index_prefix = "test"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Flush strategy name: `"atomic"`, `"atomic_no_refresh"` or `"urgent"`.
    #[serde(default = "default_strategy_str")]
    pub strategy: String,
    /// Prefix joined to index names with `_`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_prefix: Option<String>,
}

fn default_strategy_str() -> String {
    StrategyKind::default().as_str().to_string()
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy_str(),
            index_prefix: None,
        }
    }
}

impl CheckConfig {
    /// Parse the strategy string into a `StrategyKind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a known strategy.
    pub fn strategy_kind(&self) -> Result<StrategyKind> {
        self.strategy.parse()
    }

    /// Apply the configured prefix to an index name
    ///
    /// Names that already carry the prefix are returned unchanged.
    pub fn derive_index_name(&self, name: &str) -> String {
        match self.index_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => {
                let prefixed = format!("{}_", prefix);
                if name.starts_with(&prefixed) {
                    name.to_string()
                } else {
                    format!("{}{}", prefixed, name)
                }
            }
            _ => name.to_string(),
        }
    }

    /// Parse and validate a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema or the
    /// strategy is unknown.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CheckConfig = toml::from_str(content)
            .map_err(|e| Error::invalid_config(format!("cannot parse {}: {}", CONFIG_FILE_NAME, e)))?;
        config.strategy_kind()?;
        Ok(config)
    }

    /// Read and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not validate.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::invalid_config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# indexcheck configuration
#
# Flush strategy the action under test runs in:
#   "atomic"            = stash imports, send one batch per index on leave (default)
#   "atomic_no_refresh" = like "atomic", with refresh=false on every batch
#   "urgent"            = send every import immediately
strategy = "atomic"

# Prefix joined to index names with "_" (e.g. "test" turns "users" into "test_users")
# index_prefix = "test"
"#
    }
}
