//! CLI configuration file

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Settings read from the `--config` YAML file
///
/// Every field is optional in the file. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Fallback filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Pretty-print JSON output.
    pub pretty: bool,

    /// Fill in draft-07 defaults when loading schemas.
    pub normalize: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            pretty: false,
            normalize: false,
        }
    }
}

impl CliConfig {
    /// Load the file at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("invalid config file '{}'", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        // An empty file parses as null
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}
