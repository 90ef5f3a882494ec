//! Resolver configuration, loaded from TOML.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{RestyleError, Result};

/// Which dynamic pseudo-class states are evaluated per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatePolicy {
    /// Only the default state (nothing hovered, focused, active or visited).
    #[default]
    DefaultOnly,
    /// Every state that is valid for the element.
    Reachable,
    /// Valid states restricted to the pseudo-classes some selector uses.
    Referenced,
}

/// Settings for a style resolution pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Output media; rules in `@media all` always apply as well.
    pub media: String,
    pub state_policy: StatePolicy,
    pub allow_hover: bool,
    pub allow_focus: bool,
    pub allow_active: bool,
    pub allow_visited: bool,
    /// Deadline for one page, polled at element boundaries.
    pub time_budget_ms: Option<u64>,
    /// Maximum `@import` nesting followed during collection.
    pub max_import_depth: usize,
    /// Elements whose subtree is never styled.
    pub skipped_tags: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            media: "screen".to_string(),
            state_policy: StatePolicy::DefaultOnly,
            allow_hover: true,
            allow_focus: true,
            allow_active: true,
            allow_visited: true,
            time_budget_ms: None,
            max_import_depth: 8,
            skipped_tags: vec![
                "head".to_string(),
                "script".to_string(),
                "noscript".to_string(),
            ],
        }
    }
}

impl ResolverConfig {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded resolver config from {}", path.as_ref().display());
        Self::from_toml(&text)
    }

    /// The time budget as a `Duration`, if one is configured.
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> Result<()> {
        if self.media.trim().is_empty() {
            return Err(RestyleError::Config("media must not be empty".into()));
        }
        if self.media.contains(|c: char| c.is_whitespace() || c == ',') {
            return Err(RestyleError::Config(format!(
                "media must be a single media type, got `{}`",
                self.media
            )));
        }
        Ok(())
    }
}
