//! Corpus conventions and build settings.
//!
//! A [`CorpusProfile`] captures the markers a particular manual export uses
//! (title decoration, breadcrumb root, preferred section). Defaults match the
//! shipped manual; other exports can supply a TOML file with any subset of
//! the fields.

use crate::error::BuildError;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Documents per full-text shard.
pub const DEFAULT_SHARD_SIZE: usize = 2000;
/// Maximum characters of body text kept per page.
pub const BODY_TRUNCATE: usize = 2000;
/// Characters of body text shown as a result snippet.
pub const SNIPPET_LENGTH: usize = 200;
/// Pages with a body this short or shorter are left out of full-text shards.
pub const MIN_CONTENT_CHARS: usize = 50;

/// Markers of one manual export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorpusProfile {
    /// Regex matching the decoration appended to every `<title>`.
    pub title_suffix: String,
    /// Breadcrumb segment after which the meaningful path starts.
    pub breadcrumb_root: String,
    /// Breadcrumb prefix of the section preferred when collapsing duplicates.
    pub primary_section: String,
}

impl Default for CorpusProfile {
    fn default() -> Self {
        Self {
            title_suffix: r"\s*[—–-]\s*2008 Cadillac SRX.*$".to_string(),
            breadcrumb_root: "SRX AWD V8-4.6L".to_string(),
            primary_section: "Repair and Diagnosis".to_string(),
        }
    }
}

impl CorpusProfile {
    /// Parses a profile from TOML text; missing fields keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, BuildError> {
        let profile: Self = toml::from_str(text).map_err(|e| BuildError::Profile(e.to_string()))?;
        profile.title_suffix_regex()?;
        Ok(profile)
    }

    /// Loads a profile file.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BuildError::Profile(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Loads `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, BuildError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn title_suffix_regex(&self) -> Result<Regex, BuildError> {
        Regex::new(&self.title_suffix)
            .map_err(|e| BuildError::Profile(format!("title_suffix: {}", e)))
    }
}

/// Settings for one build run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub shard_size: usize,
    pub profile: CorpusProfile,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            shard_size: DEFAULT_SHARD_SIZE,
            profile: CorpusProfile::default(),
        }
    }
}
