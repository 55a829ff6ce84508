//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for the binary and other top-level glue.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` at the command layer.
pub type Result<T> = anyhow::Result<T>;

/// Failures during the offline build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// One page could not be extracted. Logged and skipped by the builder.
    #[error("failed to parse page {}: {reason}", path.display())]
    PageParse { path: PathBuf, reason: String },

    /// The corpus directory itself could not be read. Fatal.
    #[error("failed to read corpus directory {}", path.display())]
    CorpusRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be written. Fatal.
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {artifact}")]
    Serialize {
        artifact: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid corpus profile: {0}")]
    Profile(String),
}

/// Failures reading a named artifact from an [`ArtifactSource`](crate::artifact::ArtifactSource).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact '{0}' not found")]
    NotFound(String),

    #[error("failed to read artifact '{name}': {reason}")]
    Io { name: String, reason: String },
}

/// Runtime failures of the query engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// The quick index, page metadata, or manifest could not be loaded.
    /// Search is disabled for the session.
    #[error("search index unavailable: {artifact}: {reason}")]
    IndexUnavailable { artifact: String, reason: String },

    /// One full-text shard failed to load. The shard is dropped and the
    /// session continues with the rest.
    #[error("full-text shard {shard} ({file}) failed to load: {reason}")]
    ShardLoad {
        shard: usize,
        file: String,
        reason: String,
    },
}
