pub mod artifact;
pub mod build;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod error;
pub mod extract;
pub mod format;
pub mod search;
pub mod tracing;
pub mod types;

pub use build::{BuildReport, build_index};
pub use config::{BuildConfig, CorpusProfile};
pub use error::{ArtifactError, BuildError, SearchError};
pub use search::{SearchOptions, SearchOutcome, SearchSession, TierStatus};
pub use types::{Document, Manifest, PageMeta, PageType, RankedResult};
