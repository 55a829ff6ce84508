use crate::config::DEFAULT_SHARD_SIZE;
use crate::search::DEFAULT_PAGE_SIZE;
use crate::tracing::LogFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "manual-search")]
#[command(about = "Build and query a search index over an exported service manual", long_about = None)]
pub struct Cli {
    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract every page of a corpus and write the search artifacts
    Build {
        /// Corpus root: holds `pages/*.html` or the page files directly
        corpus: PathBuf,
        /// Output directory for the artifacts
        out: PathBuf,
        /// Content pages per full-text shard
        #[arg(long, default_value_t = DEFAULT_SHARD_SIZE, value_parser = parse_positive)]
        shard_size: usize,
        /// TOML file overriding corpus conventions
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Search built artifacts
    Search {
        query: String,
        /// Directory holding the artifacts
        #[arg(short, long, default_value = "search-data")]
        data: PathBuf,
        /// Always search page bodies, not only when titles find few matches
        #[arg(short = 'f', long)]
        full_text: bool,
        /// 1-based result page
        #[arg(short, long, default_value_t = 1, value_parser = parse_positive)]
        page: usize,
        #[arg(short = 'n', long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = parse_positive)]
        page_size: usize,
        /// Print results as JSON instead of text
        #[arg(long)]
        json: bool,
        /// TOML file overriding corpus conventions
        #[arg(long)]
        profile: Option<PathBuf>,
    },
}

fn parse_positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
