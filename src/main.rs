use anyhow::Context;
use clap::Parser;
use manual_search::artifact::DirSource;
use manual_search::cli::{Cli, Commands};
use manual_search::error::Result;
use manual_search::format::render_outcome;
use manual_search::search::paginate;
use manual_search::{BuildConfig, CorpusProfile, SearchOptions, SearchSession, build_index};
use std::path::{Path, PathBuf};
use std::sync::Arc;

async fn run_build(corpus: PathBuf, out: PathBuf, shard_size: usize, profile: Option<&Path>) -> Result<()> {
    let profile = CorpusProfile::load_or_default(profile).context("Failed to load corpus profile")?;
    let config = BuildConfig { shard_size, profile };

    let report = tokio::task::spawn_blocking(move || build_index(&corpus, &out, &config))
        .await
        .context("Build task panicked")?
        .context("Build failed")?;

    println!(
        "Indexed {} of {} pages ({} failed): {} content pages in {} shards, {} bytes written",
        report.parsed,
        report.total_files,
        report.failed,
        report.content_pages,
        report.shard_count,
        report.bytes_written
    );
    Ok(())
}

struct SearchArgs {
    query: String,
    data: PathBuf,
    full_text: bool,
    page: usize,
    page_size: usize,
    json: bool,
    profile: Option<PathBuf>,
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let profile = CorpusProfile::load_or_default(args.profile.as_deref()).context("Failed to load corpus profile")?;
    let source = Arc::new(DirSource::new(&args.data));
    let session = SearchSession::open(source, &profile)
        .await
        .with_context(|| format!("Failed to open search index in {}", args.data.display()))?;

    let outcome = session
        .search(
            &args.query,
            SearchOptions {
                full_text: args.full_text,
            },
        )
        .await;
    let offset = (args.page - 1).saturating_mul(args.page_size);
    let page = paginate(&outcome.results, offset, args.page_size);

    if args.json {
        let results: Vec<serde_json::Value> = page
            .items
            .iter()
            .map(|result| {
                let meta = session.meta(result.id);
                serde_json::json!({
                    "id": result.id,
                    "score": result.score,
                    "dedupCount": result.dedup_count,
                    "title": meta.map(|m| m.title.as_str()),
                    "breadcrumb": meta.map(|m| m.breadcrumb.as_str()),
                    "pageType": meta.map(|m| m.page_type),
                    "snippet": meta.map(|m| m.snippet.as_str()),
                })
            })
            .collect();
        let body = serde_json::json!({
            "query": outcome.query,
            "expandedQuery": outcome.expanded_query,
            "status": outcome.status.to_string(),
            "total": page.total,
            "offset": page.offset,
            "results": results,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print!("{}", render_outcome(&outcome, &page, &session));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    manual_search::tracing::init_with(cli.log_format);

    let result = match cli.command {
        Commands::Build {
            corpus,
            out,
            shard_size,
            profile,
        } => run_build(corpus, out, shard_size, profile.as_deref()).await,
        Commands::Search {
            query,
            data,
            full_text,
            page,
            page_size,
            json,
            profile,
        } => {
            run_search(SearchArgs {
                query,
                data,
                full_text,
                page,
                page_size,
                json,
                profile,
            })
            .await
        }
    };
    result.inspect_err(|e| tracing::error!("{:#}", e))
}
