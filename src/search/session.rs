//! Tiered query execution over loaded artifacts.
//!
//! A [`SearchSession`] owns the quick index and page metadata from the moment
//! it opens. Full-text shards are fetched the first time a query needs them,
//! exactly once: concurrent queries arriving while the load is in flight
//! await the same shared future.

use super::blend::{BlendPolicy, MatchOrigin, ScoreBoard, Tier};
use super::dedup::deduplicate;
use super::index::{Combine, Fuzziness, LookupOptions, TextIndex};
use super::synonyms::expand_query;
use super::tokenize::whitespace_term_count;
use crate::artifact::{ArtifactSource, MANIFEST_FILE, PAGE_META_FILE, QUICK_INDEX_FILE, decode};
use crate::config::CorpusProfile;
use crate::error::SearchError;
use crate::types::{Manifest, PageMeta, RankedResult, SearchHit, ShardInfo};
use ahash::AHashMap;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Fewer quick hits than this pulls in the full-text tier.
pub const FULL_TEXT_THRESHOLD: usize = 5;

const QUICK_BOOSTS: &[(&str, f64)] = &[("title", 5.0), ("breadcrumb", 1.0)];

/// Caller-controlled query options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Search page bodies even when the quick tier finds enough.
    pub full_text: bool,
}

/// Which tiers contributed to an outcome.
#[derive(Debug, Clone)]
pub enum TierStatus {
    /// The query was empty; nothing was searched.
    Skipped,
    QuickOnly,
    FullText { shards: usize },
    /// Some shards failed to load. Results come from the quick tier and the
    /// shards that did load.
    Degraded {
        loaded: usize,
        failed: Vec<SearchError>,
    },
}

impl TierStatus {
    pub fn used_full_text(&self) -> bool {
        matches!(self, Self::FullText { .. } | Self::Degraded { .. })
    }
}

impl fmt::Display for TierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("no search performed"),
            Self::QuickOnly => f.write_str("titles and breadcrumbs"),
            Self::FullText { shards } => write!(f, "titles, breadcrumbs and full text ({} shards)", shards),
            Self::Degraded { loaded, failed } => write!(
                f,
                "full text degraded ({} shards loaded, {} failed)",
                loaded,
                failed.len()
            ),
        }
    }
}

/// Ranked, deduplicated results of one query.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query: String,
    /// The synonym-expanded query, when expansion changed anything.
    pub expanded_query: Option<String>,
    pub results: Vec<RankedResult>,
    /// Merged quick-tier hits before full text and deduplication.
    pub quick_count: usize,
    pub status: TierStatus,
}

/// Loaded full-text shards plus the ones that could not be loaded.
#[derive(Debug, Default)]
struct FullTextTier {
    shards: Vec<TextIndex>,
    failures: Vec<SearchError>,
}

type SharedLoad = Shared<BoxFuture<'static, Arc<FullTextTier>>>;

enum FullTextState {
    NotLoaded,
    Loading(SharedLoad),
    Loaded(Arc<FullTextTier>),
}

/// Query engine over one set of artifacts.
pub struct SearchSession {
    source: Arc<dyn ArtifactSource>,
    quick: TextIndex,
    pages: AHashMap<u32, PageMeta>,
    manifest: Manifest,
    primary_section: String,
    policy: BlendPolicy,
    full_text: Mutex<FullTextState>,
}

impl fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_text = match self.full_text.try_lock().as_deref() {
            Ok(FullTextState::NotLoaded) => "not loaded",
            Ok(FullTextState::Loading(_)) => "loading",
            Ok(FullTextState::Loaded(_)) => "loaded",
            Err(_) => "busy",
        };
        f.debug_struct("SearchSession")
            .field("pages", &self.pages.len())
            .field("shards", &self.manifest.shard_count)
            .field("full_text", &full_text)
            .finish_non_exhaustive()
    }
}

async fn fetch_required<T: DeserializeOwned>(
    source: &dyn ArtifactSource,
    name: &str,
) -> Result<T, SearchError> {
    let unavailable = |reason: String| SearchError::IndexUnavailable {
        artifact: name.to_string(),
        reason,
    };
    let bytes = source.fetch(name).await.map_err(|e| unavailable(e.to_string()))?;
    decode(&bytes).map_err(|e| unavailable(e.to_string()))
}

impl SearchSession {
    /// Loads the quick index, page metadata, and manifest.
    ///
    /// Any of the three failing disables search, so the session does not open.
    pub async fn open(
        source: Arc<dyn ArtifactSource>,
        profile: &CorpusProfile,
    ) -> Result<Self, SearchError> {
        let (quick, meta, manifest) = futures::try_join!(
            fetch_required::<TextIndex>(source.as_ref(), QUICK_INDEX_FILE),
            fetch_required::<Vec<PageMeta>>(source.as_ref(), PAGE_META_FILE),
            fetch_required::<Manifest>(source.as_ref(), MANIFEST_FILE),
        )?;

        tracing::info!(
            "Opened search index: {} pages, {} quick terms, {} full-text shards (built {})",
            meta.len(),
            quick.term_count(),
            manifest.shard_count,
            manifest.built_at
        );

        Ok(Self {
            source,
            quick,
            pages: meta.into_iter().map(|m| (m.id, m)).collect(),
            manifest,
            primary_section: profile.primary_section.clone(),
            policy: BlendPolicy::default(),
            full_text: Mutex::new(FullTextState::NotLoaded),
        })
    }

    /// Replaces the blend policy used for merging tiers.
    #[must_use]
    pub fn with_policy(mut self, policy: BlendPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Display metadata for a page id.
    pub fn meta(&self, id: u32) -> Option<&PageMeta> {
        self.pages.get(&id)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub async fn is_full_text_loaded(&self) -> bool {
        matches!(*self.full_text.lock().await, FullTextState::Loaded(_))
    }

    /// Runs `query` through the quick tier, the full-text tier when needed,
    /// and deduplication.
    pub async fn search(&self, query: &str, options: SearchOptions) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome {
                query: String::new(),
                expanded_query: None,
                results: vec![],
                quick_count: 0,
                status: TierStatus::Skipped,
            };
        }

        let expansion = expand_query(query);
        let expanded = expansion.is_expanded().then_some(expansion.expanded);

        let literal_options = LookupOptions {
            combine: if whitespace_term_count(query) >= 2 { Combine::And } else { Combine::Or },
            fuzziness: Fuzziness::Adaptive,
            prefix: true,
            boosts: QUICK_BOOSTS,
        };
        let expanded_options = LookupOptions {
            combine: Combine::Or,
            fuzziness: Fuzziness::Off,
            ..literal_options
        };

        let mut board = ScoreBoard::default();
        board.merge(
            &self.quick.search(query, &literal_options),
            Tier::Quick,
            MatchOrigin::Literal,
            &self.policy,
        );
        if let Some(expanded) = &expanded {
            board.merge(
                &self.quick.search(expanded, &expanded_options),
                Tier::Quick,
                MatchOrigin::Expanded,
                &self.policy,
            );
        }
        let quick_count = board.len();

        let status = if options.full_text || quick_count < FULL_TEXT_THRESHOLD {
            let tier = self.full_text_tier().await;
            let variants = [(Some(query), MatchOrigin::Literal), (expanded.as_deref(), MatchOrigin::Expanded)];
            for (text, origin) in variants {
                let Some(text) = text else { continue };
                for shard in &tier.shards {
                    // Shards reuse the literal query's combine and fuzziness for both variants
                    let hits = shard.search(text, &literal_options);
                    board.merge(&hits, Tier::FullText, origin, &self.policy);
                }
            }

            if tier.failures.is_empty() {
                TierStatus::FullText {
                    shards: tier.shards.len(),
                }
            } else {
                TierStatus::Degraded {
                    loaded: tier.shards.len(),
                    failed: tier.failures.clone(),
                }
            }
        } else {
            TierStatus::QuickOnly
        };

        let merged: Vec<SearchHit> = board.into_sorted();
        let results = deduplicate(&merged, |id| self.pages.get(&id), &self.primary_section);

        tracing::debug!(
            "Query {:?}: {} quick hits, {} merged, {} after dedup ({})",
            query,
            quick_count,
            merged.len(),
            results.len(),
            status
        );

        SearchOutcome {
            query: query.to_string(),
            expanded_query: expanded,
            results,
            quick_count,
            status,
        }
    }

    /// The full-text tier, loading it on first use.
    async fn full_text_tier(&self) -> Arc<FullTextTier> {
        let load = {
            let mut state = self.full_text.lock().await;
            match &*state {
                FullTextState::Loaded(tier) => return tier.clone(),
                FullTextState::Loading(load) => {
                    tracing::debug!("Awaiting in-flight full-text load");
                    load.clone()
                }
                FullTextState::NotLoaded => {
                    let load = load_shards(self.source.clone(), self.manifest.shards.clone())
                        .boxed()
                        .shared();
                    *state = FullTextState::Loading(load.clone());
                    load
                }
            }
        };

        let tier = load.await;

        let mut state = self.full_text.lock().await;
        if matches!(*state, FullTextState::Loading(_)) {
            *state = FullTextState::Loaded(tier.clone());
        }
        tier
    }
}

async fn load_shards(source: Arc<dyn ArtifactSource>, shards: Vec<ShardInfo>) -> Arc<FullTextTier> {
    let started = Instant::now();
    tracing::info!("Loading {} full-text shards", shards.len());

    let loads = shards
        .iter()
        .enumerate()
        .map(|(i, info)| load_shard(source.as_ref(), i, info));
    let results = futures::future::join_all(loads).await;

    let mut tier = FullTextTier::default();
    for result in results {
        match result {
            Ok(index) => tier.shards.push(index),
            Err(e) => {
                tracing::warn!("{}", e);
                tier.failures.push(e);
            }
        }
    }

    tracing::info!(
        "Full-text index loaded in {:.2?}: {} shards, {} failed",
        started.elapsed(),
        tier.shards.len(),
        tier.failures.len()
    );
    Arc::new(tier)
}

async fn load_shard(
    source: &dyn ArtifactSource,
    shard: usize,
    info: &ShardInfo,
) -> Result<TextIndex, SearchError> {
    let failed = |reason: String| SearchError::ShardLoad {
        shard,
        file: info.file.clone(),
        reason,
    };
    let bytes = source.fetch(&info.file).await.map_err(|e| failed(e.to_string()))?;
    tokio::task::spawn_blocking(move || decode::<TextIndex>(&bytes))
        .await
        .map_err(|e| failed(e.to_string()))?
        .map_err(|e| failed(e.to_string()))
}
