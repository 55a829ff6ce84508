//! Offline index build: corpus pages in, search artifacts out.
//!
//! The build runs as one batch. Pages are extracted in parallel, then sorted
//! by id so the artifacts depend only on corpus content and shard size.

use crate::artifact::{
    MANIFEST_FILE, MemorySource, PAGE_META_FILE, QUICK_INDEX_FILE, shard_file, to_ascii_json,
};
use crate::config::{BuildConfig, DEFAULT_SHARD_SIZE, MIN_CONTENT_CHARS};
use crate::error::BuildError;
use crate::extract::Extractor;
use crate::search::IndexBuilder;
use crate::types::{Document, Manifest, PageMeta, ShardInfo};
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Log a progress line every this many extracted pages.
const PROGRESS_INTERVAL: usize = 2000;

/// Subdirectory holding the pages in a standard export.
const PAGES_DIR: &str = "pages";

pub const QUICK_FIELDS: &[&str] = &["title", "breadcrumb"];
pub const FULL_TEXT_FIELDS: &[&str] = &["body"];

/// Summary of one build run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub total_files: usize,
    pub parsed: usize,
    pub failed: usize,
    pub content_pages: usize,
    pub shard_count: usize,
    pub bytes_written: u64,
}

/// Encoded artifacts of one build, ready to be written or served.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub manifest: Manifest,
    /// `(file name, bytes)` in write order: quick index, page metadata, shards, manifest.
    pub files: Vec<(String, Vec<u8>)>,
}

impl ArtifactSet {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|(_, bytes)| bytes.len() as u64).sum()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(file, _)| file == name)
            .map(|(_, bytes)| bytes.as_slice())
    }

    pub fn into_memory_source(self) -> MemorySource {
        let mut source = MemorySource::new();
        for (name, bytes) in self.files {
            source.insert(name, bytes);
        }
        source
    }
}

/// Whether a document belongs in the full-text shards.
pub fn is_content_page(doc: &Document) -> bool {
    !doc.is_nav_page && doc.body_text.chars().count() > MIN_CONTENT_CHARS
}

/// Lists the page files of a corpus, sorted by path.
///
/// Pages live in `<root>/pages/` when that directory exists, otherwise
/// directly in `<root>`.
pub fn collect_page_files(corpus_root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let pages_dir = corpus_root.join(PAGES_DIR);
    let dir = if pages_dir.is_dir() { pages_dir } else { corpus_root.to_path_buf() };

    std::fs::metadata(&dir).map_err(|source| BuildError::CorpusRead {
        path: dir.clone(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in WalkBuilder::new(&dir)
        .max_depth(Some(1))
        .standard_filters(false)
        .build()
    {
        let entry = entry.map_err(|e| {
            let message = e.to_string();
            BuildError::CorpusRead {
                path: dir.clone(),
                source: e.into_io_error().unwrap_or_else(|| std::io::Error::other(message)),
            }
        })?;
        let path = entry.path();
        let is_html = path.extension().and_then(|ext| ext.to_str()) == Some("html");
        if is_html && entry.file_type().is_some_and(|t| t.is_file()) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Extracts every page in parallel. Pages that fail are logged and skipped.
///
/// Returns documents sorted by id, plus the number of failures.
pub fn extract_all(files: &[PathBuf], extractor: &Extractor) -> (Vec<Document>, usize) {
    let done = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let total = files.len();

    let mut docs: Vec<Document> = files
        .par_iter()
        .filter_map(|path| {
            let result = extractor.extract_file(path);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if finished % PROGRESS_INTERVAL == 0 {
                tracing::info!("Parsed {}/{} pages", finished, total);
            }
            match result {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::warn!("Skipping page: {}", e);
                    failed.fetch_add(1, Ordering::Relaxed);
                    None
                }
            }
        })
        .collect();

    docs.sort_by_key(|doc| doc.id);
    (docs, failed.load(Ordering::Relaxed))
}

fn encode<T: Serialize + ?Sized>(artifact: &str, value: &T) -> Result<Vec<u8>, BuildError> {
    to_ascii_json(value).map_err(|source| BuildError::Serialize {
        artifact: artifact.to_string(),
        source,
    })
}

/// Builds every artifact from documents already sorted by id.
pub fn assemble_artifacts(
    docs: &[Document],
    shard_size: usize,
    built_at: DateTime<Utc>,
) -> Result<ArtifactSet, BuildError> {
    let shard_size = if shard_size == 0 { DEFAULT_SHARD_SIZE } else { shard_size };
    let mut files = Vec::new();

    let mut quick = IndexBuilder::new(QUICK_FIELDS);
    for doc in docs {
        quick.add(doc.id, &[&doc.title, &doc.breadcrumb]);
    }
    let quick_bytes = encode(QUICK_INDEX_FILE, &quick.finish())?;
    tracing::info!("Quick index: {}", format_size(quick_bytes.len() as u64));
    files.push((QUICK_INDEX_FILE.to_string(), quick_bytes));

    let meta: Vec<PageMeta> = docs.iter().map(Document::meta).collect();
    let meta_bytes = encode(PAGE_META_FILE, &meta)?;
    tracing::info!("Page metadata: {}", format_size(meta_bytes.len() as u64));
    files.push((PAGE_META_FILE.to_string(), meta_bytes));

    let content: Vec<&Document> = docs.iter().filter(|doc| is_content_page(doc)).collect();
    tracing::info!(
        "{} content pages ({} nav or empty pages excluded)",
        content.len(),
        docs.len() - content.len()
    );

    let mut shards = Vec::new();
    for (i, chunk) in content.chunks(shard_size).enumerate() {
        let mut builder = IndexBuilder::new(FULL_TEXT_FIELDS);
        for doc in chunk {
            builder.add(doc.id, &[&doc.body_text]);
        }
        let file = shard_file(i);
        let bytes = encode(&file, &builder.finish())?;
        tracing::info!("Shard {}: {} docs, {}", i, chunk.len(), format_size(bytes.len() as u64));

        // chunks() never yields an empty slice
        let (first, last) = (chunk[0].id, chunk[chunk.len() - 1].id);
        shards.push(ShardInfo {
            file: file.clone(),
            first_id: first,
            last_id: last,
            doc_count: chunk.len(),
        });
        files.push((file, bytes));
    }

    let manifest = Manifest {
        shard_count: shards.len(),
        shards,
        total_pages: docs.len(),
        content_pages: content.len(),
        built_at,
    };
    files.push((MANIFEST_FILE.to_string(), encode(MANIFEST_FILE, &manifest)?));

    Ok(ArtifactSet { manifest, files })
}

/// Writes `artifacts` into `out_dir`, creating it if needed. Returns bytes written.
pub fn write_artifacts(artifacts: &ArtifactSet, out_dir: &Path) -> Result<u64, BuildError> {
    std::fs::create_dir_all(out_dir).map_err(|source| BuildError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;
    for (name, bytes) in &artifacts.files {
        let path = out_dir.join(name);
        std::fs::write(&path, bytes).map_err(|source| BuildError::Write { path, source })?;
    }
    Ok(artifacts.total_bytes())
}

/// Extracts the corpus at `corpus_root` and writes all artifacts to `out_dir`.
///
/// Only an unreadable corpus or an unwritable output fails the build;
/// individual bad pages are skipped.
pub fn build_index(
    corpus_root: &Path,
    out_dir: &Path,
    config: &BuildConfig,
) -> Result<BuildReport, BuildError> {
    let started = Instant::now();
    let extractor = Extractor::new(&config.profile)?;

    let files = collect_page_files(corpus_root)?;
    tracing::info!("Found {} pages in {}", files.len(), corpus_root.display());

    let (docs, failed) = extract_all(&files, &extractor);
    tracing::info!("Parsed {} pages successfully", docs.len());

    let artifacts = assemble_artifacts(&docs, config.shard_size, Utc::now())?;
    let bytes_written = write_artifacts(&artifacts, out_dir)?;

    tracing::info!(
        "Build complete in {:.2?}: {} files, {} total, {} shards, output in {}",
        started.elapsed(),
        artifacts.files.len(),
        format_size(bytes_written),
        artifacts.manifest.shard_count,
        out_dir.display()
    );

    Ok(BuildReport {
        total_files: files.len(),
        parsed: docs.len(),
        failed,
        content_pages: artifacts.manifest.content_pages,
        shard_count: artifacts.manifest.shard_count,
        bytes_written,
    })
}

fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::TextIndex;
    use crate::types::PageType;
    use assert2::{check, let_assert};
    use chrono::TimeZone;

    fn doc(id: u32, body_len: usize, nav: bool) -> Document {
        Document {
            id,
            title: format!("Page {}", id),
            breadcrumb: "Repair and Diagnosis > Engine".into(),
            body_text: "x".repeat(body_len),
            snippet: String::new(),
            page_type: if nav { PageType::Nav } else { PageType::Content },
            is_nav_page: nav,
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_content_threshold_is_exclusive() {
        check!(!is_content_page(&doc(1, 50, false)));
        check!(is_content_page(&doc(1, 51, false)));
        check!(!is_content_page(&doc(1, 500, true)));
    }

    #[test]
    fn test_shards_partition_content_pages() {
        let docs: Vec<Document> = (1..=7)
            .map(|id| doc(id, if id == 4 { 10 } else { 80 }, id == 2))
            .collect();
        let artifacts = assemble_artifacts(&docs, 2, fixed_time()).unwrap();
        let manifest = &artifacts.manifest;

        check!(manifest.total_pages == 7);
        check!(manifest.content_pages == 5);
        check!(manifest.shard_count == 3);
        let counts: Vec<usize> = manifest.shards.iter().map(|s| s.doc_count).collect();
        check!(counts == [2, 2, 1]);
        check!(manifest.shards[0].first_id == 1);
        check!(manifest.shards[0].last_id == 3);
        check!(manifest.shards[2].first_id == 7);

        let_assert!(Some(bytes) = artifacts.get("index-full-1.json"));
        let shard: TextIndex = crate::artifact::decode(bytes).unwrap();
        check!(shard.ids() == [5, 6]);
    }

    #[test]
    fn test_no_content_means_no_shards() {
        let docs = vec![doc(1, 0, false), doc(2, 10, true)];
        let artifacts = assemble_artifacts(&docs, 2000, fixed_time()).unwrap();
        check!(artifacts.manifest.shard_count == 0);
        check!(artifacts.files.len() == 3);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let docs: Vec<Document> = (1..=20).map(|id| doc(id, 60 + id as usize, false)).collect();
        let a = assemble_artifacts(&docs, 6, fixed_time()).unwrap();
        let b = assemble_artifacts(&docs, 6, fixed_time()).unwrap();
        check!(a.files == b.files);
    }

    #[test]
    fn test_missing_corpus_is_fatal() {
        let result = collect_page_files(Path::new("/nonexistent/corpus"));
        let_assert!(Err(BuildError::CorpusRead { .. }) = result);
    }

    #[test]
    fn test_collects_from_pages_dir() {
        let dir = tempfile::tempdir().unwrap();
        let pages = dir.path().join("pages");
        std::fs::create_dir(&pages).unwrap();
        std::fs::write(pages.join("2.html"), "").unwrap();
        std::fs::write(pages.join("1.html"), "").unwrap();
        std::fs::write(pages.join("notes.txt"), "").unwrap();
        std::fs::write(dir.path().join("9.html"), "").unwrap();

        let files = collect_page_files(dir.path()).unwrap();
        check!(files == [pages.join("1.html"), pages.join("2.html")]);
    }
}
