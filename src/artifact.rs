//! Persisted search artifacts: names, ASCII-safe encoding, and sources.
//!
//! Artifacts are JSON with every non-ASCII character escaped, so they survive
//! being served without an explicit charset.

use crate::error::ArtifactError;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::Formatter;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const QUICK_INDEX_FILE: &str = "index-quick.json";
pub const PAGE_META_FILE: &str = "page-meta.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name of the full-text shard at `index`.
pub fn shard_file(index: usize) -> String {
    format!("index-full-{}.json", index)
}

/// Compact JSON formatter that writes non-ASCII characters as `\uXXXX` escapes.
#[derive(Debug, Default, Clone, Copy)]
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut ascii_start = 0;
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[ascii_start..i])?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            ascii_start = i + c.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[ascii_start..])
    }
}

/// Serializes `value` as compact, pure-ASCII JSON.
pub fn to_ascii_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Parses an artifact fetched from a source.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Somewhere artifacts can be fetched from by name.
///
/// The query engine only ever suspends inside `fetch`.
pub trait ArtifactSource: Send + Sync + 'static {
    fn fetch(&self, name: &str) -> BoxFuture<'static, Result<Vec<u8>, ArtifactError>>;
}

/// Reads artifacts from a local build output directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSource for DirSource {
    fn fetch(&self, name: &str) -> BoxFuture<'static, Result<Vec<u8>, ArtifactError>> {
        let path = self.root.join(name);
        let name = name.to_string();
        Box::pin(async move {
            tokio::fs::read(&path).await.map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    ArtifactError::NotFound(name)
                } else {
                    ArtifactError::Io {
                        name,
                        reason: e.to_string(),
                    }
                }
            })
        })
    }
}

/// Serves artifacts held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    artifacts: HashMap<String, Arc<Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.artifacts.insert(name.into(), Arc::new(bytes));
    }

    /// Loads every file in `dir` as an artifact named by its file name.
    pub fn from_dir(dir: &Path) -> io::Result<Self> {
        let mut source = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                source.insert(
                    entry.file_name().to_string_lossy().into_owned(),
                    std::fs::read(entry.path())?,
                );
            }
        }
        Ok(source)
    }
}

impl ArtifactSource for MemorySource {
    fn fetch(&self, name: &str) -> BoxFuture<'static, Result<Vec<u8>, ArtifactError>> {
        let result = self
            .artifacts
            .get(name)
            .map(|bytes| bytes.as_ref().clone())
            .ok_or_else(|| ArtifactError::NotFound(name.to_string()));
        Box::pin(async move { result })
    }
}
