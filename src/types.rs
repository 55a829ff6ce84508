//! Core records shared by the build stage and the query engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Page classification, derived once at build time.
///
/// DO NOT rename variants without a rebuild: the lowercase serialized form is
/// what lands in `page-meta.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Service,
    Testing,
    Diagrams,
    Locations,
    Tsb,
    Labor,
    Specifications,
    Dtc,
    Description,
    Precautions,
    Tools,
    Adjustments,
    Parts,
    Content,
    Nav,
}

impl PageType {
    pub const ALL: [Self; 15] = [
        Self::Service,
        Self::Testing,
        Self::Diagrams,
        Self::Locations,
        Self::Tsb,
        Self::Labor,
        Self::Specifications,
        Self::Dtc,
        Self::Description,
        Self::Precautions,
        Self::Tools,
        Self::Adjustments,
        Self::Parts,
        Self::Content,
        Self::Nav,
    ];

    /// Maps a breadcrumb section label to its page type.
    ///
    /// Unknown labels are ordinary content pages.
    pub fn from_section_label(label: &str) -> Self {
        match label {
            "Testing and Inspection" => Self::Testing,
            "Service and Repair" => Self::Service,
            "Diagrams" => Self::Diagrams,
            "Locations" => Self::Locations,
            "Technical Service Bulletins" => Self::Tsb,
            "Labor Times" => Self::Labor,
            "Specifications" => Self::Specifications,
            "Diagnostic Trouble Codes" => Self::Dtc,
            "Description and Operation" => Self::Description,
            "Service Precautions" => Self::Precautions,
            "Tools and Equipment" => Self::Tools,
            "Adjustments" => Self::Adjustments,
            "Parts" => Self::Parts,
            _ => Self::Content,
        }
    }

    /// Rank used when picking a representative among duplicates.
    /// Lower is more useful to someone doing a repair.
    pub const fn priority(self) -> u8 {
        match self {
            Self::Service => 1,
            Self::Testing => 2,
            Self::Diagrams => 3,
            Self::Description => 4,
            Self::Tsb => 5,
            Self::Specifications => 6,
            Self::Locations => 7,
            Self::Dtc => 8,
            Self::Precautions => 9,
            Self::Tools => 10,
            Self::Adjustments => 11,
            Self::Labor => 12,
            Self::Parts => 13,
            Self::Content => 14,
            Self::Nav => 20,
        }
    }

    /// Short badge shown next to a result.
    pub const fn display_label(self) -> &'static str {
        match self {
            Self::Service => "Service & Repair",
            Self::Testing => "Testing",
            Self::Diagrams => "Diagram",
            Self::Locations => "Location",
            Self::Tsb => "TSB",
            Self::Labor => "Labor Times",
            Self::Specifications => "Specs",
            Self::Dtc => "DTC",
            Self::Description => "Description",
            Self::Precautions => "Precaution",
            Self::Tools => "Tools",
            Self::Adjustments => "Adjustment",
            Self::Parts => "Parts",
            Self::Content => "Content",
            Self::Nav => "Index",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Testing => "testing",
            Self::Diagrams => "diagrams",
            Self::Locations => "locations",
            Self::Tsb => "tsb",
            Self::Labor => "labor",
            Self::Specifications => "specifications",
            Self::Dtc => "dtc",
            Self::Description => "description",
            Self::Precautions => "precautions",
            Self::Tools => "tools",
            Self::Adjustments => "adjustments",
            Self::Parts => "parts",
            Self::Content => "content",
            Self::Nav => "nav",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted manual page. Lives for a single build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: u32,
    pub title: String,
    pub breadcrumb: String,
    pub body_text: String,
    pub snippet: String,
    pub page_type: PageType,
    pub is_nav_page: bool,
}

impl Document {
    pub fn meta(&self) -> PageMeta {
        PageMeta {
            id: self.id,
            title: self.title.clone(),
            breadcrumb: self.breadcrumb.clone(),
            page_type: self.page_type,
            snippet: self.snippet.clone(),
        }
    }
}

/// Display row for a page, one per document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub id: u32,
    pub title: String,
    pub breadcrumb: String,
    pub page_type: PageType,
    pub snippet: String,
}

/// Id range and size of one full-text shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardInfo {
    pub file: String,
    pub first_id: u32,
    pub last_id: u32,
    pub doc_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub shard_count: usize,
    pub shards: Vec<ShardInfo>,
    pub total_pages: usize,
    pub content_pages: usize,
    pub built_at: DateTime<Utc>,
}

/// A scored page id produced by a single index lookup or a tier merge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub id: u32,
    pub score: f64,
}

/// A deduplicated result: one representative per normalized title.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub id: u32,
    pub score: f64,
    /// How many merged hits collapsed into this one (1 when unique).
    pub dedup_count: usize,
}
