//! Field-weighted inverted index with BM25+ scoring.
//!
//! The same structure backs the quick (title/breadcrumb) index and every
//! full-text shard. Terms live in a `BTreeMap` so prefix expansion is a range
//! scan and so the serialized form is deterministic.

use super::tokenize::tokenize;
use crate::types::SearchHit;
use ahash::AHashMap;
use rapidfuzz::distance::levenshtein;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;

/// BM25+ term frequency saturation.
const BM25_K: f64 = 1.2;
/// BM25+ length normalization.
const BM25_B: f64 = 0.7;
/// BM25+ lower bound added to every matching term.
const BM25_D: f64 = 0.5;

/// Weight of a term reached through prefix expansion.
const PREFIX_WEIGHT: f64 = 0.375;
/// Weight of a term reached through fuzzy expansion.
const FUZZY_WEIGHT: f64 = 0.45;

/// How query terms are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// A page must match every query term.
    And,
    /// A page matching any query term is a hit.
    Or,
}

/// Edit-distance tolerance for query terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fuzziness {
    Off,
    /// Short terms are exact, medium terms allow one edit, long terms two.
    Adaptive,
}

impl Fuzziness {
    /// Maximum edit distance allowed for `term`.
    pub fn max_edits(self, term: &str) -> usize {
        match self {
            Self::Off => 0,
            Self::Adaptive => match term.chars().count() {
                0..=4 => 0,
                5 | 6 => 1,
                _ => 2,
            },
        }
    }
}

/// Per-lookup options.
#[derive(Debug, Clone, Copy)]
pub struct LookupOptions {
    pub combine: Combine,
    pub fuzziness: Fuzziness,
    pub prefix: bool,
    /// Field boosts by field name; fields not listed get 1.0.
    pub boosts: &'static [(&'static str, f64)],
}

impl LookupOptions {
    fn boost_for(&self, field: &str) -> f64 {
        self.boosts
            .iter()
            .find(|(name, _)| *name == field)
            .map_or(1.0, |(_, boost)| *boost)
    }
}

/// One occurrence record: (document slot, field slot, term frequency).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Posting(u32, u8, u32);

/// A searchable index over one or more text fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextIndex {
    fields: Vec<String>,
    /// Page id for each document slot, in insertion order.
    ids: Vec<u32>,
    /// Token count of every field, per document slot.
    field_lengths: Vec<Vec<u32>>,
    /// Sum of `field_lengths` per field, for average length normalization.
    field_totals: Vec<u64>,
    terms: BTreeMap<String, Vec<Posting>>,
}

impl TextIndex {
    /// Number of unique terms in the index.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Number of documents in the index.
    pub fn document_count(&self) -> usize {
        self.ids.len()
    }

    /// Page ids in insertion order.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Runs `query` against the index.
    ///
    /// Each query term is expanded into the indexed terms it reaches (exact,
    /// prefix, then fuzzy), each reached term contributes a weighted BM25+
    /// score, and the per-term scores are combined with AND or OR. The final
    /// score is multiplied by the number of query terms the page matched, so
    /// pages covering more of the query rank higher.
    ///
    /// Results are sorted by descending score, ties by ascending id.
    pub fn search(&self, query: &str, options: &LookupOptions) -> Vec<SearchHit> {
        let mut query_terms = tokenize(query);
        let mut seen = ahash::AHashSet::with_capacity(query_terms.len());
        query_terms.retain(|term| seen.insert(term.clone()));

        if query_terms.is_empty() || self.ids.is_empty() {
            return vec![];
        }

        // doc slot -> (score, matched query terms)
        let mut combined: AHashMap<u32, (f64, usize)> = AHashMap::new();

        for (position, term) in query_terms.iter().enumerate() {
            let term_scores = self.score_term(term, options);

            match options.combine {
                Combine::Or => {
                    for (doc, score) in term_scores {
                        let entry = combined.entry(doc).or_insert((0.0, 0));
                        entry.0 += score;
                        entry.1 += 1;
                    }
                }
                Combine::And => {
                    if position == 0 {
                        combined = term_scores
                            .into_iter()
                            .map(|(doc, score)| (doc, (score, 1)))
                            .collect();
                    } else {
                        combined.retain(|doc, _| term_scores.contains_key(doc));
                        for (doc, entry) in &mut combined {
                            entry.0 += term_scores[doc];
                            entry.1 += 1;
                        }
                    }
                    if combined.is_empty() {
                        return vec![];
                    }
                }
            }
        }

        let mut hits: Vec<SearchHit> = combined
            .into_iter()
            .map(|(doc, (score, matched))| SearchHit {
                id: self.ids[doc as usize],
                score: score * matched as f64,
            })
            .collect();
        sort_hits(&mut hits);
        hits
    }

    /// Scores every document reached by one query term.
    fn score_term(&self, term: &str, options: &LookupOptions) -> AHashMap<u32, f64> {
        let mut scores: AHashMap<u32, f64> = AHashMap::new();
        let doc_count = self.ids.len() as f64;
        let boosts: Vec<f64> = self.fields.iter().map(|f| options.boost_for(f)).collect();

        for (indexed_term, weight) in self.expand_term(term, options) {
            let Some(postings) = self.terms.get(indexed_term) else {
                continue;
            };

            let mut field_doc_freq = vec![0usize; self.fields.len()];
            for Posting(_, field, _) in postings {
                field_doc_freq[*field as usize] += 1;
            }

            for &Posting(doc, field, tf) in postings {
                let field = field as usize;
                let boost = boosts[field];
                if boost == 0.0 {
                    continue;
                }
                let avg_len = self.field_totals[field] as f64 / doc_count;
                let field_len = f64::from(self.field_lengths[doc as usize][field]);
                let score = bm25_plus(
                    f64::from(tf),
                    field_doc_freq[field] as f64,
                    doc_count,
                    field_len,
                    avg_len,
                );
                *scores.entry(doc).or_insert(0.0) += weight * boost * score;
            }
        }

        scores
    }

    /// Indexed terms reachable from `term`, each with its match weight.
    ///
    /// Prefix matches take precedence over fuzzy matches for the same
    /// indexed term.
    fn expand_term<'a>(&'a self, term: &str, options: &LookupOptions) -> Vec<(&'a str, f64)> {
        let mut expanded: Vec<(&'a str, f64)> = Vec::new();
        let term_len = term.chars().count() as f64;

        if let Some((indexed, _)) = self.terms.get_key_value(term) {
            expanded.push((indexed.as_str(), 1.0));
        }

        if options.prefix {
            for indexed in self
                .terms
                .range::<str, _>((Bound::Included(term), Bound::Unbounded))
                .map(|(key, _)| key)
                .take_while(|key| key.starts_with(term))
                .filter(|key| key.as_str() != term)
            {
                let distance = indexed.chars().count() as f64 - term_len;
                let weight = PREFIX_WEIGHT * term_len / (term_len + 0.3 * distance);
                expanded.push((indexed.as_str(), weight));
            }
        }

        let max_edits = options.fuzziness.max_edits(term);
        if max_edits > 0 {
            let term_chars = term.chars().count();
            for indexed in self.terms.keys() {
                if indexed == term || (options.prefix && indexed.starts_with(term)) {
                    continue;
                }
                if indexed.chars().count().abs_diff(term_chars) > max_edits {
                    continue;
                }
                let distance = levenshtein::distance(term.chars(), indexed.chars());
                if distance <= max_edits {
                    let weight = FUZZY_WEIGHT * term_len / (term_len + distance as f64);
                    expanded.push((indexed.as_str(), weight));
                }
            }
        }

        expanded
    }
}

/// BM25+ relevance of one term in one field of one document.
fn bm25_plus(tf: f64, doc_freq: f64, doc_count: f64, field_len: f64, avg_len: f64) -> f64 {
    let idf = (1.0 + (doc_count - doc_freq + 0.5) / (doc_freq + 0.5)).ln();
    let norm = if avg_len > 0.0 { field_len / avg_len } else { 1.0 };
    idf * (BM25_D + tf * (BM25_K + 1.0) / (tf + BM25_K * (1.0 - BM25_B + BM25_B * norm)))
}

/// Sorts hits by descending score, then ascending id.
pub(crate) fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
}

/// Accumulates documents before freezing them into a [`TextIndex`].
#[derive(Debug)]
pub struct IndexBuilder {
    fields: Vec<String>,
    ids: Vec<u32>,
    field_lengths: Vec<Vec<u32>>,
    field_totals: Vec<u64>,
    terms: BTreeMap<String, Vec<Posting>>,
}

impl IndexBuilder {
    pub fn new(fields: &[&str]) -> Self {
        assert!(fields.len() <= usize::from(u8::MAX), "too many index fields");
        Self {
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
            ids: Vec::new(),
            field_lengths: Vec::new(),
            field_totals: vec![0; fields.len()],
            terms: BTreeMap::new(),
        }
    }

    /// Adds one document. `values` holds one text per field, in field order.
    pub fn add(&mut self, id: u32, values: &[&str]) {
        debug_assert_eq!(values.len(), self.fields.len());
        let doc = u32::try_from(self.ids.len()).unwrap_or(u32::MAX);
        self.ids.push(id);

        let mut lengths = Vec::with_capacity(self.fields.len());
        for (field, text) in values.iter().enumerate() {
            let tokens = tokenize(text);
            let length = u32::try_from(tokens.len()).unwrap_or(u32::MAX);
            lengths.push(length);
            self.field_totals[field] += u64::from(length);

            // BTreeMap keeps postings for a document in term order
            let mut counts: BTreeMap<String, u32> = BTreeMap::new();
            for token in tokens {
                *counts.entry(token).or_insert(0) += 1;
            }
            #[allow(clippy::cast_possible_truncation)]
            let field_slot = field as u8;
            for (term, tf) in counts {
                self.terms
                    .entry(term)
                    .or_default()
                    .push(Posting(doc, field_slot, tf));
            }
        }
        self.field_lengths.push(lengths);
    }

    pub fn finish(self) -> TextIndex {
        let index = TextIndex {
            fields: self.fields,
            ids: self.ids,
            field_lengths: self.field_lengths,
            field_totals: self.field_totals,
            terms: self.terms,
        };
        tracing::debug!(
            "Built text index over {:?}: {} unique terms, {} documents",
            index.fields,
            index.term_count(),
            index.document_count()
        );
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    const TITLE_BOOSTS: &[(&str, f64)] = &[("title", 5.0), ("breadcrumb", 1.0)];

    fn options(combine: Combine, fuzziness: Fuzziness) -> LookupOptions {
        LookupOptions {
            combine,
            fuzziness,
            prefix: true,
            boosts: TITLE_BOOSTS,
        }
    }

    fn sample_index() -> TextIndex {
        let mut builder = IndexBuilder::new(&["title", "breadcrumb"]);
        builder.add(1, &["Fuel Pump Replacement", "Engine > Fuel System"]);
        builder.add(2, &["Fuel Filter", "Engine > Fuel System"]);
        builder.add(3, &["Water Pump", "Engine > Cooling System"]);
        builder.add(4, &["Thermostat", "Engine > Cooling System"]);
        builder.add(5, &["Transmission Fluid", "Transmission > Service and Repair"]);
        builder.finish()
    }

    fn ids(hits: &[SearchHit]) -> Vec<u32> {
        let mut ids: Vec<u32> = hits.iter().map(|h| h.id).collect();
        ids.sort_unstable();
        ids
    }

    #[rstest]
    #[case("oil", 0)]
    #[case("pump", 0)]
    #[case("brake", 1)]
    #[case("filter", 1)]
    #[case("thermost", 2)]
    #[case("condenser", 2)]
    fn test_adaptive_fuzziness(#[case] term: &str, #[case] expected: usize) {
        check!(Fuzziness::Adaptive.max_edits(term) == expected);
        check!(Fuzziness::Off.max_edits(term) == 0);
    }

    #[test]
    fn test_and_requires_every_term() {
        let index = sample_index();
        let hits = index.search("fuel pump", &options(Combine::And, Fuzziness::Adaptive));
        check!(ids(&hits) == [1]);
    }

    #[test]
    fn test_or_accepts_any_term() {
        let index = sample_index();
        let hits = index.search("fuel pump", &options(Combine::Or, Fuzziness::Adaptive));
        check!(ids(&hits) == [1, 2, 3]);
        // The page matching both terms outranks single-term matches
        check!(hits[0].id == 1);
    }

    #[test]
    fn test_prefix_matching() {
        let index = sample_index();
        let hits = index.search("therm", &options(Combine::Or, Fuzziness::Off));
        check!(ids(&hits) == [4]);
    }

    #[test]
    fn test_exact_outranks_prefix() {
        let mut builder = IndexBuilder::new(&["title"]);
        builder.add(1, &["Pumps"]);
        builder.add(2, &["Pump"]);
        let index = builder.finish();
        let hits = index.search("pump", &options(Combine::Or, Fuzziness::Off));
        check!(hits.len() == 2);
        check!(hits[0].id == 2);
    }

    #[test]
    fn test_short_terms_are_not_fuzzy() {
        let index = sample_index();
        // "pimp" is one edit from "pump" but only four characters long
        let hits = index.search("pimp", &options(Combine::Or, Fuzziness::Adaptive));
        check!(hits.is_empty());
    }

    #[test]
    fn test_medium_terms_allow_one_edit() {
        let index = sample_index();
        let hits = index.search("filtar", &options(Combine::Or, Fuzziness::Adaptive));
        check!(ids(&hits) == [2]);
        let hits = index.search("fultar", &options(Combine::Or, Fuzziness::Adaptive));
        check!(hits.is_empty());
    }

    #[test]
    fn test_long_terms_allow_two_edits() {
        let index = sample_index();
        let hits = index.search("thermostot", &options(Combine::Or, Fuzziness::Adaptive));
        check!(ids(&hits) == [4]);
        let hits = index.search("thirmostot", &options(Combine::Or, Fuzziness::Adaptive));
        check!(ids(&hits) == [4]);
        let hits = index.search("thirmastot", &options(Combine::Or, Fuzziness::Adaptive));
        check!(hits.is_empty());
    }

    #[test]
    fn test_fuzzy_disabled_is_strict() {
        let index = sample_index();
        let hits = index.search("filtar", &options(Combine::Or, Fuzziness::Off));
        check!(hits.is_empty());
    }

    #[test]
    fn test_title_boost_beats_breadcrumb() {
        let mut builder = IndexBuilder::new(&["title", "breadcrumb"]);
        builder.add(1, &["Overview", "Cooling System"]);
        builder.add(2, &["Cooling System", "Overview"]);
        let index = builder.finish();
        let hits = index.search("cooling", &options(Combine::Or, Fuzziness::Off));
        check!(hits[0].id == 2);
        check!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_empty_query_and_empty_index() {
        let index = sample_index();
        check!(index.search("   ", &options(Combine::Or, Fuzziness::Off)).is_empty());
        let empty = IndexBuilder::new(&["body"]).finish();
        check!(empty.search("fuel", &options(Combine::Or, Fuzziness::Off)).is_empty());
    }

    #[test]
    fn test_serialization_is_stable() {
        let first = serde_json::to_string(&sample_index()).unwrap();
        let second = serde_json::to_string(&sample_index()).unwrap();
        check!(first == second);
        let restored: TextIndex = serde_json::from_str(&first).unwrap();
        check!(restored == sample_index());
    }
}
