//! Cross-tier score blending.
//!
//! Every multiplier applied while merging one result list into another lives
//! in [`BlendPolicy`], keyed by where the hit came from and whether it is new
//! to the combined set. Ranking tuning is a table edit here.

use crate::types::SearchHit;
use ahash::AHashMap;

/// Which index produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Title and breadcrumb index.
    Quick,
    /// Page body shards.
    FullText,
}

/// Which query variant produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOrigin {
    /// The query as typed.
    Literal,
    /// The synonym-expanded query.
    Expanded,
}

/// Whether a hit reinforces a page already in the combined set or adds a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeKind {
    Reinforce,
    Admit,
}

/// Multipliers for merging hits into the combined ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendPolicy {
    weights: Vec<((Tier, MatchOrigin, MergeKind), f64)>,
}

impl Default for BlendPolicy {
    fn default() -> Self {
        use MatchOrigin::{Expanded, Literal};
        use MergeKind::{Admit, Reinforce};
        use Tier::{FullText, Quick};

        Self {
            weights: vec![
                // Literal quick hits seed the combined set unchanged
                ((Quick, Literal, Admit), 1.0),
                ((Quick, Literal, Reinforce), 1.0),
                // Synonym matches help literal matches, and rank below them alone
                ((Quick, Expanded, Reinforce), 0.3),
                ((Quick, Expanded, Admit), 0.5),
                // Body matches rank below structural matches
                ((FullText, Literal, Reinforce), 0.2),
                ((FullText, Literal, Admit), 0.4),
                ((FullText, Expanded, Reinforce), 0.2),
                ((FullText, Expanded, Admit), 0.2),
            ],
        }
    }
}

impl BlendPolicy {
    pub fn weight(&self, tier: Tier, origin: MatchOrigin, kind: MergeKind) -> f64 {
        self.weights
            .iter()
            .find(|(key, _)| *key == (tier, origin, kind))
            .map_or(0.0, |(_, weight)| *weight)
    }

    /// Returns a copy with one weight replaced.
    pub fn with_weight(mut self, tier: Tier, origin: MatchOrigin, kind: MergeKind, weight: f64) -> Self {
        let key = (tier, origin, kind);
        match self.weights.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = weight,
            None => self.weights.push((key, weight)),
        }
        self
    }
}

/// The combined result set being assembled across tiers.
///
/// Insertion order is remembered so that the final sort is deterministic.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    slots: AHashMap<u32, usize>,
    hits: Vec<SearchHit>,
}

impl ScoreBoard {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.slots.contains_key(&id)
    }

    /// Merges `hits` using the policy weights for `(tier, origin)`.
    pub fn merge(&mut self, hits: &[SearchHit], tier: Tier, origin: MatchOrigin, policy: &BlendPolicy) {
        let reinforce = policy.weight(tier, origin, MergeKind::Reinforce);
        let admit = policy.weight(tier, origin, MergeKind::Admit);

        for hit in hits {
            match self.slots.get(&hit.id) {
                Some(&slot) => self.hits[slot].score += hit.score * reinforce,
                None => {
                    self.slots.insert(hit.id, self.hits.len());
                    self.hits.push(SearchHit {
                        id: hit.id,
                        score: hit.score * admit,
                    });
                }
            }
        }
    }

    /// Consumes the board, returning hits by descending score.
    pub fn into_sorted(self) -> Vec<SearchHit> {
        let mut hits = self.hits;
        super::index::sort_hits(&mut hits);
        hits
    }
}
