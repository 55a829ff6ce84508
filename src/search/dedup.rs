//! Collapsing same-titled results into one representative.
//!
//! The manual repeats many pages verbatim under different sections ("Thermostat"
//! appears under Repair and Diagnosis and again under Parts and Labor). Results
//! are grouped by lowercase title and the most useful page of each group is
//! kept, carrying the best score of the group.
//!
//! Known limitation: the key is the title alone, so unrelated pages that happen
//! to share a title in different subsystems collapse together as well.

use crate::types::{PageMeta, PageType, RankedResult, SearchHit};
use ahash::AHashMap;
use std::cmp::Ordering;

struct Candidate {
    hit: SearchHit,
    in_primary_section: bool,
    priority: u8,
}

/// Orders candidates best-first: primary section, then page type, then score.
fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.in_primary_section
        .cmp(&a.in_primary_section)
        .then(a.priority.cmp(&b.priority))
        .then(b.hit.score.total_cmp(&a.hit.score))
}

/// Groups `hits` by normalized title and keeps one result per group.
///
/// `lookup` resolves page metadata; hits without metadata are grouped under
/// an empty title as plain content pages. `primary_section` is the breadcrumb
/// prefix that marks the preferred section.
pub fn deduplicate<'a, F>(hits: &[SearchHit], lookup: F, primary_section: &str) -> Vec<RankedResult>
where
    F: Fn(u32) -> Option<&'a PageMeta>,
{
    let mut group_slots: AHashMap<String, usize> = AHashMap::new();
    let mut groups: Vec<Vec<Candidate>> = Vec::new();

    for hit in hits {
        let meta = lookup(hit.id);
        let key = meta.map(|m| m.title.to_lowercase()).unwrap_or_default();
        let candidate = Candidate {
            hit: *hit,
            in_primary_section: meta.is_some_and(|m| m.breadcrumb.starts_with(primary_section)),
            priority: meta.map_or(PageType::Content, |m| m.page_type).priority(),
        };

        let slot = *group_slots.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(candidate);
    }

    let mut ranked: Vec<RankedResult> = groups
        .into_iter()
        .filter_map(|mut group| {
            let max_score = group
                .iter()
                .map(|c| c.hit.score)
                .fold(f64::NEG_INFINITY, f64::max);
            let dedup_count = group.len();
            group.sort_by(compare_candidates);
            group.first().map(|best| RankedResult {
                id: best.hit.id,
                score: max_score,
                dedup_count,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));

    let collapsed = hits.len() - ranked.len();
    if collapsed > 0 {
        tracing::debug!("Collapsed {} duplicate results into {} groups", collapsed, ranked.len());
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::collections::HashMap;

    const PRIMARY: &str = "Repair and Diagnosis";

    fn meta(id: u32, title: &str, breadcrumb: &str, page_type: PageType) -> PageMeta {
        PageMeta {
            id,
            title: title.to_string(),
            breadcrumb: breadcrumb.to_string(),
            page_type,
            snippet: String::new(),
        }
    }

    fn table(rows: Vec<PageMeta>) -> HashMap<u32, PageMeta> {
        rows.into_iter().map(|m| (m.id, m)).collect()
    }

    fn hit(id: u32, score: f64) -> SearchHit {
        SearchHit { id, score }
    }

    #[test]
    fn test_primary_section_wins_with_max_score() {
        let metas = table(vec![
            meta(1, "Thermostat", "Parts and Labor > Engine", PageType::Parts),
            meta(2, "Thermostat", "Repair and Diagnosis > Engine", PageType::Service),
        ]);
        let ranked = deduplicate(&[hit(1, 9.0), hit(2, 4.0)], |id| metas.get(&id), PRIMARY);

        check!(ranked.len() == 1);
        check!(ranked[0].id == 2);
        check!(ranked[0].score == 9.0);
        check!(ranked[0].dedup_count == 2);
    }

    #[test]
    fn test_primary_section_beats_page_type() {
        let metas = table(vec![
            meta(1, "Fuel Pump", "Parts and Labor > Fuel", PageType::Service),
            meta(2, "Fuel Pump", "Repair and Diagnosis > Fuel", PageType::Parts),
        ]);
        let ranked = deduplicate(&[hit(1, 5.0), hit(2, 5.0)], |id| metas.get(&id), PRIMARY);
        check!(ranked[0].id == 2);
    }

    #[test]
    fn test_page_type_then_score() {
        let metas = table(vec![
            meta(1, "Water Pump", "Repair and Diagnosis > A", PageType::Diagrams),
            meta(2, "Water Pump", "Repair and Diagnosis > B", PageType::Service),
            meta(3, "Water Pump", "Repair and Diagnosis > C", PageType::Service),
        ]);
        let ranked = deduplicate(
            &[hit(1, 10.0), hit(2, 2.0), hit(3, 3.0)],
            |id| metas.get(&id),
            PRIMARY,
        );
        check!(ranked.len() == 1);
        check!(ranked[0].id == 3);
        check!(ranked[0].score == 10.0);
        check!(ranked[0].dedup_count == 3);
    }

    #[test]
    fn test_title_key_is_case_insensitive() {
        let metas = table(vec![
            meta(1, "Engine Oil", "Repair and Diagnosis", PageType::Content),
            meta(2, "ENGINE OIL", "Repair and Diagnosis", PageType::Content),
        ]);
        let ranked = deduplicate(&[hit(1, 1.0), hit(2, 2.0)], |id| metas.get(&id), PRIMARY);
        check!(ranked.len() == 1);
        check!(ranked[0].id == 2);
    }

    #[test]
    fn test_groups_resorted_by_adjusted_score() {
        let metas = table(vec![
            meta(1, "Brake Pads", "Repair and Diagnosis", PageType::Service),
            meta(2, "Rotor", "Repair and Diagnosis", PageType::Service),
            meta(3, "Rotor", "Parts and Labor", PageType::Parts),
        ]);
        let ranked = deduplicate(
            &[hit(1, 6.0), hit(2, 1.0), hit(3, 8.0)],
            |id| metas.get(&id),
            PRIMARY,
        );
        let order: Vec<(u32, usize)> = ranked.iter().map(|r| (r.id, r.dedup_count)).collect();
        check!(order == [(2, 2), (1, 1)]);
    }

    #[test]
    fn test_unrelated_pages_with_same_title_collapse() {
        let metas = table(vec![
            meta(1, "Relay", "Repair and Diagnosis > Fuel", PageType::Locations),
            meta(2, "Relay", "Repair and Diagnosis > Lighting", PageType::Locations),
        ]);
        let ranked = deduplicate(&[hit(1, 3.0), hit(2, 2.0)], |id| metas.get(&id), PRIMARY);
        check!(ranked.len() == 1);
    }

    #[test]
    fn test_missing_meta_does_not_panic() {
        let metas: HashMap<u32, PageMeta> = HashMap::new();
        let ranked = deduplicate(&[hit(1, 3.0), hit(2, 2.0)], |id| metas.get(&id), PRIMARY);
        check!(ranked.len() == 1);
        check!(ranked[0].dedup_count == 2);
    }

    #[test]
    fn test_empty_input() {
        let metas: HashMap<u32, PageMeta> = HashMap::new();
        check!(deduplicate(&[], |id| metas.get(&id), PRIMARY).is_empty());
    }
}
