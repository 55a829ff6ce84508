//! Plain-text rendering of search results for the terminal.

use crate::config::SNIPPET_LENGTH;
use crate::search::{Page, SearchOutcome, SearchSession};
use crate::types::{PageType, RankedResult};
use regex::RegexBuilder;

const MARK_OPEN: &str = "**";
const MARK_CLOSE: &str = "**";

/// Marks every occurrence of a query term in `text`, extended to the end of
/// the word it starts, e.g. `pump` marks `**pumps**`.
///
/// Terms are the whitespace-separated words of `query` longer than one
/// character, case-insensitive. Snippets cut at the snippet length get a
/// trailing `...`.
pub fn highlight_terms(text: &str, query: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lowered = query.to_lowercase();
    let mut terms: Vec<&str> = Vec::new();
    for term in lowered.split_whitespace() {
        if term.chars().count() > 1 && !terms.contains(&term) {
            terms.push(term);
        }
    }

    let mut result = if terms.is_empty() {
        text.to_string()
    } else {
        let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
        match RegexBuilder::new(&format!(r"(?:{})\w*", alternation))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => pattern
                .replace_all(text, |caps: &regex::Captures<'_>| {
                    format!("{}{}{}", MARK_OPEN, &caps[0], MARK_CLOSE)
                })
                .into_owned(),
            Err(e) => {
                tracing::debug!("Highlight pattern rejected: {}", e);
                text.to_string()
            }
        }
    };

    if text.chars().count() >= SNIPPET_LENGTH {
        result.push_str("...");
    }
    result
}

fn render_result(out: &mut String, rank: usize, result: &RankedResult, session: &SearchSession, query: &str) {
    let Some(meta) = session.meta(result.id) else {
        out.push_str(&format!("{:>3}. Page {}  score {:.2}\n", rank, result.id, result.score));
        return;
    };

    out.push_str(&format!("{:>3}. {}", rank, meta.title));
    if meta.page_type != PageType::Content {
        out.push_str(&format!(" [{}]", meta.page_type.display_label()));
    }
    if result.dedup_count > 1 {
        out.push_str(&format!(" (+{} similar)", result.dedup_count - 1));
    }
    out.push_str(&format!("  #{} score {:.2}\n", result.id, result.score));

    if !meta.breadcrumb.is_empty() {
        out.push_str(&format!("     {}\n", meta.breadcrumb));
    }
    let snippet = highlight_terms(&meta.snippet, query);
    if !snippet.is_empty() {
        out.push_str(&format!("     {}\n", snippet));
    }
}

/// Renders one page of an outcome, resolving display fields through `session`.
pub fn render_outcome(outcome: &SearchOutcome, page: &Page<'_, RankedResult>, session: &SearchSession) -> String {
    let mut out = String::new();

    if page.total == 0 {
        out.push_str(&format!("No results found for \"{}\" ({})\n", outcome.query, outcome.status));
        return out;
    }

    out.push_str(&format!(
        "{} results for \"{}\" ({})\n",
        page.total, outcome.query, outcome.status
    ));
    if let Some(expanded) = &outcome.expanded_query {
        out.push_str(&format!("Searched as: {}\n", expanded));
    }
    out.push('\n');

    // Synonym terms matched too, so they are highlighted as well
    let highlight_query = outcome.expanded_query.as_deref().unwrap_or(&outcome.query);
    for (i, result) in page.items.iter().enumerate() {
        render_result(&mut out, page.offset + i + 1, result, session, highlight_query);
    }

    if page.next_offset().is_some() {
        out.push_str(&format!("\n{} more results\n", page.remaining));
    }
    out
}
