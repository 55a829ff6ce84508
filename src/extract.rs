//! Turning one exported manual page into a [`Document`].
//!
//! Pages are static HTML with a fixed layout: a `<title>` carrying a model-year
//! decoration, a chain of `a.breadcrumb-part` links, and the page content in
//! `div.main`. Directory pages additionally carry an expand-all button and a
//! bare list of links.

use crate::config::{BODY_TRUNCATE, CorpusProfile, SNIPPET_LENGTH};
use crate::error::BuildError;
use crate::types::{Document, PageType};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::path::Path;
use std::sync::LazyLock;

/// Elements inside the main region whose text never belongs to the body.
const SKIPPED_ELEMENTS: &[&str] = &["h1", "button", "img"];

/// Directory pages have less non-whitespace body text than this.
const NAV_BODY_LIMIT: usize = 150;

struct Selectors {
    title: Selector,
    breadcrumb: Selector,
    main: Selector,
    labor_table: Selector,
    expand_all: Selector,
    list_links: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| {
    let parse = |css: &str| Selector::parse(css).expect("static selector is valid");
    Selectors {
        title: parse("title"),
        breadcrumb: parse("a.breadcrumb-part"),
        main: parse("div.main"),
        labor_table: parse("table.labor-times-table"),
        expand_all: parse("button#expand-all"),
        list_links: parse("ul > li > a[href]"),
    }
});

/// Markers in body text that identify a technical service bulletin.
const BULLETIN_MARKERS: &[&str] = &["Bulletin No.:", "Bulletin No:"];

/// Extracts documents according to one corpus profile.
#[derive(Debug, Clone)]
pub struct Extractor {
    title_suffix: Regex,
    breadcrumb_root: String,
}

impl Extractor {
    pub fn new(profile: &CorpusProfile) -> Result<Self, BuildError> {
        Ok(Self {
            title_suffix: profile.title_suffix_regex()?,
            breadcrumb_root: profile.breadcrumb_root.clone(),
        })
    }

    /// Reads and extracts the page at `path`. The page id is the file stem.
    pub fn extract_file(&self, path: &Path) -> Result<Document, BuildError> {
        let id = page_id_from_path(path).ok_or_else(|| BuildError::PageParse {
            path: path.to_path_buf(),
            reason: "file name is not a numeric page id".to_string(),
        })?;
        let bytes = std::fs::read(path).map_err(|e| BuildError::PageParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        // Older exports mix in Latin-1 bytes; keep the page with replacement chars.
        Ok(self.extract(id, &String::from_utf8_lossy(&bytes)))
    }

    /// Extracts a document from page HTML. Malformed markup degrades to
    /// empty fields rather than failing.
    pub fn extract(&self, id: u32, html: &str) -> Document {
        let document = Html::parse_document(html);
        let selectors = &*SELECTORS;

        let raw_title: String = document
            .select(&selectors.title)
            .next()
            .map(|el| el.text().collect())
            .unwrap_or_default();
        let title = self.title_suffix.replace(&raw_title, "").trim().to_string();

        let crumbs = self.breadcrumb_segments(&document);
        let breadcrumb = crumbs.join(" > ");

        let mut raw_body = String::new();
        let mut has_list_links = false;
        for main in document.select(&selectors.main) {
            collect_text(main, &mut raw_body);
            has_list_links |= main.select(&selectors.list_links).next().is_some();
        }
        let body_text = truncate_chars(&normalize_whitespace(&raw_body), BODY_TRUNCATE).to_string();
        let snippet = truncate_chars(&body_text, SNIPPET_LENGTH).to_string();

        let mut page_type = crumbs
            .last()
            .map_or(PageType::Content, |label| PageType::from_section_label(label));
        if document.select(&selectors.labor_table).next().is_some() {
            page_type = PageType::Labor;
        }
        if BULLETIN_MARKERS.iter().any(|marker| body_text.contains(marker)) {
            page_type = PageType::Tsb;
        }

        // Buttons inside the main region are page content, not the directory control.
        let has_expand_all = document.select(&selectors.expand_all).any(|button| {
            !button
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| selectors.main.matches(&ancestor))
        });
        let visible_chars = body_text.chars().filter(|c| !c.is_whitespace()).count();
        let is_nav_page = has_expand_all && has_list_links && visible_chars < NAV_BODY_LIMIT;
        if is_nav_page {
            page_type = PageType::Nav;
        }

        Document {
            id,
            title,
            breadcrumb,
            body_text,
            snippet,
            page_type,
            is_nav_page,
        }
    }

    /// Breadcrumb labels after the root segment, in page order.
    fn breadcrumb_segments(&self, document: &Html) -> Vec<String> {
        let mut crumbs = Vec::new();
        let mut found_root = false;
        for part in document.select(&SELECTORS.breadcrumb) {
            let text = part.text().collect::<String>().trim().to_string();
            if found_root {
                crumbs.push(text);
            } else if text == self.breadcrumb_root {
                found_root = true;
            }
        }
        crumbs
    }
}

/// Page id encoded in a file name like `1234.html`.
pub fn page_id_from_path(path: &Path) -> Option<u32> {
    path.file_stem()?.to_str()?.parse().ok()
}

/// Appends the text under `element`, skipping headings, buttons, and images.
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

/// Collapses every whitespace run (tabs and newlines included) to one space and trims.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The first `max_chars` characters of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
