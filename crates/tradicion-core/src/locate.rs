//! Diagnostic search for folio numbers in certificate text.
//!
//! Used to answer "why is folio X missing from the output?": it reports
//! whether the folio appears at all, in which shape, on which page, and the
//! text around it.

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::document;

const CONTEXT_CHARS: usize = 100;

/// The shapes a folio can take in certificate text, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SightingPattern {
    /// `12 -> 5537007`
    NumberedArrow,
    /// `-> 5537007`
    Arrow,
    /// `5537007 :`, `5537007.` or `5537007-`
    Punctuated,
    /// `5537007APTO`
    Concatenated,
}

impl SightingPattern {
    pub const ORDER: [SightingPattern; 4] = [
        SightingPattern::NumberedArrow,
        SightingPattern::Arrow,
        SightingPattern::Punctuated,
        SightingPattern::Concatenated,
    ];

    fn regex(self, folio: &str) -> Option<Regex> {
        let f = regex::escape(folio);
        let pattern = match self {
            SightingPattern::NumberedArrow => format!(r"\d+\s*->\s*{f}(?:\D|$)"),
            SightingPattern::Arrow => format!(r"->\s*{f}(?:\D|$)"),
            SightingPattern::Punctuated => format!(r"\b{f}\s*[:.\-]"),
            SightingPattern::Concatenated => format!(r"\b{f}[A-Z]"),
        };
        Regex::new(&pattern).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolioSighting {
    pub pattern: SightingPattern,
    /// 1-based page; form feeds separate pages.
    pub page: usize,
    /// Byte offset within the page.
    pub offset: usize,
    /// Surrounding text on one line.
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolioSearch {
    pub folio: String,
    pub sighting: Option<FolioSighting>,
}

impl FolioSearch {
    pub fn is_found(&self) -> bool {
        self.sighting.is_some()
    }
}

/// Split a free-text query such as `"5537007, 5537071"` into folio numbers.
pub fn parse_folio_query(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Look for each folio in `text`. Patterns are tried in
/// [`SightingPattern::ORDER`]; the first page with a match wins.
pub fn locate(text: &str, folios: &[String]) -> Vec<FolioSearch> {
    let pages = document::split_pages(text);
    folios
        .iter()
        .map(|folio| {
            let sighting = SightingPattern::ORDER.iter().find_map(|pattern| {
                let re = pattern.regex(folio)?;
                pages.iter().enumerate().find_map(|(idx, page)| {
                    re.find(page).map(|m| FolioSighting {
                        pattern: *pattern,
                        page: idx + 1,
                        offset: m.start(),
                        context: context(page, m.start(), m.end()),
                    })
                })
            });
            debug!(folio = %folio, found = sighting.is_some(), "located folio");
            FolioSearch {
                folio: folio.clone(),
                sighting,
            }
        })
        .collect()
}

/// Up to [`CONTEXT_CHARS`] characters either side of `start..end`, newlines
/// flattened to spaces.
fn context(text: &str, start: usize, end: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_CHARS - 1)
        .map_or(0, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map_or(text.len(), |(i, _)| end + i);
    text[from..to].replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folios(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn query_accepts_any_separator() {
        assert_eq!(
            parse_folio_query("5537007, 5537071;5537072\n"),
            ["5537007", "5537071", "5537072"]
        );
    }

    #[test]
    fn strongest_pattern_wins() {
        let text = "5537007: mencion suelta\n12 -> 5537007 : LOCAL 1";
        let found = locate(text, &folios(&["5537007"]));
        let sighting = found[0].sighting.as_ref().unwrap();
        assert_eq!(sighting.pattern, SightingPattern::NumberedArrow);
        assert_eq!(sighting.offset, text.find("12 ->").unwrap());
    }

    #[test]
    fn concatenated_and_missing() {
        let text = "4 -> 230510APTO 0129 - TORRE 8";
        let found = locate(text, &folios(&["230510", "999"]));
        assert_eq!(
            found[0].sighting.as_ref().map(|s| s.pattern),
            Some(SightingPattern::NumberedArrow)
        );
        assert!(!found[1].is_found());

        let found = locate("xx 230510APTO", &folios(&["230510"]));
        assert_eq!(
            found[0].sighting.as_ref().map(|s| s.pattern),
            Some(SightingPattern::Concatenated)
        );
    }

    #[test]
    fn longer_folio_is_not_a_match() {
        let found = locate("3 -> 55370071 : LOCAL", &folios(&["5537007"]));
        assert!(!found[0].is_found());
    }

    #[test]
    fn reports_page() {
        let text = "pagina uno\n\u{c}7 -> 123 : CASA";
        let found = locate(text, &folios(&["123"]));
        assert_eq!(found[0].sighting.as_ref().map(|s| s.page), Some(2));
    }

    #[test]
    fn context_is_bounded_and_flat() {
        let text = format!("{}\n3 -> 42 : CASA\n{}", "á".repeat(300), "b".repeat(300));
        let found = locate(&text, &folios(&["42"]));
        let context = &found[0].sighting.as_ref().unwrap().context;
        assert!(!context.contains('\n'));
        assert!(context.contains("3 -> 42"));
        assert!(context.chars().count() <= 2 * CONTEXT_CHARS + "3 -> 42 ".len());
    }
}
