//! Folio-list parser.
//!
//! A small state machine over the lines of a folio list. One entry is under
//! construction at a time:
//!
//! ```text
//! AwaitingEntryStart --entry line--> AccumulatingName --complete--> (emit) --> AwaitingEntryStart
//!                                          |  ^
//!                                          +--+ continuation lines (noise skipped)
//! ```
//!
//! An entry closes when its accumulated name no longer ends in a dangling
//! connector (`EN EL`, bare `PISO`, ...), when the next entry starts, when
//! the continuation budget runs out, or at end of input.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::grammar::{self, EntryHead, LineKind};
use crate::record::FolioEntry;

/// Words that leave a name unfinished when they are its last word.
const DANGLING_WORDS: &[&str] = &[
    "EN", "EL", "LA", "LOS", "LAS", "DE", "DEL", "AL", "CON", "POR", "PARA", "SOBRE", "SU", "SUS",
    "UBICADO", "UBICADA", "SITUADO", "SITUADA", "NUMERO", "NÚMERO", "NRO",
];

/// Words that complete a trailing `PISO` when they precede it.
const FLOOR_ORDINALS: &[&str] = &[
    "PRIMER", "PRIMERO", "SEGUNDO", "TERCER", "TERCERO", "CUARTO", "QUINTO", "SEXTO", "SEPTIMO",
    "SÉPTIMO", "OCTAVO", "NOVENO", "DECIMO", "DÉCIMO", "UNDECIMO", "DUODECIMO", "ULTIMO", "ÚLTIMO",
];

/// Tuning for the folio-list parser.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Physical lines one entry may absorb after its entry line.
    pub max_continuation_lines: usize,
    /// Words whose trailing `-` belongs to the legal name (`... II ETAPA -`).
    pub attached_connector_words: Vec<String>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_continuation_lines: 6,
            attached_connector_words: vec!["ETAPA".to_string(), "FASE".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// `<n> ->` marker with no parseable folio.
    UnparseableEntry,
    /// The entry closed without any name text.
    EmptyName,
    /// The name was still dangling when the entry had to close.
    Unterminated,
}

/// A data-quality problem found while parsing. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub line: usize,
    pub text: String,
    pub kind: WarningKind,
}

/// Entry under construction.
struct Pending {
    head: EntryHead,
    line: usize,
    fragments: Vec<String>,
    continuation_lines: usize,
}

impl Pending {
    fn text(&self) -> String {
        self.fragments.join(" ")
    }

    fn append(&mut self, fragment: &str) {
        // A dash left dangling at a line wrap is not part of the name.
        if let Some(last) = self.fragments.last_mut() {
            let trimmed = last.trim_end();
            if let Some(without) = trimmed.strip_suffix('-') {
                *last = without.trim_end().to_string();
            }
        }
        self.fragments.push(fragment.trim().to_string());
        self.continuation_lines += 1;
    }
}

enum State {
    AwaitingEntryStart,
    AccumulatingName(Pending),
}

/// Lazily yields one [`FolioEntry`] per completed entry.
///
/// Warnings accumulate on the parser and can be read at any point with
/// [`warnings`](Self::warnings) or taken at the end with
/// [`into_warnings`](Self::into_warnings).
pub struct FolioListParser<'a> {
    lines: Box<dyn Iterator<Item = (usize, &'a str)> + 'a>,
    options: &'a ParserOptions,
    state: State,
    ready: VecDeque<FolioEntry>,
    warnings: Vec<ParseWarning>,
    finished: bool,
}

impl<'a> FolioListParser<'a> {
    pub fn new(text: &'a str, options: &'a ParserOptions) -> Self {
        let lines = text.lines().enumerate().flat_map(|(idx, line)| {
            grammar::split_entries(line)
                .into_iter()
                .map(move |part| (idx + 1, part))
        });
        Self {
            lines: Box::new(lines),
            options,
            state: State::AwaitingEntryStart,
            ready: VecDeque::new(),
            warnings: Vec::new(),
            finished: false,
        }
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<ParseWarning> {
        self.warnings
    }

    fn warn(&mut self, line: usize, text: &str, kind: WarningKind) {
        warn!(line, kind = ?kind, text = %text, "folio list parse warning");
        self.warnings.push(ParseWarning {
            line,
            text: text.to_string(),
            kind,
        });
    }

    fn step(&mut self, line_no: usize, line: &str) {
        match grammar::classify(line) {
            LineKind::Blank => {}
            LineKind::Noise => trace!(line = line_no, "skipping noise line"),
            LineKind::Malformed => {
                self.close_pending();
                self.warn(line_no, line.trim(), WarningKind::UnparseableEntry);
            }
            LineKind::EntryStart(head) => {
                self.close_pending();
                let fragment = head.fragment.clone();
                let pending = Pending {
                    head,
                    line: line_no,
                    fragments: vec![fragment],
                    continuation_lines: 0,
                };
                if is_complete(&pending.text()) {
                    self.finish(pending, false);
                } else {
                    self.state = State::AccumulatingName(pending);
                }
            }
            LineKind::Continuation(text) => {
                let state = std::mem::replace(&mut self.state, State::AwaitingEntryStart);
                match state {
                    State::AwaitingEntryStart => {
                        trace!(line = line_no, "ignoring text outside an entry");
                    }
                    State::AccumulatingName(mut pending) => {
                        if text.trim().is_empty() {
                            // Only noise was embedded in this line.
                            self.state = State::AccumulatingName(pending);
                            return;
                        }
                        pending.append(&text);
                        if is_complete(&pending.text()) {
                            self.finish(pending, false);
                        } else if pending.continuation_lines >= self.options.max_continuation_lines
                        {
                            self.finish(pending, true);
                        } else {
                            self.state = State::AccumulatingName(pending);
                        }
                    }
                }
            }
        }
    }

    /// Close whatever entry is open, whether or not its name looks finished.
    fn close_pending(&mut self) {
        if let State::AccumulatingName(pending) =
            std::mem::replace(&mut self.state, State::AwaitingEntryStart)
        {
            self.finish(pending, true);
        }
    }

    fn finish(&mut self, pending: Pending, forced: bool) {
        let raw = pending.text();
        let name = finish_name(&raw, &self.options.attached_connector_words);
        if name.is_empty() {
            let text = format!(
                "{} -> {}",
                pending.head.sequence_number, pending.head.folio_number
            );
            self.warn(pending.line, &text, WarningKind::EmptyName);
            return;
        }
        if forced && !is_complete(&raw) {
            self.warn(pending.line, &name, WarningKind::Unterminated);
        }
        let entry = FolioEntry {
            sequence_number: pending.head.sequence_number,
            circuit_code: pending.head.circuit_code.unwrap_or_default(),
            folio_number: pending.head.folio_number,
            property_name: name,
            separator: pending.head.separator,
            line: pending.line,
        };
        debug!(
            line = entry.line,
            folio = %entry.folio_number,
            separator = ?entry.separator,
            "parsed folio entry"
        );
        self.ready.push_back(entry);
    }
}

impl Iterator for FolioListParser<'_> {
    type Item = FolioEntry;

    fn next(&mut self) -> Option<FolioEntry> {
        loop {
            if let Some(entry) = self.ready.pop_front() {
                return Some(entry);
            }
            if self.finished {
                return None;
            }
            match self.lines.next() {
                Some((line_no, line)) => self.step(line_no, line),
                None => {
                    self.close_pending();
                    self.finished = true;
                }
            }
        }
    }
}

/// Result of parsing a whole folio list.
#[derive(Debug, Clone, Default)]
pub struct FolioListParse {
    pub entries: Vec<FolioEntry>,
    pub warnings: Vec<ParseWarning>,
}

/// Parse a complete folio list.
pub fn parse_folio_list(text: &str, options: &ParserOptions) -> FolioListParse {
    let mut parser = FolioListParser::new(text, options);
    let entries: Vec<FolioEntry> = parser.by_ref().collect();
    let warnings = parser.into_warnings();
    info!(
        entries = entries.len(),
        warnings = warnings.len(),
        "parsed folio list"
    );
    FolioListParse { entries, warnings }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn last_words(s: &str) -> (Option<String>, Option<String>) {
    let mut words = s.split_whitespace().rev().map(str::to_uppercase);
    let last = words.next();
    let before = words.next();
    (last, before)
}

/// Whether the accumulated name text reads as finished.
///
/// One trailing `-` is ignored. The text is unfinished when it is empty, ends
/// in `,` or `:`, ends in a dangling preposition/article/connector, or ends in
/// `PISO` that is not preceded by an ordinal or a numeral.
pub fn is_complete(text: &str) -> bool {
    let collapsed = collapse_whitespace(text);
    let text = collapsed
        .strip_suffix('-')
        .map(str::trim_end)
        .unwrap_or(collapsed.as_str());
    if text.is_empty() || text.ends_with(',') || text.ends_with(':') {
        return false;
    }
    match last_words(text) {
        (Some(last), _) if DANGLING_WORDS.contains(&last.as_str()) => false,
        (Some(last), before) if last == "PISO" => before.is_some_and(|w| {
            FLOOR_ORDINALS.contains(&w.as_str()) || w.starts_with(|c: char| c.is_ascii_digit())
        }),
        (Some(_), _) => true,
        (None, _) => false,
    }
}

/// Normalise an assembled name.
///
/// Whitespace collapses to single spaces and leading connectors left over
/// from the separator are dropped. Exactly one trailing `-` or `.` is removed
/// unless the word before it is one of `attached` (`... II ETAPA -`).
pub fn finish_name(raw: &str, attached: &[String]) -> String {
    let name = collapse_whitespace(raw);
    let name = name.trim_start_matches(['-', '.', ' ']);
    let Some(stripped) = name.strip_suffix(['-', '.']) else {
        return name.to_string();
    };
    let stripped = stripped.trim_end();
    let (last, _) = last_words(stripped);
    let keep = last.is_some_and(|word| attached.iter().any(|a| a.eq_ignore_ascii_case(&word)));
    if keep {
        name.to_string()
    } else {
        stripped.to_string()
    }
}
