//! Line grammar of a folio list.
//!
//! Every physical line is classified into one of a closed set of kinds by
//! running an ordered list of matchers; the first matcher that accepts the
//! line decides. Entry lines look like
//!
//! ```text
//! <sequence> -> [<circuit>-]<folio><separator><name fragment>
//! 3 -> 190172 : TORRE 9 - APARTAMENTO 103 - PROYECTO MODIGLIANI
//! 4 -> 230510APTO 0129 - TORRE 8 - ETAPA I
//! 2 -> 176-0998349 - APARTAMENTO 101
//! ```
//!
//! The separator between folio and name is itself chosen from an ordered
//! list, see [`Separator::PRIORITY`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matricula::is_valid_circuit;
use crate::noise;

static ENTRY_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s*->\s*(?:(\d{1,3}[A-Za-z]?)-)?(\d+)(.*)$").expect("static pattern")
});

static ARROW_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\s*->").expect("static pattern"));

static EMBEDDED_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+\s*->\s*\d").expect("static pattern"));

/// How the property name is separated from the folio number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Separator {
    /// `: -`
    ColonDash,
    /// `..`
    DoubleDot,
    /// `:`
    Colon,
    /// `-`
    Dash,
    /// `.`
    Dot,
    /// Nothing: the name follows the folio digits directly (`230510APTO 0129`).
    Concatenated,
}

impl Separator {
    /// Detection order. Longer separators come before their prefixes.
    pub const PRIORITY: [Separator; 6] = [
        Separator::ColonDash,
        Separator::DoubleDot,
        Separator::Colon,
        Separator::Dash,
        Separator::Dot,
        Separator::Concatenated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Separator::ColonDash => ": -",
            Separator::DoubleDot => "..",
            Separator::Colon => ":",
            Separator::Dash => "-",
            Separator::Dot => ".",
            Separator::Concatenated => "",
        }
    }

    /// Consume this separator (and surrounding whitespace) from the text that
    /// follows the folio digits.
    fn strip(self, rest: &str) -> Option<&str> {
        let rest = rest.trim_start();
        let after = match self {
            Separator::ColonDash => rest.strip_prefix(':')?.trim_start().strip_prefix('-')?,
            Separator::DoubleDot => rest.strip_prefix("..")?,
            Separator::Colon => rest.strip_prefix(':')?,
            Separator::Dash => rest.strip_prefix('-')?,
            Separator::Dot => rest.strip_prefix('.')?,
            Separator::Concatenated if rest.is_empty() || rest.starts_with(char::is_alphabetic) => {
                rest
            }
            Separator::Concatenated => return None,
        };
        Some(after.trim_start())
    }

    /// First separator in [`PRIORITY`](Self::PRIORITY) order that matches,
    /// with the name fragment that follows it. `None` when the folio digits
    /// are followed by something that is neither a separator nor a letter.
    pub fn detect(rest: &str) -> Option<(Separator, &str)> {
        Self::PRIORITY
            .iter()
            .find_map(|sep| sep.strip(rest).map(|after| (*sep, after)))
    }
}

/// The parsed head of an entry line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHead {
    pub sequence_number: u32,
    pub circuit_code: Option<String>,
    pub folio_number: String,
    pub separator: Separator,
    /// Name text on the entry line itself, noise already removed.
    pub fragment: String,
}

/// What a physical line is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    /// Boilerplate through and through.
    Noise,
    EntryStart(EntryHead),
    /// Has the `<n> ->` marker but no parseable folio after it.
    Malformed,
    /// Anything else; carries the line with noise removed.
    Continuation(String),
}

/// Tag of a [`LineKind`], used to expose the matcher order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    Blank,
    Noise,
    EntryStart,
    Malformed,
    Continuation,
}

impl LineKind {
    pub fn tag(&self) -> LineTag {
        match self {
            LineKind::Blank => LineTag::Blank,
            LineKind::Noise => LineTag::Noise,
            LineKind::EntryStart(_) => LineTag::EntryStart,
            LineKind::Malformed => LineTag::Malformed,
            LineKind::Continuation(_) => LineTag::Continuation,
        }
    }
}

type Matcher = fn(&str) -> Option<LineKind>;

/// Matchers in the order they are tried.
const MATCHERS: &[(LineTag, Matcher)] = &[
    (LineTag::Blank, match_blank),
    (LineTag::Noise, match_noise),
    (LineTag::EntryStart, match_entry_start),
    (LineTag::Malformed, match_malformed),
    (LineTag::Continuation, match_continuation),
];

/// The order in which [`classify`] tries each kind.
pub fn classification_order() -> impl Iterator<Item = LineTag> {
    MATCHERS.iter().map(|(tag, _)| *tag)
}

/// Classify one physical line.
pub fn classify(line: &str) -> LineKind {
    MATCHERS
        .iter()
        .find_map(|(_, matcher)| matcher(line))
        .unwrap_or(LineKind::Blank)
}

fn match_blank(line: &str) -> Option<LineKind> {
    line.trim().is_empty().then_some(LineKind::Blank)
}

fn match_noise(line: &str) -> Option<LineKind> {
    noise::is_noise(line).then_some(LineKind::Noise)
}

fn match_entry_start(line: &str) -> Option<LineKind> {
    parse_entry_head(line).map(LineKind::EntryStart)
}

fn match_malformed(line: &str) -> Option<LineKind> {
    ARROW_MARKER.is_match(line).then_some(LineKind::Malformed)
}

fn match_continuation(line: &str) -> Option<LineKind> {
    Some(LineKind::Continuation(noise::strip_noise(line).into_owned()))
}

/// Parse `<sequence> -> [<circuit>-]<folio><separator><rest>`.
pub fn parse_entry_head(line: &str) -> Option<EntryHead> {
    let cleaned = noise::strip_noise(line);
    let caps = ENTRY_START.captures(&cleaned)?;
    let sequence_number: u32 = caps[1].parse().ok()?;
    let circuit_code = caps.get(2).map(|m| m.as_str().to_string());
    if let Some(circuit) = &circuit_code
        && !is_valid_circuit(circuit)
    {
        return None;
    }
    let (separator, fragment) = Separator::detect(&caps[4])?;
    Some(EntryHead {
        sequence_number,
        circuit_code,
        folio_number: caps[3].to_string(),
        separator,
        fragment: fragment.to_string(),
    })
}

/// Split a physical line at every embedded entry start, so that
/// `...PISO -4 -> 190173 : LOCAL 2` yields two logical lines.
pub fn split_entries(line: &str) -> Vec<&str> {
    let mut cuts: Vec<usize> = EMBEDDED_START
        .find_iter(line)
        .map(|m| m.start())
        .filter(|&start| !line[..start].trim().is_empty())
        .collect();
    if cuts.is_empty() {
        return vec![line];
    }
    cuts.push(line.len());
    let mut parts = Vec::with_capacity(cuts.len());
    let mut from = 0;
    for cut in cuts {
        parts.push(&line[from..cut]);
        from = cut;
    }
    parts
}
