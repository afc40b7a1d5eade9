//! Registry identifiers: circuit codes, folio numbers and the combined matrícula.
//!
//! # Colombian registry conventions
//!
//! - Circuit code (círculo registral): the office/district prefix. One to three
//!   digits (`176`, `350`), optionally followed by a single letter (`51N`, `01N`).
//! - Folio number: digits only. Left padding is significant (`0998349` is not
//!   `998349`) so it is kept as a string.
//! - Matrícula: `<circuit>-<folio>`, e.g. `176-0998349`.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};

static MATRICULA_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,3}[A-Za-z]?)-(\d+)\b").expect("static pattern"));

/// Check the shape of a circuit code: one to three ASCII digits, optionally
/// followed by exactly one ASCII letter.
pub fn is_valid_circuit(s: &str) -> bool {
    let bytes = s.as_bytes();
    let digit_end = bytes
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len());
    if !(1..=3).contains(&digit_end) {
        return false;
    }
    match &bytes[digit_end..] {
        [] => true,
        [letter] => letter.is_ascii_alphabetic(),
        _ => false,
    }
}

/// Check the shape of a folio number: one or more ASCII digits.
pub fn is_valid_folio(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// A validated circuit code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CircuitCode(String);

impl CircuitCode {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if is_valid_circuit(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ReconcileError::InvalidCircuit(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CircuitCode {
    type Error = ReconcileError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<CircuitCode> for String {
    fn from(c: CircuitCode) -> Self {
        c.0
    }
}

impl fmt::Display for CircuitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A full registry identifier, `<circuit>-<folio>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Matricula {
    pub circuit: CircuitCode,
    pub folio: String,
}

impl Matricula {
    /// Parse `176-0998349` / `51N-0998349`.
    ///
    /// The split happens at the first `-`; surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (circuit, folio) = s
            .split_once('-')
            .ok_or_else(|| ReconcileError::InvalidMatricula(s.to_string()))?;
        if !is_valid_folio(folio) {
            return Err(ReconcileError::InvalidMatricula(s.to_string()));
        }
        Ok(Self {
            circuit: CircuitCode::parse(circuit)?,
            folio: folio.to_string(),
        })
    }
}

impl fmt::Display for Matricula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.circuit, self.folio)
    }
}

/// Join a circuit code and folio number into the rendered identifier.
///
/// An empty circuit (entry lines that carry only the folio) renders as the
/// bare folio number.
pub fn identifier(circuit: &str, folio: &str) -> String {
    if circuit.is_empty() {
        folio.to_string()
    } else {
        format!("{circuit}-{folio}")
    }
}

/// Pull every `circuit-folio` code out of free text, in order of appearance.
///
/// Separators between codes are irrelevant (spaces, commas, newlines). Only
/// the first occurrence of each folio number is kept.
pub fn extract_matriculas(text: &str) -> Vec<Matricula> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for caps in MATRICULA_CODE.captures_iter(text) {
        let folio = &caps[2];
        if !seen.insert(folio.to_string()) {
            continue;
        }
        // The regex already guarantees both shapes.
        out.push(Matricula {
            circuit: CircuitCode(caps[1].to_string()),
            folio: folio.to_string(),
        });
    }
    out
}
