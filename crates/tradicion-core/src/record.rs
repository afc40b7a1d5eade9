//! Data model shared by the parser, the resolver and the renderers.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};
use crate::grammar::Separator;
use crate::matricula;

/// Property name used for folios listed in a matrícula list but absent from
/// the parsed text.
pub const NOT_FOUND_NAME: &str = "NO ENCONTRADO";

/// One parsed line-group from the folio list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolioEntry {
    /// The number left of `->`, as written. Doubles as the annotation number
    /// that opened the folio.
    pub sequence_number: u32,
    /// Empty when the entry line carries only the folio number.
    pub circuit_code: String,
    pub folio_number: String,
    pub property_name: String,
    pub separator: Separator,
    /// 1-based line of the folio list where the entry starts.
    pub line: usize,
}

impl FolioEntry {
    pub fn identifier(&self) -> String {
        matricula::identifier(&self.circuit_code, &self.folio_number)
    }

    pub fn annotation_number(&self) -> AnnotationNumber {
        AnnotationNumber::from_sequence(self.sequence_number)
    }
}

/// Zero-padded annotation key, `"001"`..`"999"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationNumber(String);

impl AnnotationNumber {
    pub fn from_sequence(n: u32) -> Self {
        Self(format!("{n:03}"))
    }

    /// Accepts `"3"`, `"03"` or `"003"`; the result is always padded to three digits.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ReconcileError::InvalidAnnotation(s.to_string()));
        }
        let n: u32 = s
            .parse()
            .map_err(|_| ReconcileError::InvalidAnnotation(s.to_string()))?;
        if n == 0 {
            return Err(ReconcileError::InvalidAnnotation(s.to_string()));
        }
        Ok(Self::from_sequence(n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `ESCRITURA <number> DEL|DE <date>`, cut exactly at the date token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeedReference(String);

impl DeedReference {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The deed number, e.g. `4067`.
    pub fn number(&self) -> Option<&str> {
        self.0.split_whitespace().nth(1)
    }

    /// The date token parsed as a calendar date. Both `-` and `/` separators
    /// are accepted; the string form keeps whichever was written.
    pub fn date(&self) -> Option<NaiveDate> {
        let token = self.0.split_whitespace().last()?;
        NaiveDate::parse_from_str(token, "%d-%m-%Y")
            .or_else(|_| NaiveDate::parse_from_str(token, "%d/%m/%Y"))
            .ok()
    }
}

impl fmt::Display for DeedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output unit, one per folio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledRecord {
    /// `None` for placeholder records of matrícula-list folios that were not found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u32>,
    pub circuit_code: String,
    pub folio_number: String,
    pub property_name: String,
    /// `None` when deed output was not requested; `Some("")` when requested
    /// but no deed line was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deed_reference: Option<String>,
}

impl ReconciledRecord {
    pub fn identifier(&self) -> String {
        matricula::identifier(&self.circuit_code, &self.folio_number)
    }

    pub fn is_found(&self) -> bool {
        self.sequence_number.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_number_is_zero_padded() {
        assert_eq!(AnnotationNumber::from_sequence(3).as_str(), "003");
        assert_eq!(AnnotationNumber::from_sequence(42).as_str(), "042");
        assert_eq!(AnnotationNumber::from_sequence(999).as_str(), "999");
    }

    #[test]
    fn annotation_number_parse() {
        assert_eq!(AnnotationNumber::parse("3").unwrap().as_str(), "003");
        assert_eq!(AnnotationNumber::parse("003").unwrap().as_str(), "003");
        assert!(AnnotationNumber::parse("").is_err());
        assert!(AnnotationNumber::parse("0").is_err());
        assert!(AnnotationNumber::parse("1a").is_err());
    }

    #[test]
    fn deed_date_with_dashes() {
        let deed = DeedReference::new("ESCRITURA 4067 DEL 16-09-2022".into());
        assert_eq!(deed.number(), Some("4067"));
        assert_eq!(deed.date(), NaiveDate::from_ymd_opt(2022, 9, 16));
    }

    #[test]
    fn deed_date_with_slashes() {
        let deed = DeedReference::new("ESCRITURA 12 DE 01/02/2019".into());
        assert_eq!(deed.date(), NaiveDate::from_ymd_opt(2019, 2, 1));
        assert_eq!(deed.to_string(), "ESCRITURA 12 DE 01/02/2019");
    }

    #[test]
    fn plain_record_omits_deed_field_in_json() {
        let record = ReconciledRecord {
            sequence_number: Some(3),
            circuit_code: "176".into(),
            folio_number: "190172".into(),
            property_name: "TORRE 9".into(),
            deed_reference: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("deed_reference"));
        assert_eq!(record.identifier(), "176-190172");
    }

    #[test]
    fn csv_record_keeps_empty_deed_field_in_json() {
        let record = ReconciledRecord {
            sequence_number: Some(3),
            circuit_code: String::new(),
            folio_number: "190172".into(),
            property_name: "TORRE 9".into(),
            deed_reference: Some(String::new()),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""deed_reference":"""#));
    }
}
