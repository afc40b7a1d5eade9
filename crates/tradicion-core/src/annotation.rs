//! Deed lookup inside a certificate body.
//!
//! The body is a run of annotation blocks, each opened by a header such as
//! `ANOTACION: Nro 003 Fecha: 20-09-2022 Radicación: ...`. A block may carry
//! a document line `Doc: ESCRITURA 4067 DEL 16-09-2022 NOTARIA SEPTIMA DE IBAGUE`.
//! The deed reference is the `ESCRITURA ... <date>` part of that line and
//! nothing after the date.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::record::{AnnotationNumber, DeedReference};

static ANNOTATION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)ANOTACI[OÓ]N:?\s*Nro:?\s*(\d+)").expect("static pattern")
});

static DEED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Doc:\s*(ESCRITURA\s+\d+\s+DEL?\s+\d{1,2}[-/]\d{1,2}[-/]\d{4})")
        .expect("static pattern")
});

/// Anything that can answer "which deed does annotation N cite?".
///
/// [`DeedCache`](crate::DeedCache) sits in front of an implementation of this
/// trait so each annotation is resolved at most once per run.
pub trait ResolveDeed {
    fn find_deed(&self, number: &AnnotationNumber) -> Option<DeedReference>;
}

/// One annotation block of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationRecord {
    pub number: AnnotationNumber,
    pub deed_reference: Option<DeedReference>,
}

struct Header {
    number: AnnotationNumber,
    start: usize,
}

/// Scans a certificate body for annotation blocks.
pub struct AnnotationResolver<'a> {
    text: &'a str,
}

impl<'a> AnnotationResolver<'a> {
    pub fn new(certificate_text: &'a str) -> Self {
        Self {
            text: certificate_text,
        }
    }

    fn headers(&self) -> Vec<Header> {
        ANNOTATION_HEADER
            .captures_iter(self.text)
            .filter_map(|caps| {
                let number = AnnotationNumber::parse(&caps[1]).ok()?;
                let start = caps.get(0)?.start();
                Some(Header { number, start })
            })
            .collect()
    }

    /// The text of annotation `number`, from its header up to the next header
    /// or the end of the body.
    pub fn block(&self, number: &AnnotationNumber) -> Option<&'a str> {
        let headers = self.headers();
        let idx = headers.iter().position(|h| &h.number == number)?;
        let end = headers
            .get(idx + 1)
            .map_or(self.text.len(), |next| next.start);
        Some(&self.text[headers[idx].start..end])
    }

    /// Every annotation block in document order.
    pub fn records(&self) -> Vec<AnnotationRecord> {
        let headers = self.headers();
        headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let end = headers
                    .get(idx + 1)
                    .map_or(self.text.len(), |next| next.start);
                AnnotationRecord {
                    number: header.number.clone(),
                    deed_reference: deed_in_block(&self.text[header.start..end]),
                }
            })
            .collect()
    }
}

impl ResolveDeed for AnnotationResolver<'_> {
    fn find_deed(&self, number: &AnnotationNumber) -> Option<DeedReference> {
        let Some(block) = self.block(number) else {
            debug!(annotation = %number, "annotation block not found");
            return None;
        };
        let deed = deed_in_block(block);
        if deed.is_none() {
            debug!(annotation = %number, "annotation has no deed line");
        }
        deed
    }
}

fn deed_in_block(block: &str) -> Option<DeedReference> {
    let caps = DEED_LINE.captures(block)?;
    let text = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
    Some(DeedReference::new(text))
}

/// Look up the deed cited by annotation `number` in `certificate_text`.
pub fn find_deed(certificate_text: &str, number: &AnnotationNumber) -> Option<DeedReference> {
    AnnotationResolver::new(certificate_text).find_deed(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERTIFICATE: &str = "\
ANOTACION: Nro 001 Fecha: 02-03-2020 Radicación: 2020-100-6-1234
Doc: ESCRITURA 512 DEL 28-02-2020 NOTARIA PRIMERA DE IBAGUE VALOR ACTO: $0
ESPECIFICACION: 0125 COMPRAVENTA
ANOTACION: Nro 002 Fecha: 10-05-2021 Radicación: 2021-100-6-777
Doc: OFICIO 33 DEL 09-05-2021 JUZGADO CIVIL
ANOTACION: Nro 003 Fecha: 20-09-2022 Radicación: 2022-100-6-999
Doc: ESCRITURA 4067 DEL 16-09-2022 NOTARIA SEPTIMA DE IBAGUE VALOR ACTO: $574,354,780
ANOTACION: Nro 004 Fecha: 01-12-2022
Doc: ESCRITURA 77 DE 30/11/2022NOTARIA UNICA";

    fn n(s: &str) -> AnnotationNumber {
        AnnotationNumber::parse(s).unwrap()
    }

    #[test]
    fn deed_stops_at_date() {
        let deed = find_deed(CERTIFICATE, &n("003")).unwrap();
        assert_eq!(deed.as_str(), "ESCRITURA 4067 DEL 16-09-2022");
    }

    #[test]
    fn deed_with_slashes_and_no_trailing_space() {
        let deed = find_deed(CERTIFICATE, &n("004")).unwrap();
        assert_eq!(deed.as_str(), "ESCRITURA 77 DE 30/11/2022");
    }

    #[test]
    fn block_without_deed_is_not_found() {
        assert_eq!(find_deed(CERTIFICATE, &n("002")), None);
    }

    #[test]
    fn missing_block_is_not_found() {
        assert_eq!(find_deed(CERTIFICATE, &n("042")), None);
        assert_eq!(find_deed("", &n("001")), None);
    }

    #[test]
    fn lookup_does_not_leak_into_next_block() {
        let text = "ANOTACION: Nro 001 sin documento\nANOTACION: Nro 002\nDoc: ESCRITURA 9 DEL 01-01-2001";
        assert_eq!(find_deed(text, &n("001")), None);
        assert!(find_deed(text, &n("002")).is_some());
    }

    #[test]
    fn unpadded_header_matches_padded_number() {
        let text = "ANOTACION: Nro 7 Fecha: 01-01-2001\nDoc: ESCRITURA 1 DEL 01-01-2001";
        assert_eq!(
            find_deed(text, &n("007")).map(|d| d.to_string()),
            Some("ESCRITURA 1 DEL 01-01-2001".to_string())
        );
    }

    #[test]
    fn no_partial_number_match() {
        let text = "ANOTACION: Nro 0031\nDoc: ESCRITURA 1 DEL 01-01-2001";
        assert_eq!(find_deed(text, &n("003")), None);
    }

    #[test]
    fn records_cover_every_block() {
        let records = AnnotationResolver::new(CERTIFICATE).records();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].number.as_str(), "001");
        assert!(records[1].deed_reference.is_none());
        assert_eq!(
            records[2].deed_reference.as_ref().map(DeedReference::as_str),
            Some("ESCRITURA 4067 DEL 16-09-2022")
        );
    }

    #[test]
    fn block_spans_to_next_header() {
        let resolver = AnnotationResolver::new(CERTIFICATE);
        let block = resolver.block(&n("001")).unwrap();
        assert!(block.starts_with("ANOTACION: Nro 001"));
        assert!(block.contains("COMPRAVENTA"));
        assert!(!block.contains("Nro 002"));
    }
}
