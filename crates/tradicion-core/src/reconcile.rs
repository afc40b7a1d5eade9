//! One extraction run: parse the folio list, optionally resolve deeds, and
//! assemble the output records.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::annotation::{AnnotationResolver, ResolveDeed};
use crate::cache::DeedCache;
use crate::error::{ReconcileError, Result};
use crate::folio_list::{ParseWarning, ParserOptions, parse_folio_list};
use crate::matricula::{self, Matricula};
use crate::noise;
use crate::record::{FolioEntry, NOT_FOUND_NAME, ReconciledRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `<circuit>-<folio>: <name>`, no deeds.
    #[default]
    Text,
    /// `Circulo,Folio,Inmueble,EP`.
    Csv,
    /// Serialised report. Carries deeds when a certificate is supplied.
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Everything one run needs. Borrowed text only; nothing outlives the run.
#[derive(Debug, Clone, Default)]
pub struct ReconcileRequest<'a> {
    /// Falls back to `certificate` when absent.
    pub folio_list: Option<&'a str>,
    pub certificate: Option<&'a str>,
    /// Optional free-text list of `circuit-folio` codes that fixes output order.
    pub matriculas: Option<&'a str>,
    pub format: OutputFormat,
    pub options: ParserOptions,
}

impl<'a> ReconcileRequest<'a> {
    pub fn new(folio_list: &'a str) -> Self {
        Self {
            folio_list: Some(folio_list),
            ..Self::default()
        }
    }

    pub fn with_certificate(mut self, certificate: &'a str) -> Self {
        self.certificate = Some(certificate);
        self
    }

    pub fn with_matriculas(mut self, matriculas: &'a str) -> Self {
        self.matriculas = Some(matriculas);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// The text the folio list is parsed from.
    pub fn folio_source(&self) -> Option<&'a str> {
        self.folio_list.or(self.certificate)
    }

    pub fn deeds_requested(&self) -> bool {
        match self.format {
            OutputFormat::Text => false,
            OutputFormat::Csv => true,
            OutputFormat::Json => self.certificate.is_some(),
        }
    }

    /// Reject caller mistakes before any parsing happens.
    pub fn validate(&self) -> Result<()> {
        match self.folio_source() {
            Some(text) if !text.trim().is_empty() => {}
            _ => return Err(ReconcileError::MissingFolioList),
        }
        if self.format == OutputFormat::Csv && self.certificate.is_none() {
            return Err(ReconcileError::MissingCertificate);
        }
        Ok(())
    }
}

/// Counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub entries_parsed: usize,
    pub records: usize,
    pub found: usize,
    pub not_found: usize,
    pub deeds_resolved: usize,
    pub deeds_missing: usize,
    /// Calls made to the annotation resolver (one per distinct number).
    pub resolutions: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub records: Vec<ReconciledRecord>,
    pub warnings: Vec<ParseWarning>,
    /// Identifiers from the matrícula list with no parsed entry.
    pub not_found: Vec<String>,
    pub summary: RunSummary,
    /// Office named in the certificate header (`MANIZALES`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_office: Option<String>,
    /// Whether records carry a deed field.
    #[serde(skip)]
    pub with_deeds: bool,
}

/// Run a request against its own certificate.
pub fn reconcile(request: &ReconcileRequest<'_>) -> Result<ReconcileReport> {
    let resolver = AnnotationResolver::new(request.certificate.unwrap_or_default());
    reconcile_with(request, &resolver)
}

/// Run a request, resolving deeds through `resolver`.
///
/// The resolver is only consulted when [`ReconcileRequest::deeds_requested`]
/// holds; a fresh [`DeedCache`] sits in front of it for this run alone.
pub fn reconcile_with<R: ResolveDeed + ?Sized>(
    request: &ReconcileRequest<'_>,
    resolver: &R,
) -> Result<ReconcileReport> {
    request.validate()?;
    let text = request.folio_source().unwrap_or_default();

    let matriculas = match request.matriculas {
        Some(list) => {
            let codes = matricula::extract_matriculas(list);
            if codes.is_empty() {
                return Err(ReconcileError::NoMatriculas);
            }
            info!(codes = codes.len(), "loaded matrícula list");
            Some(codes)
        }
        None => None,
    };

    let parsed = parse_folio_list(text, &request.options);
    let registry_office = request
        .certificate
        .and_then(noise::registry_office)
        .or_else(|| noise::registry_office(text));
    if let Some(office) = &registry_office {
        debug!(office = %office, "registry office");
    }

    let (rows, not_found): (Vec<Row<'_>>, Vec<String>) = match &matriculas {
        Some(codes) => join_matriculas(&parsed.entries, codes),
        None => (
            parsed
                .entries
                .iter()
                .map(|e| Row {
                    entry: Some(e),
                    circuit_code: e.circuit_code.clone(),
                    folio_number: e.folio_number.clone(),
                })
                .collect(),
            Vec::new(),
        ),
    };

    let with_deeds = request.deeds_requested();
    let mut summary = RunSummary {
        entries_parsed: parsed.entries.len(),
        records: rows.len(),
        not_found: not_found.len(),
        warnings: parsed.warnings.len(),
        ..RunSummary::default()
    };

    let records = if with_deeds {
        let mut cache = DeedCache::new(resolver);
        let records: Vec<ReconciledRecord> = rows
            .into_iter()
            .map(|row| {
                let deed = row
                    .entry
                    .and_then(|e| cache.get_or_resolve(&e.annotation_number()));
                if deed.is_some() {
                    summary.deeds_resolved += 1;
                } else {
                    summary.deeds_missing += 1;
                }
                row.into_record(Some(deed.map(|d| d.to_string()).unwrap_or_default()))
            })
            .collect();
        summary.resolutions = cache.resolutions();
        records
    } else {
        debug!("deed output not requested; resolver skipped");
        rows.into_iter().map(|row| row.into_record(None)).collect()
    };
    summary.found = records.iter().filter(|r| r.is_found()).count();

    info!(
        records = summary.records,
        found = summary.found,
        not_found = summary.not_found,
        deeds = summary.deeds_resolved,
        resolutions = summary.resolutions,
        "reconciled"
    );

    Ok(ReconcileReport {
        records,
        warnings: parsed.warnings,
        not_found,
        summary,
        registry_office,
        with_deeds,
    })
}

struct Row<'e> {
    entry: Option<&'e FolioEntry>,
    circuit_code: String,
    folio_number: String,
}

impl Row<'_> {
    fn into_record(self, deed_reference: Option<String>) -> ReconciledRecord {
        ReconciledRecord {
            sequence_number: self.entry.map(|e| e.sequence_number),
            circuit_code: self.circuit_code,
            folio_number: self.folio_number,
            property_name: self
                .entry
                .map_or_else(|| NOT_FOUND_NAME.to_string(), |e| e.property_name.clone()),
            deed_reference,
        }
    }
}

/// Order rows by the matrícula list. The first parsed entry for a folio wins;
/// the circuit always comes from the list.
fn join_matriculas<'e>(
    entries: &'e [FolioEntry],
    codes: &[Matricula],
) -> (Vec<Row<'e>>, Vec<String>) {
    let mut by_folio: HashMap<&str, &FolioEntry> = HashMap::new();
    for entry in entries {
        by_folio.entry(entry.folio_number.as_str()).or_insert(entry);
    }

    let mut not_found = Vec::new();
    let rows = codes
        .iter()
        .map(|code| {
            let entry = by_folio.get(code.folio.as_str()).copied();
            if entry.is_none() {
                debug!(matricula = %code, "folio not found in text");
                not_found.push(code.to_string());
            }
            Row {
                entry,
                circuit_code: code.circuit.as_str().to_string(),
                folio_number: code.folio.clone(),
            }
        })
        .collect();
    (rows, not_found)
}
