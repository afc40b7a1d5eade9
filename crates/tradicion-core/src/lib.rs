//! Property extraction for Colombian *certificados de tradición y libertad*.
//!
//! Turns the folio list of a certificate into one record per folio
//! (`<circuit>-<folio>: <property name>`), optionally resolving the deed
//! (*escritura pública*) cited by the annotation that opened each folio.

pub mod annotation;
pub mod cache;
pub mod document;
pub mod error;
pub mod folio_list;
pub mod grammar;
pub mod locate;
pub mod matricula;
pub mod noise;
pub mod reconcile;
pub mod record;
pub mod render;

pub use annotation::{AnnotationRecord, AnnotationResolver, ResolveDeed, find_deed};
pub use cache::DeedCache;
pub use error::{ReconcileError, Result};
pub use folio_list::{
    FolioListParse, FolioListParser, ParseWarning, ParserOptions, WarningKind, parse_folio_list,
};
pub use grammar::{LineKind, Separator, classify};
pub use locate::{FolioSearch, FolioSighting, SightingPattern, locate};
pub use matricula::{CircuitCode, Matricula, extract_matriculas};
pub use reconcile::{
    OutputFormat, ReconcileReport, ReconcileRequest, RunSummary, reconcile, reconcile_with,
};
pub use record::{AnnotationNumber, DeedReference, FolioEntry, NOT_FOUND_NAME, ReconciledRecord};
pub use render::{CSV_COLUMNS, render, render_csv, render_json, render_text};
