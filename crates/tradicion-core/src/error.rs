use thiserror::Error;

/// Contract violations from the caller. Data-quality problems in the
/// documents themselves are reported as [`ParseWarning`](crate::ParseWarning)s.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("folio list text is missing or blank")]
    MissingFolioList,

    #[error("deed output requested but no certificate text was supplied")]
    MissingCertificate,

    #[error("no circuit-folio codes found in the matrícula list (expected e.g. 176-250064)")]
    NoMatriculas,

    #[error("invalid circuit code: {0:?}")]
    InvalidCircuit(String),

    #[error("invalid matrícula: {0:?}")]
    InvalidMatricula(String),

    #[error("invalid annotation number: {0:?}")]
    InvalidAnnotation(String),

    #[error("JSON rendering failed: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ReconcileError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
