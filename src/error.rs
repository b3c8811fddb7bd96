use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("invalid structure id: {0}")]
    InvalidStructureId(String),

    #[error("RCSB client error: {0}")]
    Http(String),

    #[error("fetch failed for structure {structure}: {message}")]
    Fetch { structure: String, message: String },

    #[error("RCSB returned status {status} for structure {structure}: {message}")]
    FetchStatus {
        structure: String,
        status: u16,
        message: String,
    },

    #[error("failed to parse PDBx/XML for structure {structure}: {message}")]
    Parse { structure: String, message: String },

    #[error("failed to open store at {path}: {message}")]
    StoreOpen { path: String, message: String },

    #[error("failed to prepare store schema: {message}")]
    Schema { message: String },

    #[error("store error for structure {structure}: {message}")]
    Store { structure: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
