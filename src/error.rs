use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum RecuperaError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Not logged in. Run `nrecupera login` first.")]
    NotLoggedIn,

    #[error("Session error: {0}")]
    Session(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Contact(#[from] ContactError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Workbook read error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("Workbook write error: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Recusas ao aceitar um lead ou registrar o resultado do contato.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("no lead is currently selected")]
    NoLeadSelected,

    #[error("lead {0} is still selected; save or skip it first")]
    SelectionPending(String),

    #[error("lead {0} is closed and can no longer be edited")]
    LeadLocked(String),

    #[error("lead {id} belongs to another agent ({owner})")]
    NotOwner { id: String, owner: String },

    #[error("a contact channel is required when the client answered")]
    MissingChannel,

    #[error("a diagnostic reason is required to close the lead")]
    MissingDiagnostic,

    #[error("diagnostic reason {0} does not apply to this outcome")]
    InvalidDiagnostic(u32),

    #[error("agent notes are required to close the lead")]
    MissingNotes,
}
