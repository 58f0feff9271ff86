//! Error types for the AI Notes core library.

use thiserror::Error;

/// All errors that can occur within the AI Notes core library.
#[derive(Debug, Error)]
pub enum AinotesError {
    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Note data could not be serialized or deserialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An HTTP request to the AI service could not be sent.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A note ID was requested that does not exist in the collection.
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// The note is locked and its content may not be read for this operation.
    #[error("Note is locked: {0}")]
    NoteLocked(String),

    /// An import payload had an unexpected shape or could not be read.
    #[error("Invalid import: {0}")]
    InvalidImport(String),

    /// The import file's extension is not one of the accepted formats.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Every candidate in a document import was a duplicate of an existing note.
    #[error("No new notes to import (duplicates were skipped)")]
    NothingToImport,

    /// A document export was requested over an empty collection.
    #[error("No notes available to export")]
    NothingToExport,

    /// The external document renderer failed; no partial file was produced.
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// The supplied PIN does not match the stored one.
    #[error("Incorrect PIN")]
    WrongPin,

    /// A note lock was requested before any PIN has been set.
    #[error("No PIN has been set")]
    PinNotSet,

    /// A new PIN failed validation.
    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    /// No API key is configured for the AI service.
    #[error("AI API key is not configured")]
    MissingApiKey,

    /// An AI request was rejected before being sent (empty content, etc.).
    #[error("AI request rejected: {0}")]
    AiRequest(String),

    /// Every model in the fallback chain failed.
    #[error("AI service unavailable: {0}")]
    AiUnavailable(String),
}

/// Convenience alias that pins the error type to [`AinotesError`].
pub type Result<T> = std::result::Result<T, AinotesError>;

impl AinotesError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Http(e) => format!("Network error: {e}"),
            Self::NoteNotFound(_) => "Note no longer exists".to_string(),
            Self::NoteLocked(_) => "Unlock the note first".to_string(),
            Self::InvalidImport(msg) => msg.clone(),
            Self::UnsupportedFileType(_) => {
                "Unsupported file type. Please upload a JSON, PDF, or DOCX file.".to_string()
            }
            Self::NothingToImport => {
                "No new notes to import (duplicates were skipped).".to_string()
            }
            Self::NothingToExport => "No notes available to export.".to_string(),
            Self::ExportFailed(_) => "Failed to export notes.".to_string(),
            Self::WrongPin => "Incorrect PIN. Please try again.".to_string(),
            Self::PinNotSet => "Set a PIN before locking notes.".to_string(),
            Self::InvalidPin(msg) => msg.clone(),
            Self::MissingApiKey => "API key is not configured.".to_string(),
            Self::AiRequest(msg) => msg.clone(),
            Self::AiUnavailable(_) => {
                "All models failed. Please check your API key and try again.".to_string()
            }
        }
    }
}
