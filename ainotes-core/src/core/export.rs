//! Export pipeline: read-only serializers over the current collection.
//!
//! JSON export embeds the notes as-is except that locked content is
//! replaced by [`LOCKED_PLACEHOLDER`]. Document export builds an ordered
//! [`ExportDocument`] of per-note sections and hands it to a
//! [`DocumentRenderer`]; the concrete PDF/Word writers are external
//! collaborators behind that seam. Nothing here mutates state.

use crate::{AinotesError, Note, NoteRepository, Result};
use serde::Serialize;

/// Substituted for the content of locked notes in every export format.
pub const LOCKED_PLACEHOLDER: &str = "[Content is locked]";

/// Fixed stem of every export filename.
pub const EXPORT_FILE_STEM: &str = "notes_backup";

/// Export formats produced by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Pdf,
    Docx,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    /// The fixed `notes_backup.<ext>` filename for this format.
    #[must_use]
    pub fn filename(self) -> String {
        format!("{EXPORT_FILE_STEM}.{}", self.extension())
    }
}

/// One note rendered as a document section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSection {
    pub title: String,
    /// Formatted creation date.
    pub created: String,
    /// Note content, or the locked placeholder.
    pub body: String,
}

/// The intermediate document handed to renderers: one section per note, in
/// collection order, with a page or section break between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDocument {
    pub sections: Vec<DocumentSection>,
}

/// Renders an [`ExportDocument`] into a file payload. Implementations wrap
/// the third-party PDF/Word writers.
pub trait DocumentRenderer {
    /// Produces the complete file contents, or an error — partial output is
    /// never used.
    fn render(
        &self,
        document: &ExportDocument,
    ) -> std::result::Result<Vec<u8>, Box<dyn std::error::Error>>;
}

/// Paginated plain-text renderer: sections separated by a form feed.
pub struct PlainTextRenderer;

impl DocumentRenderer for PlainTextRenderer {
    fn render(
        &self,
        document: &ExportDocument,
    ) -> std::result::Result<Vec<u8>, Box<dyn std::error::Error>> {
        let pages: Vec<String> = document
            .sections
            .iter()
            .map(|section| format!("{}\n{}\n\n{}\n", section.title, section.created, section.body))
            .collect();
        Ok(pages.join("\u{000C}\n").into_bytes())
    }
}

/// Serializes `notes` as pretty-printed JSON with locked content masked.
///
/// An empty collection exports as `[]`; only document export refuses to run
/// on an empty collection.
pub fn export_json(notes: &[Note]) -> Result<String> {
    let masked: Vec<Note> = notes.iter().cloned().map(mask_locked).collect();
    Ok(serde_json::to_string_pretty(&masked)?)
}

fn mask_locked(mut note: Note) -> Note {
    if note.locked {
        note.content = LOCKED_PLACEHOLDER.to_string();
    }
    note
}

/// Builds the document model for `notes`, in collection order.
///
/// # Errors
///
/// Returns [`AinotesError::NothingToExport`] for an empty collection.
pub fn build_document(notes: &[Note]) -> Result<ExportDocument> {
    if notes.is_empty() {
        return Err(AinotesError::NothingToExport);
    }
    let sections = notes
        .iter()
        .enumerate()
        .map(|(index, note)| DocumentSection {
            title: if note.title.is_empty() {
                format!("Note {}", index + 1)
            } else {
                note.title.clone()
            },
            created: note.created_at.format("%Y-%m-%d %H:%M").to_string(),
            body: if note.locked {
                LOCKED_PLACEHOLDER.to_string()
            } else {
                note.content.clone()
            },
        })
        .collect();
    Ok(ExportDocument { sections })
}

/// Builds the document for `notes` and renders it through `renderer`.
///
/// # Errors
///
/// Returns [`AinotesError::NothingToExport`] for an empty collection, or
/// [`AinotesError::ExportFailed`] wrapping any renderer error; no partial
/// file is produced.
pub fn render_document(notes: &[Note], renderer: &dyn DocumentRenderer) -> Result<Vec<u8>> {
    let document = build_document(notes)?;
    renderer
        .render(&document)
        .map_err(|e| AinotesError::ExportFailed(e.to_string()))
}

impl NoteRepository {
    /// JSON export of the current collection. See [`export_json`].
    pub fn export_json(&self) -> Result<String> {
        export_json(&self.list())
    }

    /// Document export of the current collection through `renderer`. See
    /// [`render_document`].
    pub fn export_document(&self, renderer: &dyn DocumentRenderer) -> Result<Vec<u8>> {
        render_document(&self.list(), renderer)
    }
}
