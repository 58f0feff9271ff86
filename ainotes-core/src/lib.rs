//! Core library for AI Notes — a local-first, AI-assisted note-taking
//! application.
//!
//! The primary entry point is [`NoteRepository`], which owns the durable
//! key-value store and is the sole mutator of the notes collection. Import,
//! export, the PIN lock gate, and AI summarize/rewrite all operate through
//! it; the UI layer holds only read-only snapshots refreshed after each
//! mutation call.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core`
//! module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    ai::{AiConfig, AiService, API_KEY_ENV, DEFAULT_MODELS, OPENROUTER_CHAT_URL},
    error::{AinotesError, Result},
    export::{
        build_document, export_json, render_document, DocumentRenderer, DocumentSection,
        ExportDocument, ExportFormat, PlainTextRenderer, EXPORT_FILE_STEM, LOCKED_PLACEHOLDER,
    },
    import::{
        content_key, next_imported_doc_number, split_text_blocks, Extractors, ImportFormat,
        TextExtractor, TextImportMode,
    },
    lock::MIN_PIN_LENGTH,
    note::{Note, NoteColor, NoteDraft, NotePatch},
    repository::NoteRepository,
    storage::Storage,
};
