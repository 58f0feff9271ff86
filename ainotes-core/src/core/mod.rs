//! Internal domain modules for the AI Notes core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod ai;
pub mod error;
pub mod export;
pub mod import;
pub mod lock;
pub mod note;
pub mod repository;
pub mod storage;

#[doc(inline)]
pub use ai::{AiConfig, AiService, API_KEY_ENV, DEFAULT_MODELS, OPENROUTER_CHAT_URL};
#[doc(inline)]
pub use error::{AinotesError, Result};
#[doc(inline)]
pub use export::{
    build_document, export_json, render_document, DocumentRenderer, DocumentSection,
    ExportDocument, ExportFormat, PlainTextRenderer, EXPORT_FILE_STEM, LOCKED_PLACEHOLDER,
};
#[doc(inline)]
pub use import::{
    content_key, next_imported_doc_number, split_text_blocks, Extractors, ImportFormat,
    TextExtractor, TextImportMode,
};
#[doc(inline)]
pub use lock::MIN_PIN_LENGTH;
#[doc(inline)]
pub use note::{Note, NoteColor, NoteDraft, NotePatch};
#[doc(inline)]
pub use repository::NoteRepository;
#[doc(inline)]
pub use storage::Storage;
