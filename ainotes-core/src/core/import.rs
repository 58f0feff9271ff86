//! Import pipeline: turning external documents into note records.
//!
//! Two deliberately different modes exist:
//!
//! * JSON import is a full-backup restore — the sanitized payload replaces
//!   the entire collection and is never deduplicated.
//! * Document-text import (the PDF/DOCX path) is incremental — candidates
//!   are deduplicated against existing notes by a normalized content key and
//!   prepended, newest first.
//!
//! Text extraction from PDF/DOCX binaries is an external collaborator
//! behind the [`TextExtractor`] seam; this module only sees the extracted
//! text blob.

use crate::core::repository::allocate_id;
use crate::{AinotesError, Note, NoteColor, NoteRepository, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static IMPORTED_DOC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Imported Doc\s+(\d+)").expect("valid imported-doc regex"));
static BLANK_LINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n+").expect("valid blank-lines regex"));

/// Maximum length of a title taken from the first line of a text block.
const BLOCK_TITLE_MAX: usize = 120;

/// Extracts plain text from a binary document. Implementations wrap the
/// third-party PDF/DOCX readers; the pipeline itself never touches bytes.
pub trait TextExtractor {
    /// Extracts the full text of `bytes` as a single blob.
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

/// The extractors consulted by [`NoteRepository::import_file`] for binary
/// formats.
pub struct Extractors<'a> {
    pub pdf: &'a dyn TextExtractor,
    pub docx: &'a dyn TextExtractor,
}

/// Accepted import file formats, recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Pdf,
    Docx,
}

impl ImportFormat {
    /// Recognizes the format from a filename's extension
    /// (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::UnsupportedFileType`] for anything other
    /// than `.json`, `.pdf`, or `.docx`.
    pub fn from_filename(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("pdf") => Ok(Self::Pdf),
            Some("docx") => Ok(Self::Docx),
            _ => Err(AinotesError::UnsupportedFileType(name.to_string())),
        }
    }
}

/// How raw document text is turned into note candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextImportMode {
    /// One note holding the whole document, titled `Imported Doc N`.
    /// This is the path PDF and DOCX imports take.
    SingleDocument,
    /// Split on blank lines into one note per block. Not reachable from
    /// file import; callers must opt in explicitly.
    SplitBlocks,
}

/// Normalization key used to detect duplicate notes: lowercased,
/// whitespace-collapsed `title + "\n" + content`. `None` when the note has
/// no text at all, which excludes it from dedup consideration.
#[must_use]
pub fn content_key(title: &str, content: &str) -> Option<String> {
    if title.is_empty() && content.is_empty() {
        return None;
    }
    let joined = format!("{title}\n{content}");
    let key = WHITESPACE_RE
        .replace_all(&joined, " ")
        .trim()
        .to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Next sequential number for an `Imported Doc N` title: one past the
/// highest existing, starting at 1.
#[must_use]
pub fn next_imported_doc_number(existing: &[Note]) -> u32 {
    existing
        .iter()
        .filter_map(|n| IMPORTED_DOC_RE.captures(&n.title))
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Splits raw text on blank lines into `(title, content)` pairs.
///
/// The first non-empty line of each block (truncated to 120 characters)
/// becomes the title, the remainder the content; empty blocks fall back to
/// numbered placeholders.
#[must_use]
pub fn split_text_blocks(text: &str) -> Vec<(String, String)> {
    BLANK_LINES_RE
        .split(text)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .enumerate()
        .map(|(index, block)| {
            let lines: Vec<&str> = block
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            let title_candidate: String = lines
                .first()
                .map(|line| line.chars().take(BLOCK_TITLE_MAX).collect())
                .unwrap_or_default();
            let body = lines.get(1..).unwrap_or_default().join("\n");
            let title = if title_candidate.is_empty() {
                format!("Imported Note {}", index + 1)
            } else {
                title_candidate.clone()
            };
            let content = if !body.is_empty() {
                body
            } else if !title_candidate.is_empty() {
                title_candidate
            } else {
                format!("Imported note {}", index + 1)
            };
            (title, content)
        })
        .collect()
}

/// Sanitizes a JSON import payload into note records.
///
/// Accepts a bare array of note-like objects or an object with a `notes`
/// array. Entries empty after trimming are dropped; everything else gets
/// defaults for missing fields and preserved-or-assigned identity and
/// timestamps.
pub fn sanitize_json_payload(payload: &str) -> Result<Vec<Note>> {
    let value: Value = serde_json::from_str(payload)?;
    let entries = match value {
        Value::Array(items) => items,
        Value::Object(ref map) => match map.get("notes") {
            Some(Value::Array(items)) => items.clone(),
            _ => {
                return Err(AinotesError::InvalidImport(
                    "Invalid JSON format. Expected an array of notes.".to_string(),
                ))
            }
        },
        _ => {
            return Err(AinotesError::InvalidImport(
                "Invalid JSON format. Expected an array of notes.".to_string(),
            ))
        }
    };

    let now = Utc::now();
    let id_base = now.timestamp_millis();
    let mut notes = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let raw_title = scalar_string(entry.get("title")).unwrap_or_default();
        let raw_content = scalar_string(entry.get("content")).unwrap_or_default();
        if raw_title.trim().is_empty() && raw_content.trim().is_empty() {
            continue;
        }

        let title = if raw_title.trim().is_empty() {
            format!("Imported Note {}", index + 1)
        } else {
            raw_title.trim().to_string()
        };
        let tags = entry
            .get("tags")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let color = scalar_string(entry.get("color"))
            .map(|c| NoteColor::parse(&c))
            .unwrap_or_default();
        let id = scalar_string(entry.get("id"))
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("{id_base}-{index}"));
        let created_at = timestamp_field(entry.get("createdAt"), now);
        let updated_at = timestamp_field(entry.get("updatedAt"), now);

        notes.push(Note {
            id,
            title,
            content: raw_content,
            tags,
            color,
            // Lock state is intentionally not restored; imported notes
            // start unlocked.
            locked: false,
            created_at,
            updated_at,
        });
    }
    Ok(notes)
}

/// Coerces a scalar JSON value (string, number, or bool) to a string so
/// hand-edited backups with loose types still import.
fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Preserves an RFC 3339 timestamp field or assigns `fallback`.
fn timestamp_field(value: Option<&Value>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(fallback)
}

impl NoteRepository {
    /// Restores the collection from a JSON backup payload. This is a full
    /// overwrite: the sanitized entries replace every existing note.
    ///
    /// Returns the number of notes imported.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::Json`] for unparseable payloads or
    /// [`AinotesError::InvalidImport`] for a parseable payload of the wrong
    /// shape. No write occurs on error.
    pub fn import_json(&mut self, payload: &str) -> Result<usize> {
        let notes = sanitize_json_payload(payload)?;
        self.persist(&notes);
        Ok(notes.len())
    }

    /// Imports extracted document text, deduplicating against the existing
    /// collection and prepending whatever survives, newest first.
    ///
    /// Returns the number of notes added.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::NothingToImport`] when every candidate is a
    /// duplicate (storage is left untouched), or
    /// [`AinotesError::InvalidImport`] when `SplitBlocks` finds no usable
    /// blocks.
    pub fn import_document_text(&mut self, text: &str, mode: TextImportMode) -> Result<usize> {
        let existing = self.list();

        let drafts: Vec<(String, String)> = match mode {
            TextImportMode::SingleDocument => {
                let number = next_imported_doc_number(&existing);
                vec![(format!("Imported Doc {number}"), text.trim().to_string())]
            }
            TextImportMode::SplitBlocks => {
                let blocks = split_text_blocks(text);
                if blocks.is_empty() {
                    return Err(AinotesError::InvalidImport(
                        "Unable to extract notes from the file.".to_string(),
                    ));
                }
                blocks
            }
        };

        let now = Utc::now();
        let mut candidates = Vec::with_capacity(drafts.len());
        for (index, (title, content)) in drafts.into_iter().enumerate() {
            let title = title.trim().to_string();
            let title = if title.is_empty() {
                format!("Imported Note {}", index + 1)
            } else {
                title
            };
            candidates.push(Note {
                id: batch_id(&existing, &candidates, now, index),
                title,
                content: content.trim().to_string(),
                tags: vec![],
                color: NoteColor::Default,
                locked: false,
                created_at: now,
                updated_at: now,
            });
        }

        // Keys of existing notes plus keys accepted so far, so duplicates
        // within the batch are suppressed too.
        let mut seen: HashSet<String> = existing
            .iter()
            .filter_map(|n| content_key(&n.title, &n.content))
            .collect();
        let fresh: Vec<Note> = candidates
            .into_iter()
            .filter(|note| match content_key(&note.title, &note.content) {
                Some(key) => seen.insert(key),
                None => false,
            })
            .collect();

        if fresh.is_empty() {
            return Err(AinotesError::NothingToImport);
        }

        let added = fresh.len();
        let mut merged = fresh;
        merged.extend(existing);
        self.persist(&merged);
        Ok(added)
    }

    /// Imports a file by extension: `.json` restores a backup, `.pdf` and
    /// `.docx` route through the matching extractor into a single-document
    /// text import.
    ///
    /// Returns the number of notes imported.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::UnsupportedFileType`] for unrecognized
    /// extensions, [`AinotesError::InvalidImport`] for non-UTF-8 JSON, or
    /// any error from the underlying import path.
    pub fn import_file(
        &mut self,
        filename: &str,
        bytes: &[u8],
        extractors: &Extractors<'_>,
    ) -> Result<usize> {
        match ImportFormat::from_filename(filename)? {
            ImportFormat::Json => {
                let payload = std::str::from_utf8(bytes).map_err(|_| {
                    AinotesError::InvalidImport("JSON file is not valid UTF-8.".to_string())
                })?;
                self.import_json(payload)
            }
            ImportFormat::Pdf => {
                let text = extractors.pdf.extract(bytes)?;
                self.import_document_text(&text, TextImportMode::SingleDocument)
            }
            ImportFormat::Docx => {
                let text = extractors.docx.extract(bytes)?;
                self.import_document_text(&text, TextImportMode::SingleDocument)
            }
        }
    }
}

/// Batch ID in the `{timestamp}-{index}` shape, nudged until unique against
/// both the existing collection and earlier candidates in the batch.
fn batch_id(existing: &[Note], accepted: &[Note], now: DateTime<Utc>, index: usize) -> String {
    let candidate = format!("{}-{index}", now.timestamp_millis());
    let taken = |id: &str| {
        existing.iter().any(|n| n.id == id) || accepted.iter().any(|n| n.id == id)
    };
    if !taken(&candidate) {
        return candidate;
    }
    let mut pool: Vec<Note> = existing.to_vec();
    pool.extend_from_slice(accepted);
    allocate_id(&pool, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteDraft;

    /// Extractor that hands back the bytes as UTF-8 text unchanged.
    struct Passthrough;

    impl TextExtractor for Passthrough {
        fn extract(&self, bytes: &[u8]) -> Result<String> {
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    fn repo() -> NoteRepository {
        NoteRepository::in_memory().unwrap()
    }

    #[test]
    fn test_format_recognition_is_case_insensitive() {
        assert_eq!(ImportFormat::from_filename("a.JSON").unwrap(), ImportFormat::Json);
        assert_eq!(ImportFormat::from_filename("b.Pdf").unwrap(), ImportFormat::Pdf);
        assert_eq!(ImportFormat::from_filename("c.docx").unwrap(), ImportFormat::Docx);
    }

    #[test]
    fn test_unrecognized_extension_is_rejected() {
        let err = ImportFormat::from_filename("notes.csv").unwrap_err();
        assert!(matches!(err, AinotesError::UnsupportedFileType(_)));
        assert!(ImportFormat::from_filename("no-extension").is_err());
    }

    #[test]
    fn test_content_key_normalizes_case_and_whitespace() {
        let a = content_key("My  Title", "some\n\tcontent here").unwrap();
        let b = content_key("my title", "some content   here").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_key_empty_note_is_excluded() {
        assert_eq!(content_key("", ""), None);
        assert_eq!(content_key("   ", "\n\t"), None);
    }

    #[test]
    fn test_imported_doc_numbering() {
        let mut repo = repo();
        assert_eq!(next_imported_doc_number(&repo.list()), 1);

        repo.create(NoteDraft { title: "Imported Doc 4".to_string(), ..Default::default() });
        repo.create(NoteDraft { title: "imported doc 7 (copy)".to_string(), ..Default::default() });
        repo.create(NoteDraft { title: "Unrelated".to_string(), ..Default::default() });
        assert_eq!(next_imported_doc_number(&repo.list()), 8);
    }

    #[test]
    fn test_split_text_blocks_titles_and_bodies() {
        let blocks = split_text_blocks("First Title\nline one\nline two\n\nSecond block only");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].0, "First Title");
        assert_eq!(blocks[0].1, "line one\nline two");
        // A single-line block uses its line as both title and content.
        assert_eq!(blocks[1].0, "Second block only");
        assert_eq!(blocks[1].1, "Second block only");
    }

    #[test]
    fn test_split_text_blocks_truncates_long_titles() {
        let long_line = "x".repeat(200);
        let blocks = split_text_blocks(&long_line);
        assert_eq!(blocks[0].0.chars().count(), 120);
    }

    #[test]
    fn test_split_text_blocks_empty_input() {
        assert!(split_text_blocks("").is_empty());
        assert!(split_text_blocks("\n\n  \n\n").is_empty());
    }

    #[test]
    fn test_json_import_of_minimal_entry() {
        let mut repo = repo();
        let count = repo.import_json(r#"[{"title": "A", "content": "B"}]"#).unwrap();
        assert_eq!(count, 1);
        let notes = repo.list();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "A");
        assert_eq!(notes[0].content, "B");
        assert_eq!(notes[0].color, NoteColor::Default);
        assert!(notes[0].updated_at >= notes[0].created_at);
    }

    #[test]
    fn test_json_import_accepts_notes_wrapper_object() {
        let mut repo = repo();
        let count = repo
            .import_json(r#"{"notes": [{"title": "wrapped", "content": ""}]}"#)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(repo.list()[0].title, "wrapped");
    }

    #[test]
    fn test_json_import_rejects_wrong_shapes() {
        let mut repo = repo();
        assert!(matches!(
            repo.import_json(r#"{"name": "not notes"}"#).unwrap_err(),
            AinotesError::InvalidImport(_)
        ));
        assert!(matches!(
            repo.import_json("42").unwrap_err(),
            AinotesError::InvalidImport(_)
        ));
        assert!(matches!(
            repo.import_json("{{{").unwrap_err(),
            AinotesError::Json(_)
        ));
        // No partial write happened.
        assert!(repo.list().is_empty());
    }

    #[test]
    fn test_json_import_defaults_and_drops_empty_entries() {
        let mut repo = repo();
        let payload = r#"[
            {"content": "only content"},
            {"title": "  ", "content": "   "},
            {"title": "keeps color", "color": "violet", "tags": ["a", "b"]}
        ]"#;
        let count = repo.import_json(payload).unwrap();
        assert_eq!(count, 2);
        let notes = repo.list();
        assert_eq!(notes[0].title, "Imported Note 1");
        assert_eq!(notes[1].color, NoteColor::Violet);
        assert_eq!(notes[1].tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_json_import_replaces_entire_collection() {
        let mut repo = repo();
        repo.create(NoteDraft { title: "pre-existing".to_string(), ..Default::default() });
        repo.import_json(r#"[{"title": "restored", "content": "x"}]"#).unwrap();
        let notes = repo.list();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "restored");
    }

    #[test]
    fn test_json_import_preserves_id_and_timestamps() {
        let mut repo = repo();
        let payload = r#"[{
            "id": "kept-id",
            "title": "A",
            "content": "B",
            "createdAt": "2023-05-01T10:00:00Z",
            "updatedAt": "2023-05-02T10:00:00Z"
        }]"#;
        repo.import_json(payload).unwrap();
        let note = &repo.list()[0];
        assert_eq!(note.id, "kept-id");
        assert_eq!(note.created_at.to_rfc3339(), "2023-05-01T10:00:00+00:00");
        assert!(note.updated_at > note.created_at);
    }

    #[test]
    fn test_document_import_creates_numbered_single_note() {
        let mut repo = repo();
        let added = repo
            .import_document_text("  body of the document  ", TextImportMode::SingleDocument)
            .unwrap();
        assert_eq!(added, 1);
        let notes = repo.list();
        assert_eq!(notes[0].title, "Imported Doc 1");
        assert_eq!(notes[0].content, "body of the document");

        repo.import_document_text("another document", TextImportMode::SingleDocument).unwrap();
        assert_eq!(repo.list()[0].title, "Imported Doc 2");
    }

    #[test]
    fn test_document_import_skips_duplicates() {
        let mut repo = repo();
        repo.import_document_text("same text", TextImportMode::SingleDocument).unwrap();

        // Identical after whitespace normalization — nothing new, storage
        // untouched. The title differs ("Imported Doc 2") so the key is the
        // title+content pair; make the clash explicit via an exact note.
        let before = repo.list();
        let note = &before[0];
        let err = repo
            .import_document_text(
                &format!("{}\n{}", note.title, note.content),
                TextImportMode::SplitBlocks,
            )
            .unwrap_err();
        assert!(matches!(err, AinotesError::NothingToImport));
        assert_eq!(repo.list(), before);
    }

    #[test]
    fn test_document_import_prepends_distinct_texts_newest_first() {
        let mut repo = repo();
        repo.import_document_text("first document", TextImportMode::SingleDocument).unwrap();
        repo.import_document_text("second document", TextImportMode::SingleDocument).unwrap();
        let notes = repo.list();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].content, "second document");
        assert_eq!(notes[1].content, "first document");
    }

    #[test]
    fn test_split_blocks_import_suppresses_in_batch_duplicates() {
        let mut repo = repo();
        let added = repo
            .import_document_text(
                "Alpha\nbody\n\nAlpha\nbody\n\nBeta\nother",
                TextImportMode::SplitBlocks,
            )
            .unwrap();
        assert_eq!(added, 2);
    }

    #[test]
    fn test_import_file_dispatches_by_extension() {
        let mut repo = repo();
        let extractors = Extractors { pdf: &Passthrough, docx: &Passthrough };

        repo.import_file("backup.json", br#"[{"title": "J", "content": "x"}]"#, &extractors)
            .unwrap();
        assert_eq!(repo.list()[0].title, "J");

        repo.import_file("report.pdf", b"pdf text here", &extractors).unwrap();
        assert_eq!(repo.list()[0].title, "Imported Doc 1");

        let err = repo.import_file("notes.txt", b"plain", &extractors).unwrap_err();
        assert!(matches!(err, AinotesError::UnsupportedFileType(_)));
    }

    #[test]
    fn test_round_trip_export_then_import_preserves_unlocked_notes() {
        let mut repo = repo();
        repo.create(NoteDraft {
            title: "first".to_string(),
            content: "alpha".to_string(),
            ..Default::default()
        });
        repo.create(NoteDraft {
            title: "second".to_string(),
            content: "beta".to_string(),
            ..Default::default()
        });

        let exported = repo.export_json().unwrap();
        let mut restored = NoteRepository::in_memory().unwrap();
        restored.import_json(&exported).unwrap();

        let original = repo.list();
        let round_tripped = restored.list();
        assert_eq!(original.len(), round_tripped.len());
        for (a, b) in original.iter().zip(&round_tripped) {
            assert_eq!(a.title, b.title);
            assert_eq!(a.content, b.content);
        }
    }

    #[test]
    fn test_locked_content_is_destroyed_by_export_import() {
        let mut repo = repo();
        let note = repo.create(NoteDraft {
            title: "secret".to_string(),
            content: "hidden text".to_string(),
            ..Default::default()
        });
        repo.set_pin("1234").unwrap();
        repo.lock_note(&note.id).unwrap();

        let exported = repo.export_json().unwrap();
        let mut restored = NoteRepository::in_memory().unwrap();
        restored.import_json(&exported).unwrap();

        // One-way by design: the placeholder survives, the content does not.
        assert_eq!(restored.list()[0].content, crate::core::export::LOCKED_PLACEHOLDER);
    }
}
