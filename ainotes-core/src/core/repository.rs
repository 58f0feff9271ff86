//! High-level note operations over the durable key-value store.
//!
//! [`NoteRepository`] is the sole mutator of the notes collection. Callers
//! hold no live references into storage; every read returns a fresh,
//! fully-deserialized snapshot and every mutation rewrites the whole
//! collection, so observers always see a consistent state.
//!
//! Storage failures never propagate out of read or write paths: reads
//! degrade to an empty collection and writes to a logged `false`, so the
//! app keeps running on whatever state is in memory.

use crate::core::lock;
use crate::core::storage::{self, Storage};
use crate::{AiService, AinotesError, Note, NoteColor, NoteDraft, NotePatch, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// An open note collection backed by a [`Storage`] handle.
pub struct NoteRepository {
    storage: Storage,
}

impl NoteRepository {
    /// Opens (creating if necessary) the repository at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::Database`] if the store cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self { storage: Storage::open(path)? })
    }

    /// Opens a transient in-memory repository.
    pub fn in_memory() -> Result<Self> {
        Ok(Self { storage: Storage::in_memory()? })
    }

    /// Returns all notes, newest first, with colors normalized to the
    /// palette. Never fails: read or parse problems are logged and degrade
    /// to an empty collection.
    #[must_use]
    pub fn list(&self) -> Vec<Note> {
        let raw = match self.storage.get(storage::NOTES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::error!("failed to read notes from storage: {e}");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(notes) => notes,
            Err(e) => {
                log::error!("stored notes payload is not valid JSON: {e}");
                Vec::new()
            }
        }
    }

    /// Fetches a single note by ID.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::NoteNotFound`] if `id` is absent.
    pub fn get(&self, id: &str) -> Result<Note> {
        self.list()
            .into_iter()
            .find(|n| n.id == id)
            .ok_or_else(|| AinotesError::NoteNotFound(id.to_string()))
    }

    /// Serializes and writes the whole collection. Returns `false` (after
    /// logging) instead of failing.
    pub(crate) fn persist(&mut self, notes: &[Note]) -> bool {
        let payload = match serde_json::to_string(notes) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("failed to serialize notes: {e}");
                return false;
            }
        };
        match self.storage.set(storage::NOTES_KEY, &payload) {
            Ok(()) => true,
            Err(e) => {
                log::error!("failed to write notes to storage: {e}");
                false
            }
        }
    }

    /// Creates a note from `draft` and prepends it to the collection.
    ///
    /// The ID is derived from the creation timestamp (suffix-bumped on
    /// collision) and `updated_at == created_at` at birth.
    pub fn create(&mut self, draft: NoteDraft) -> Note {
        let mut notes = self.list();
        let now = Utc::now();
        let note = Note {
            id: allocate_id(&notes, now),
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            color: draft.color.unwrap_or_default(),
            locked: false,
            created_at: now,
            updated_at: now,
        };
        notes.insert(0, note.clone());
        self.persist(&notes);
        note
    }

    /// Merges `patch` onto the note identified by `id`.
    ///
    /// The ID is preserved, an explicit color clear falls back to
    /// [`NoteColor::Default`], and `updated_at` strictly increases even if
    /// the clock has not advanced since the last mutation.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::NoteNotFound`] if `id` is absent.
    pub fn update(&mut self, id: &str, patch: NotePatch) -> Result<Note> {
        let mut notes = self.list();
        let Some(note) = notes.iter_mut().find(|n| n.id == id) else {
            return Err(AinotesError::NoteNotFound(id.to_string()));
        };

        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(content) = patch.content {
            note.content = content;
        }
        if let Some(tags) = patch.tags {
            note.tags = tags;
        }
        if let Some(color) = patch.color {
            note.color = color.unwrap_or(NoteColor::Default);
        }
        if let Some(locked) = patch.locked {
            note.locked = locked;
        }

        let mut now = Utc::now();
        if now <= note.updated_at {
            now = note.updated_at + Duration::milliseconds(1);
        }
        note.updated_at = now;

        let updated = note.clone();
        self.persist(&notes);
        Ok(updated)
    }

    /// Removes the note identified by `id` and returns the remaining
    /// collection. Deleting an unknown ID is a no-op.
    pub fn delete(&mut self, id: &str) -> Vec<Note> {
        let mut notes = self.list();
        let before = notes.len();
        notes.retain(|n| n.id != id);
        if notes.len() != before {
            self.persist(&notes);
        }
        notes
    }

    /// Seeds the three example notes on an empty collection; otherwise
    /// returns the existing collection unchanged. Intended to run once per
    /// application load.
    pub fn ensure_defaults(&mut self) -> Vec<Note> {
        let existing = self.list();
        if !existing.is_empty() {
            return existing;
        }
        let defaults = default_notes(Utc::now());
        self.persist(&defaults);
        defaults
    }

    /// Case-insensitive substring search.
    ///
    /// Titles are always matched; content only for unlocked notes. A blank
    /// query returns the full collection.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Note> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.list();
        }
        self.list()
            .into_iter()
            .filter(|n| n.matches_query(&query))
            .collect()
    }

    /// Returns all notes carrying `tag`, in collection order.
    #[must_use]
    pub fn notes_with_tag(&self, tag: &str) -> Vec<Note> {
        self.list()
            .into_iter()
            .filter(|n| n.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Returns all distinct tags used across the collection, sorted
    /// alphabetically.
    #[must_use]
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .list()
            .into_iter()
            .flat_map(|n| n.tags)
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    // ── Lock gate ──────────────────────────────────────────────────────────

    /// Whether a PIN has ever been set.
    #[must_use]
    pub fn has_pin(&self) -> bool {
        match self.storage.get(storage::PIN_KEY) {
            Ok(value) => value.is_some(),
            Err(e) => {
                log::error!("failed to read PIN from storage: {e}");
                false
            }
        }
    }

    /// Stores `pin` as the collection-wide secret, overwriting any previous
    /// value. There is no operation to clear it.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::InvalidPin`] if validation fails, or
    /// [`AinotesError::Database`] if the write fails.
    pub fn set_pin(&mut self, pin: &str) -> Result<()> {
        lock::validate_new_pin(pin)?;
        self.storage.set(storage::PIN_KEY, pin)
    }

    /// Byte-for-byte comparison of `pin` against the stored secret.
    /// Always `false` when no PIN is set.
    #[must_use]
    pub fn verify_pin(&self, pin: &str) -> bool {
        let stored = match self.storage.get(storage::PIN_KEY) {
            Ok(value) => value,
            Err(e) => {
                log::error!("failed to read PIN from storage: {e}");
                None
            }
        };
        lock::pin_matches(stored.as_deref(), pin)
    }

    /// Locks the note identified by `id`. Locking never asks for the PIN,
    /// but a PIN must already exist — set one first via [`Self::set_pin`].
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::PinNotSet`] if no PIN exists, or
    /// [`AinotesError::NoteNotFound`] for an unknown ID.
    pub fn lock_note(&mut self, id: &str) -> Result<Note> {
        if !self.has_pin() {
            return Err(AinotesError::PinNotSet);
        }
        self.update(id, NotePatch { locked: Some(true), ..Default::default() })
    }

    /// Unlocks the note identified by `id` if `pin` matches the stored
    /// secret. On mismatch the note stays locked; there is no lockout or
    /// attempt counter.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::WrongPin`] on mismatch, or
    /// [`AinotesError::NoteNotFound`] for an unknown ID.
    pub fn unlock_note(&mut self, id: &str, pin: &str) -> Result<Note> {
        if !self.verify_pin(pin) {
            return Err(AinotesError::WrongPin);
        }
        self.update(id, NotePatch { locked: Some(false), ..Default::default() })
    }

    // ── AI assistance ──────────────────────────────────────────────────────

    /// Summarizes the note's content through `ai`. Read-only: the summary
    /// is returned to the caller, not written back.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::NoteLocked`] for a locked note,
    /// [`AinotesError::NoteNotFound`] for an unknown ID, or any error from
    /// the AI service.
    pub fn summarize_note(&self, id: &str, ai: &AiService) -> Result<String> {
        let content = self.ai_content(id)?;
        ai.summarize(&content)
    }

    /// Rewrites the note's content through `ai` per `instruction` and saves
    /// the cleaned result as the new content.
    ///
    /// # Errors
    ///
    /// Same as [`Self::summarize_note`], plus validation of `instruction`.
    pub fn rewrite_note(&mut self, id: &str, instruction: &str, ai: &AiService) -> Result<Note> {
        let content = self.ai_content(id)?;
        let rewritten = ai.rewrite(&content, instruction)?;
        self.update(id, NotePatch { content: Some(rewritten), ..Default::default() })
    }

    /// Content of a note for AI consumption; refuses locked notes.
    fn ai_content(&self, id: &str) -> Result<String> {
        let note = self.get(id)?;
        if note.locked {
            return Err(AinotesError::NoteLocked(id.to_string()));
        }
        Ok(note.content)
    }
}

/// Derives a collection-unique ID from the creation timestamp.
pub(crate) fn allocate_id(existing: &[Note], now: DateTime<Utc>) -> String {
    let base = now.timestamp_millis().to_string();
    if !existing.iter().any(|n| n.id == base) {
        return base;
    }
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !existing.iter().any(|n| n.id == candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// The three example notes seeded for first-time users, with descending
/// creation timestamps so they display oldest-last.
fn default_notes(now: DateTime<Utc>) -> Vec<Note> {
    let base = now.timestamp_millis();
    let seed = |suffix: &str, title: &str, content: &str, tag: &str, color: NoteColor, age_days: i64| {
        let created = now - Duration::days(age_days);
        Note {
            id: format!("{base}-{suffix}"),
            title: title.to_string(),
            content: content.to_string(),
            tags: vec![tag.to_string()],
            color,
            locked: false,
            created_at: created,
            updated_at: created,
        }
    };
    vec![
        seed(
            "d1",
            "Welcome to AI Notes",
            "Create, organize, and summarize your notes with AI. Click \u{201c}New Note\u{201d} to get started, or try \u{201c}Summarize with AI\u{201d} inside any note.\nRewrite note to improve clarity and accuracy",
            "Info",
            NoteColor::Sky,
            1,
        ),
        seed(
            "d2",
            "Tips for Better Notes",
            "- Keep notes concise\n- Use tags like Work/Study/Personal\n- Use AI summary for quick overviews\n- Use Lock button to protect your notes\n- Use different colors for different notes",
            "Tips",
            NoteColor::Emerald,
            2,
        ),
        seed(
            "d3",
            "Try Import & Export",
            "Use the toolbar to import JSON/PDF/DOCX or export your entire notebook as JSON, PDF, or Word.",
            "Tools",
            NoteColor::Amber,
            3,
        ),
    ]
}
