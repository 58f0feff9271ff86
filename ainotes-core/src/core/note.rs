//! The note data model: [`Note`], its color palette, and the draft/patch
//! input types used by the repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Palette identifier for a note's card color.
///
/// Deserialization never fails: any string outside the palette normalizes
/// to [`NoteColor::Default`], so stale or hand-edited stored data stays
/// readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum NoteColor {
    #[default]
    Default,
    Sky,
    Rose,
    Amber,
    Emerald,
    Violet,
    Slate,
}

impl NoteColor {
    /// All palette entries, in display order.
    pub const ALL: [NoteColor; 7] = [
        NoteColor::Default,
        NoteColor::Sky,
        NoteColor::Rose,
        NoteColor::Amber,
        NoteColor::Emerald,
        NoteColor::Violet,
        NoteColor::Slate,
    ];

    /// Parses a palette identifier, normalizing unknown values to `Default`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "sky" => Self::Sky,
            "rose" => Self::Rose,
            "amber" => Self::Amber,
            "emerald" => Self::Emerald,
            "violet" => Self::Violet,
            "slate" => Self::Slate,
            _ => Self::Default,
        }
    }

    /// Returns the stable identifier used on the wire and in storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Sky => "sky",
            Self::Rose => "rose",
            Self::Amber => "amber",
            Self::Emerald => "emerald",
            Self::Violet => "violet",
            Self::Slate => "slate",
        }
    }
}

impl From<String> for NoteColor {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// A single user-authored note.
///
/// Serialized with camelCase field names; this is both the durable storage
/// layout and the JSON export/import wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique within the collection, derived from the creation timestamp,
    /// never reused.
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Insertion order is preserved for display.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub color: NoteColor,
    /// While `true`, `content` is hidden from search, plaintext export,
    /// and AI features; only the title stays visible.
    #[serde(default)]
    pub locked: bool,
    /// Immutable after creation.
    #[serde(default = "now")]
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation; always `>= created_at`.
    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Case-insensitive substring match against `query` (already lowercased).
    ///
    /// The title is always searchable; content only while unlocked.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        if self.title.to_lowercase().contains(query) {
            return true;
        }
        if self.locked {
            return false;
        }
        self.content.to_lowercase().contains(query)
    }
}

/// Input for creating a new note. Identity and timestamps are assigned by
/// the repository.
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub color: Option<NoteColor>,
}

/// A merge patch for [`NoteRepository::update`](crate::NoteRepository::update).
///
/// `None` fields are left untouched. `color` is doubly optional so a patch
/// can distinguish "keep the current color" (`None`) from "explicitly clear
/// it back to default" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub color: Option<Option<NoteColor>>,
    pub locked: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_color_normalizes_to_default() {
        assert_eq!(NoteColor::parse("chartreuse"), NoteColor::Default);
        assert_eq!(NoteColor::parse(""), NoteColor::Default);
        assert_eq!(NoteColor::parse("sky"), NoteColor::Sky);
    }

    #[test]
    fn test_color_round_trips_through_json() {
        let json = serde_json::to_string(&NoteColor::Emerald).unwrap();
        assert_eq!(json, "\"emerald\"");
        let parsed: NoteColor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, NoteColor::Emerald);
    }

    #[test]
    fn test_unknown_color_deserializes_to_default() {
        let parsed: NoteColor = serde_json::from_str("\"magenta\"").unwrap();
        assert_eq!(parsed, NoteColor::Default);
    }

    #[test]
    fn test_note_deserializes_with_missing_optional_fields() {
        let note: Note = serde_json::from_str(
            r#"{"id": "1", "title": "A", "content": "B"}"#,
        )
        .unwrap();
        assert_eq!(note.color, NoteColor::Default);
        assert!(!note.locked);
        assert!(note.tags.is_empty());
        assert!(note.updated_at >= note.created_at);
    }

    #[test]
    fn test_note_serializes_camel_case_timestamps() {
        let note = Note {
            id: "1".to_string(),
            title: "A".to_string(),
            content: "B".to_string(),
            tags: vec![],
            color: NoteColor::Default,
            locked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&note).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"updatedAt\""));
    }

    #[test]
    fn test_locked_note_query_matches_title_only() {
        let note = Note {
            id: "1".to_string(),
            title: "Grocery list".to_string(),
            content: "milk and eggs".to_string(),
            tags: vec![],
            color: NoteColor::Default,
            locked: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(note.matches_query("grocery"));
        assert!(!note.matches_query("milk"));
    }
}
