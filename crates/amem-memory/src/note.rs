//! Memory note data model.
//!
//! A [`MemoryNote`] is one stored observation. Its id is content-addressed
//! over `(content, context)`, so the payload never changes after creation;
//! only the bookkeeping fields (access count, timestamps, activation, and the
//! linked-note cache) move.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::MemoryError;

/// Number of hex characters kept from the content digest.
const NOTE_ID_LEN: usize = 16;

/// Identifier of a note (hex digest prefix).
pub type NoteId = String;

// ─────────────────────────────────────────────────────────────────────────────
// Note Type
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of knowledge a note holds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    /// A specific observation or event.
    #[default]
    Episodic,
    /// Generalized knowledge, usually produced by consolidation.
    Semantic,
    /// How-to knowledge.
    Procedural,
}

impl NoteType {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
            Self::Procedural => "procedural",
        }
    }

    /// All note types, in declaration order.
    pub fn all() -> [NoteType; 3] {
        [Self::Episodic, Self::Semantic, Self::Procedural]
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "episodic" => Ok(Self::Episodic),
            "semantic" => Ok(Self::Semantic),
            "procedural" => Ok(Self::Procedural),
            other => Err(MemoryError::InvalidInput(format!(
                "unknown note type '{}'",
                other
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Note Id
// ─────────────────────────────────────────────────────────────────────────────

/// Derive the content-addressed id for a `(content, context)` pair.
///
/// A unit separator sits between the two fields so that moving text from
/// one field to the other changes the id.
pub fn note_id(content: &str, context: &str) -> NoteId {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update([0x1f]);
    hasher.update(context.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(NOTE_ID_LEN);
    digest
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Note
// ─────────────────────────────────────────────────────────────────────────────

/// One stored observation plus its derived features and bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryNote {
    /// Content-addressed identifier.
    pub id: NoteId,
    /// The observation itself.
    pub content: String,
    /// Situational description.
    pub context: String,
    /// Derived keywords, lower-cased.
    pub keywords: Vec<String>,
    /// Derived category tags.
    pub tags: Vec<String>,
    /// Where the note came from (caller-defined).
    pub source: String,
    pub note_type: NoteType,
    /// Importance in `[0, 1]`.
    pub importance: f32,
    /// Transient recall activation.
    pub activation: f32,
    pub access_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    /// Outbound neighbors; mirrors the graph's forward edge map.
    pub linked_notes: BTreeSet<NoteId>,
}

impl MemoryNote {
    /// Create a new note with a content-addressed id.
    ///
    /// Activation starts at `importance`.
    pub fn new(
        content: impl Into<String>,
        context: impl Into<String>,
        source: impl Into<String>,
        note_type: NoteType,
        importance: f32,
    ) -> Self {
        let content = content.into();
        let context = context.into();
        let now = Utc::now();
        Self {
            id: note_id(&content, &context),
            content,
            context,
            keywords: Vec::new(),
            tags: Vec::new(),
            source: source.into(),
            note_type,
            importance,
            activation: importance,
            access_count: 0,
            created_at: now,
            last_accessed: now,
            linked_notes: BTreeSet::new(),
        }
    }

    /// Set derived keywords.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Set derived tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Record an access: bump the counter and refresh `last_accessed`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed = now;
    }

    /// Whole days elapsed since creation (never negative).
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }

    /// Whole days elapsed since the last access (never negative).
    pub fn idle_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_accessed).num_days().max(0)
    }

    /// Is this note linked to `other`?
    pub fn is_linked_to(&self, other: &str) -> bool {
        self.linked_notes.contains(other)
    }
}
