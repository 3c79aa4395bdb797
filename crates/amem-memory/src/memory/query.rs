//! Option and result types for store, recall and consolidation.

use serde::Serialize;

use crate::note::{MemoryNote, NoteId, NoteType};

/// Source recorded on notes when the caller does not name one.
pub const DEFAULT_SOURCE: &str = "user";

/// Importance given to notes when the caller does not set one.
pub const DEFAULT_IMPORTANCE: f32 = 0.5;

// ─────────────────────────────────────────────────────────────────────────────
// Store Options
// ─────────────────────────────────────────────────────────────────────────────

/// Everything `store` needs besides the content.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOptions {
    /// Situational description; part of the note's identity.
    pub context: String,
    pub source: String,
    pub note_type: NoteType,
    /// Importance, clamped into `[0, 1]`.
    pub importance: f32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            context: String::new(),
            source: DEFAULT_SOURCE.to_string(),
            note_type: NoteType::Episodic,
            importance: DEFAULT_IMPORTANCE,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_type(mut self, note_type: NoteType) -> Self {
        self.note_type = note_type;
        self
    }

    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = importance;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Recall Options
// ─────────────────────────────────────────────────────────────────────────────

/// Per-call recall settings. Unset fields use the memory's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecallOptions {
    /// Extra context folded into query tag inference.
    pub context: Option<String>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Minimum final activation for a result.
    pub min_relevance: Option<f32>,
}

impl RecallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_min_relevance(mut self, min_relevance: f32) -> Self {
        self.min_relevance = Some(min_relevance);
        self
    }
}

/// One recall hit: a snapshot of the note after its access was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecallMatch {
    pub note: MemoryNote,
    /// Final activation of the note.
    pub score: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Consolidation
// ─────────────────────────────────────────────────────────────────────────────

/// Summary of a consolidation pass that ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsolidationReport {
    /// Semantic notes newly created by this pass.
    pub consolidated: usize,
    /// Episodic notes that qualified for grouping.
    pub episodic_processed: usize,
    /// Note count after the pass.
    pub total_notes: usize,
    /// Ids of every semantic note this pass synthesized, new or already present.
    pub semantic_ids: Vec<NoteId>,
}

/// Returned when consolidation was rate-limited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidationSkipped {
    pub skipped: bool,
    pub reason: String,
    /// Seconds until the next pass is allowed.
    pub retry_after_secs: u64,
}

/// Result of `consolidate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConsolidationOutcome {
    Completed(ConsolidationReport),
    Skipped(ConsolidationSkipped),
}

impl ConsolidationOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// The report, if the pass ran.
    pub fn report(&self) -> Option<&ConsolidationReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped(_) => None,
        }
    }
}
