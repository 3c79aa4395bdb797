//! Store pipeline: dedup, feature derivation, linking.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::AgenticMemory;
use super::query::StoreOptions;
use crate::error::{MemoryError, Result};
use crate::extractor::{NoteFeatures, extract_features};
use crate::note::{MemoryNote, NoteId, note_id};
use crate::validation::{normalize_importance, validate_content};

/// Weight of keyword overlap in link similarity.
const KEYWORD_LINK_WEIGHT: f32 = 0.6;
/// Weight of tag overlap in link similarity.
const TAG_LINK_WEIGHT: f32 = 0.4;

/// Raw-count overlap between two string lists.
pub(crate) fn overlap(a: &[String], b: &[String]) -> usize {
    a.iter().filter(|item| b.contains(item)).count()
}

/// Store-time link similarity between two notes' features.
pub(crate) fn link_similarity(
    keywords: &[String],
    tags: &[String],
    other: &MemoryNote,
) -> f32 {
    KEYWORD_LINK_WEIGHT * overlap(keywords, &other.keywords) as f32
        + TAG_LINK_WEIGHT * overlap(tags, &other.tags) as f32
}

impl AgenticMemory {
    /// Store an observation, returning the stored (or existing) note.
    ///
    /// Identical `(content, context)` pairs resolve to one note: a repeat
    /// store records an access and raises importance to the maximum seen,
    /// without re-deriving features or links.
    pub async fn store(&mut self, content: &str, options: StoreOptions) -> Result<MemoryNote> {
        validate_content(content)?;
        let importance = normalize_importance(options.importance)?;

        let id = note_id(content, &options.context);
        if self.graph.contains(&id) {
            return self.refresh_existing(&id, importance, Utc::now());
        }

        let extractor = self.extractor();
        let features = extract_features(extractor.as_ref(), content, &options.context).await?;
        self.store_with_features(content, options, features)
    }

    /// Synchronous half of [`store`](Self::store) with precomputed features.
    ///
    /// The dedup check runs again here, so features computed for a note that
    /// appeared in the meantime are discarded.
    pub fn store_with_features(
        &mut self,
        content: &str,
        options: StoreOptions,
        features: NoteFeatures,
    ) -> Result<MemoryNote> {
        validate_content(content)?;
        let importance = normalize_importance(options.importance)?;
        let now = Utc::now();

        let id = note_id(content, &options.context);
        if self.graph.contains(&id) {
            return self.refresh_existing(&id, importance, now);
        }

        self.counters.total_stores += 1;
        let note = MemoryNote::new(
            content,
            options.context,
            options.source,
            options.note_type,
            importance,
        )
        .with_keywords(features.keywords)
        .with_tags(features.tags);

        let links = self.link_candidates(&note);
        self.graph.add_node(note);
        if importance > 0.0 {
            self.primed.insert(id.clone());
        }
        for (other, weight) in &links {
            self.graph.add_edge(&id, other, *weight);
            self.graph.add_edge(other, &id, *weight);
            debug!(from = %id, to = %other, weight, "Linked notes");
        }
        debug!(id = %id, links = links.len(), total = self.graph.len(), "Stored note");

        if self.graph.len() > self.params.max_notes {
            self.evict(&id, now);
        }

        self.snapshot(&id)
    }

    /// Dedup path: record the access and keep the larger importance.
    fn refresh_existing(
        &mut self,
        id: &str,
        importance: f32,
        now: DateTime<Utc>,
    ) -> Result<MemoryNote> {
        self.counters.total_stores += 1;
        let note = self
            .graph
            .get_mut(id)
            .ok_or_else(|| MemoryError::NotFound(id.to_string()))?;
        note.touch(now);
        note.importance = note.importance.max(importance);
        debug!(id, access_count = note.access_count, "Store hit existing note");
        Ok(note.clone())
    }

    /// Clone of the note with `id`.
    fn snapshot(&self, id: &str) -> Result<MemoryNote> {
        self.graph
            .get(id)
            .cloned()
            .ok_or_else(|| MemoryError::NotFound(id.to_string()))
    }

    /// Existing notes similar enough to `note` to link, with edge weights.
    fn link_candidates(&self, note: &MemoryNote) -> Vec<(NoteId, f32)> {
        let mut links: Vec<(NoteId, f32)> = self
            .graph
            .notes()
            .filter(|other| other.id != note.id)
            .filter_map(|other| {
                let similarity = link_similarity(&note.keywords, &note.tags, other);
                (similarity >= self.params.link_threshold)
                    .then(|| (other.id.clone(), similarity.min(1.0)))
            })
            .collect();
        links.sort_by(|a, b| a.0.cmp(&b.0));
        links
    }
}
