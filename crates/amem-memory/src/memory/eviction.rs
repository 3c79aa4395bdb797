//! Capacity enforcement.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::AgenticMemory;
use crate::note::{MemoryNote, NoteId};

/// Access count at which the access factor saturates.
const ACCESS_SATURATION: f32 = 10.0;

/// Retention score: `importance * recency * access`.
///
/// Recency is `1 / (1 + days since last access)`; access is
/// `min(access_count / 10, 1)`.
pub(crate) fn retention_score(note: &MemoryNote, now: DateTime<Utc>) -> f32 {
    let recency = 1.0 / (1.0 + note.idle_days(now) as f32);
    let access = (note.access_count as f32 / ACCESS_SATURATION).min(1.0);
    note.importance * recency * access
}

impl AgenticMemory {
    /// Number of notes an eviction pass removes at the current size.
    fn eviction_count(&self) -> usize {
        let len = self.graph.len();
        let fraction = (len as f32 * self.params.eviction_fraction).floor() as usize;
        let overflow = len.saturating_sub(self.params.max_notes);
        fraction.max(overflow).max(1)
    }

    /// Remove the lowest-retention notes until the graph is within capacity.
    ///
    /// `protected` (the note just stored) is never a victim. Ties fall to the
    /// least recently accessed note, then the smaller id.
    pub(crate) fn evict(&mut self, protected: &str, now: DateTime<Utc>) {
        let count = self.eviction_count();

        let mut candidates: Vec<(f32, DateTime<Utc>, NoteId)> = self
            .graph
            .notes()
            .filter(|note| note.id != protected)
            .map(|note| (retention_score(note, now), note.last_accessed, note.id.clone()))
            .collect();
        candidates.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        let mut removed = 0;
        for (score, _, id) in candidates.into_iter().take(count) {
            if self.graph.remove_node(&id).is_some() {
                self.primed.remove(&id);
                removed += 1;
                debug!(id = %id, score, "Evicted note");
            }
        }
        info!(removed, remaining = self.graph.len(), "Eviction pass complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;

    use crate::extractor::{HeuristicExtractor, NoteFeatures};
    use crate::memory::{MemoryParams, StoreOptions};

    fn memory(max_notes: usize) -> AgenticMemory {
        let params = MemoryParams {
            max_notes,
            ..Default::default()
        };
        AgenticMemory::new(params, Arc::new(HeuristicExtractor)).unwrap()
    }

    fn store(memory: &mut AgenticMemory, content: &str, importance: f32) -> NoteId {
        memory
            .store_with_features(
                content,
                StoreOptions::new().with_importance(importance),
                NoteFeatures::default(),
            )
            .unwrap()
            .id
    }

    #[test]
    fn test_retention_score() {
        let now = Utc::now();
        let mut note = MemoryNote::new("x", "", "t", Default::default(), 0.8);
        assert_eq!(retention_score(&note, now), 0.0);

        note.access_count = 5;
        assert!((retention_score(&note, now) - 0.4).abs() < 1e-6);

        note.access_count = 50;
        note.last_accessed = now - Duration::days(1);
        assert!((retention_score(&note, now) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_eviction_keeps_capacity_and_new_note() {
        let mut mem = memory(3);
        for i in 0..3 {
            store(&mut mem, &format!("note number {i}"), 0.5);
        }
        let newest = store(&mut mem, "the newest note", 0.0);
        assert_eq!(mem.len(), 3);
        assert!(mem.get(&newest).is_some());
    }

    #[test]
    fn test_eviction_prefers_low_retention() {
        let mut mem = memory(3);
        let keep_a = store(&mut mem, "frequently used", 0.9);
        let victim = store(&mut mem, "never used", 0.9);
        let keep_b = store(&mut mem, "also used", 0.9);
        for id in [&keep_a, &keep_b] {
            mem.graph.get_mut(id).unwrap().access_count = 5;
        }

        store(&mut mem, "overflow", 0.5);
        assert!(mem.get(&victim).is_none());
        assert!(mem.get(&keep_a).is_some());
        assert!(mem.get(&keep_b).is_some());
    }

    #[test]
    fn test_eviction_tie_breaks_on_last_access() {
        let mut mem = memory(2);
        let older = store(&mut mem, "first", 0.5);
        let newer = store(&mut mem, "second", 0.5);
        let now = Utc::now();
        mem.graph.get_mut(&older).unwrap().last_accessed = now - Duration::hours(2);
        mem.graph.get_mut(&newer).unwrap().last_accessed = now - Duration::hours(1);

        store(&mut mem, "third", 0.5);
        assert!(mem.get(&older).is_none());
        assert!(mem.get(&newer).is_some());
    }

    #[test]
    fn test_eviction_fraction_removes_batch() {
        let params = MemoryParams {
            max_notes: 10,
            eviction_fraction: 0.5,
            ..Default::default()
        };
        let mut mem = AgenticMemory::new(params, Arc::new(HeuristicExtractor)).unwrap();
        for i in 0..11 {
            store(&mut mem, &format!("item {i}"), 0.5);
        }
        // floor(11 * 0.5) = 5 removed.
        assert_eq!(mem.len(), 6);
    }

    #[test]
    fn test_evicted_notes_leave_no_links() {
        let mut mem = memory(2);
        let features = NoteFeatures::new(vec!["shared".into()], vec![]);
        let a = mem
            .store_with_features("alpha", StoreOptions::new(), features.clone())
            .unwrap()
            .id;
        let b = mem
            .store_with_features("beta", StoreOptions::new(), features.clone())
            .unwrap()
            .id;
        mem.graph.get_mut(&b).unwrap().access_count = 5;
        assert!(mem.get(&b).unwrap().is_linked_to(&a));

        mem.store_with_features("gamma", StoreOptions::new(), features)
            .unwrap();
        assert!(mem.get(&a).is_none());
        assert!(!mem.get(&b).unwrap().is_linked_to(&a));
        assert!(mem.graph.is_consistent());
        assert!(!mem.primed.contains(&a));
    }
}
