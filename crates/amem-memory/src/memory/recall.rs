//! Recall by spreading activation.
//!
//! 1. Zero the activation of every primed note.
//! 2. Score every note against the query features; the best become seeds.
//! 3. Spread for `spread_steps` steps. Each step reads a snapshot of the
//!    activations at the start of the step, so the outcome does not depend on
//!    the order neighbors are visited in. Incoming spread is merged with
//!    `max`, never summed.
//! 4. Rank by final activation and record an access on every returned note.

use std::cmp::Ordering;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use super::AgenticMemory;
use super::query::{RecallMatch, RecallOptions};
use super::store_ops::overlap;
use crate::error::Result;
use crate::extractor::{NoteFeatures, extract_features};
use crate::note::{MemoryNote, NoteId};
use crate::validation::validate_query;

const KEYWORD_SEED_WEIGHT: f32 = 0.6;
const TAG_SEED_WEIGHT: f32 = 0.4;

/// Seed relevance of `note` for a query.
///
/// Overlaps are normalized by the query-side count, then scaled by
/// `0.5 + importance / 2` and a creation-age boost `0.7 + 0.3 / (1 + days)`.
pub(crate) fn seed_relevance(query: &NoteFeatures, note: &MemoryNote, now: DateTime<Utc>) -> f32 {
    let keyword_score = if query.keywords.is_empty() {
        0.0
    } else {
        overlap(&query.keywords, &note.keywords) as f32 / query.keywords.len() as f32
    };
    let tag_score = if query.tags.is_empty() {
        0.0
    } else {
        overlap(&query.tags, &note.tags) as f32 / query.tags.len() as f32
    };

    let base = keyword_score * KEYWORD_SEED_WEIGHT + tag_score * TAG_SEED_WEIGHT;
    let importance = 0.5 + note.importance * 0.5;
    let recency = 0.7 + 0.3 / (1.0 + note.age_days(now) as f32);
    base * importance * recency
}

/// Descending by score, then ascending by id.
fn by_score_then_id(a: &(NoteId, f32), b: &(NoteId, f32)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
}

impl AgenticMemory {
    /// Recall notes relevant to `query`, best first.
    ///
    /// Side effects: every returned note gets an access recorded, and
    /// transient activations across the graph are rewritten.
    pub async fn recall(&mut self, query: &str, options: RecallOptions) -> Result<Vec<RecallMatch>> {
        validate_query(query)?;
        let extractor = self.extractor();
        let context = options.context.as_deref().unwrap_or("");
        let features = extract_features(extractor.as_ref(), query, context).await?;
        Ok(self.recall_with_features(&features, &options))
    }

    /// Synchronous half of [`recall`](Self::recall) with precomputed query features.
    pub fn recall_with_features(
        &mut self,
        features: &NoteFeatures,
        options: &RecallOptions,
    ) -> Vec<RecallMatch> {
        let started = Instant::now();
        let now = Utc::now();
        let limit = options.limit.unwrap_or(self.params.default_limit);
        let min_relevance = options
            .min_relevance
            .unwrap_or(self.params.default_min_relevance);

        self.counters.total_recalls += 1;
        self.reset_activation();

        let seeds = self.select_seeds(features, now);
        for (id, relevance) in &seeds {
            if let Some(note) = self.graph.get_mut(id) {
                note.activation = *relevance;
                self.primed.insert(id.clone());
            }
        }

        let steps = self.spread(started);
        let ranked = self.rank(min_relevance, limit);

        let matches: Vec<RecallMatch> = ranked
            .into_iter()
            .filter_map(|(id, score)| {
                let note = self.graph.get_mut(&id)?;
                note.touch(now);
                Some(RecallMatch {
                    note: note.clone(),
                    score,
                })
            })
            .collect();

        debug!(
            seeds = seeds.len(),
            steps,
            results = matches.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Recall complete"
        );
        matches
    }

    /// Zero every activation that may be non-zero.
    ///
    /// Notes outside `primed` already sit at zero, so this matches a full
    /// reset.
    fn reset_activation(&mut self) {
        for id in self.primed.drain() {
            if let Some(note) = self.graph.get_mut(&id) {
                note.activation = 0.0;
            }
        }
    }

    /// Notes whose seed relevance clears the threshold, best `max_seeds` first.
    fn select_seeds(&self, features: &NoteFeatures, now: DateTime<Utc>) -> Vec<(NoteId, f32)> {
        let mut seeds: Vec<(NoteId, f32)> = self
            .graph
            .notes()
            .filter_map(|note| {
                let relevance = seed_relevance(features, note, now);
                (relevance > self.params.seed_threshold).then(|| (note.id.clone(), relevance))
            })
            .collect();
        seeds.sort_by(by_score_then_id);
        seeds.truncate(self.params.max_seeds);
        seeds
    }

    /// Run the spreading steps; returns how many ran.
    fn spread(&mut self, started: Instant) -> usize {
        let mut completed = 0;
        for step in 0..self.params.spread_steps {
            let decay = self.params.step_decay(step);
            let active: Vec<(NoteId, f32)> = self
                .primed
                .iter()
                .filter_map(|id| {
                    let activation = self.graph.get(id)?.activation;
                    (activation >= self.params.activation_threshold && activation > 0.0)
                        .then(|| (id.clone(), activation))
                })
                .collect();
            if active.is_empty() {
                break;
            }

            for (source, activation) in active {
                for (target, weight) in self.graph.get_neighbors(&source) {
                    let incoming = activation * self.params.spread_factor * weight * decay;
                    if let Some(note) = self.graph.get_mut(&target)
                        && incoming > note.activation
                    {
                        note.activation = incoming;
                        self.primed.insert(target);
                    }
                }
            }
            completed += 1;
            trace!(step, "Spread step complete");

            if let Some(budget) = self.params.time_budget
                && started.elapsed() >= budget
            {
                debug!(step, "Recall time budget exhausted");
                break;
            }
        }
        completed
    }

    /// Notes at or above `min_relevance`, best first, at most `limit`.
    fn rank(&self, min_relevance: f32, limit: usize) -> Vec<(NoteId, f32)> {
        let mut ranked: Vec<(NoteId, f32)> = if min_relevance > 0.0 {
            self.primed
                .iter()
                .filter_map(|id| {
                    let activation = self.graph.get(id)?.activation;
                    (activation >= min_relevance).then(|| (id.clone(), activation))
                })
                .collect()
        } else {
            self.graph
                .notes()
                .filter(|note| note.activation >= min_relevance)
                .map(|note| (note.id.clone(), note.activation))
                .collect()
        };
        ranked.sort_by(by_score_then_id);
        ranked.truncate(limit);
        ranked
    }
}
