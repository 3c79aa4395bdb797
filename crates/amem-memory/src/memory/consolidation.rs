//! Episodic to semantic consolidation.
//!
//! Episodic notes recalled or re-stored at least twice are grouped by tag.
//! Each tag group with enough members yields one semantic note summarizing up
//! to five of them, linked to every member of the group. The semantic note is
//! content-addressed, so an unchanged group always maps to the same note.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::AgenticMemory;
use super::query::{ConsolidationOutcome, ConsolidationReport, ConsolidationSkipped};
use crate::note::{MemoryNote, NoteId, NoteType};

/// Access count an episodic note needs to take part.
const MIN_ACCESS_COUNT: u32 = 2;
/// Members a tag group needs before it is consolidated.
const MIN_GROUP_SIZE: usize = 3;
/// Members summarized into the semantic note's content.
const MAX_SUMMARIZED: usize = 5;
/// Characters kept from each summarized member.
const SNIPPET_CHARS: usize = 100;
/// Keyword cap for semantic notes.
const MAX_SEMANTIC_KEYWORDS: usize = 15;
/// Weight of consolidation links.
const CONSOLIDATION_LINK_WEIGHT: f32 = 0.8;
/// Source recorded on synthesized notes.
const CONSOLIDATION_SOURCE: &str = "consolidation";
/// Extra tag carried by synthesized notes.
const CONSOLIDATED_TAG: &str = "consolidated";

/// A semantic note to synthesize and the members it links to.
struct Synthesis {
    note: MemoryNote,
    members: Vec<NoteId>,
}

/// Build the semantic note for one tag group.
fn synthesize(tag: &str, mut members: Vec<&MemoryNote>) -> Synthesis {
    members.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let summarized = &members[..members.len().min(MAX_SUMMARIZED)];
    let snippets: Vec<String> = summarized
        .iter()
        .map(|note| note.content.chars().take(SNIPPET_CHARS).collect())
        .collect();
    let content = format!("[{}] {}", tag, snippets.join(" | "));
    let context = format!("semantic:{}", tag);

    let mut keywords: Vec<String> = Vec::new();
    for keyword in members.iter().flat_map(|note| note.keywords.iter()) {
        if keywords.len() == MAX_SEMANTIC_KEYWORDS {
            break;
        }
        if !keywords.contains(keyword) {
            keywords.push(keyword.clone());
        }
    }

    let importance = members
        .iter()
        .map(|note| note.importance)
        .fold(0.0_f32, f32::max);

    let note = MemoryNote::new(
        content,
        context,
        CONSOLIDATION_SOURCE,
        NoteType::Semantic,
        importance,
    )
    .with_keywords(keywords)
    .with_tags(vec![tag.to_string(), CONSOLIDATED_TAG.to_string()]);

    Synthesis {
        note,
        members: members.iter().map(|note| note.id.clone()).collect(),
    }
}

impl AgenticMemory {
    /// Consolidate unless the last pass was less than the configured interval ago.
    pub fn consolidate(&mut self) -> ConsolidationOutcome {
        if let Some(last) = self.last_consolidation {
            let elapsed = last.elapsed();
            let interval = self.params.consolidation_interval;
            if elapsed < interval {
                let retry_after_secs = (interval - elapsed).as_secs();
                warn!(retry_after_secs, "Consolidation skipped: too soon");
                return ConsolidationOutcome::Skipped(ConsolidationSkipped {
                    skipped: true,
                    reason: format!(
                        "consolidation ran {}s ago; interval is {}s",
                        elapsed.as_secs(),
                        interval.as_secs()
                    ),
                    retry_after_secs,
                });
            }
        }
        ConsolidationOutcome::Completed(self.consolidate_now())
    }

    /// Consolidate immediately, ignoring the rate limit.
    pub fn consolidate_now(&mut self) -> ConsolidationReport {
        let eligible: Vec<&MemoryNote> = self
            .graph
            .notes()
            .filter(|note| {
                note.note_type == NoteType::Episodic && note.access_count >= MIN_ACCESS_COUNT
            })
            .collect();
        let episodic_processed = eligible.len();

        let mut groups: BTreeMap<&str, Vec<&MemoryNote>> = BTreeMap::new();
        for &note in &eligible {
            for tag in &note.tags {
                groups.entry(tag.as_str()).or_default().push(note);
            }
        }

        let syntheses: Vec<Synthesis> = groups
            .into_iter()
            .filter(|(_, members)| members.len() >= MIN_GROUP_SIZE)
            .map(|(tag, members)| synthesize(tag, members))
            .collect();

        let mut consolidated = 0;
        let mut semantic_ids = Vec::with_capacity(syntheses.len());
        for Synthesis { note, members } in syntheses {
            let id = note.id.clone();
            let importance = note.importance;
            if self.graph.add_node(note) {
                consolidated += 1;
                if importance > 0.0 {
                    self.primed.insert(id.clone());
                }
                debug!(id = %id, members = members.len(), "Created semantic note");
            }
            for member in &members {
                self.graph.add_edge(&id, member, CONSOLIDATION_LINK_WEIGHT);
                if self.params.symmetric_consolidation_links {
                    self.graph.add_edge(member, &id, CONSOLIDATION_LINK_WEIGHT);
                }
            }
            semantic_ids.push(id);
        }

        self.last_consolidation = Some(Instant::now());
        self.counters.total_consolidations += 1;

        let report = ConsolidationReport {
            consolidated,
            episodic_processed,
            total_notes: self.graph.len(),
            semantic_ids,
        };
        info!(
            consolidated = report.consolidated,
            episodic_processed = report.episodic_processed,
            total_notes = report.total_notes,
            "Consolidation complete"
        );
        report
    }
}
