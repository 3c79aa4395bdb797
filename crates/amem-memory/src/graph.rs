//! In-memory knowledge graph of memory notes.
//!
//! The graph exclusively owns note storage and edge weights. Edges live in a
//! forward map and a mirrored reverse map so traversal works in both
//! directions. Every forward edge `a -> b` is also reflected in
//! `nodes[a].linked_notes`; the graph is the only writer of that set, which
//! keeps the two from diverging.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::note::{MemoryNote, NoteId};

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// A directed, weighted edge as seen from outside the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: NoteId,
    pub to: NoteId,
    pub weight: f32,
}

/// Weighted adjacency keyed by node id.
type Adjacency = HashMap<NoteId, HashMap<NoteId, f32>>;

// ─────────────────────────────────────────────────────────────────────────────
// Knowledge Graph
// ─────────────────────────────────────────────────────────────────────────────

/// Owner of all notes and the weighted links between them.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: HashMap<NoteId, MemoryNote>,
    edges: Adjacency,
    reverse_edges: Adjacency,
}

impl KnowledgeGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a note if no note with the same id exists.
    ///
    /// Returns `true` if the note was inserted. The incoming note's
    /// `linked_notes` is cleared: links only come into existence through
    /// [`add_edge`](Self::add_edge).
    pub fn add_node(&mut self, mut note: MemoryNote) -> bool {
        if self.nodes.contains_key(&note.id) {
            trace!(id = %note.id, "add_node: already present");
            return false;
        }
        note.linked_notes.clear();
        self.nodes.insert(note.id.clone(), note);
        true
    }

    /// Add or overwrite a directed edge.
    ///
    /// A no-op returning `false` when either endpoint is missing, when
    /// `from == to`, or when the weight is not a positive number. Weights
    /// above 1.0 are clamped.
    pub fn add_edge(&mut self, from: &str, to: &str, weight: f32) -> bool {
        if from == to || !self.nodes.contains_key(from) || !self.nodes.contains_key(to) {
            return false;
        }
        if weight.is_nan() || weight <= 0.0 {
            debug!(from, to, weight, "add_edge: ignoring non-positive weight");
            return false;
        }
        let weight = weight.min(1.0);

        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), weight);
        self.reverse_edges
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string(), weight);
        if let Some(note) = self.nodes.get_mut(from) {
            note.linked_notes.insert(to.to_string());
        }
        true
    }

    /// Outbound neighbors of `id`, sorted by neighbor id.
    ///
    /// Unknown or disconnected ids yield an empty list.
    pub fn get_neighbors(&self, id: &str) -> Vec<(NoteId, f32)> {
        sorted_adjacent(self.edges.get(id))
    }

    /// Inbound neighbors of `id`, sorted by neighbor id.
    pub fn get_inbound(&self, id: &str) -> Vec<(NoteId, f32)> {
        sorted_adjacent(self.reverse_edges.get(id))
    }

    /// Weight of the edge `from -> to`, if present.
    pub fn edge_weight(&self, from: &str, to: &str) -> Option<f32> {
        self.edges.get(from).and_then(|m| m.get(to)).copied()
    }

    /// Remove a note together with every incident edge.
    ///
    /// Neighbors that linked to the removed note lose it from their
    /// `linked_notes`. Returns the removed note.
    pub fn remove_node(&mut self, id: &str) -> Option<MemoryNote> {
        let note = self.nodes.remove(id)?;

        if let Some(outbound) = self.edges.remove(id) {
            for target in outbound.keys() {
                if let Some(inbound) = self.reverse_edges.get_mut(target) {
                    inbound.remove(id);
                    if inbound.is_empty() {
                        self.reverse_edges.remove(target);
                    }
                }
            }
        }

        if let Some(inbound) = self.reverse_edges.remove(id) {
            for source in inbound.keys() {
                if let Some(outbound) = self.edges.get_mut(source) {
                    outbound.remove(id);
                    if outbound.is_empty() {
                        self.edges.remove(source);
                    }
                }
                if let Some(neighbor) = self.nodes.get_mut(source) {
                    neighbor.linked_notes.remove(id);
                }
            }
        }

        debug!(id, "Removed node and incident edges");
        Some(note)
    }

    /// Get a note by id.
    pub fn get(&self, id: &str) -> Option<&MemoryNote> {
        self.nodes.get(id)
    }

    /// Mutable access for bookkeeping fields.
    ///
    /// Crate-private: callers outside must not edit `linked_notes`.
    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut MemoryNote> {
        self.nodes.get_mut(id)
    }

    /// Check whether a note exists.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate over all notes in unspecified order.
    pub fn notes(&self) -> impl Iterator<Item = &MemoryNote> {
        self.nodes.values()
    }

    /// Number of notes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no notes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(HashMap::len).sum()
    }

    /// All directed edges, sorted by `(from, to)`.
    pub fn edges(&self) -> Vec<GraphEdge> {
        let mut edges: Vec<GraphEdge> = self
            .edges
            .iter()
            .flat_map(|(from, targets)| {
                targets.iter().map(move |(to, weight)| GraphEdge {
                    from: from.clone(),
                    to: to.clone(),
                    weight: *weight,
                })
            })
            .collect();
        edges.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));
        edges
    }

    /// Check that every note's `linked_notes` matches its forward edges and
    /// that the reverse map mirrors the forward map.
    pub fn is_consistent(&self) -> bool {
        let links_match = self.nodes.values().all(|note| {
            let forward = self.edges.get(&note.id);
            let forward_len = forward.map_or(0, HashMap::len);
            forward_len == note.linked_notes.len()
                && note
                    .linked_notes
                    .iter()
                    .all(|n| forward.is_some_and(|f| f.contains_key(n)))
        });

        let reverse_mirrors = self.edges.iter().all(|(from, targets)| {
            self.nodes.contains_key(from)
                && targets.iter().all(|(to, w)| {
                    self.nodes.contains_key(to)
                        && self
                            .reverse_edges
                            .get(to)
                            .and_then(|r| r.get(from))
                            .is_some_and(|rw| rw == w)
                })
        });

        let reverse_len: usize = self.reverse_edges.values().map(HashMap::len).sum();
        links_match && reverse_mirrors && reverse_len == self.edge_count()
    }
}

fn sorted_adjacent(map: Option<&HashMap<NoteId, f32>>) -> Vec<(NoteId, f32)> {
    let mut out: Vec<(NoteId, f32)> = map
        .map(|m| m.iter().map(|(k, w)| (k.clone(), *w)).collect())
        .unwrap_or_default();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}
