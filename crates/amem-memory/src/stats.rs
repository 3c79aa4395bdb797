//! Statistics and full-graph export.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::graph::GraphEdge;
use crate::memory::AgenticMemory;
use crate::note::{MemoryNote, NoteType};

/// Aggregate numbers describing a memory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStatistics {
    pub total_notes: usize,
    /// Directed edge count.
    pub total_edges: usize,
    /// Mean outbound edges per note.
    pub avg_connections: f64,
    /// Note count per type; every type is listed.
    pub note_types: BTreeMap<String, usize>,
    pub total_stores: u64,
    pub total_recalls: u64,
    pub total_consolidations: u64,
}

/// Everything in the memory, for visualization and debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphExport {
    /// Notes ordered by id.
    pub nodes: Vec<MemoryNote>,
    /// Edges ordered by `(from, to)`.
    pub edges: Vec<GraphEdge>,
    pub statistics: MemoryStatistics,
}

impl GraphExport {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl AgenticMemory {
    /// Current statistics.
    pub fn statistics(&self) -> MemoryStatistics {
        let graph = self.graph();
        let total_notes = graph.len();
        let total_edges = graph.edge_count();

        let mut note_types: BTreeMap<String, usize> = NoteType::all()
            .iter()
            .map(|t| (t.as_str().to_string(), 0))
            .collect();
        for note in graph.notes() {
            *note_types.entry(note.note_type.as_str().to_string()).or_default() += 1;
        }

        let avg_connections = if total_notes == 0 {
            0.0
        } else {
            total_edges as f64 / total_notes as f64
        };

        let counters = self.counters();
        MemoryStatistics {
            total_notes,
            total_edges,
            avg_connections,
            note_types,
            total_stores: counters.total_stores,
            total_recalls: counters.total_recalls,
            total_consolidations: counters.total_consolidations,
        }
    }

    /// Dump every note and edge plus statistics.
    pub fn export_graph(&self) -> GraphExport {
        let mut nodes: Vec<MemoryNote> = self.graph().notes().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        GraphExport {
            nodes,
            edges: self.graph().edges(),
            statistics: self.statistics(),
        }
    }
}
