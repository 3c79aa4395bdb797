//! The agentic memory: store, recall, consolidate.
//!
//! [`AgenticMemory`] owns a [`KnowledgeGraph`] plus the tunables and counters
//! that drive it. Operations are split by concern:
//!
//! - `store_ops`: dedup, feature derivation, linking
//! - `eviction`: capacity enforcement after a store
//! - `recall`: seed selection and spreading activation
//! - `consolidation`: episodic to semantic synthesis
//!
//! Async entry points (`store`, `recall`) only await the extractor. Every
//! graph mutation happens in a synchronous `*_with_features` method after
//! extraction has finished, so a failed extraction never leaves a partial
//! note behind.

mod consolidation;
mod eviction;
pub mod query;
mod recall;
mod store_ops;

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::Result;
use crate::extractor::{HeuristicExtractor, SharedExtractor};
use crate::graph::KnowledgeGraph;
use crate::note::{MemoryNote, NoteId};
use crate::validation::{Bounds, ValidationError, check_range};

pub use query::{
    ConsolidationOutcome, ConsolidationReport, ConsolidationSkipped, DEFAULT_IMPORTANCE,
    DEFAULT_SOURCE, RecallMatch, RecallOptions, StoreOptions,
};

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Resolved tunables for an [`AgenticMemory`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryParams {
    /// Capacity; eviction runs when a store pushes the count above it.
    pub max_notes: usize,
    /// Per-step decay of spread activation.
    pub decay_rate: f32,
    /// Share of activation passed across an edge.
    pub spread_factor: f32,
    /// Activation a node needs before it spreads.
    pub activation_threshold: f32,
    /// Similarity needed for a store-time link.
    pub link_threshold: f32,
    /// Share of notes removed per eviction.
    pub eviction_fraction: f32,
    pub consolidation_interval: Duration,
    /// Add episodic -> semantic links alongside semantic -> episodic ones.
    pub symmetric_consolidation_links: bool,
    pub default_limit: usize,
    pub default_min_relevance: f32,
    pub max_seeds: usize,
    /// Seed relevance must be strictly greater than this.
    pub seed_threshold: f32,
    pub spread_steps: usize,
    /// Wall-clock budget for spreading; checked after each step.
    pub time_budget: Option<Duration>,
}

impl Default for MemoryParams {
    fn default() -> Self {
        Self {
            max_notes: 1000,
            decay_rate: 0.1,
            spread_factor: 0.7,
            activation_threshold: 0.1,
            link_threshold: 0.3,
            eviction_fraction: 0.1,
            consolidation_interval: Duration::from_secs(3600),
            symmetric_consolidation_links: true,
            default_limit: 10,
            default_min_relevance: 0.1,
            max_seeds: 20,
            seed_threshold: 0.1,
            spread_steps: 3,
            time_budget: None,
        }
    }
}

impl MemoryParams {
    /// Check every tunable against its legal range.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        check_range("decay_rate", self.decay_rate, 0.0, 1.0, Bounds::ClosedOpen, "[0, 1)")?;
        check_range("spread_factor", self.spread_factor, 0.0, 1.0, Bounds::OpenClosed, "(0, 1]")?;
        check_range(
            "activation_threshold",
            self.activation_threshold,
            0.0,
            1.0,
            Bounds::Closed,
            "[0, 1]",
        )?;
        check_range(
            "link_threshold",
            self.link_threshold,
            0.0,
            f32::INFINITY,
            Bounds::OpenClosed,
            "(0, inf)",
        )?;
        check_range(
            "eviction_fraction",
            self.eviction_fraction,
            0.0,
            1.0,
            Bounds::OpenClosed,
            "(0, 1]",
        )?;
        if !self.default_min_relevance.is_finite() {
            return Err(ValidationError::OutOfRange {
                name: "min_relevance",
                value: self.default_min_relevance as f64,
                range: "finite",
            });
        }
        if !self.seed_threshold.is_finite() {
            return Err(ValidationError::OutOfRange {
                name: "seed_threshold",
                value: self.seed_threshold as f64,
                range: "finite",
            });
        }
        if self.max_notes == 0 {
            return Err(ValidationError::Inconsistent(
                "max_notes must be at least 1".to_string(),
            ));
        }
        if self.max_seeds == 0 {
            return Err(ValidationError::Inconsistent(
                "max_seeds must be at least 1".to_string(),
            ));
        }
        let last_step = self.spread_steps.saturating_sub(1) as f32;
        if self.decay_rate * last_step >= 1.0 {
            return Err(ValidationError::Inconsistent(format!(
                "decay_rate {} leaves no activation by spread step {}",
                self.decay_rate, last_step
            )));
        }
        Ok(())
    }

    /// Decay multiplier applied on spread step `step` (0-based).
    pub(crate) fn step_decay(&self, step: usize) -> f32 {
        1.0 - self.decay_rate * step as f32
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Counters
// ─────────────────────────────────────────────────────────────────────────────

/// Lifetime operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Every `store` call, including dedup hits.
    pub total_stores: u64,
    pub total_recalls: u64,
    /// Consolidation passes that ran (skips excluded).
    pub total_consolidations: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Agentic Memory
// ─────────────────────────────────────────────────────────────────────────────

/// Self-organizing associative memory over a [`KnowledgeGraph`].
///
/// `recall` mutates state: returned notes get their access count and
/// last-access time bumped, and transient activations are rewritten.
pub struct AgenticMemory {
    pub(crate) graph: KnowledgeGraph,
    pub(crate) params: MemoryParams,
    extractor: SharedExtractor,
    /// Notes whose activation may be non-zero.
    pub(crate) primed: HashSet<NoteId>,
    pub(crate) counters: Counters,
    pub(crate) last_consolidation: Option<Instant>,
}

impl fmt::Debug for AgenticMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgenticMemory")
            .field("notes", &self.graph.len())
            .field("edges", &self.graph.edge_count())
            .field("extractor", &self.extractor.name())
            .field("params", &self.params)
            .field("counters", &self.counters)
            .finish()
    }
}

impl AgenticMemory {
    /// Create an empty memory after validating `params`.
    pub fn new(params: MemoryParams, extractor: SharedExtractor) -> Result<Self> {
        params.validate()?;
        Ok(Self::build(params, extractor))
    }

    /// Default parameters with the heuristic extractor.
    pub fn with_defaults() -> Self {
        Self::build(
            MemoryParams::default(),
            std::sync::Arc::new(HeuristicExtractor::new()),
        )
    }

    /// Assemble an empty memory from already-validated parameters.
    fn build(params: MemoryParams, extractor: SharedExtractor) -> Self {
        debug!(
            extractor = extractor.name(),
            max_notes = params.max_notes,
            "Created agentic memory"
        );
        Self {
            graph: KnowledgeGraph::new(),
            params,
            extractor,
            primed: HashSet::new(),
            counters: Counters::default(),
            last_consolidation: None,
        }
    }

    pub fn params(&self) -> &MemoryParams {
        &self.params
    }

    /// Handle to the extractor, for running extraction outside a lock.
    pub fn extractor(&self) -> SharedExtractor {
        self.extractor.clone()
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Look up a note by id.
    pub fn get(&self, id: &str) -> Option<&MemoryNote> {
        self.graph.get(id)
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}
