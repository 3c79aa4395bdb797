//! Self-organizing associative memory.
//!
//! Notes are stored in an in-memory knowledge graph, linked automatically to
//! notes that share keywords or tags, and retrieved by spreading activation
//! outward from the notes that best match a query. Frequently used episodic
//! notes are periodically consolidated into semantic summary notes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SharedMemory (Arc<RwLock<..>>)                                         │
//! │  ┌───────────────────────────────────────────────────────────────────┐  │
//! │  │  AgenticMemory                                                    │  │
//! │  │  - store: dedup, extract, link, evict                             │  │
//! │  │  - recall: seed, spread, rank                                     │  │
//! │  │  - consolidate: episodic -> semantic                              │  │
//! │  │  ┌─────────────────────────────────────────────────────────────┐  │  │
//! │  │  │  KnowledgeGraph: notes + forward/reverse weighted edges     │  │  │
//! │  │  └─────────────────────────────────────────────────────────────┘  │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! │  Extractor: heuristic or LLM-backed keywords, heuristic tags            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use amem_memory::{AgenticMemory, RecallOptions, StoreOptions};
//!
//! # async fn demo() -> amem_memory::Result<()> {
//! let mut memory = AgenticMemory::with_defaults();
//! memory.store("LRU eviction for caches", StoreOptions::new()).await?;
//!
//! for hit in memory.recall("cache eviction strategy", RecallOptions::new()).await? {
//!     println!("{:.3} {}", hit.score, hit.note.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extractor;
pub mod graph;
pub mod memory;
pub mod note;
pub mod shared;
pub mod stats;
pub mod validation;

pub use error::{MemoryError, Result};
pub use extractor::{
    Extractor, HeuristicExtractor, LlmExtractor, NoteFeatures, SharedExtractor, extract_features,
};
pub use graph::{GraphEdge, KnowledgeGraph};
pub use memory::{
    AgenticMemory, ConsolidationOutcome, ConsolidationReport, ConsolidationSkipped, Counters,
    MemoryParams, RecallMatch, RecallOptions, StoreOptions,
};
pub use note::{MemoryNote, NoteId, NoteType, note_id};
pub use shared::SharedMemory;
pub use stats::{GraphExport, MemoryStatistics};
pub use validation::ValidationError;
