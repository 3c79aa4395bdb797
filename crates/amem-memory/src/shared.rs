//! Cloneable, task-safe handle to one [`AgenticMemory`].
//!
//! Every mutating operation (store, recall, consolidate) takes the write
//! lock, so they never interleave. Keyword/tag extraction is the only
//! suspension point and runs before the lock is taken. Statistics, export and
//! lookups share the read lock.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::trace;

use crate::error::Result;
use crate::extractor::{NoteFeatures, SharedExtractor, extract_features};
use crate::memory::{
    AgenticMemory, ConsolidationOutcome, ConsolidationReport, RecallMatch, RecallOptions,
    StoreOptions,
};
use crate::note::{MemoryNote, note_id};
use crate::stats::{GraphExport, MemoryStatistics};
use crate::validation::{normalize_importance, validate_content, validate_query};

/// Shared handle to an [`AgenticMemory`].
#[derive(Clone)]
pub struct SharedMemory {
    inner: Arc<RwLock<AgenticMemory>>,
    extractor: SharedExtractor,
}

impl SharedMemory {
    /// Wrap a memory for shared use.
    pub fn new(memory: AgenticMemory) -> Self {
        let extractor = memory.extractor();
        Self {
            inner: Arc::new(RwLock::new(memory)),
            extractor,
        }
    }

    /// Store an observation. See [`AgenticMemory::store`].
    pub async fn store(&self, content: &str, options: StoreOptions) -> Result<MemoryNote> {
        validate_content(content)?;
        normalize_importance(options.importance)?;

        let id = note_id(content, &options.context);
        let known = self.inner.read().await.graph().contains(&id);
        if known {
            let mut memory = self.inner.write().await;
            if memory.graph().contains(&id) {
                return memory.store_with_features(content, options, NoteFeatures::default());
            }
            trace!(id = %id, "Note evicted before dedup; extracting");
        }

        let features = self.features(content, &options.context).await?;
        self.inner
            .write()
            .await
            .store_with_features(content, options, features)
    }

    /// Recall notes for `query`. See [`AgenticMemory::recall`].
    pub async fn recall(&self, query: &str, options: RecallOptions) -> Result<Vec<RecallMatch>> {
        validate_query(query)?;
        let context = options.context.as_deref().unwrap_or("");
        let features = self.features(query, context).await?;
        Ok(self
            .inner
            .write()
            .await
            .recall_with_features(&features, &options))
    }

    /// Rate-limited consolidation.
    pub async fn consolidate(&self) -> ConsolidationOutcome {
        self.inner.write().await.consolidate()
    }

    /// Consolidation ignoring the rate limit.
    pub async fn consolidate_now(&self) -> ConsolidationReport {
        self.inner.write().await.consolidate_now()
    }

    pub async fn statistics(&self) -> MemoryStatistics {
        self.inner.read().await.statistics()
    }

    pub async fn export_graph(&self) -> GraphExport {
        self.inner.read().await.export_graph()
    }

    /// Snapshot of one note.
    pub async fn get(&self, id: &str) -> Option<MemoryNote> {
        self.inner.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    async fn features(&self, text: &str, context: &str) -> Result<NoteFeatures> {
        extract_features(self.extractor.as_ref(), text, context).await
    }
}
