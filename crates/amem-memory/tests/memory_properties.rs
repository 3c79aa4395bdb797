//! Behavioral properties of the agentic memory.
//!
//! These tests drive `AgenticMemory` through its public API only, using the
//! heuristic extractor unless a test needs something else.

use std::sync::Arc;

use amem_llm::{MockBackend, MockResponse};
use amem_memory::{
    AgenticMemory, Extractor, LlmExtractor, MemoryError, MemoryParams, RecallOptions,
    StoreOptions,
};
use async_trait::async_trait;

const SCENARIO: [&str; 3] = [
    "caching improves read latency",
    "LRU eviction for caches",
    "cache invalidation is hard",
];
const UNRELATED: &str = "morning greeting logic";

fn memory() -> AgenticMemory {
    AgenticMemory::with_defaults()
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_idempotent_store() -> amem_memory::Result<()> {
    let mut mem = memory();
    for content in SCENARIO {
        mem.store(content, StoreOptions::new()).await?;
    }
    let edges_before = mem.graph().edge_count();

    let first = mem
        .store("cache invalidation is hard", StoreOptions::new())
        .await?;
    let second = mem
        .store("cache invalidation is hard", StoreOptions::new())
        .await?;

    assert_eq!(first.id, second.id);
    assert_eq!(mem.len(), 3);
    assert_eq!(mem.graph().edge_count(), edges_before);
    assert_eq!(second.access_count, first.access_count + 1);
    Ok(())
}

#[tokio::test]
async fn test_context_is_part_of_identity() -> amem_memory::Result<()> {
    let mut mem = memory();
    let a = mem
        .store("same words", StoreOptions::new().with_context("one"))
        .await?;
    let b = mem
        .store("same words", StoreOptions::new().with_context("two"))
        .await?;
    assert_ne!(a.id, b.id);
    assert_eq!(mem.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_dedup_importance_is_max() -> amem_memory::Result<()> {
    let pairs = [(0.2, 0.9), (0.9, 0.2), (0.5, 0.5), (0.0, 1.0), (1.0, 0.0)];
    for (i1, i2) in pairs {
        let mut mem = memory();
        mem.store("importance check", StoreOptions::new().with_importance(i1))
            .await?;
        let note = mem
            .store("importance check", StoreOptions::new().with_importance(i2))
            .await?;
        assert_eq!(note.importance, f32::max(i1, i2), "pair ({i1}, {i2})");
    }
    Ok(())
}

#[tokio::test]
async fn test_store_rejects_bad_input() {
    let mut mem = memory();
    let empty = mem.store("  ", StoreOptions::new()).await;
    assert!(matches!(empty, Err(MemoryError::InvalidInput(_))));

    let nan = mem
        .store("fine", StoreOptions::new().with_importance(f32::NAN))
        .await;
    assert!(matches!(nan, Err(MemoryError::InvalidInput(_))));

    let clamped = mem
        .store("loud", StoreOptions::new().with_importance(4.0))
        .await
        .unwrap();
    assert_eq!(clamped.importance, 1.0);
    assert_eq!(mem.len(), 1);
}

/// Extractor that always fails.
struct BrokenExtractor;

#[async_trait]
impl Extractor for BrokenExtractor {
    async fn extract_keywords(&self, _text: &str) -> amem_memory::Result<Vec<String>> {
        Err(MemoryError::Extraction("model unavailable".to_string()))
    }

    async fn infer_tags(&self, _content: &str, _context: &str) -> amem_memory::Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "broken"
    }
}

#[tokio::test]
async fn test_failed_extraction_leaves_graph_untouched() {
    let mut mem = AgenticMemory::new(MemoryParams::default(), Arc::new(BrokenExtractor)).unwrap();

    let result = mem.store("anything at all", StoreOptions::new()).await;
    assert!(matches!(result, Err(MemoryError::Extraction(_))));
    assert!(mem.is_empty());
    assert_eq!(mem.statistics().total_stores, 0);
}

#[tokio::test]
async fn test_llm_extractor_drives_linking() -> amem_memory::Result<()> {
    let backend = Arc::new(MockBackend::new(vec![
        MockResponse::Text("graph\nactivation".to_string()),
        MockResponse::Text("activation\nspreading".to_string()),
        MockResponse::Error("backend down".to_string()),
    ]));
    let extractor = Arc::new(LlmExtractor::new(backend.clone(), "mock-model"));
    let mut mem = AgenticMemory::new(MemoryParams::default(), extractor)?;

    let a = mem.store("first note", StoreOptions::new()).await?;
    let b = mem.store("second note", StoreOptions::new()).await?;
    assert_eq!(a.keywords, vec!["graph", "activation"]);
    assert!(mem.get(&a.id).unwrap().is_linked_to(&b.id));

    // Backend failure falls back to the heuristic.
    let c = mem.store("heuristic fallback works", StoreOptions::new()).await?;
    assert_eq!(c.keywords, vec!["heuristic", "fallback", "works"]);
    assert_eq!(backend.request_count(), 3);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Recall
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_example_scenario_ranking() -> amem_memory::Result<()> {
    let mut mem = memory();
    let mut related = Vec::new();
    for content in SCENARIO {
        let note = mem.store(content, StoreOptions::new()).await?;
        assert_eq!(note.tags, vec!["optimization"], "{content}");
        related.push(note.id);
    }
    let unrelated = mem.store(UNRELATED, StoreOptions::new()).await?;

    let hits = mem
        .recall("cache eviction strategy", RecallOptions::new())
        .await?;
    let ids: Vec<&str> = hits.iter().map(|h| h.note.id.as_str()).collect();
    for id in &related {
        assert!(ids.contains(&id.as_str()));
    }

    let lowest_related = hits
        .iter()
        .filter(|h| related.contains(&h.note.id))
        .map(|h| h.score)
        .fold(f32::INFINITY, f32::min);
    if let Some(other) = hits.iter().find(|h| h.note.id == unrelated.id) {
        assert!(other.score < lowest_related);
    }
    // The note that shares a keyword with the query ranks first.
    assert_ne!(hits[0].note.content, "caching improves read latency");
    Ok(())
}

#[tokio::test]
async fn test_recall_is_deterministic() -> amem_memory::Result<()> {
    let mut mem = memory();
    for content in SCENARIO {
        mem.store(content, StoreOptions::new()).await?;
    }
    mem.store(UNRELATED, StoreOptions::new()).await?;
    mem.store("cache design pattern for the module system", StoreOptions::new())
        .await?;

    let first = mem.recall("cache eviction", RecallOptions::new()).await?;
    let second = mem.recall("cache eviction", RecallOptions::new()).await?;

    let summarize = |hits: &[amem_memory::RecallMatch]| {
        hits.iter()
            .map(|h| (h.note.id.clone(), h.score))
            .collect::<Vec<_>>()
    };
    assert_eq!(summarize(&first), summarize(&second));
    assert!(!first.is_empty());

    // The only state that moved is access bookkeeping.
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(b.note.access_count, a.note.access_count + 1);
    }
    Ok(())
}

#[tokio::test]
async fn test_activation_is_bounded() -> amem_memory::Result<()> {
    let mut mem = memory();
    for content in SCENARIO {
        mem.store(content, StoreOptions::new().with_importance(1.0))
            .await?;
    }
    mem.store(
        "cache cache cache eviction latency caching caches",
        StoreOptions::new().with_importance(1.0),
    )
    .await?;

    for query in ["cache eviction strategy", "latency", "cache"] {
        mem.recall(query, RecallOptions::new().with_min_relevance(0.0))
            .await?;
        for note in mem.export_graph().nodes {
            assert!(note.activation <= 1.0, "{} = {}", note.id, note.activation);
            assert!(note.activation >= 0.0);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_recall_limit_and_threshold() -> amem_memory::Result<()> {
    let mut mem = memory();
    for content in SCENARIO {
        mem.store(content, StoreOptions::new()).await?;
    }

    let limited = mem
        .recall("cache eviction strategy", RecallOptions::new().with_limit(1))
        .await?;
    assert_eq!(limited.len(), 1);

    let strict = mem
        .recall(
            "cache eviction strategy",
            RecallOptions::new().with_min_relevance(0.99),
        )
        .await?;
    assert!(strict.is_empty());

    let nothing = mem.recall("zebra", RecallOptions::new()).await?;
    assert!(nothing.is_empty());
    assert_eq!(mem.statistics().total_recalls, 3);
    Ok(())
}

#[tokio::test]
async fn test_recall_context_supplies_seed_tag() -> amem_memory::Result<()> {
    let mut mem = memory();
    let secured = mem
        .store(
            "rotate signing keys weekly",
            StoreOptions::new().with_context("security review"),
        )
        .await?;
    assert_eq!(secured.tags, vec!["security"]);
    mem.store(UNRELATED, StoreOptions::new()).await?;

    // The query shares no keyword or tag with any note on its own.
    let bare = mem
        .recall("quarterly checklist", RecallOptions::new())
        .await?;
    assert!(bare.is_empty());

    let hits = mem
        .recall(
            "quarterly checklist",
            RecallOptions::new().with_context("security"),
        )
        .await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].note.id, secured.id);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Eviction
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_eviction_respects_capacity() -> amem_memory::Result<()> {
    let params = MemoryParams {
        max_notes: 10,
        ..Default::default()
    };
    let mut mem = AgenticMemory::new(params, Arc::new(amem_memory::HeuristicExtractor))?;

    for i in 0..40 {
        let content = format!("observation number {i} about caching layers");
        let stored = mem.store(&content, StoreOptions::new()).await?;
        assert!(mem.len() <= 10);
        assert!(mem.get(&stored.id).is_some(), "just-stored note was evicted");

        assert!(mem.graph().is_consistent());
        for note in mem.graph().notes() {
            for linked in &note.linked_notes {
                assert!(mem.get(linked).is_some(), "dangling link {linked}");
            }
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Consolidation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_consolidation_is_idempotent() -> amem_memory::Result<()> {
    let mut mem = memory();
    // Three stores each: access_count reaches 2.
    for _ in 0..3 {
        for content in SCENARIO {
            mem.store(content, StoreOptions::new()).await?;
        }
    }
    mem.store(UNRELATED, StoreOptions::new()).await?;

    let first = mem.consolidate_now();
    assert_eq!(first.consolidated, 1);
    assert_eq!(first.episodic_processed, 3);
    assert_eq!(first.total_notes, 5);

    let second = mem.consolidate_now();
    assert_eq!(second.consolidated, 0);
    assert_eq!(second.semantic_ids, first.semantic_ids);
    assert_eq!(second.total_notes, 5);

    let semantic = mem.get(&first.semantic_ids[0]).unwrap();
    assert_eq!(semantic.context, "semantic:optimization");
    assert!(semantic.content.starts_with("[optimization] "));
    assert_eq!(mem.statistics().note_types["semantic"], 1);
    assert_eq!(mem.statistics().total_consolidations, 2);
    Ok(())
}

#[tokio::test]
async fn test_consolidated_note_is_recallable() -> amem_memory::Result<()> {
    let mut mem = memory();
    for _ in 0..3 {
        for content in SCENARIO {
            mem.store(content, StoreOptions::new()).await?;
        }
    }
    let report = mem.consolidate_now();
    let semantic_id = report.semantic_ids[0].clone();

    let hits = mem
        .recall("cache eviction strategy", RecallOptions::new())
        .await?;
    assert!(hits.iter().any(|h| h.note.id == semantic_id));
    Ok(())
}
