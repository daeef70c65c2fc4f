//! Retrieval bounds, reranking, and the degraded (no credential) path.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{DIMS, ReversingReranker, StaticEmbedder};
use ragchat::{
    Chunk, InMemoryVectorStore, RetrievalSettings, Retriever, VectorStoreGateway,
};

fn chunk(id: &str, text: &str) -> Chunk {
    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), format!("{id}.md"));
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        embedding: Vec::new(),
        metadata,
        document_id: id.to_string(),
    }
}

/// Gateway seeded with six chunks at distinct points on the unit axes.
async fn seeded_gateway() -> Arc<VectorStoreGateway> {
    common::init_tracing();
    let mut embedder = StaticEmbedder::new(DIMS).with_vector("query", vec![1.0, 0.1, 0.0, 0.0]);
    let mut chunks = Vec::new();
    for i in 0..6 {
        let text = format!("text {i}");
        let mut v = vec![0.0; DIMS];
        v[i % DIMS] = 1.0;
        v[(i + 2) % DIMS] = 0.2 + i as f32 * 0.05;
        embedder = embedder.with_vector(&text, v);
        chunks.push(chunk(&format!("c{i}"), &text));
    }

    let gateway = Arc::new(
        VectorStoreGateway::new(
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(embedder),
            "vectorstore",
            DIMS,
        )
        .unwrap(),
    );
    gateway.add(chunks).await.unwrap();
    gateway
}

fn settings(use_reranking: bool, top_n: usize, initial_k: usize) -> RetrievalSettings {
    RetrievalSettings { use_reranking, top_n, initial_k }
}

#[tokio::test]
async fn plain_retrieval_is_bounded_by_top_n() {
    let retriever = Retriever::new(seeded_gateway().await);
    let retrieval =
        retriever.retrieve("query", None, &settings(false, 2, 20)).await.unwrap();
    assert!(retrieval.results.len() <= 2);
    assert!(retrieval.warning.is_none());
}

#[tokio::test]
async fn reranked_retrieval_draws_from_initial_candidates() {
    let gateway = seeded_gateway().await;
    let plain = Retriever::new(gateway.clone())
        .retrieve("query", None, &settings(false, 4, 4))
        .await
        .unwrap();
    let candidate_ids: Vec<String> =
        plain.results.iter().map(|r| r.chunk.id.clone()).collect();

    let reranked = Retriever::new(gateway)
        .retrieve("query", Some(&ReversingReranker), &settings(true, 2, 4))
        .await
        .unwrap();

    assert!(reranked.results.len() <= 2);
    assert!(reranked.warning.is_none());
    for result in &reranked.results {
        assert!(candidate_ids.contains(&result.chunk.id));
    }
}

#[tokio::test]
async fn missing_reranker_degrades_to_plain_path() {
    let gateway = seeded_gateway().await;

    let plain = Retriever::new(gateway.clone())
        .retrieve("query", None, &settings(false, 3, 20))
        .await
        .unwrap();
    let degraded = Retriever::new(gateway)
        .retrieve("query", None, &settings(true, 3, 20))
        .await
        .unwrap();

    assert!(degraded.warning.is_some());
    let plain_ids: Vec<&str> = plain.results.iter().map(|r| r.chunk.id.as_str()).collect();
    let degraded_ids: Vec<&str> =
        degraded.results.iter().map(|r| r.chunk.id.as_str()).collect();
    assert_eq!(plain_ids, degraded_ids);
}

#[tokio::test]
async fn initial_k_is_raised_to_top_n() {
    let retriever = Retriever::new(seeded_gateway().await);
    // initial_k below top_n must not shrink the candidate pool below top_n.
    let retrieval = retriever
        .retrieve("query", Some(&ReversingReranker), &settings(true, 4, 1))
        .await
        .unwrap();
    assert!(retrieval.results.len() <= 4);
    assert!(retrieval.results.len() >= 2);
}
