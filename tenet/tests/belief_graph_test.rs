mod common;

use chrono::{TimeZone, Utc};
use common::{chat_response, setup_store, test_llm};
use tenet::config::Config;
use tenet::intelligence::{BeliefConsolidator, DriftDetector, RelationBuilder};
use tenet::models::{ClaimType, RawClaim, RelationKind};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Drives consolidation, relation building and drift detection over
// hand-planted claims. Orthogonal embeddings keep the two claims in
// separate beliefs, so every downstream count is exact.
#[tokio::test]
async fn test_consolidate_relate_drift_round() {
    let (store, _temp) = setup_store().await;
    let author = store.upsert_author("Jane Writer", None).await.unwrap();

    let early = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2024, 6, 20, 12, 0, 0).unwrap();
    let post_a = store
        .upsert_post(&author.id, "https://example.com/posts/1", None, Some(early))
        .await
        .unwrap();
    let post_b = store
        .upsert_post(&author.id, "https://example.com/posts/2", None, Some(late))
        .await
        .unwrap();

    store
        .insert_claim_occurrences(
            &author.id,
            &post_a.id,
            &[RawClaim {
                text: "Crypto is the future of money".to_string(),
                polarity: 1.0,
                confidence: 0.8,
            }],
            early,
        )
        .await
        .unwrap();
    store
        .insert_claim_occurrences(
            &author.id,
            &post_b.id,
            &[RawClaim {
                text: "Crypto was a speculative bubble".to_string(),
                polarity: -0.6,
                confidence: 0.7,
            }],
            late,
        )
        .await
        .unwrap();

    let rows = store.get_unclassified_claims(10).await.unwrap();
    assert_eq!(rows.len(), 2);
    let mut updates = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        store
            .set_claim_type(row.id, ClaimType::Advanced)
            .await
            .unwrap();
        let mut vector = vec![0.0f32; 4];
        vector[i] = 1.0;
        updates.push((row.id, vector));
    }
    store.set_claim_embeddings_batch(&updates).await.unwrap();

    let consolidator = BeliefConsolidator::new(
        store.clone(),
        Config::default().analysis.belief_similarity_threshold,
    );
    assert_eq!(consolidator.consolidate_author(&author.id).await.unwrap(), 2);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
            r#"{"relation": "CONTRADICTS", "confidence": 0.9}"#,
        )))
        .mount(&server)
        .await;

    let relations = RelationBuilder::new(store.clone(), test_llm(server.uri()));
    assert_eq!(relations.build_for_author(&author.id).await.unwrap(), 1);

    let stored = store.get_author_relations(&author.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].relation, RelationKind::Contradicts);

    let report = DriftDetector::new(store.clone())
        .detect_author(&author.id)
        .await
        .unwrap();
    assert_eq!(report.spans.len(), 2);
    assert_eq!(report.spans[0].claim, "Crypto is the future of money");
    assert_eq!(report.spans[0].first_seen, early);

    assert_eq!(report.drifts.len(), 1);
    assert_eq!(report.drifts[0].earlier, "Crypto is the future of money");
    assert_eq!(report.drifts[0].later, "Crypto was a speculative bubble");
    assert!((report.drifts[0].confidence - 0.9).abs() < 1e-9);
}

#[tokio::test]
async fn test_empty_author_yields_empty_graph() {
    let (store, _temp) = setup_store().await;
    let author = store.upsert_author("Quiet Author", None).await.unwrap();

    let consolidator = BeliefConsolidator::new(
        store.clone(),
        Config::default().analysis.belief_similarity_threshold,
    );
    assert_eq!(consolidator.consolidate_author(&author.id).await.unwrap(), 0);

    let report = DriftDetector::new(store.clone())
        .detect_author(&author.id)
        .await
        .unwrap();
    assert!(report.spans.is_empty());
    assert!(report.drifts.is_empty());
}
