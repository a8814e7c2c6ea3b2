use std::sync::Arc;

use crate::db::GraphStore;
use crate::error::Result;
use crate::models::{PostAnalysis, RawClaim};

/// Turn one post analysis into normalized claims.
///
/// The main claim carries full polarity; supporting arguments +0.7,
/// opposing arguments -0.7. Confidence is inherited from the analysis
/// because the extractor itself adds no judgment of its own.
pub fn extract_claims(analysis: &PostAnalysis) -> Vec<RawClaim> {
    let confidence = analysis.confidence.unwrap_or(0.5);
    let mut claims = Vec::new();

    if let Some(main_claim) = analysis.main_claim.as_deref() {
        let text = main_claim.trim();
        if !text.is_empty() {
            claims.push(RawClaim {
                text: text.to_string(),
                polarity: 1.0,
                confidence,
            });
        }
    }

    for argument in &analysis.arguments_for {
        let text = argument.trim();
        if !text.is_empty() {
            claims.push(RawClaim {
                text: text.to_string(),
                polarity: 0.7,
                confidence,
            });
        }
    }

    for argument in &analysis.arguments_against {
        let text = argument.trim();
        if !text.is_empty() {
            claims.push(RawClaim {
                text: text.to_string(),
                polarity: -0.7,
                confidence,
            });
        }
    }

    claims
}

/// Walks an author's analyzed posts and materializes claim occurrences.
pub struct ClaimExtractor {
    store: Arc<dyn GraphStore>,
}

impl ClaimExtractor {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Insert claims for every analyzed post that has none yet. Posts that
    /// already contributed occurrences are skipped, so re-running after new
    /// posts arrive picks up only the new ones.
    pub async fn backfill_author(&self, author_id: &str) -> Result<u64> {
        let posts = self.store.get_analyzed_posts(author_id).await?;
        let mut inserted = 0u64;

        for (post, analysis) in posts {
            if self.store.count_claims_for_post(&post.id).await? > 0 {
                continue;
            }

            let claims = extract_claims(&analysis);
            if claims.is_empty() {
                continue;
            }

            // Undated posts use the ingestion timestamp; it is stable
            // across re-runs where "now" would not be.
            let occurred_at = post.published_at.unwrap_or(post.created_at);
            inserted += self
                .store
                .insert_claim_occurrences(&post.author_id, &post.id, &claims, occurred_at)
                .await?;
        }

        tracing::info!(author_id = %author_id, inserted, "Claim backfill complete");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::{Database, LibSqlBackend};
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn analysis_with(
        main_claim: Option<&str>,
        arguments_for: &[&str],
        arguments_against: &[&str],
        confidence: Option<f64>,
    ) -> PostAnalysis {
        let mut analysis = PostAnalysis::new("post-1".to_string());
        analysis.main_claim = main_claim.map(|s| s.to_string());
        analysis.arguments_for = arguments_for.iter().map(|s| s.to_string()).collect();
        analysis.arguments_against = arguments_against.iter().map(|s| s.to_string()).collect();
        analysis.confidence = confidence;
        analysis
    }

    #[test]
    fn extract_claims_produces_polarity_triples() {
        let analysis = analysis_with(Some("X"), &["A"], &["B"], Some(0.8));

        let claims = extract_claims(&analysis);

        assert_eq!(
            claims,
            vec![
                RawClaim {
                    text: "X".to_string(),
                    polarity: 1.0,
                    confidence: 0.8
                },
                RawClaim {
                    text: "A".to_string(),
                    polarity: 0.7,
                    confidence: 0.8
                },
                RawClaim {
                    text: "B".to_string(),
                    polarity: -0.7,
                    confidence: 0.8
                },
            ]
        );
    }

    #[test]
    fn extract_claims_skips_blank_text() {
        let analysis = analysis_with(Some("   "), &["", "  ", "Real argument"], &[], None);

        let claims = extract_claims(&analysis);

        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].text, "Real argument");
        // No analysis confidence reported: claims carry the 0.5 default.
        assert_eq!(claims[0].confidence, 0.5);
    }

    #[test]
    fn extract_claims_is_pure() {
        let analysis = analysis_with(Some("X"), &["A"], &["B"], Some(0.8));

        let first = extract_claims(&analysis);
        let second = extract_claims(&analysis);

        assert_eq!(first, second);
    }

    async fn setup_test_backend() -> (Arc<dyn GraphStore>, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let config = DatabaseConfig {
            url: temp_file.path().to_str().unwrap().to_string(),
            ..Default::default()
        };
        let db = Database::new(&config).await.unwrap();
        let backend: Arc<dyn GraphStore> = Arc::new(LibSqlBackend::new(db));
        (backend, temp_file)
    }

    #[tokio::test]
    async fn test_backfill_author_is_idempotent() {
        let (store, _temp) = setup_test_backend().await;
        let author = store.upsert_author("Jane Writer", None).await.unwrap();
        let post = store
            .upsert_post(&author.id, "https://example.com/p/1", None, None)
            .await
            .unwrap();

        let analysis = {
            let mut a = PostAnalysis::new(post.id.clone());
            a.main_claim = Some("Forecasting beats punditry".to_string());
            a.arguments_for = vec!["Track records are measurable".to_string()];
            a.confidence = Some(0.8);
            a
        };
        store.upsert_post_analysis(&analysis).await.unwrap();

        let extractor = ClaimExtractor::new(store.clone());

        let first = extractor.backfill_author(&author.id).await.unwrap();
        let second = extractor.backfill_author(&author.id).await.unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 0, "second run must not duplicate claims");
        assert_eq!(store.count_claims_for_post(&post.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_backfill_picks_up_new_posts_only() {
        let (store, _temp) = setup_test_backend().await;
        let author = store.upsert_author("Jane Writer", None).await.unwrap();

        let first_post = store
            .upsert_post(&author.id, "https://example.com/p/1", None, None)
            .await
            .unwrap();
        let mut analysis = PostAnalysis::new(first_post.id.clone());
        analysis.main_claim = Some("Claim one".to_string());
        store.upsert_post_analysis(&analysis).await.unwrap();

        let extractor = ClaimExtractor::new(store.clone());
        assert_eq!(extractor.backfill_author(&author.id).await.unwrap(), 1);

        let second_post = store
            .upsert_post(&author.id, "https://example.com/p/2", None, None)
            .await
            .unwrap();
        let mut analysis = PostAnalysis::new(second_post.id.clone());
        analysis.main_claim = Some("Claim two".to_string());
        store.upsert_post_analysis(&analysis).await.unwrap();

        assert_eq!(extractor.backfill_author(&author.id).await.unwrap(), 1);
        assert_eq!(
            store.count_claims_for_post(&first_post.id).await.unwrap(),
            1
        );
        assert_eq!(
            store.count_claims_for_post(&second_post.id).await.unwrap(),
            1
        );
    }
}
