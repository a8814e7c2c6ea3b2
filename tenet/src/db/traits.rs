use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Author, AuthorProfile, BeliefDraft, BeliefRelation, CanonicalBelief, ClaimOccurrence,
    ClaimType, Post, PostAnalysis, RawClaim, RelationKind, Tension, TimelineEntry,
};

// ---------------------------------------------------------------------------
// Individual store traits
// ---------------------------------------------------------------------------

/// Authors, posts, and the per-post analyses the article analyzer hands us.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Insert an author if the name is new, otherwise return the existing row.
    async fn upsert_author(&self, name: &str, feed_url: Option<&str>) -> Result<Author>;
    async fn get_author_by_id(&self, id: &str) -> Result<Option<Author>>;
    async fn get_author_by_name(&self, name: &str) -> Result<Option<Author>>;
    async fn list_authors(&self) -> Result<Vec<Author>>;

    /// Insert or refresh a post keyed by URL.
    async fn upsert_post(
        &self,
        author_id: &str,
        url: &str,
        title: Option<&str>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Post>;
    async fn get_posts_by_author(&self, author_id: &str) -> Result<Vec<Post>>;

    async fn upsert_post_analysis(&self, analysis: &PostAnalysis) -> Result<()>;
    /// Posts that have an analysis attached, oldest first.
    async fn get_analyzed_posts(&self, author_id: &str) -> Result<Vec<(Post, PostAnalysis)>>;
}

/// Claim occurrences and their per-row classification and embedding state.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Bulk-insert the claims extracted from one post.
    async fn insert_claim_occurrences(
        &self,
        author_id: &str,
        post_id: &str,
        claims: &[RawClaim],
        occurred_at: DateTime<Utc>,
    ) -> Result<u64>;
    async fn count_claims_for_post(&self, post_id: &str) -> Result<u64>;

    /// Rows with no classification yet, in insertion order.
    async fn get_unclassified_claims(&self, limit: usize) -> Result<Vec<ClaimOccurrence>>;
    async fn set_claim_type(&self, id: i64, claim_type: ClaimType) -> Result<()>;

    /// Rows with no embedding yet, in insertion order.
    async fn get_unembedded_claims(&self) -> Result<Vec<ClaimOccurrence>>;
    async fn set_claim_embeddings_batch(&self, updates: &[(i64, Vec<f32>)]) -> Result<u64>;

    /// ADVANCED rows with embeddings for one author, in insertion order.
    /// This ordering is what makes clustering reproducible.
    async fn get_clusterable_claims(&self, author_id: &str) -> Result<Vec<ClaimOccurrence>>;
}

/// Canonical beliefs, rebuilt wholesale per author.
#[async_trait]
pub trait BeliefStore: Send + Sync {
    /// Atomically replace the author's belief set and append the timeline
    /// rows produced by the same clustering pass. Either everything lands
    /// or the previous belief set survives untouched.
    async fn replace_author_beliefs(
        &self,
        author_id: &str,
        beliefs: &[BeliefDraft],
        timeline: &[TimelineEntry],
    ) -> Result<u64>;

    /// Beliefs ordered by support count descending, then insertion order.
    async fn get_author_beliefs(&self, author_id: &str) -> Result<Vec<CanonicalBelief>>;
}

/// Pairwise relations between canonical beliefs, keyed by belief text.
#[async_trait]
pub trait RelationStore: Send + Sync {
    async fn delete_author_relations(&self, author_id: &str) -> Result<u64>;
    async fn create_relation(
        &self,
        author_id: &str,
        belief_a: &str,
        belief_b: &str,
        relation: RelationKind,
        confidence: f64,
    ) -> Result<()>;
    async fn get_author_relations(&self, author_id: &str) -> Result<Vec<BeliefRelation>>;

    /// CONTRADICTS relations, highest confidence first.
    async fn get_contradictions(&self, author_id: &str) -> Result<Vec<Tension>>;
}

/// Append-only occurrence timeline for canonical claims.
#[async_trait]
pub trait TimelineStore: Send + Sync {
    /// All timeline rows for one author, oldest first.
    async fn get_author_timeline(&self, author_id: &str) -> Result<Vec<TimelineEntry>>;
}

/// Cached author profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn upsert_profile(&self, profile: &AuthorProfile) -> Result<()>;
    async fn get_profile(&self, author_id: &str) -> Result<Option<AuthorProfile>>;
}

// ---------------------------------------------------------------------------
// Unified backend supertrait
// ---------------------------------------------------------------------------

/// A complete belief-graph store combining all store traits plus lifecycle
/// operations (sync for replicated deployments).
#[async_trait]
pub trait GraphStore:
    ArchiveStore + ClaimStore + BeliefStore + RelationStore + TimelineStore + ProfileStore
{
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;
}
