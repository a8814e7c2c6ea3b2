use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::connection::Database;
use crate::db::repository::{
    AuthorRepository, BeliefRepository, ClaimRepository, ProfileRepository, RelationRepository,
    TimelineRepository,
};
use crate::db::traits::{
    ArchiveStore, BeliefStore, ClaimStore, GraphStore, ProfileStore, RelationStore, TimelineStore,
};
use crate::error::Result;
use crate::models::{
    Author, AuthorProfile, BeliefDraft, BeliefRelation, CanonicalBelief, ClaimOccurrence,
    ClaimType, Post, PostAnalysis, RawClaim, RelationKind, Tension, TimelineEntry,
};

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn conn(&self) -> Result<libsql::Connection> {
        self.db.connect()
    }
}

#[async_trait]
impl ArchiveStore for LibSqlBackend {
    async fn upsert_author(&self, name: &str, feed_url: Option<&str>) -> Result<Author> {
        let conn = self.conn()?;
        AuthorRepository::upsert(&conn, name, feed_url).await
    }
    async fn get_author_by_id(&self, id: &str) -> Result<Option<Author>> {
        let conn = self.conn()?;
        AuthorRepository::get_by_id(&conn, id).await
    }
    async fn get_author_by_name(&self, name: &str) -> Result<Option<Author>> {
        let conn = self.conn()?;
        AuthorRepository::get_by_name(&conn, name).await
    }
    async fn list_authors(&self) -> Result<Vec<Author>> {
        let conn = self.conn()?;
        AuthorRepository::list(&conn).await
    }
    async fn upsert_post(
        &self,
        author_id: &str,
        url: &str,
        title: Option<&str>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Post> {
        let conn = self.conn()?;
        AuthorRepository::upsert_post(&conn, author_id, url, title, published_at).await
    }
    async fn get_posts_by_author(&self, author_id: &str) -> Result<Vec<Post>> {
        let conn = self.conn()?;
        AuthorRepository::get_posts_by_author(&conn, author_id).await
    }
    async fn upsert_post_analysis(&self, analysis: &PostAnalysis) -> Result<()> {
        let conn = self.conn()?;
        AuthorRepository::upsert_analysis(&conn, analysis).await
    }
    async fn get_analyzed_posts(&self, author_id: &str) -> Result<Vec<(Post, PostAnalysis)>> {
        let conn = self.conn()?;
        AuthorRepository::get_analyzed_posts(&conn, author_id).await
    }
}

#[async_trait]
impl ClaimStore for LibSqlBackend {
    async fn insert_claim_occurrences(
        &self,
        author_id: &str,
        post_id: &str,
        claims: &[RawClaim],
        occurred_at: DateTime<Utc>,
    ) -> Result<u64> {
        let conn = self.conn()?;
        ClaimRepository::insert_batch(&conn, author_id, post_id, claims, occurred_at).await
    }
    async fn count_claims_for_post(&self, post_id: &str) -> Result<u64> {
        let conn = self.conn()?;
        ClaimRepository::count_for_post(&conn, post_id).await
    }
    async fn get_unclassified_claims(&self, limit: usize) -> Result<Vec<ClaimOccurrence>> {
        let conn = self.conn()?;
        ClaimRepository::get_unclassified(&conn, limit).await
    }
    async fn set_claim_type(&self, id: i64, claim_type: ClaimType) -> Result<()> {
        let conn = self.conn()?;
        ClaimRepository::set_claim_type(&conn, id, claim_type).await
    }
    async fn get_unembedded_claims(&self) -> Result<Vec<ClaimOccurrence>> {
        let conn = self.conn()?;
        ClaimRepository::get_unembedded(&conn).await
    }
    async fn set_claim_embeddings_batch(&self, updates: &[(i64, Vec<f32>)]) -> Result<u64> {
        let conn = self.conn()?;
        ClaimRepository::update_embeddings_batch(&conn, updates).await
    }
    async fn get_clusterable_claims(&self, author_id: &str) -> Result<Vec<ClaimOccurrence>> {
        let conn = self.conn()?;
        ClaimRepository::get_clusterable(&conn, author_id).await
    }
}

#[async_trait]
impl BeliefStore for LibSqlBackend {
    async fn replace_author_beliefs(
        &self,
        author_id: &str,
        beliefs: &[BeliefDraft],
        timeline: &[TimelineEntry],
    ) -> Result<u64> {
        let conn = self.conn()?;
        BeliefRepository::replace_for_author(&conn, author_id, beliefs, timeline).await
    }
    async fn get_author_beliefs(&self, author_id: &str) -> Result<Vec<CanonicalBelief>> {
        let conn = self.conn()?;
        BeliefRepository::get_by_author(&conn, author_id).await
    }
}

#[async_trait]
impl RelationStore for LibSqlBackend {
    async fn delete_author_relations(&self, author_id: &str) -> Result<u64> {
        let conn = self.conn()?;
        RelationRepository::delete_for_author(&conn, author_id).await
    }
    async fn create_relation(
        &self,
        author_id: &str,
        belief_a: &str,
        belief_b: &str,
        relation: RelationKind,
        confidence: f64,
    ) -> Result<()> {
        let conn = self.conn()?;
        RelationRepository::create(&conn, author_id, belief_a, belief_b, relation, confidence)
            .await
    }
    async fn get_author_relations(&self, author_id: &str) -> Result<Vec<BeliefRelation>> {
        let conn = self.conn()?;
        RelationRepository::get_by_author(&conn, author_id).await
    }
    async fn get_contradictions(&self, author_id: &str) -> Result<Vec<Tension>> {
        let conn = self.conn()?;
        RelationRepository::get_contradictions(&conn, author_id).await
    }
}

#[async_trait]
impl TimelineStore for LibSqlBackend {
    async fn get_author_timeline(&self, author_id: &str) -> Result<Vec<TimelineEntry>> {
        let conn = self.conn()?;
        TimelineRepository::get_by_author(&conn, author_id).await
    }
}

#[async_trait]
impl ProfileStore for LibSqlBackend {
    async fn upsert_profile(&self, profile: &AuthorProfile) -> Result<()> {
        let conn = self.conn()?;
        ProfileRepository::upsert(&conn, profile).await
    }
    async fn get_profile(&self, author_id: &str) -> Result<Option<AuthorProfile>> {
        let conn = self.conn()?;
        ProfileRepository::get(&conn, author_id).await
    }
}

#[async_trait]
impl GraphStore for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}
