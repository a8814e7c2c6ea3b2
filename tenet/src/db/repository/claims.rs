use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::{Result, TenetError};
use crate::models::{ClaimOccurrence, ClaimType, RawClaim};

use super::authors::parse_timestamp;

const CLAIM_COLUMNS: &str =
    "id, author_id, post_id, text, polarity, confidence, occurred_at, claim_type, embedding";

pub struct ClaimRepository;

impl ClaimRepository {
    /// Bulk-insert the claims extracted from one post. Rows get sequential
    /// ids, so insertion order is the pipeline's processing order.
    pub async fn insert_batch(
        conn: &Connection,
        author_id: &str,
        post_id: &str,
        claims: &[RawClaim],
        occurred_at: DateTime<Utc>,
    ) -> Result<u64> {
        let mut inserted = 0u64;
        for claim in claims {
            conn.execute(
                r#"
                INSERT INTO claim_occurrences (
                    author_id, post_id, text, polarity, confidence, occurred_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    author_id,
                    post_id,
                    claim.text.clone(),
                    claim.polarity,
                    claim.confidence,
                    occurred_at.to_rfc3339(),
                ],
            )
            .await?;
            inserted += 1;
        }

        Ok(inserted)
    }

    pub async fn count_for_post(conn: &Connection, post_id: &str) -> Result<u64> {
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM claim_occurrences WHERE post_id = ?1",
                params![post_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)? as u64),
            None => Ok(0),
        }
    }

    pub async fn get_unclassified(conn: &Connection, limit: usize) -> Result<Vec<ClaimOccurrence>> {
        let mut rows = conn
            .query(
                &format!(
                    r#"
                    SELECT {CLAIM_COLUMNS}
                    FROM claim_occurrences
                    WHERE claim_type IS NULL
                    ORDER BY id ASC
                    LIMIT ?1
                    "#
                ),
                params![limit as i64],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_claim(&row)?);
        }

        Ok(results)
    }

    pub async fn set_claim_type(
        conn: &Connection,
        id: i64,
        claim_type: ClaimType,
    ) -> Result<()> {
        conn.execute(
            "UPDATE claim_occurrences SET claim_type = ?1 WHERE id = ?2",
            params![claim_type.to_string(), id],
        )
        .await?;

        Ok(())
    }

    pub async fn get_unembedded(conn: &Connection) -> Result<Vec<ClaimOccurrence>> {
        let mut rows = conn
            .query(
                &format!(
                    r#"
                    SELECT {CLAIM_COLUMNS}
                    FROM claim_occurrences
                    WHERE embedding IS NULL
                    ORDER BY id ASC
                    "#
                ),
                (),
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_claim(&row)?);
        }

        Ok(results)
    }

    pub async fn update_embedding(conn: &Connection, id: i64, embedding: &[f32]) -> Result<()> {
        let embedding_json = serde_json::to_string(embedding)?;

        conn.execute(
            "UPDATE claim_occurrences SET embedding = ?2 WHERE id = ?1",
            params![id, embedding_json],
        )
        .await?;

        Ok(())
    }

    pub async fn update_embeddings_batch(
        conn: &Connection,
        updates: &[(i64, Vec<f32>)],
    ) -> Result<u64> {
        for (id, embedding) in updates {
            Self::update_embedding(conn, *id, embedding).await?;
        }
        Ok(updates.len() as u64)
    }

    /// ADVANCED claims with embeddings in insertion order. Clustering
    /// iterates these as-is, so the result order must never change.
    pub async fn get_clusterable(
        conn: &Connection,
        author_id: &str,
    ) -> Result<Vec<ClaimOccurrence>> {
        let mut rows = conn
            .query(
                &format!(
                    r#"
                    SELECT {CLAIM_COLUMNS}
                    FROM claim_occurrences
                    WHERE author_id = ?1
                      AND claim_type = 'ADVANCED'
                      AND embedding IS NOT NULL
                    ORDER BY id ASC
                    "#
                ),
                params![author_id],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_claim(&row)?);
        }

        Ok(results)
    }

    fn row_to_claim(row: &libsql::Row) -> Result<ClaimOccurrence> {
        let id: i64 = row.get(0)?;

        // A present-but-unreadable embedding is a hard error, never a
        // silent zero vector.
        let embedding = match row.get::<Option<String>>(8)? {
            Some(raw) => Some(
                serde_json::from_str::<Vec<f32>>(&raw)
                    .map_err(|e| TenetError::EmbeddingParse(format!("claim {id}: {e}")))?,
            ),
            None => None,
        };

        Ok(ClaimOccurrence {
            id,
            author_id: row.get(1)?,
            post_id: row.get(2)?,
            text: row.get(3)?,
            polarity: row.get(4)?,
            confidence: row.get(5)?,
            occurred_at: parse_timestamp(&row.get::<String>(6)?),
            claim_type: row
                .get::<Option<String>>(7)?
                .and_then(|raw| raw.parse::<ClaimType>().ok()),
            embedding,
        })
    }
}
