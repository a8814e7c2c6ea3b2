use libsql::{params, Connection};

use crate::error::{Result, TenetError};
use crate::models::{BeliefRelation, RelationKind, Tension};

pub struct RelationRepository;

impl RelationRepository {
    pub async fn delete_for_author(conn: &Connection, author_id: &str) -> Result<u64> {
        let deleted = conn
            .execute(
                "DELETE FROM belief_relations WHERE author_id = ?1",
                params![author_id],
            )
            .await?;

        Ok(deleted)
    }

    pub async fn create(
        conn: &Connection,
        author_id: &str,
        belief_a: &str,
        belief_b: &str,
        relation: RelationKind,
        confidence: f64,
    ) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO belief_relations (
                author_id, belief_a, belief_b, relation, confidence
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                author_id,
                belief_a,
                belief_b,
                relation.to_string(),
                confidence,
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_author(conn: &Connection, author_id: &str) -> Result<Vec<BeliefRelation>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, author_id, belief_a, belief_b, relation, confidence
                FROM belief_relations
                WHERE author_id = ?1
                ORDER BY id ASC
                "#,
                params![author_id],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_relation(&row)?);
        }

        Ok(results)
    }

    /// CONTRADICTS pairs, strongest first. Id breaks confidence ties so
    /// the order is stable across runs.
    pub async fn get_contradictions(conn: &Connection, author_id: &str) -> Result<Vec<Tension>> {
        let mut rows = conn
            .query(
                r#"
                SELECT belief_a, belief_b, confidence
                FROM belief_relations
                WHERE author_id = ?1 AND relation = 'CONTRADICTS'
                ORDER BY confidence DESC, id ASC
                "#,
                params![author_id],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Tension {
                belief_a: row.get(0)?,
                belief_b: row.get(1)?,
                confidence: row.get(2)?,
            });
        }

        Ok(results)
    }

    fn row_to_relation(row: &libsql::Row) -> Result<BeliefRelation> {
        let raw_kind: String = row.get(4)?;

        Ok(BeliefRelation {
            id: row.get(0)?,
            author_id: row.get(1)?,
            belief_a: row.get(2)?,
            belief_b: row.get(3)?,
            relation: raw_kind.parse().map_err(TenetError::Validation)?,
            confidence: row.get(5)?,
        })
    }
}
