use libsql::{params, Connection, Transaction};

use crate::error::Result;
use crate::models::{BeliefDraft, CanonicalBelief, TimelineEntry};

use super::timeline::TimelineRepository;

pub struct BeliefRepository;

impl BeliefRepository {
    /// Replace the author's belief set and append this run's timeline rows
    /// in one transaction. A failure mid-write leaves the previous belief
    /// set untouched.
    pub async fn replace_for_author(
        conn: &Connection,
        author_id: &str,
        beliefs: &[BeliefDraft],
        timeline: &[TimelineEntry],
    ) -> Result<u64> {
        let tx = conn.transaction().await?;

        if let Err(error) = Self::write_replacement(&tx, author_id, beliefs, timeline).await {
            tx.rollback().await?;
            return Err(error);
        }
        tx.commit().await?;

        Ok(beliefs.len() as u64)
    }

    async fn write_replacement(
        tx: &Transaction,
        author_id: &str,
        beliefs: &[BeliefDraft],
        timeline: &[TimelineEntry],
    ) -> Result<()> {
        // Relations are keyed by belief text and deliberately survive this
        // rebuild; only the next relation build replaces them.
        tx.execute(
            "DELETE FROM author_beliefs WHERE author_id = ?1",
            params![author_id],
        )
        .await?;

        for belief in beliefs {
            tx.execute(
                r#"
                INSERT INTO author_beliefs (
                    author_id, text, support_count, avg_polarity, avg_confidence
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    author_id,
                    belief.text.clone(),
                    belief.support_count,
                    belief.avg_polarity,
                    belief.avg_confidence,
                ],
            )
            .await?;
        }

        TimelineRepository::append(tx, timeline).await?;

        Ok(())
    }

    /// Beliefs ordered by support count descending, then insertion order.
    pub async fn get_by_author(conn: &Connection, author_id: &str) -> Result<Vec<CanonicalBelief>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, author_id, text, support_count, avg_polarity, avg_confidence
                FROM author_beliefs
                WHERE author_id = ?1
                ORDER BY support_count DESC, id ASC
                "#,
                params![author_id],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_belief(&row)?);
        }

        Ok(results)
    }

    fn row_to_belief(row: &libsql::Row) -> Result<CanonicalBelief> {
        Ok(CanonicalBelief {
            id: row.get(0)?,
            author_id: row.get(1)?,
            text: row.get(2)?,
            support_count: row.get(3)?,
            avg_polarity: row.get(4)?,
            avg_confidence: row.get(5)?,
        })
    }
}
