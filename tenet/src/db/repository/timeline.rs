use libsql::{params, Connection};

use crate::error::Result;
use crate::models::TimelineEntry;

use super::authors::parse_timestamp;

pub struct TimelineRepository;

impl TimelineRepository {
    /// Append-only: consolidation runs add rows, nothing rewrites them.
    pub async fn append(conn: &Connection, entries: &[TimelineEntry]) -> Result<u64> {
        for entry in entries {
            conn.execute(
                "INSERT INTO belief_timeline (author_id, claim, occurred_at) VALUES (?1, ?2, ?3)",
                params![
                    entry.author_id.clone(),
                    entry.claim.clone(),
                    entry.occurred_at.to_rfc3339(),
                ],
            )
            .await?;
        }

        Ok(entries.len() as u64)
    }

    pub async fn get_by_author(conn: &Connection, author_id: &str) -> Result<Vec<TimelineEntry>> {
        let mut rows = conn
            .query(
                r#"
                SELECT author_id, claim, occurred_at
                FROM belief_timeline
                WHERE author_id = ?1
                ORDER BY occurred_at ASC, id ASC
                "#,
                params![author_id],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(TimelineEntry {
                author_id: row.get(0)?,
                claim: row.get(1)?,
                occurred_at: parse_timestamp(&row.get::<String>(2)?),
            });
        }

        Ok(results)
    }
}
