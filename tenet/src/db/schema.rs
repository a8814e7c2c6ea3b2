use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Newsletter authors
        CREATE TABLE IF NOT EXISTS authors (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            feed_url TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_authors_name ON authors(name);

        -- Archived posts
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            author_id TEXT NOT NULL,
            url TEXT NOT NULL UNIQUE,
            title TEXT,
            published_at TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_posts_author_id ON posts(author_id);

        -- Per-post analysis produced by the upstream article analyzer
        CREATE TABLE IF NOT EXISTS post_analyses (
            post_id TEXT PRIMARY KEY,
            summary TEXT,
            main_claim TEXT,
            bias_score REAL,
            confidence REAL,
            arguments_for TEXT NOT NULL DEFAULT '[]',
            arguments_against TEXT NOT NULL DEFAULT '[]',
            topics TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
        );

        -- Claim occurrences; rowid order doubles as the stable
        -- processing order for clustering and classification
        CREATE TABLE IF NOT EXISTS claim_occurrences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id TEXT NOT NULL,
            post_id TEXT NOT NULL,
            text TEXT NOT NULL,
            polarity REAL NOT NULL,
            confidence REAL NOT NULL,
            occurred_at TEXT NOT NULL,
            claim_type TEXT,
            embedding TEXT,
            FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE CASCADE,
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_claims_author_id ON claim_occurrences(author_id);
        CREATE INDEX IF NOT EXISTS idx_claims_post_id ON claim_occurrences(post_id);
        -- Partial indexes for the two "missing work" scans
        CREATE INDEX IF NOT EXISTS idx_claims_unclassified
            ON claim_occurrences(id) WHERE claim_type IS NULL;
        CREATE INDEX IF NOT EXISTS idx_claims_unembedded
            ON claim_occurrences(id) WHERE embedding IS NULL;

        -- Canonical beliefs; rebuilt wholesale per author on each
        -- consolidation run
        CREATE TABLE IF NOT EXISTS author_beliefs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id TEXT NOT NULL,
            text TEXT NOT NULL,
            support_count INTEGER NOT NULL,
            avg_polarity REAL NOT NULL,
            avg_confidence REAL NOT NULL,
            FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_beliefs_author_id ON author_beliefs(author_id);

        -- Pairwise relations between canonical beliefs. Beliefs are
        -- referenced by text, not row id: consolidation rebuilds belief
        -- rows wholesale, and relations must outlive that until the next
        -- relation build replaces them.
        CREATE TABLE IF NOT EXISTS belief_relations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id TEXT NOT NULL,
            belief_a TEXT NOT NULL,
            belief_b TEXT NOT NULL,
            relation TEXT NOT NULL,
            confidence REAL NOT NULL,
            FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_relations_author_id ON belief_relations(author_id);
        CREATE INDEX IF NOT EXISTS idx_relations_kind ON belief_relations(author_id, relation);

        -- Append-only record of when each canonical claim surfaced
        CREATE TABLE IF NOT EXISTS belief_timeline (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id TEXT NOT NULL,
            claim TEXT NOT NULL,
            occurred_at TEXT NOT NULL,
            FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_timeline_author_id ON belief_timeline(author_id);

        -- Cached author profiles
        CREATE TABLE IF NOT EXISTS author_profiles (
            author_id TEXT PRIMARY KEY,
            profile TEXT NOT NULL,
            computed_at TEXT NOT NULL,
            FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE CASCADE
        );
        "#,
    )
    .await?;

    migrate_claim_type_column(conn).await?;

    Ok(())
}

/// Claim classification shipped after extraction, so older databases
/// carry occurrence rows without the claim_type column.
async fn migrate_claim_type_column(conn: &Connection) -> Result<()> {
    let column_exists: bool = conn
        .query(
            "SELECT COUNT(*) FROM pragma_table_info('claim_occurrences') WHERE name='claim_type'",
            (),
        )
        .await?
        .next()
        .await?
        .map(|row| row.get::<i64>(0).unwrap_or(0) > 0)
        .unwrap_or(false);

    if !column_exists {
        tracing::info!("Migrating claim_occurrences table: adding claim_type column");
        conn.execute("ALTER TABLE claim_occurrences ADD COLUMN claim_type TEXT", ())
            .await?;
        tracing::info!("Migration complete: claim_type column added");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    #[tokio::test]
    async fn test_claim_occurrences_schema_has_pipeline_columns() {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();

        init_schema(&conn).await.unwrap();

        let result = conn
            .query(
                "SELECT name, type FROM pragma_table_info('claim_occurrences') WHERE name IN ('claim_type', 'embedding', 'polarity')",
                (),
            )
            .await
            .unwrap();

        let mut rows = Vec::new();
        let mut result_set = result;
        while let Some(row) = result_set.next().await.unwrap() {
            let name: String = row.get(0).unwrap();
            let col_type: String = row.get(1).unwrap();
            rows.push((name, col_type));
        }

        assert_eq!(rows.len(), 3, "Expected claim_type, embedding, polarity");

        let claim_type = rows.iter().find(|(name, _)| name == "claim_type");
        assert!(claim_type.is_some(), "claim_type column should exist");
        assert_eq!(claim_type.unwrap().1, "TEXT");

        let embedding = rows.iter().find(|(name, _)| name == "embedding");
        assert!(embedding.is_some(), "embedding column should exist");
        assert_eq!(embedding.unwrap().1, "TEXT");

        let polarity = rows.iter().find(|(name, _)| name == "polarity");
        assert!(polarity.is_some(), "polarity column should exist");
        assert_eq!(polarity.unwrap().1, "REAL");
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();

        init_schema(&conn).await.unwrap();
        init_schema(&conn).await.unwrap();

        let mut result = conn
            .query(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='author_beliefs'",
                (),
            )
            .await
            .unwrap();
        let row = result.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }
}
