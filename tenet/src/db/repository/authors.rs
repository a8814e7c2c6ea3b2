use chrono::{DateTime, Utc};
use libsql::{params, Connection};
use nanoid::nanoid;

use crate::error::{Result, TenetError};
use crate::models::{Author, Post, PostAnalysis};

pub struct AuthorRepository;

impl AuthorRepository {
    /// Insert by name, keeping the existing row (and id) when the name is
    /// already known. A fresh feed_url wins over a stored one.
    pub async fn upsert(conn: &Connection, name: &str, feed_url: Option<&str>) -> Result<Author> {
        let id = nanoid!();
        let created_at = Utc::now();

        conn.execute(
            r#"
            INSERT INTO authors (id, name, feed_url, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(name) DO UPDATE SET
                feed_url = COALESCE(excluded.feed_url, authors.feed_url)
            "#,
            params![id, name, feed_url, created_at.to_rfc3339()],
        )
        .await?;

        Self::get_by_name(conn, name).await?.ok_or_else(|| {
            TenetError::Internal(format!("author upsert for '{name}' did not persist"))
        })
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Author>> {
        let mut rows = conn
            .query(
                "SELECT id, name, feed_url, created_at FROM authors WHERE id = ?1",
                params![id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_author(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Author>> {
        let mut rows = conn
            .query(
                "SELECT id, name, feed_url, created_at FROM authors WHERE name = ?1",
                params![name],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_author(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list(conn: &Connection) -> Result<Vec<Author>> {
        let mut rows = conn
            .query(
                "SELECT id, name, feed_url, created_at FROM authors ORDER BY name ASC",
                (),
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_author(&row)?);
        }

        Ok(results)
    }

    /// Insert or refresh a post keyed by URL. Title and publish date from
    /// a re-crawl win over stored NULLs but never blank out stored values.
    pub async fn upsert_post(
        conn: &Connection,
        author_id: &str,
        url: &str,
        title: Option<&str>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Post> {
        let id = nanoid!();
        let created_at = Utc::now();

        conn.execute(
            r#"
            INSERT INTO posts (id, author_id, url, title, published_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(url) DO UPDATE SET
                title = COALESCE(excluded.title, posts.title),
                published_at = COALESCE(excluded.published_at, posts.published_at)
            "#,
            params![
                id,
                author_id,
                url,
                title,
                published_at.map(|dt| dt.to_rfc3339()),
                created_at.to_rfc3339(),
            ],
        )
        .await?;

        Self::get_post_by_url(conn, url)
            .await?
            .ok_or_else(|| TenetError::Internal(format!("post upsert for '{url}' did not persist")))
    }

    pub async fn get_post_by_url(conn: &Connection, url: &str) -> Result<Option<Post>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, author_id, url, title, published_at, created_at
                FROM posts
                WHERE url = ?1
                "#,
                params![url],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_post(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_posts_by_author(conn: &Connection, author_id: &str) -> Result<Vec<Post>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, author_id, url, title, published_at, created_at
                FROM posts
                WHERE author_id = ?1
                ORDER BY COALESCE(published_at, created_at) ASC
                "#,
                params![author_id],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_post(&row)?);
        }

        Ok(results)
    }

    pub async fn upsert_analysis(conn: &Connection, analysis: &PostAnalysis) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO post_analyses (
                post_id, summary, main_claim, bias_score, confidence,
                arguments_for, arguments_against, topics, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(post_id) DO UPDATE SET
                summary = excluded.summary,
                main_claim = excluded.main_claim,
                bias_score = excluded.bias_score,
                confidence = excluded.confidence,
                arguments_for = excluded.arguments_for,
                arguments_against = excluded.arguments_against,
                topics = excluded.topics
            "#,
            params![
                analysis.post_id.clone(),
                analysis.summary.clone(),
                analysis.main_claim.clone(),
                analysis.bias_score,
                analysis.confidence,
                serde_json::to_string(&analysis.arguments_for)?,
                serde_json::to_string(&analysis.arguments_against)?,
                serde_json::to_string(&analysis.topics)?,
                analysis.created_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    /// Posts joined to their analyses, oldest first. Posts without an
    /// analysis are skipped; the belief pipeline has nothing to read there.
    pub async fn get_analyzed_posts(
        conn: &Connection,
        author_id: &str,
    ) -> Result<Vec<(Post, PostAnalysis)>> {
        let mut rows = conn
            .query(
                r#"
                SELECT
                    p.id, p.author_id, p.url, p.title, p.published_at, p.created_at,
                    a.post_id, a.summary, a.main_claim, a.bias_score, a.confidence,
                    a.arguments_for, a.arguments_against, a.topics, a.created_at
                FROM posts p
                JOIN post_analyses a ON a.post_id = p.id
                WHERE p.author_id = ?1
                ORDER BY COALESCE(p.published_at, p.created_at) ASC
                "#,
                params![author_id],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            let post = Self::row_to_post(&row)?;
            let analysis = PostAnalysis {
                post_id: row.get(6)?,
                summary: row.get(7)?,
                main_claim: row.get(8)?,
                bias_score: row.get(9)?,
                confidence: row.get(10)?,
                arguments_for: serde_json::from_str(&row.get::<String>(11)?).unwrap_or_default(),
                arguments_against: serde_json::from_str(&row.get::<String>(12)?)
                    .unwrap_or_default(),
                topics: serde_json::from_str(&row.get::<String>(13)?).unwrap_or_default(),
                created_at: parse_timestamp(&row.get::<String>(14)?),
            };
            results.push((post, analysis));
        }

        Ok(results)
    }

    fn row_to_author(row: &libsql::Row) -> Result<Author> {
        Ok(Author {
            id: row.get(0)?,
            name: row.get(1)?,
            feed_url: row.get(2)?,
            created_at: parse_timestamp(&row.get::<String>(3)?),
        })
    }

    fn row_to_post(row: &libsql::Row) -> Result<Post> {
        Ok(Post {
            id: row.get(0)?,
            author_id: row.get(1)?,
            url: row.get(2)?,
            title: row.get(3)?,
            published_at: row
                .get::<Option<String>>(4)?
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            created_at: parse_timestamp(&row.get::<String>(5)?),
        })
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
