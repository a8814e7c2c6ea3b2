use libsql::{params, Connection};

use crate::error::Result;
use crate::models::AuthorProfile;

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn upsert(conn: &Connection, profile: &AuthorProfile) -> Result<()> {
        let profile_json = serde_json::to_string(profile)?;

        conn.execute(
            r#"
            INSERT INTO author_profiles (author_id, profile, computed_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(author_id) DO UPDATE SET
                profile = excluded.profile,
                computed_at = excluded.computed_at
            "#,
            params![
                profile.author_id.clone(),
                profile_json,
                profile.computed_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get(conn: &Connection, author_id: &str) -> Result<Option<AuthorProfile>> {
        let mut rows = conn
            .query(
                "SELECT profile FROM author_profiles WHERE author_id = ?1",
                params![author_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let raw: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }
}
