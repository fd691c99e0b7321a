use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::db::{connection::Database, helpers::to_db_timestamp, models::Shoutout};

impl Database {
    /// Record a shoutout. Both users must be in `organization_id` and differ.
    pub async fn insert_shoutout(
        &self,
        organization_id: &str,
        from_user_id: &str,
        to_user_id: &str,
        message: &str,
        is_public: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Shoutout> {
        if from_user_id == to_user_id {
            bail!("users cannot give themselves a shoutout");
        }

        let shoutout = Shoutout {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            from_user_id: from_user_id.to_string(),
            to_user_id: to_user_id.to_string(),
            message: message.to_string(),
            is_public,
            created_at,
        };
        let record = shoutout.clone();
        self.execute(move |conn| {
            for user_id in [&record.from_user_id, &record.to_user_id] {
                let user_org: Option<String> = conn
                    .query_row(
                        "SELECT organization_id FROM users WHERE id = ?1",
                        params![user_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if user_org.as_deref() != Some(record.organization_id.as_str()) {
                    bail!("user {user_id} is not in organization {}", record.organization_id);
                }
            }

            conn.execute(
                "INSERT INTO shoutouts (id, organization_id, from_user_id, to_user_id, message, is_public, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.organization_id,
                    record.from_user_id,
                    record.to_user_id,
                    record.message,
                    record.is_public,
                    to_db_timestamp(record.created_at),
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(shoutout)
    }
}
