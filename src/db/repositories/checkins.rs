use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{parse_date, parse_datetime, parse_optional_datetime, to_db_timestamp},
    models::Checkin,
};

/// Managers are expected to review a check-in within this long of submission.
pub const REVIEW_WINDOW_HOURS: i64 = 72;

fn row_to_checkin(row: &Row) -> Result<Checkin> {
    let week_of: String = row.get("week_of")?;
    let due_at: String = row.get("due_at")?;
    let created_at: String = row.get("created_at")?;
    let mood_rating: Option<i64> = row.get("mood_rating")?;

    Ok(Checkin {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        week_of: parse_date(&week_of, "week_of")?,
        mood_rating: mood_rating
            .map(|value| u8::try_from(value).map_err(|_| anyhow!("mood_rating out of range: {value}")))
            .transpose()?,
        due_at: parse_datetime(&due_at, "due_at")?,
        submitted_at: parse_optional_datetime(row.get("submitted_at")?, "submitted_at")?,
        reviewed_by: row.get("reviewed_by")?,
        review_due_at: parse_optional_datetime(row.get("review_due_at")?, "review_due_at")?,
        reviewed_at: parse_optional_datetime(row.get("reviewed_at")?, "reviewed_at")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Open a check-in for `user_id` covering the week starting `week_of`.
    pub async fn insert_checkin(
        &self,
        user_id: &str,
        week_of: NaiveDate,
        due_at: DateTime<Utc>,
    ) -> Result<Checkin> {
        let checkin = Checkin {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            week_of,
            mood_rating: None,
            due_at,
            submitted_at: None,
            reviewed_by: None,
            review_due_at: None,
            reviewed_at: None,
            created_at: Utc::now(),
        };
        let record = checkin.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO checkins (id, user_id, week_of, due_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.user_id,
                    record.week_of.format("%Y-%m-%d").to_string(),
                    to_db_timestamp(record.due_at),
                    to_db_timestamp(record.created_at),
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(checkin)
    }

    /// Record the mood rating and start the manager review clock.
    pub async fn submit_checkin(
        &self,
        checkin_id: &str,
        mood_rating: u8,
        submitted_at: DateTime<Utc>,
    ) -> Result<Checkin> {
        if !(1..=5).contains(&mood_rating) {
            bail!("mood rating must be between 1 and 5, got {mood_rating}");
        }
        let checkin_id = checkin_id.to_string();
        let review_due_at = submitted_at + Duration::hours(REVIEW_WINDOW_HOURS);
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE checkins
                 SET mood_rating = ?1,
                     submitted_at = ?2,
                     review_due_at = ?3
                 WHERE id = ?4 AND submitted_at IS NULL",
                params![
                    mood_rating,
                    to_db_timestamp(submitted_at),
                    to_db_timestamp(review_due_at),
                    checkin_id,
                ],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Check-in not found or already submitted"));
            }

            load_checkin(conn, &checkin_id)
        })
        .await
    }

    pub async fn review_checkin(
        &self,
        checkin_id: &str,
        reviewer_id: &str,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Checkin> {
        let checkin_id = checkin_id.to_string();
        let reviewer_id = reviewer_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE checkins
                 SET reviewed_by = ?1,
                     reviewed_at = ?2
                 WHERE id = ?3 AND submitted_at IS NOT NULL",
                params![reviewer_id, to_db_timestamp(reviewed_at), checkin_id],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Check-in not found or not yet submitted"));
            }

            load_checkin(conn, &checkin_id)
        })
        .await
    }

    pub async fn get_checkin(&self, checkin_id: &str) -> Result<Checkin> {
        let checkin_id = checkin_id.to_string();
        self.execute(move |conn| load_checkin(conn, &checkin_id)).await
    }
}

fn load_checkin(conn: &rusqlite::Connection, checkin_id: &str) -> Result<Checkin> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, week_of, mood_rating, due_at, submitted_at, reviewed_by, review_due_at, reviewed_at, created_at
         FROM checkins
         WHERE id = ?1",
    )?;
    let mut rows = stmt.query(params![checkin_id])?;
    match rows.next()? {
        Some(row) => row_to_checkin(row),
        None => Err(anyhow!("Check-in not found")),
    }
}
