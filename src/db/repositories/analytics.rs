//! Row-level reads behind the analytics endpoints. Every query is bounded by
//! a `ScopeTarget` and a `DateWindow`; aggregation happens in `crate::analytics`.

use anyhow::{anyhow, Result};
use rusqlite::{ToSql, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{parse_datetime, parse_optional_datetime, to_db_timestamp},
        models::{CheckinFact, CheckinTimestamp, ShoutoutFact},
    },
    filters::{DateWindow, Direction, Visibility},
    scope::ScopeTarget,
};

fn row_to_checkin_fact(row: &Row) -> Result<CheckinFact> {
    let due_at: String = row.get("due_at")?;
    let mood_rating: Option<i64> = row.get("mood_rating")?;

    Ok(CheckinFact {
        user_id: row.get("user_id")?,
        user_name: row.get("user_name")?,
        mood_rating: mood_rating
            .map(|value| u8::try_from(value).map_err(|_| anyhow!("mood_rating out of range: {value}")))
            .transpose()?,
        due_at: parse_datetime(&due_at, "due_at")?,
        submitted_at: parse_optional_datetime(row.get("submitted_at")?, "submitted_at")?,
        review_due_at: parse_optional_datetime(row.get("review_due_at")?, "review_due_at")?,
        reviewed_at: parse_optional_datetime(row.get("reviewed_at")?, "reviewed_at")?,
    })
}

fn row_to_shoutout_fact(row: &Row) -> Result<ShoutoutFact> {
    let created_at: String = row.get("created_at")?;

    Ok(ShoutoutFact {
        from_user_id: row.get("from_user_id")?,
        from_name: row.get("from_name")?,
        to_user_id: row.get("to_user_id")?,
        to_name: row.get("to_name")?,
        is_public: row.get("is_public")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

fn checkin_scope_clause(target: &ScopeTarget) -> &'static str {
    match target {
        ScopeTarget::Organization(_) => "u.organization_id = ?",
        ScopeTarget::Team(_) => "u.team_id = ?",
        ScopeTarget::User(_) => "u.id = ?",
    }
}

/// Returns the clause and how many times the target id is bound.
fn shoutout_scope_clause(target: &ScopeTarget, direction: Direction) -> (&'static str, usize) {
    match (target, direction) {
        (ScopeTarget::Organization(_), _) => ("s.organization_id = ?", 1),
        (ScopeTarget::Team(_), Direction::Given) => ("fu.team_id = ?", 1),
        (ScopeTarget::Team(_), Direction::Received) => ("tu.team_id = ?", 1),
        (ScopeTarget::Team(_), Direction::All) => ("(fu.team_id = ? OR tu.team_id = ?)", 2),
        (ScopeTarget::User(_), Direction::Given) => ("s.from_user_id = ?", 1),
        (ScopeTarget::User(_), Direction::Received) => ("s.to_user_id = ?", 1),
        (ScopeTarget::User(_), Direction::All) => ("(s.from_user_id = ? OR s.to_user_id = ?)", 2),
    }
}

impl Database {
    /// Check-ins whose `timestamp` column falls inside `window`, oldest first.
    pub async fn checkin_facts(
        &self,
        target: ScopeTarget,
        window: DateWindow,
        timestamp: CheckinTimestamp,
    ) -> Result<Vec<CheckinFact>> {
        self.execute(move |conn| {
            let column = timestamp.column();
            let query = format!(
                "SELECT c.user_id, u.name AS user_name, c.mood_rating, c.due_at, c.submitted_at, c.review_due_at, c.reviewed_at
                 FROM checkins c
                 JOIN users u ON u.id = c.user_id
                 WHERE {} AND {column} >= ? AND {column} < ?
                 ORDER BY {column} ASC, u.rowid ASC",
                checkin_scope_clause(&target)
            );

            let params_vec: Vec<Box<dyn ToSql>> = vec![
                Box::new(target.id().to_string()),
                Box::new(to_db_timestamp(window.start())),
                Box::new(to_db_timestamp(window.end_exclusive())),
            ];
            let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&query)?;
            let mut rows = stmt.query(params_refs.as_slice())?;
            let mut facts = Vec::new();
            while let Some(row) = rows.next()? {
                facts.push(row_to_checkin_fact(row)?);
            }

            Ok(facts)
        })
        .await
    }

    /// Shoutouts created inside `window` that touch the target on the
    /// requested side, oldest first.
    pub async fn shoutout_facts(
        &self,
        target: ScopeTarget,
        window: DateWindow,
        direction: Direction,
        visibility: Visibility,
    ) -> Result<Vec<ShoutoutFact>> {
        self.execute(move |conn| {
            let (scope_clause, binds) = shoutout_scope_clause(&target, direction);
            let mut conditions = vec![
                scope_clause.to_string(),
                "s.created_at >= ?".to_string(),
                "s.created_at < ?".to_string(),
            ];

            let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
            for _ in 0..binds {
                params_vec.push(Box::new(target.id().to_string()));
            }
            params_vec.push(Box::new(to_db_timestamp(window.start())));
            params_vec.push(Box::new(to_db_timestamp(window.end_exclusive())));

            if let Some(is_public) = visibility.is_public() {
                conditions.push("s.is_public = ?".to_string());
                params_vec.push(Box::new(is_public));
            }

            let query = format!(
                "SELECT s.from_user_id, fu.name AS from_name, s.to_user_id, tu.name AS to_name, s.is_public, s.created_at
                 FROM shoutouts s
                 JOIN users fu ON fu.id = s.from_user_id
                 JOIN users tu ON tu.id = s.to_user_id
                 WHERE {}
                 ORDER BY s.created_at ASC, s.rowid ASC",
                conditions.join(" AND ")
            );

            let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&query)?;
            let mut rows = stmt.query(params_refs.as_slice())?;
            let mut facts = Vec::new();
            while let Some(row) = rows.next()? {
                facts.push(row_to_shoutout_fact(row)?);
            }

            Ok(facts)
        })
        .await
    }
}
