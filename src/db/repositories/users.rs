use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{
        connection::Database,
        helpers::{parse_datetime, parse_role, to_db_timestamp},
        models::User,
    },
    scope::Role,
};

const USER_COLUMNS: &str =
    "id, organization_id, name, email, role, team_id, manager_id, is_active, created_at";

/// Input data for creating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub organization_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team_id: Option<String>,
    pub manager_id: Option<String>,
}

fn row_to_user(row: &Row) -> Result<User> {
    let role: String = row.get("role")?;
    let created_at: String = row.get("created_at")?;

    Ok(User {
        id: row.get("id")?,
        organization_id: row.get("organization_id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        role: parse_role(&role)?,
        team_id: row.get("team_id")?,
        manager_id: row.get("manager_id")?,
        is_active: row.get("is_active")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Create a user. The team, if any, must belong to the same organization.
    pub async fn insert_user(&self, input: NewUser) -> Result<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            organization_id: input.organization_id,
            name: input.name,
            email: input.email,
            role: input.role,
            team_id: input.team_id,
            manager_id: input.manager_id,
            is_active: true,
            created_at: Utc::now(),
        };
        let record = user.clone();
        self.execute(move |conn| {
            if let Some(team_id) = &record.team_id {
                let team_org: Option<String> = conn
                    .query_row(
                        "SELECT organization_id FROM teams WHERE id = ?1",
                        params![team_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if team_org.as_deref() != Some(record.organization_id.as_str()) {
                    bail!("team {team_id} is not in organization {}", record.organization_id);
                }
            }

            conn.execute(
                "INSERT INTO users (id, organization_id, name, email, role, team_id, manager_id, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id,
                    record.organization_id,
                    record.name,
                    record.email,
                    record.role.as_str(),
                    record.team_id,
                    record.manager_id,
                    record.is_active,
                    to_db_timestamp(record.created_at),
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
            let mut rows = stmt.query(params![user_id])?;
            let user = match rows.next()? {
                Some(row) => Some(row_to_user(row)?),
                None => None,
            };
            Ok(user)
        })
        .await
    }

    /// Active members of a team in creation order.
    pub async fn list_team_members(&self, team_id: &str) -> Result<Vec<User>> {
        let team_id = team_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE team_id = ?1 AND is_active = 1
                 ORDER BY rowid ASC"
            ))?;

            let mut rows = stmt.query(params![team_id])?;
            let mut users = Vec::new();
            while let Some(row) = rows.next()? {
                users.push(row_to_user(row)?);
            }

            Ok(users)
        })
        .await
    }

    pub async fn deactivate_user(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE users SET is_active = 0 WHERE id = ?1",
                params![user_id],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("User not found"));
            }

            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("users.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn inserts_and_reads_back_users() {
        let (_dir, db) = open().await;
        let org = db.insert_organization("Acme").await.unwrap();
        let team = db.insert_team(&org.id, "Platform", None).await.unwrap();

        let created = db
            .insert_user(NewUser {
                organization_id: org.id.clone(),
                name: "Ada".into(),
                email: "ada@acme.test".into(),
                role: Role::Manager,
                team_id: Some(team.id.clone()),
                manager_id: None,
            })
            .await
            .unwrap();

        let loaded = db.get_user(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Ada");
        assert_eq!(loaded.role, Role::Manager);
        assert_eq!(loaded.team_id.as_deref(), Some(team.id.as_str()));
        assert!(loaded.is_active);

        let members = db.list_team_members(&team.id).await.unwrap();
        assert_eq!(members.len(), 1);

        db.deactivate_user(&created.id).await.unwrap();
        assert!(db.list_team_members(&team.id).await.unwrap().is_empty());
        assert!(db.get_user("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refuses_team_from_other_organization() {
        let (_dir, db) = open().await;
        let acme = db.insert_organization("Acme").await.unwrap();
        let globex = db.insert_organization("Globex").await.unwrap();
        let team = db.insert_team(&globex.id, "Sales", None).await.unwrap();

        let result = db
            .insert_user(NewUser {
                organization_id: acme.id,
                name: "Eve".into(),
                email: "eve@acme.test".into(),
                role: Role::Member,
                team_id: Some(team.id),
                manager_id: None,
            })
            .await;
        assert!(result.is_err());
    }
}
