use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, to_db_timestamp},
    models::{Organization, Team},
};

fn row_to_team(row: &Row) -> Result<Team> {
    let created_at: String = row.get("created_at")?;

    Ok(Team {
        id: row.get("id")?,
        organization_id: row.get("organization_id")?,
        parent_team_id: row.get("parent_team_id")?,
        name: row.get("name")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn insert_organization(&self, name: &str) -> Result<Organization> {
        let organization = Organization {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let record = organization.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO organizations (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![record.id, record.name, to_db_timestamp(record.created_at)],
            )?;
            Ok(())
        })
        .await?;
        Ok(organization)
    }

    pub async fn get_organization(&self, organization_id: &str) -> Result<Option<Organization>> {
        let organization_id = organization_id.to_string();
        self.execute(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, created_at FROM organizations WHERE id = ?1",
                    params![organization_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()?;

            row.map(|(id, name, created_at)| {
                Ok(Organization {
                    id,
                    name,
                    created_at: parse_datetime(&created_at, "created_at")?,
                })
            })
            .transpose()
        })
        .await
    }

    /// Create a team, optionally nested under a parent in the same organization.
    pub async fn insert_team(
        &self,
        organization_id: &str,
        name: &str,
        parent_team_id: Option<&str>,
    ) -> Result<Team> {
        let team = Team {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            parent_team_id: parent_team_id.map(str::to_string),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let record = team.clone();
        self.execute(move |conn| {
            if let Some(parent) = &record.parent_team_id {
                let parent_org: Option<String> = conn
                    .query_row(
                        "SELECT organization_id FROM teams WHERE id = ?1",
                        params![parent],
                        |row| row.get(0),
                    )
                    .optional()?;
                if parent_org.as_deref() != Some(record.organization_id.as_str()) {
                    return Err(anyhow!("parent team {parent} is not in this organization"));
                }
            }

            conn.execute(
                "INSERT INTO teams (id, organization_id, parent_team_id, name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.organization_id,
                    record.parent_team_id,
                    record.name,
                    to_db_timestamp(record.created_at),
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(team)
    }

    pub async fn get_team(&self, team_id: &str) -> Result<Option<Team>> {
        let team_id = team_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, organization_id, parent_team_id, name, created_at
                 FROM teams
                 WHERE id = ?1",
            )?;

            let mut rows = stmt.query(params![team_id])?;
            let team = match rows.next()? {
                Some(row) => Some(row_to_team(row)?),
                None => None,
            };
            Ok(team)
        })
        .await
    }

    pub async fn list_teams(&self, organization_id: &str) -> Result<Vec<Team>> {
        let organization_id = organization_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, organization_id, parent_team_id, name, created_at
                 FROM teams
                 WHERE organization_id = ?1
                 ORDER BY name ASC",
            )?;

            let mut rows = stmt.query(params![organization_id])?;
            let mut teams = Vec::new();
            while let Some(row) = rows.next()? {
                teams.push(row_to_team(row)?);
            }

            Ok(teams)
        })
        .await
    }
}
