//! SQLite team store. Team creation and member upserts run in one transaction.

use super::pool::DbPool;
use crate::error::AppError;
use crate::models::{Team, TeamMember};
use crate::store::TeamStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};

#[derive(Clone)]
pub struct SqliteTeamStore {
    pool: DbPool,
}

impl SqliteTeamStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Insert or move a member into `team_name`.
async fn upsert_member(
    tx: &mut Transaction<'_, Sqlite>,
    team_name: &str,
    member: &TeamMember,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, team_name, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            username = excluded.username,
            team_name = excluded.team_name,
            is_active = excluded.is_active,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&member.user_id)
    .bind(&member.username)
    .bind(team_name)
    .bind(member.is_active)
    .bind(now)
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        AppError::database_with_op(e.to_string(), format!("upsert member {}", member.user_id))
    })?;
    Ok(())
}

#[async_trait]
impl TeamStore for SqliteTeamStore {
    async fn get_by_name(&self, team_name: &str) -> Result<Team, AppError> {
        let row: Option<(String, DateTime<Utc>, DateTime<Utc>)> =
            sqlx::query_as("SELECT name, created_at, updated_at FROM teams WHERE name = ?")
                .bind(team_name)
                .fetch_optional(&self.pool)
                .await?;

        let (name, created_at, updated_at) =
            row.ok_or_else(|| AppError::not_found_with_id("Team", team_name))?;

        let members: Vec<(String, String, bool)> = sqlx::query_as(
            "SELECT id, username, is_active FROM users WHERE team_name = ? ORDER BY username",
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(Team {
            name,
            members: members
                .into_iter()
                .map(|(user_id, username, is_active)| TeamMember {
                    user_id,
                    username,
                    is_active,
                })
                .collect(),
            created_at,
            updated_at,
        })
    }

    async fn exists(&self, team_name: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE name = ?)")
            .bind(team_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn create(&self, team: &Team) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO teams (name, created_at, updated_at) VALUES (?, ?, ?) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&team.name)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "create team"))?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(AppError::already_exists("Team", &team.name));
        }

        for member in &team.members {
            upsert_member(&mut tx, &team.name, member, now).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update_members(
        &self,
        team_name: &str,
        members: &[TeamMember],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let result = sqlx::query("UPDATE teams SET updated_at = ? WHERE name = ?")
            .bind(now)
            .bind(team_name)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found_with_id("Team", team_name));
        }

        for member in members {
            upsert_member(&mut tx, team_name, member, now).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize_in_memory;

    fn member(id: &str, name: &str) -> TeamMember {
        TeamMember {
            user_id: id.to_string(),
            username: name.to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_team() {
        let store = SqliteTeamStore::new(initialize_in_memory().await.unwrap());
        let team = Team::new("core", vec![member("u2", "bob"), member("u1", "alice")]);

        store.create(&team).await.unwrap();
        assert!(store.exists("core").await.unwrap());
        assert!(!store.exists("web").await.unwrap());

        let stored = store.get_by_name("core").await.unwrap();
        let names: Vec<&str> = stored.members.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_duplicate_team_leaves_members_untouched() {
        let store = SqliteTeamStore::new(initialize_in_memory().await.unwrap());
        store
            .create(&Team::new("core", vec![member("u1", "alice")]))
            .await
            .unwrap();

        let err = store
            .create(&Team::new("core", vec![member("u9", "mallory")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists { .. }));

        let stored = store.get_by_name("core").await.unwrap();
        assert_eq!(stored.members.len(), 1);
    }

    #[tokio::test]
    async fn test_update_members_moves_users() {
        let store = SqliteTeamStore::new(initialize_in_memory().await.unwrap());
        store
            .create(&Team::new("core", vec![member("u1", "alice"), member("u2", "bob")]))
            .await
            .unwrap();
        store.create(&Team::new("web", vec![])).await.unwrap();

        store.update_members("web", &[member("u2", "bob")]).await.unwrap();

        assert_eq!(store.get_by_name("core").await.unwrap().members.len(), 1);
        assert_eq!(store.get_by_name("web").await.unwrap().members.len(), 1);

        let err = store.update_members("missing", &[]).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_missing_team() {
        let store = SqliteTeamStore::new(initialize_in_memory().await.unwrap());
        assert!(store.get_by_name("ghost").await.unwrap_err().is_not_found());
    }
}
