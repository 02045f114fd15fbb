//! SQLite user store.

use super::pool::DbPool;
use crate::error::AppError;
use crate::models::User;
use crate::store::UserStore;
use async_trait::async_trait;
use chrono::Utc;

const USER_COLUMNS: &str = "id, username, team_name, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteUserStore {
    pool: DbPool,
}

impl SqliteUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get_by_id(&self, user_id: &str) -> Result<User, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "get user by id"))?
            .ok_or_else(|| AppError::not_found_with_id("User", user_id))
    }

    async fn get_by_team(&self, team_name: &str) -> Result<Vec<User>, AppError> {
        let query = format!(
            "SELECT {} FROM users WHERE team_name = ? ORDER BY username",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(team_name)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn get_active_members_excluding(
        &self,
        team_name: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<User>, AppError> {
        // Exclusions travel as one JSON array so the statement stays fixed.
        let exclude_json = serde_json::to_string(exclude_ids)?;
        let query = format!(
            r#"
            SELECT {}
            FROM users
            WHERE team_name = ?
              AND is_active = 1
              AND id NOT IN (SELECT value FROM json_each(?))
            ORDER BY username
            "#,
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(team_name)
            .bind(exclude_json)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "get active team members"))?;
        Ok(users)
    }

    async fn create(&self, user: &User) -> Result<(), AppError> {
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
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.team_name)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "create user"))?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = ?, team_name = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.team_name)
        .bind(user.is_active)
        .bind(Utc::now())
        .bind(&user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "update user"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found_with_id("User", &user.id));
        }
        Ok(())
    }

    async fn set_active(&self, user_id: &str, is_active: bool) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "set user active"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found_with_id("User", user_id));
        }
        Ok(())
    }
}
