//! SQLite statistics queries. Everything is aggregated on read.

use super::pool::DbPool;
use crate::error::AppError;
use crate::models::{PrAssignmentStats, UserAssignmentStats};
use crate::store::StatsStore;
use async_trait::async_trait;

#[derive(Clone)]
pub struct SqliteStatsStore {
    pool: DbPool,
}

impl SqliteStatsStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsStore for SqliteStatsStore {
    async fn assignment_stats(&self) -> Result<Vec<UserAssignmentStats>, AppError> {
        let stats = sqlx::query_as::<_, UserAssignmentStats>(
            r#"
            SELECT
                u.id AS user_id,
                u.username,
                u.team_name,
                u.is_active,
                (
                    SELECT COUNT(*)
                    FROM pull_requests pr
                    WHERE EXISTS (
                        SELECT 1 FROM json_each(pr.assigned_reviewers) r WHERE r.value = u.id
                    )
                ) AS assignment_count
            FROM users u
            WHERE u.is_active = 1
            ORDER BY assignment_count DESC, u.username ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "query assignment stats"))?;

        Ok(stats)
    }

    async fn pr_assignment_stats(&self) -> Result<PrAssignmentStats, AppError> {
        let stats = sqlx::query_as::<_, PrAssignmentStats>(
            r#"
            SELECT
                COUNT(*) AS total_prs,
                COALESCE(SUM(CASE WHEN status = 'OPEN' THEN 1 ELSE 0 END), 0) AS open_prs,
                COALESCE(SUM(CASE WHEN status = 'MERGED' THEN 1 ELSE 0 END), 0) AS merged_prs,
                CAST(COALESCE(AVG(json_array_length(assigned_reviewers)), 0.0) AS REAL)
                    AS avg_reviewers_per_pr,
                COALESCE(SUM(CASE WHEN json_array_length(assigned_reviewers) = 0 THEN 1 ELSE 0 END), 0)
                    AS prs_with_no_reviewers,
                COALESCE(SUM(CASE WHEN json_array_length(assigned_reviewers) = 1 THEN 1 ELSE 0 END), 0)
                    AS prs_with_one_reviewer,
                COALESCE(SUM(CASE WHEN json_array_length(assigned_reviewers) = 2 THEN 1 ELSE 0 END), 0)
                    AS prs_with_two_reviewers
            FROM pull_requests
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "query pull request stats"))?;

        Ok(stats)
    }

    async fn user_assignment_count(&self, user_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM pull_requests pr
            WHERE EXISTS (SELECT 1 FROM json_each(pr.assigned_reviewers) r WHERE r.value = ?)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "count user assignments"))?;

        Ok(count)
    }
}
