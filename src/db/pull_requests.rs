//! SQLite pull request store.
//!
//! Reviewers are stored as a JSON array in `assigned_reviewers` and matched
//! with `json_each`. Merging is a conditional update so concurrent merges
//! produce exactly one transition.

use super::pool::DbPool;
use crate::error::AppError;
use crate::models::{PullRequest, PullRequestShort};
use crate::store::{MergeOutcome, PullRequestStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

const PR_COLUMNS: &str =
    "id, name, author_id, status, assigned_reviewers, created_at, merged_at, updated_at";

/// Filter matching rows whose reviewer list contains the bound user id.
const HAS_REVIEWER: &str =
    "EXISTS (SELECT 1 FROM json_each(pull_requests.assigned_reviewers) WHERE json_each.value = ?)";

/// Raw row; `assigned_reviewers` and `status` are parsed on conversion.
#[derive(Debug, FromRow)]
struct PullRequestRow {
    id: String,
    name: String,
    author_id: String,
    status: String,
    assigned_reviewers: String,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PullRequestRow> for PullRequest {
    type Error = AppError;

    fn try_from(row: PullRequestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row.status.parse()?,
            assigned_reviewers: serde_json::from_str(&row.assigned_reviewers)?,
            id: row.id,
            name: row.name,
            author_id: row.author_id,
            created_at: row.created_at,
            merged_at: row.merged_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PullRequestShortRow {
    id: String,
    name: String,
    author_id: String,
    status: String,
}

impl TryFrom<PullRequestShortRow> for PullRequestShort {
    type Error = AppError;

    fn try_from(row: PullRequestShortRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row.status.parse()?,
            id: row.id,
            name: row.name,
            author_id: row.author_id,
        })
    }
}

#[derive(Clone)]
pub struct SqlitePullRequestStore {
    pool: DbPool,
}

impl SqlitePullRequestStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn query_pull_requests(
        &self,
        filter: &str,
        bind: &str,
    ) -> Result<Vec<PullRequest>, AppError> {
        let query = format!(
            "SELECT {} FROM pull_requests WHERE {} ORDER BY created_at DESC, id",
            PR_COLUMNS, filter
        );
        let rows: Vec<PullRequestRow> = sqlx::query_as(&query)
            .bind(bind)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "query pull requests"))?;

        rows.into_iter().map(PullRequest::try_from).collect()
    }
}

#[async_trait]
impl PullRequestStore for SqlitePullRequestStore {
    async fn create(&self, pr: &PullRequest) -> Result<(), AppError> {
        let reviewers_json = serde_json::to_string(&pr.assigned_reviewers)?;

        let result = sqlx::query(
            r#"
            INSERT INTO pull_requests (id, name, author_id, status, assigned_reviewers, created_at, merged_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&pr.id)
        .bind(&pr.name)
        .bind(&pr.author_id)
        .bind(pr.status.as_str())
        .bind(reviewers_json)
        .bind(pr.created_at)
        .bind(pr.merged_at)
        .bind(pr.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::already_exists("PullRequest", &pr.id))
            }
            Err(e) => Err(AppError::database_with_op(e.to_string(), "create pull request")),
        }
    }

    async fn get_by_id(&self, pr_id: &str) -> Result<PullRequest, AppError> {
        let query = format!("SELECT {} FROM pull_requests WHERE id = ?", PR_COLUMNS);
        let row: Option<PullRequestRow> = sqlx::query_as(&query)
            .bind(pr_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database_with_op(e.to_string(), "get pull request by id"))?;

        row.ok_or_else(|| AppError::not_found_with_id("PullRequest", pr_id))?
            .try_into()
    }

    async fn get_by_author(&self, author_id: &str) -> Result<Vec<PullRequest>, AppError> {
        self.query_pull_requests("author_id = ?", author_id).await
    }

    async fn get_by_reviewer(
        &self,
        reviewer_id: &str,
    ) -> Result<Vec<PullRequestShort>, AppError> {
        let query = format!(
            "SELECT id, name, author_id, status FROM pull_requests WHERE {} ORDER BY created_at DESC, id",
            HAS_REVIEWER
        );
        let rows: Vec<PullRequestShortRow> = sqlx::query_as(&query)
            .bind(reviewer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::database_with_op(e.to_string(), "query pull requests by reviewer")
            })?;

        rows.into_iter().map(PullRequestShort::try_from).collect()
    }

    async fn list_open_by_reviewer(
        &self,
        reviewer_id: &str,
    ) -> Result<Vec<PullRequest>, AppError> {
        let filter = format!("status = 'OPEN' AND {}", HAS_REVIEWER);
        self.query_pull_requests(&filter, reviewer_id).await
    }

    async fn update(&self, pr: &PullRequest) -> Result<(), AppError> {
        let reviewers_json = serde_json::to_string(&pr.assigned_reviewers)?;

        let result = sqlx::query(
            r#"
            UPDATE pull_requests
            SET name = ?, status = ?, assigned_reviewers = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&pr.name)
        .bind(pr.status.as_str())
        .bind(reviewers_json)
        .bind(pr.updated_at)
        .bind(&pr.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "update pull request"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found_with_id("PullRequest", &pr.id));
        }
        Ok(())
    }

    async fn merge(
        &self,
        pr_id: &str,
        merged_at: DateTime<Utc>,
    ) -> Result<MergeOutcome, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE pull_requests
            SET status = 'MERGED', merged_at = ?, updated_at = ?
            WHERE id = ? AND status != 'MERGED'
            "#,
        )
        .bind(merged_at)
        .bind(merged_at)
        .bind(pr_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "merge pull request"))?;

        if result.rows_affected() > 0 {
            return Ok(MergeOutcome::Updated);
        }

        // Zero rows: either someone else merged it first or it never existed.
        if self.exists(pr_id).await? {
            Ok(MergeOutcome::AlreadyMerged)
        } else {
            Ok(MergeOutcome::NotFound)
        }
    }

    async fn exists(&self, pr_id: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pull_requests WHERE id = ?)")
                .bind(pr_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{initialize_in_memory, SqliteTeamStore};
    use crate::models::{PullRequestStatus, Team, TeamMember};
    use crate::store::TeamStore;

    async fn store_with_team() -> SqlitePullRequestStore {
        let pool = initialize_in_memory().await.unwrap();
        let members = ["u1", "u2", "u3"]
            .iter()
            .map(|id| TeamMember {
                user_id: id.to_string(),
                username: format!("user-{}", id),
                is_active: true,
            })
            .collect();
        SqliteTeamStore::new(pool.clone())
            .create(&Team::new("core", members))
            .await
            .unwrap();
        SqlitePullRequestStore::new(pool)
    }

    fn reviewers(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_round_trips_reviewers() {
        let store = store_with_team().await;
        let pr = PullRequest::open("pr-1", "Add login", "u1", reviewers(&["u3", "u2"]));
        store.create(&pr).await.unwrap();

        let stored = store.get_by_id("pr-1").await.unwrap();
        assert_eq!(stored.assigned_reviewers, vec!["u3", "u2"]);
        assert_eq!(stored.status, PullRequestStatus::Open);
        assert!(stored.merged_at.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_is_already_exists() {
        let store = store_with_team().await;
        let pr = PullRequest::open("pr-1", "Add login", "u1", vec![]);
        store.create(&pr).await.unwrap();

        let err = store.create(&pr).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_merge_is_conditional() {
        let store = store_with_team().await;
        store
            .create(&PullRequest::open("pr-1", "Add login", "u1", vec![]))
            .await
            .unwrap();

        assert_eq!(store.merge("pr-1", Utc::now()).await.unwrap(), MergeOutcome::Updated);
        let first = store.get_by_id("pr-1").await.unwrap().merged_at;
        assert!(first.is_some());

        assert_eq!(
            store.merge("pr-1", Utc::now()).await.unwrap(),
            MergeOutcome::AlreadyMerged
        );
        assert_eq!(
            store.merge("pr-404", Utc::now()).await.unwrap(),
            MergeOutcome::NotFound
        );

        let merged = store.get_by_id("pr-1").await.unwrap();
        assert_eq!(merged.status, PullRequestStatus::Merged);
        assert_eq!(merged.merged_at, first);
    }

    #[tokio::test]
    async fn test_reviewer_queries() {
        let store = store_with_team().await;
        store
            .create(&PullRequest::open("pr-1", "One", "u1", reviewers(&["u2"])))
            .await
            .unwrap();
        store
            .create(&PullRequest::open("pr-2", "Two", "u1", reviewers(&["u2", "u3"])))
            .await
            .unwrap();
        store
            .create(&PullRequest::open("pr-3", "Three", "u3", reviewers(&["u1"])))
            .await
            .unwrap();
        store.merge("pr-1", Utc::now()).await.unwrap();

        let mut reviewed: Vec<String> = store
            .get_by_reviewer("u2")
            .await
            .unwrap()
            .into_iter()
            .map(|pr| pr.id)
            .collect();
        reviewed.sort();
        assert_eq!(reviewed, vec!["pr-1", "pr-2"]);

        let open = store.list_open_by_reviewer("u2").await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "pr-2");

        assert_eq!(store.get_by_author("u1").await.unwrap().len(), 2);
        assert!(store.get_by_reviewer("u9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_record() {
        let store = store_with_team().await;
        let mut pr = PullRequest::open("pr-1", "Add login", "u1", reviewers(&["u2"]));
        store.create(&pr).await.unwrap();

        pr.replace_reviewer("u2", "u3");
        pr.updated_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        store.update(&pr).await.unwrap();
        let stored = store.get_by_id("pr-1").await.unwrap();
        assert_eq!(stored.assigned_reviewers, vec!["u3"]);
        assert_eq!(stored.updated_at, pr.updated_at);

        let ghost = PullRequest::open("pr-404", "Ghost", "u1", vec![]);
        assert!(store.update(&ghost).await.unwrap_err().is_not_found());
    }
}
