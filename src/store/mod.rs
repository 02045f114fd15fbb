//! Storage capabilities consumed by the services.
//!
//! Each capability is its own trait so services depend only on what they
//! use, and tests can inject [`MemoryStore`] in place of SQLite.

mod memory;

pub use memory::MemoryStore;

use crate::db::pool::DbPool;
use crate::db::{SqlitePullRequestStore, SqliteStatsStore, SqliteTeamStore, SqliteUserStore};
use crate::error::AppError;
use crate::models::{
    PrAssignmentStats, PullRequest, PullRequestShort, Team, TeamMember, User,
    UserAssignmentStats,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Outcome of the conditional merge write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The pull request moved to `MERGED` in this call.
    Updated,
    /// Another caller merged it first; nothing was written.
    AlreadyMerged,
    NotFound,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `NotFound` if the user does not exist.
    async fn get_by_id(&self, user_id: &str) -> Result<User, AppError>;

    /// Members of a team ordered by username.
    async fn get_by_team(&self, team_name: &str) -> Result<Vec<User>, AppError>;

    /// Active members of a team, minus `exclude_ids`, ordered by username.
    async fn get_active_members_excluding(
        &self,
        team_name: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<User>, AppError>;

    /// Insert a user, overwriting any existing record with the same id.
    async fn create(&self, user: &User) -> Result<(), AppError>;

    /// Fails with `NotFound` if the user does not exist.
    async fn update(&self, user: &User) -> Result<(), AppError>;

    /// Fails with `NotFound` if the user does not exist.
    async fn set_active(&self, user_id: &str, is_active: bool) -> Result<(), AppError>;
}

#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Team with its members ordered by username; `NotFound` if absent.
    async fn get_by_name(&self, team_name: &str) -> Result<Team, AppError>;

    async fn exists(&self, team_name: &str) -> Result<bool, AppError>;

    /// Create the team and upsert all members atomically.
    /// Fails with `AlreadyExists` if the team name is taken.
    async fn create(&self, team: &Team) -> Result<(), AppError>;

    /// Upsert members into an existing team atomically.
    async fn update_members(&self, team_name: &str, members: &[TeamMember])
        -> Result<(), AppError>;
}

#[async_trait]
pub trait PullRequestStore: Send + Sync {
    /// Fails with `AlreadyExists` on a duplicate id.
    async fn create(&self, pr: &PullRequest) -> Result<(), AppError>;

    /// Fails with `NotFound` if the pull request does not exist.
    async fn get_by_id(&self, pr_id: &str) -> Result<PullRequest, AppError>;

    /// Newest first.
    async fn get_by_author(&self, author_id: &str) -> Result<Vec<PullRequest>, AppError>;

    /// Pull requests whose reviewer list contains `reviewer_id`, newest first.
    async fn get_by_reviewer(&self, reviewer_id: &str)
        -> Result<Vec<PullRequestShort>, AppError>;

    /// Open pull requests reviewed by `reviewer_id`, newest first.
    async fn list_open_by_reviewer(&self, reviewer_id: &str)
        -> Result<Vec<PullRequest>, AppError>;

    /// Full record replace. Fails with `NotFound` if the id is missing.
    async fn update(&self, pr: &PullRequest) -> Result<(), AppError>;

    /// Mark merged only if not already merged.
    async fn merge(&self, pr_id: &str, merged_at: DateTime<Utc>)
        -> Result<MergeOutcome, AppError>;

    async fn exists(&self, pr_id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Assignment counts for every active user, highest first, ties by username.
    async fn assignment_stats(&self) -> Result<Vec<UserAssignmentStats>, AppError>;

    async fn pr_assignment_stats(&self) -> Result<PrAssignmentStats, AppError>;

    /// Number of pull requests (any status) reviewed by `user_id`.
    async fn user_assignment_count(&self, user_id: &str) -> Result<i64, AppError>;
}

/// The four storage capabilities, injected separately into the services.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub teams: Arc<dyn TeamStore>,
    pub pull_requests: Arc<dyn PullRequestStore>,
    pub stats: Arc<dyn StatsStore>,
}

impl Stores {
    pub fn sqlite(pool: DbPool) -> Self {
        Self {
            users: Arc::new(SqliteUserStore::new(pool.clone())),
            teams: Arc::new(SqliteTeamStore::new(pool.clone())),
            pull_requests: Arc::new(SqlitePullRequestStore::new(pool.clone())),
            stats: Arc::new(SqliteStatsStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    /// Share one memory store across all capabilities.
    pub fn from_memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            teams: store.clone(),
            pull_requests: store.clone(),
            stats: store,
        }
    }
}
