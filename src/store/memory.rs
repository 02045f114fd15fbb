//! In-memory implementation of the storage capabilities.
//!
//! All state is held in a single map set behind a `RwLock` and lost on
//! drop. Clones share the same state, so tests can keep a handle for
//! seeding while the services own another.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{MergeOutcome, PullRequestStore, StatsStore, TeamStore, UserStore};
use crate::error::AppError;
use crate::models::{
    PrAssignmentStats, PullRequest, PullRequestShort, PullRequestStatus, Team, TeamMember, User,
    UserAssignmentStats,
};

#[derive(Debug, Clone)]
struct TeamRecord {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, User>,
    teams: HashMap<String, TeamRecord>,
    pull_requests: HashMap<String, PullRequest>,
}

impl MemoryState {
    fn sorted_members(&self, team_name: &str) -> Vec<User> {
        let mut members: Vec<User> = self
            .users
            .values()
            .filter(|u| u.team_name == team_name)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.username.cmp(&b.username));
        members
    }

    fn upsert_member(&mut self, team_name: &str, member: &TeamMember, now: DateTime<Utc>) {
        let created_at = self
            .users
            .get(&member.user_id)
            .map(|u| u.created_at)
            .unwrap_or(now);
        self.users.insert(
            member.user_id.clone(),
            User {
                id: member.user_id.clone(),
                username: member.username.clone(),
                team_name: team_name.to_string(),
                is_active: member.is_active,
                created_at,
                updated_at: now,
            },
        );
    }

    fn newest_first(&self, filter: impl Fn(&PullRequest) -> bool) -> Vec<PullRequest> {
        let mut prs: Vec<PullRequest> = self
            .pull_requests
            .values()
            .filter(|pr| filter(pr))
            .cloned()
            .collect();
        prs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        prs
    }

    fn assignment_count(&self, user_id: &str) -> i64 {
        self.pull_requests
            .values()
            .filter(|pr| pr.has_reviewer(user_id))
            .count() as i64
    }
}

/// In-memory store implementing every storage capability.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_by_id(&self, user_id: &str) -> Result<User, AppError> {
        let state = self.state.read().await;
        state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| AppError::not_found_with_id("User", user_id))
    }

    async fn get_by_team(&self, team_name: &str) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.sorted_members(team_name))
    }

    async fn get_active_members_excluding(
        &self,
        team_name: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .sorted_members(team_name)
            .into_iter()
            .filter(|u| u.is_active && !exclude_ids.contains(&u.id))
            .collect())
    }

    async fn create(&self, user: &User) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let mut record = user.clone();
        if let Some(existing) = state.users.get(&user.id) {
            record.created_at = existing.created_at;
        }
        state.users.insert(user.id.clone(), record);
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user.id) {
            Some(existing) => {
                existing.username = user.username.clone();
                existing.team_name = user.team_name.clone();
                existing.is_active = user.is_active;
                existing.updated_at = Utc::now();
                Ok(())
            }
            None => Err(AppError::not_found_with_id("User", &user.id)),
        }
    }

    async fn set_active(&self, user_id: &str, is_active: bool) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        match state.users.get_mut(user_id) {
            Some(user) => {
                user.is_active = is_active;
                user.updated_at = Utc::now();
                Ok(())
            }
            None => Err(AppError::not_found_with_id("User", user_id)),
        }
    }
}

#[async_trait]
impl TeamStore for MemoryStore {
    async fn get_by_name(&self, team_name: &str) -> Result<Team, AppError> {
        let state = self.state.read().await;
        let record = state
            .teams
            .get(team_name)
            .ok_or_else(|| AppError::not_found_with_id("Team", team_name))?;

        Ok(Team {
            name: team_name.to_string(),
            members: state
                .sorted_members(team_name)
                .iter()
                .map(TeamMember::from)
                .collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    async fn exists(&self, team_name: &str) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state.teams.contains_key(team_name))
    }

    async fn create(&self, team: &Team) -> Result<(), AppError> {
        // Single write lock: the team and all members appear together.
        let mut state = self.state.write().await;
        if state.teams.contains_key(&team.name) {
            return Err(AppError::already_exists("Team", &team.name));
        }

        let now = Utc::now();
        state.teams.insert(
            team.name.clone(),
            TeamRecord {
                created_at: now,
                updated_at: now,
            },
        );
        for member in &team.members {
            state.upsert_member(&team.name, member, now);
        }
        Ok(())
    }

    async fn update_members(
        &self,
        team_name: &str,
        members: &[TeamMember],
    ) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        match state.teams.get_mut(team_name) {
            Some(record) => record.updated_at = now,
            None => return Err(AppError::not_found_with_id("Team", team_name)),
        }
        for member in members {
            state.upsert_member(team_name, member, now);
        }
        Ok(())
    }
}

#[async_trait]
impl PullRequestStore for MemoryStore {
    async fn create(&self, pr: &PullRequest) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.pull_requests.contains_key(&pr.id) {
            return Err(AppError::already_exists("PullRequest", &pr.id));
        }
        state.pull_requests.insert(pr.id.clone(), pr.clone());
        Ok(())
    }

    async fn get_by_id(&self, pr_id: &str) -> Result<PullRequest, AppError> {
        let state = self.state.read().await;
        state
            .pull_requests
            .get(pr_id)
            .cloned()
            .ok_or_else(|| AppError::not_found_with_id("PullRequest", pr_id))
    }

    async fn get_by_author(&self, author_id: &str) -> Result<Vec<PullRequest>, AppError> {
        let state = self.state.read().await;
        Ok(state.newest_first(|pr| pr.author_id == author_id))
    }

    async fn get_by_reviewer(
        &self,
        reviewer_id: &str,
    ) -> Result<Vec<PullRequestShort>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .newest_first(|pr| pr.has_reviewer(reviewer_id))
            .iter()
            .map(PullRequest::short)
            .collect())
    }

    async fn list_open_by_reviewer(
        &self,
        reviewer_id: &str,
    ) -> Result<Vec<PullRequest>, AppError> {
        let state = self.state.read().await;
        Ok(state.newest_first(|pr| !pr.is_merged() && pr.has_reviewer(reviewer_id)))
    }

    async fn update(&self, pr: &PullRequest) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        match state.pull_requests.get_mut(&pr.id) {
            Some(existing) => {
                existing.name = pr.name.clone();
                existing.status = pr.status;
                existing.assigned_reviewers = pr.assigned_reviewers.clone();
                existing.updated_at = pr.updated_at;
                Ok(())
            }
            None => Err(AppError::not_found_with_id("PullRequest", &pr.id)),
        }
    }

    async fn merge(
        &self,
        pr_id: &str,
        merged_at: DateTime<Utc>,
    ) -> Result<MergeOutcome, AppError> {
        let mut state = self.state.write().await;
        Ok(match state.pull_requests.get_mut(pr_id) {
            None => MergeOutcome::NotFound,
            Some(pr) if pr.is_merged() => MergeOutcome::AlreadyMerged,
            Some(pr) => {
                pr.status = PullRequestStatus::Merged;
                pr.merged_at = Some(merged_at);
                pr.updated_at = merged_at;
                MergeOutcome::Updated
            }
        })
    }

    async fn exists(&self, pr_id: &str) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state.pull_requests.contains_key(pr_id))
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn assignment_stats(&self) -> Result<Vec<UserAssignmentStats>, AppError> {
        let state = self.state.read().await;
        let mut stats: Vec<UserAssignmentStats> = state
            .users
            .values()
            .filter(|u| u.is_active)
            .map(|u| UserAssignmentStats {
                user_id: u.id.clone(),
                username: u.username.clone(),
                team_name: u.team_name.clone(),
                is_active: u.is_active,
                assignment_count: state.assignment_count(&u.id),
            })
            .collect();
        stats.sort_by(|a, b| {
            b.assignment_count
                .cmp(&a.assignment_count)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(stats)
    }

    async fn pr_assignment_stats(&self) -> Result<PrAssignmentStats, AppError> {
        let state = self.state.read().await;
        let mut stats = PrAssignmentStats::default();
        let mut reviewer_total = 0usize;

        for pr in state.pull_requests.values() {
            stats.total_prs += 1;
            match pr.status {
                PullRequestStatus::Open => stats.open_prs += 1,
                PullRequestStatus::Merged => stats.merged_prs += 1,
            }
            reviewer_total += pr.assigned_reviewers.len();
            match pr.assigned_reviewers.len() {
                0 => stats.prs_with_no_reviewers += 1,
                1 => stats.prs_with_one_reviewer += 1,
                2 => stats.prs_with_two_reviewers += 1,
                _ => {}
            }
        }

        if stats.total_prs > 0 {
            stats.avg_reviewers_per_pr = reviewer_total as f64 / stats.total_prs as f64;
        }
        Ok(stats)
    }

    async fn user_assignment_count(&self, user_id: &str) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state.assignment_count(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, name: &str, active: bool) -> TeamMember {
        TeamMember {
            user_id: id.to_string(),
            username: name.to_string(),
            is_active: active,
        }
    }

    #[tokio::test]
    async fn test_duplicate_team_rejected() {
        let store = MemoryStore::new();
        let team = Team::new("core", vec![member("u1", "alice", true)]);
        TeamStore::create(&store, &team).await.unwrap();

        let err = TeamStore::create(&store, &team).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_active_members_excluding() {
        let store = MemoryStore::new();
        let team = Team::new(
            "core",
            vec![
                member("u3", "carol", true),
                member("u1", "alice", true),
                member("u2", "bob", false),
            ],
        );
        TeamStore::create(&store, &team).await.unwrap();

        let pool = store
            .get_active_members_excluding("core", &["u1".to_string()])
            .await
            .unwrap();
        let ids: Vec<&str> = pool.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u3"]);

        let members = store.get_by_team("core").await.unwrap();
        let names: Vec<&str> = members.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_user_upsert_keeps_created_at() {
        let store = MemoryStore::new();
        let first = User::new("u1", "alice", "core", true);
        UserStore::create(&store, &first).await.unwrap();

        let mut again = User::new("u1", "alice-b", "core", false);
        again.created_at = first.created_at + chrono::Duration::seconds(60);
        UserStore::create(&store, &again).await.unwrap();

        let stored = UserStore::get_by_id(&store, "u1").await.unwrap();
        assert_eq!(stored.username, "alice-b");
        assert!(!stored.is_active);
        assert_eq!(stored.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_merge_outcomes() {
        let store = MemoryStore::new();
        let pr = PullRequest::open("pr-1", "Add login", "u1", vec![]);
        PullRequestStore::create(&store, &pr).await.unwrap();

        let now = Utc::now();
        assert_eq!(store.merge("pr-1", now).await.unwrap(), MergeOutcome::Updated);
        assert_eq!(
            store.merge("pr-1", Utc::now()).await.unwrap(),
            MergeOutcome::AlreadyMerged
        );
        assert_eq!(store.merge("missing", now).await.unwrap(), MergeOutcome::NotFound);

        let merged = PullRequestStore::get_by_id(&store, "pr-1").await.unwrap();
        assert_eq!(merged.merged_at, Some(now));
    }
}
