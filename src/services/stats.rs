//! Assignment statistics, recomputed on every call.

use std::sync::Arc;

use crate::context::Deadline;
use crate::error::AppError;
use crate::models::{AssignmentStatsResponse, StatsSummary, UserAssignmentStats};
use crate::store::{StatsStore, UserStore};

#[derive(Clone)]
pub struct StatsService {
    stats: Arc<dyn StatsStore>,
    users: Arc<dyn UserStore>,
}

impl StatsService {
    pub fn new(stats: Arc<dyn StatsStore>, users: Arc<dyn UserStore>) -> Self {
        Self { stats, users }
    }

    /// Per-user counts for active users, pull request aggregates and a summary.
    pub async fn get_assignment_stats(
        &self,
        deadline: Deadline,
    ) -> Result<AssignmentStatsResponse, AppError> {
        deadline
            .run("get assignment stats", async {
                let user_stats = self.stats.assignment_stats().await?;
                let pr_stats = self.stats.pr_assignment_stats().await?;
                let summary = summarize(&user_stats);

                Ok(AssignmentStatsResponse {
                    user_stats,
                    pr_stats,
                    summary,
                })
            })
            .await
    }

    /// Profile fields plus a fresh assignment count for one user.
    pub async fn get_user_stats(
        &self,
        deadline: Deadline,
        user_id: &str,
    ) -> Result<UserAssignmentStats, AppError> {
        deadline
            .run("get user stats", async {
                let user = self.users.get_by_id(user_id).await?;
                let assignment_count = self.stats.user_assignment_count(user_id).await?;

                Ok(UserAssignmentStats {
                    user_id: user.id,
                    username: user.username,
                    team_name: user.team_name,
                    is_active: user.is_active,
                    assignment_count,
                })
            })
            .await
    }
}

/// Totals over the per-user list. The most assigned user is the first entry
/// holding the maximum; no user qualifies when every count is zero.
pub fn summarize(user_stats: &[UserAssignmentStats]) -> StatsSummary {
    let mut summary = StatsSummary {
        total_users: user_stats.len() as i64,
        ..Default::default()
    };

    let mut max_count = 0;
    for stat in user_stats {
        if stat.is_active {
            summary.active_users += 1;
        }
        summary.total_assignments += stat.assignment_count;

        if stat.assignment_count > max_count {
            max_count = stat.assignment_count;
            summary.most_assigned_user = Some(stat.username.clone());
            summary.most_assignments = Some(stat.assignment_count);
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PullRequest, Team, TeamMember};
    use crate::store::{MemoryStore, PullRequestStore, TeamStore};
    use chrono::Utc;

    fn stat(username: &str, count: i64) -> UserAssignmentStats {
        UserAssignmentStats {
            user_id: username.to_string(),
            username: username.to_string(),
            team_name: "core".to_string(),
            is_active: true,
            assignment_count: count,
        }
    }

    fn member(id: &str) -> TeamMember {
        TeamMember {
            user_id: id.to_string(),
            username: id.to_lowercase(),
            is_active: true,
        }
    }

    fn reviewers(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_summarize_first_max_wins() {
        let summary = summarize(&[stat("bob", 3), stat("alice", 3), stat("carol", 1)]);
        assert_eq!(summary.total_users, 3);
        assert_eq!(summary.active_users, 3);
        assert_eq!(summary.total_assignments, 7);
        assert_eq!(summary.most_assigned_user.as_deref(), Some("bob"));
        assert_eq!(summary.most_assignments, Some(3));
    }

    #[test]
    fn test_summarize_all_zero() {
        let summary = summarize(&[stat("alice", 0), stat("bob", 0)]);
        assert_eq!(summary.total_assignments, 0);
        assert!(summary.most_assigned_user.is_none());
        assert!(summary.most_assignments.is_none());

        let empty = summarize(&[]);
        assert_eq!(empty, StatsSummary::default());
    }

    #[tokio::test]
    async fn test_stats_consistency() {
        let store = MemoryStore::new();
        TeamStore::create(
            &store,
            &Team::new("core", vec![member("A"), member("B"), member("C")]),
        )
        .await
        .unwrap();
        for (id, author, list) in [
            ("pr-1", "A", reviewers(&["B", "C"])),
            ("pr-2", "A", reviewers(&["B"])),
            ("pr-3", "B", reviewers(&[])),
        ] {
            PullRequestStore::create(&store, &PullRequest::open(id, "Change", author, list))
                .await
                .unwrap();
        }
        PullRequestStore::merge(&store, "pr-2", Utc::now())
            .await
            .unwrap();

        let shared = Arc::new(store);
        let service = StatsService::new(shared.clone(), shared);
        let stats = service.get_assignment_stats(Deadline::none()).await.unwrap();

        let pr = &stats.pr_stats;
        assert_eq!((pr.total_prs, pr.open_prs, pr.merged_prs), (3, 2, 1));
        assert!(stats.summary.total_assignments <= (pr.open_prs + pr.merged_prs) * 2);
        assert!((pr.avg_reviewers_per_pr - 1.0).abs() < f64::EPSILON);
        assert_eq!(stats.summary.most_assigned_user.as_deref(), Some("b"));

        let user = service.get_user_stats(Deadline::none(), "C").await.unwrap();
        assert_eq!(user.assignment_count, 1);

        let err = service
            .get_user_stats(Deadline::none(), "nobody")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
