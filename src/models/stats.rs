//! Assignment statistics. Derived on every query, never persisted.

use serde::Serialize;
use sqlx::FromRow;

/// Per-user review assignment count.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct UserAssignmentStats {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
    pub assignment_count: i64,
}

/// Aggregates across all pull requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct PrAssignmentStats {
    pub total_prs: i64,
    pub open_prs: i64,
    pub merged_prs: i64,
    pub avg_reviewers_per_pr: f64,
    pub prs_with_no_reviewers: i64,
    pub prs_with_one_reviewer: i64,
    pub prs_with_two_reviewers: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_users: i64,
    pub active_users: i64,
    pub total_assignments: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_assigned_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_assignments: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentStatsResponse {
    pub user_stats: Vec<UserAssignmentStats>,
    pub pr_stats: PrAssignmentStats,
    pub summary: StatsSummary,
}
