//! Data models for the application.
//!
//! These models represent the entities stored in SQLite and returned over
//! the HTTP API. JSON field names follow the public API contract.

pub mod pull_request;
pub mod stats;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{PullRequest, PullRequestShort, PullRequestStatus, MAX_REVIEWERS};
pub use stats::{AssignmentStatsResponse, PrAssignmentStats, StatsSummary, UserAssignmentStats};
pub use team::{Team, TeamMember};
pub use user::{User, UserUpdate};
