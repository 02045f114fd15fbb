//! Pull request model.

use crate::error::{AppError, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of reviewers on a pull request.
pub const MAX_REVIEWERS: usize = 2;

/// Lifecycle state of a pull request. `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl std::str::FromStr for PullRequestStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "MERGED" => Ok(Self::Merged),
            other => Err(AppError::internal(format!(
                "unknown pull request status: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked pull request with its assigned reviewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(rename = "pull_request_id")]
    pub id: String,

    #[serde(rename = "pull_request_name")]
    pub name: String,

    pub author_id: String,

    pub status: PullRequestStatus,

    /// Reviewer user ids, at most [`MAX_REVIEWERS`].
    pub assigned_reviewers: Vec<String>,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,

    pub updated_at: DateTime<Utc>,
}

impl PullRequest {
    /// Build a new open pull request stamped with the current time.
    pub fn open(
        id: impl Into<String>,
        name: impl Into<String>,
        author_id: impl Into<String>,
        assigned_reviewers: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            author_id: author_id.into(),
            status: PullRequestStatus::Open,
            assigned_reviewers,
            created_at: now,
            merged_at: None,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::InvalidPullRequestId);
        }
        if self.name.is_empty() {
            return Err(ValidationError::InvalidPullRequestName);
        }
        if self.author_id.is_empty() {
            return Err(ValidationError::InvalidAuthorId);
        }
        if self.assigned_reviewers.len() > MAX_REVIEWERS {
            return Err(ValidationError::TooManyReviewers {
                count: self.assigned_reviewers.len(),
                max: MAX_REVIEWERS,
            });
        }
        Ok(())
    }

    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|r| r == user_id)
    }

    /// Replace every occurrence of `old` with `new`, keeping order and length.
    pub fn replace_reviewer(&mut self, old: &str, new: &str) {
        for reviewer in self.assigned_reviewers.iter_mut() {
            if reviewer == old {
                *reviewer = new.to_string();
            }
        }
    }

    pub fn short(&self) -> PullRequestShort {
        PullRequestShort {
            id: self.id.clone(),
            name: self.name.clone(),
            author_id: self.author_id.clone(),
            status: self.status,
        }
    }
}

/// Compact pull request listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestShort {
    #[serde(rename = "pull_request_id")]
    pub id: String,

    #[serde(rename = "pull_request_name")]
    pub name: String,

    pub author_id: String,

    pub status: PullRequestStatus,
}
