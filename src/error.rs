//! Application error types.
//!
//! Domain errors are returned as-is up to the HTTP boundary, which renders
//! them by kind. Storage failures are wrapped into the opaque `Database`
//! variant so callers can tell infrastructure trouble from domain rules.

use serde::Serialize;
use thiserror::Error;

/// Field-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("invalid user id")]
    InvalidUserId,

    #[error("invalid username")]
    InvalidUsername,

    #[error("invalid team name")]
    InvalidTeamName,

    #[error("invalid pull request id")]
    InvalidPullRequestId,

    #[error("invalid pull request name")]
    InvalidPullRequestName,

    #[error("invalid author id")]
    InvalidAuthorId,

    #[error("too many reviewers assigned: {count} (max {max})")]
    TooManyReviewers { count: usize, max: usize },

    #[error("duplicate team member id: {user_id}")]
    DuplicateMember { user_id: String },

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("malformed request: {message}")]
    Malformed { message: String },
}

/// Application-level errors returned by services and stores.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Requested resource not found.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Resource with the same key already exists (pull request or team).
    #[error("{resource} already exists: {id}")]
    AlreadyExists { resource: String, id: String },

    /// Input failed validation.
    #[error("Invalid input: {0}")]
    Invalid(ValidationError),

    /// The user exists but is not active.
    #[error("User is not active: {user_id}")]
    UserNotActive { user_id: String },

    /// Mutation attempted on a merged pull request.
    #[error("Pull request is merged: {pull_request_id}")]
    PullRequestMerged { pull_request_id: String },

    /// Reassignment target is not a current reviewer.
    #[error("Reviewer {reviewer_id} is not assigned to pull request {pull_request_id}")]
    NotAssigned {
        pull_request_id: String,
        reviewer_id: String,
    },

    /// No active replacement candidate in the team.
    #[error("No active replacement candidate in team {team_name}")]
    NoCandidate { team_name: String },

    /// The operation ran past its deadline and was aborted.
    #[error("Deadline exceeded: {operation}")]
    DeadlineExceeded { operation: String },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    pub fn already_exists(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn user_not_active(user_id: impl Into<String>) -> Self {
        Self::UserNotActive {
            user_id: user_id.into(),
        }
    }

    pub fn pull_request_merged(pull_request_id: impl Into<String>) -> Self {
        Self::PullRequestMerged {
            pull_request_id: pull_request_id.into(),
        }
    }

    pub fn not_assigned(pull_request_id: impl Into<String>, reviewer_id: impl Into<String>) -> Self {
        Self::NotAssigned {
            pull_request_id: pull_request_id.into(),
            reviewer_id: reviewer_id.into(),
        }
    }

    pub fn no_candidate(team_name: impl Into<String>) -> Self {
        Self::NoCandidate {
            team_name: team_name.into(),
        }
    }

    pub fn deadline_exceeded(operation: impl Into<String>) -> Self {
        Self::DeadlineExceeded {
            operation: operation.into(),
        }
    }

    /// Create a missing field validation error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::Invalid(ValidationError::MissingField {
            field: field.into(),
        })
    }

    /// Create a malformed request validation error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Invalid(ValidationError::Malformed {
            message: message.into(),
        })
    }

    /// Create a database error with optional operation context.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::Invalid(_) => "INVALID_INPUT",
            Self::UserNotActive { .. } => "USER_NOT_ACTIVE",
            Self::PullRequestMerged { .. } => "PR_MERGED",
            Self::NotAssigned { .. } => "NOT_ASSIGNED",
            Self::NoCandidate { .. } => "NO_CANDIDATE",
            Self::DeadlineExceeded { .. } => "DEADLINE_EXCEEDED",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is a domain rule violation rather than an
    /// infrastructure failure or a deadline.
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            Self::DeadlineExceeded { .. } | Self::Database { .. } | Self::Internal { .. }
        )
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

// Conversions from common error types

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}
