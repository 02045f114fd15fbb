//! HTTP surface.
//!
//! Thin axum handlers over [`Services`]. Each request gets its own
//! [`Deadline`] derived from the configured request timeout; domain errors
//! are rendered as `{"code", "message"}` with a status chosen by kind.

mod pull_requests;
mod stats;
mod teams;
mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::Deadline;
use crate::error::AppError;
use crate::services::Services;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(services: Services, request_timeout: Duration) -> Self {
        Self {
            services: Arc::new(services),
            request_timeout,
        }
    }

    /// Fresh deadline for the request being handled.
    fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}

// ── Error handling ───────────────────────────────────────────────────────────

/// JSON error body.
#[derive(Serialize)]
struct ApiError {
    code: String,
    message: String,
}

/// Wrapper to make AppError usable as an axum error response.
struct ApiErr(AppError);

impl ApiErr {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::AlreadyExists { .. }
            | AppError::UserNotActive { .. }
            | AppError::PullRequestMerged { .. }
            | AppError::NotAssigned { .. }
            | AppError::NoCandidate { .. } => StatusCode::CONFLICT,
            AppError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Database { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("[api] {} {}", status.as_u16(), self.0);
        }
        (
            status,
            Json(ApiError {
                code: self.0.kind().to_string(),
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::malformed(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::malformed(rejection.body_text()))
    }
}

/// A required request field: present and non-empty.
fn required(value: Option<String>, field: &str) -> Result<String, ApiErr> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::missing_field(field).into()),
    }
}

// ── Route builder ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/team/add", post(teams::add_team))
        .route("/team/get", get(teams::get_team))
        .route("/team/update", post(teams::update_team))
        .route("/users/add", post(users::add_user))
        .route("/users/setIsActive", post(users::set_is_active))
        .route("/users/update", post(users::update_user))
        .route("/users/getReview", get(users::get_review))
        .route("/pullRequest/create", post(pull_requests::create))
        .route("/pullRequest/merge", post(pull_requests::merge))
        .route("/pullRequest/reassign", post(pull_requests::reassign))
        .route("/pullRequest/get", get(pull_requests::get))
        .route("/stats/assignments", get(stats::assignments))
        .route("/stats/user", get(stats::user))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Service is running",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_status_by_kind() {
        let cases = [
            (AppError::missing_field("team_name"), StatusCode::BAD_REQUEST),
            (
                AppError::from(ValidationError::InvalidPullRequestName),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::not_found_with_id("User", "u1"), StatusCode::NOT_FOUND),
            (AppError::already_exists("PullRequest", "pr-1"), StatusCode::CONFLICT),
            (AppError::user_not_active("u1"), StatusCode::CONFLICT),
            (AppError::pull_request_merged("pr-1"), StatusCode::CONFLICT),
            (AppError::not_assigned("pr-1", "u2"), StatusCode::CONFLICT),
            (AppError::no_candidate("core"), StatusCode::CONFLICT),
            (AppError::deadline_exceeded("merge"), StatusCode::GATEWAY_TIMEOUT),
            (AppError::database("locked"), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::internal("bug"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiErr(err).status(), status);
        }
    }

    #[test]
    fn test_required_field() {
        assert_eq!(required(Some("pr-1".into()), "id").ok().as_deref(), Some("pr-1"));
        assert!(required(Some(String::new()), "id").is_err());
        assert!(required(None, "id").is_err());
    }
}
