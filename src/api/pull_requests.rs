//! Pull request routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{required, ApiErr, AppState};
use crate::models::PullRequest;

#[derive(Deserialize)]
pub(super) struct CreateRequest {
    pull_request_id: Option<String>,
    pull_request_name: Option<String>,
    author_id: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct PullRequestIdRequest {
    pull_request_id: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct ReassignRequest {
    pull_request_id: Option<String>,
    old_user_id: Option<String>,
}

#[derive(Serialize)]
pub(super) struct PullRequestResponse {
    pr: PullRequest,
}

#[derive(Serialize)]
pub(super) struct ReassignResponse {
    pr: PullRequest,
    replaced_by: String,
}

/// POST /pullRequest/create: open a pull request with auto-assigned reviewers.
pub(super) async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequestResponse>), ApiErr> {
    let Json(req) = payload?;
    let id = required(req.pull_request_id, "pull_request_id")?;
    let name = required(req.pull_request_name, "pull_request_name")?;
    let author_id = required(req.author_id, "author_id")?;

    let pr = state
        .services
        .pull_requests
        .create(state.deadline(), &id, &name, &author_id)
        .await?;

    Ok((StatusCode::CREATED, Json(PullRequestResponse { pr })))
}

/// POST /pullRequest/merge: idempotent.
pub(super) async fn merge(
    State(state): State<AppState>,
    payload: Result<Json<PullRequestIdRequest>, JsonRejection>,
) -> Result<Json<PullRequestResponse>, ApiErr> {
    let Json(req) = payload?;
    let id = required(req.pull_request_id, "pull_request_id")?;

    let pr = state
        .services
        .pull_requests
        .merge(state.deadline(), &id)
        .await?;

    Ok(Json(PullRequestResponse { pr }))
}

/// POST /pullRequest/reassign
pub(super) async fn reassign(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiErr> {
    let Json(req) = payload?;
    let id = required(req.pull_request_id, "pull_request_id")?;
    let old_user_id = required(req.old_user_id, "old_user_id")?;

    let (pr, replaced_by) = state
        .services
        .pull_requests
        .reassign_reviewer(state.deadline(), &id, &old_user_id)
        .await?;

    Ok(Json(ReassignResponse { pr, replaced_by }))
}

/// GET /pullRequest/get?pull_request_id=
pub(super) async fn get(
    State(state): State<AppState>,
    query: Result<Query<PullRequestIdRequest>, QueryRejection>,
) -> Result<Json<PullRequestResponse>, ApiErr> {
    let Query(params) = query?;
    let id = required(params.pull_request_id, "pull_request_id")?;

    let pr = state
        .services
        .pull_requests
        .get_by_id(state.deadline(), &id)
        .await?;

    Ok(Json(PullRequestResponse { pr }))
}
