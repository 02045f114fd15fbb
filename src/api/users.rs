//! User routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{required, ApiErr, AppState};
use crate::error::AppError;
use crate::models::{PullRequestShort, User, UserUpdate};

#[derive(Deserialize)]
pub(super) struct AddUserRequest {
    user_id: Option<String>,
    username: Option<String>,
    team_name: Option<String>,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Deserialize)]
pub(super) struct SetIsActiveRequest {
    user_id: Option<String>,
    is_active: Option<bool>,
}

#[derive(Deserialize)]
pub(super) struct UpdateUserRequest {
    user_id: Option<String>,
    #[serde(flatten)]
    update: UserUpdate,
}

#[derive(Deserialize)]
pub(super) struct UserQuery {
    user_id: Option<String>,
}

#[derive(Serialize)]
pub(super) struct UserResponse {
    user: User,
}

#[derive(Serialize)]
pub(super) struct ReviewResponse {
    user_id: String,
    pull_requests: Vec<PullRequestShort>,
}

/// POST /users/add
pub(super) async fn add_user(
    State(state): State<AppState>,
    payload: Result<Json<AddUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiErr> {
    let Json(req) = payload?;
    let user = User::new(
        required(req.user_id, "user_id")?,
        required(req.username, "username")?,
        required(req.team_name, "team_name")?,
        req.is_active,
    );

    let user = state.services.users.create(state.deadline(), user).await?;

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// POST /users/setIsActive
pub(super) async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiErr> {
    let Json(req) = payload?;
    let user_id = required(req.user_id, "user_id")?;
    let is_active = req
        .is_active
        .ok_or_else(|| AppError::missing_field("is_active"))?;

    let user = state
        .services
        .users
        .set_active(state.deadline(), &user_id, is_active)
        .await?;

    Ok(Json(UserResponse { user }))
}

/// POST /users/update: partial profile update.
pub(super) async fn update_user(
    State(state): State<AppState>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiErr> {
    let Json(req) = payload?;
    let user_id = required(req.user_id, "user_id")?;

    let user = state
        .services
        .users
        .update_profile(state.deadline(), &user_id, req.update)
        .await?;

    Ok(Json(UserResponse { user }))
}

/// GET /users/getReview?user_id=X lists pull requests the user reviews.
pub(super) async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<ReviewResponse>, ApiErr> {
    let Query(params) = query?;
    let user_id = required(params.user_id, "user_id")?;

    let pull_requests = state
        .services
        .pull_requests
        .get_by_reviewer(state.deadline(), &user_id)
        .await?;

    Ok(Json(ReviewResponse {
        user_id,
        pull_requests,
    }))
}
