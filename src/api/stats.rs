//! Statistics routes. Responses are returned unwrapped.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::{required, ApiErr, AppState};
use crate::models::{AssignmentStatsResponse, UserAssignmentStats};

#[derive(Deserialize)]
pub(super) struct UserStatsQuery {
    user_id: Option<String>,
}

/// GET /stats/assignments
pub(super) async fn assignments(
    State(state): State<AppState>,
) -> Result<Json<AssignmentStatsResponse>, ApiErr> {
    let stats = state
        .services
        .stats
        .get_assignment_stats(state.deadline())
        .await?;
    Ok(Json(stats))
}

/// GET /stats/user?user_id=
pub(super) async fn user(
    State(state): State<AppState>,
    query: Result<Query<UserStatsQuery>, QueryRejection>,
) -> Result<Json<UserAssignmentStats>, ApiErr> {
    let Query(params) = query?;
    let user_id = required(params.user_id, "user_id")?;

    let stats = state
        .services
        .stats
        .get_user_stats(state.deadline(), &user_id)
        .await?;
    Ok(Json(stats))
}
