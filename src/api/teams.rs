//! Team routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{required, ApiErr, AppState};
use crate::models::{Team, TeamMember};

#[derive(Deserialize)]
pub(super) struct TeamRequest {
    team_name: Option<String>,
    #[serde(default)]
    members: Vec<TeamMember>,
}

#[derive(Deserialize)]
pub(super) struct TeamQuery {
    team_name: Option<String>,
}

#[derive(Serialize)]
pub(super) struct TeamResponse {
    team: Team,
}

/// POST /team/add: create a team and its members.
pub(super) async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<TeamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiErr> {
    let Json(req) = payload?;
    let team_name = required(req.team_name, "team_name")?;

    let team = state
        .services
        .teams
        .create(state.deadline(), Team::new(team_name, req.members))
        .await?;

    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

/// GET /team/get?team_name=
pub(super) async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<TeamResponse>, ApiErr> {
    let Query(params) = query?;
    let team_name = required(params.team_name, "team_name")?;

    let team = state
        .services
        .teams
        .get(state.deadline(), &team_name)
        .await?;

    Ok(Json(TeamResponse { team }))
}

/// POST /team/update: add or move members into an existing team.
pub(super) async fn update_team(
    State(state): State<AppState>,
    payload: Result<Json<TeamRequest>, JsonRejection>,
) -> Result<Json<TeamResponse>, ApiErr> {
    let Json(req) = payload?;
    let team_name = required(req.team_name, "team_name")?;

    let team = state
        .services
        .teams
        .update_members(state.deadline(), &team_name, req.members)
        .await?;

    Ok(Json(TeamResponse { team }))
}
