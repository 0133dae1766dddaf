//! Team HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiError, AppState};
use sigil_core::{CreateTeamRequest, Team, TeamRepository};

/// Request body for adding a team member.
#[derive(Debug, Deserialize)]
pub struct AddMemberBody {
    pub user_id: Uuid,
}

/// Create a new team. The owner becomes its first member.
///
/// # Returns
/// - 201 Created with the team
pub async fn create_team(
    State(state): State<AppState>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    let team = state.db.teams.create(req).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// Add a user to a team. Idempotent.
///
/// # Returns
/// - 204 No Content on success
pub async fn add_team_member(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
    Json(body): Json<AddMemberBody>,
) -> Result<StatusCode, ApiError> {
    state.db.teams.add_member(team_id, body.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a user from a team.
///
/// # Returns
/// - 204 No Content on success
/// - 404 Not Found if the user is not a member
pub async fn remove_team_member(
    State(state): State<AppState>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state.db.teams.remove_member(team_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
