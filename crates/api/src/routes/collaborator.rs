use alloctrack_db::models::CollaboratorRole;
use axum::{Json, extract::{Path, State}};
use serde::Deserialize;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

use super::parse_id;
use super::project::CollaboratorResponse;

#[derive(Debug, Deserialize)]
pub struct UpdateCollaboratorRequest {
    pub role: CollaboratorRole,
}

async fn require_owner(
    state: &AppState,
    auth: &AuthUser,
    project_id: bson::oid::ObjectId,
) -> Result<(), ApiError> {
    if auth.is_staff {
        return Ok(());
    }
    match state.projects.get_role(project_id, auth.user_id).await? {
        Some(CollaboratorRole::Owner) => Ok(()),
        _ => Err(ApiError::Forbidden(
            "Only a project owner can manage collaborators".to_string(),
        )),
    }
}

pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(collaborator_id): Path<String>,
    Json(body): Json<UpdateCollaboratorRequest>,
) -> Result<Json<CollaboratorResponse>, ApiError> {
    let cid = parse_id(&collaborator_id, "collaborator_id")?;
    let collaborator = state.projects.collaborators.find_by_id(cid).await?;
    require_owner(&state, &auth, collaborator.project_id).await?;

    let collaborator = state
        .projects
        .update_collaborator_role(cid, body.role)
        .await?;
    Ok(Json(collaborator.into()))
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(collaborator_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cid = parse_id(&collaborator_id, "collaborator_id")?;
    let collaborator = state.projects.collaborators.find_by_id(cid).await?;
    // Collaborators can always remove themselves
    if collaborator.user_id != auth.user_id {
        require_owner(&state, &auth, collaborator.project_id).await?;
    }

    state.projects.remove_collaborator(cid).await?;
    Ok(Json(serde_json::json!({ "removed": true })))
}
