use alloctrack_db::models::{CollaboratorRole, Invitation};
use axum::{Json, extract::{Path, State}};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

use super::parse_id;
use super::project::{ProjectResponse, load_for_collaborator};

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: String,
    pub project_id: String,
    pub email: String,
    pub code: String,
    pub expires_at: String,
}

impl From<Invitation> for InvitationResponse {
    fn from(i: Invitation) -> Self {
        Self {
            id: i.id.unwrap().to_hex(),
            project_id: i.project_id.to_hex(),
            email: i.email,
            code: i.code,
            expires_at: i.expires_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<InvitationResponse>>, ApiError> {
    let project = load_for_collaborator(&state, &auth, &project_id).await?;
    let invitations = state
        .projects
        .list_invitations(project.id.unwrap())
        .await?;
    Ok(Json(invitations.into_iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<CreateInvitationRequest>,
) -> Result<Json<InvitationResponse>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let invitation = state
        .workflow
        .create_invitation(pid, body.email, auth.actor())
        .await?;
    Ok(Json(invitation.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invitation_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let iid = parse_id(&invitation_id, "invitation_id")?;
    let invitation = state
        .projects
        .invitations
        .find_by_id(iid)
        .await?;

    if !auth.is_staff {
        match state
            .projects
            .get_role(invitation.project_id, auth.user_id)
            .await?
        {
            Some(CollaboratorRole::Owner) => {}
            _ => {
                return Err(ApiError::Forbidden(
                    "Only a project owner can revoke invitations".to_string(),
                ));
            }
        }
    }

    state
        .projects
        .invitations
        .delete_one(bson::doc! { "_id": iid })
        .await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Accept an invitation to join a project by submitting the code.
pub async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<JoinRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let (project, _collaborator) = state
        .workflow
        .accept_invitation(body.code.trim(), auth.actor())
        .await?;
    Ok(Json(project.into()))
}

/// Explicitly garbage-collect expired invitations.
pub async fn prune(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pruned = state.workflow.prune_invitations(auth.actor()).await?;
    Ok(Json(serde_json::json!({ "pruned": pruned })))
}
