use alloctrack_db::models::Comment;
use axum::{Json, extract::{Path, State}};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

use super::parse_id;
use super::project::load_for_collaborator;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
    pub edited_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id.unwrap().to_hex(),
            project_id: c.project_id.to_hex(),
            user_id: c.user_id.to_hex(),
            content: c.content,
            created_at: c.created_at.try_to_rfc3339_string().unwrap_or_default(),
            edited_at: c.edited_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let project = load_for_collaborator(&state, &auth, &project_id).await?;
    let comments = state.projects.list_comments(project.id.unwrap()).await?;
    Ok(Json(comments.into_iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<CommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    let project = load_for_collaborator(&state, &auth, &project_id).await?;
    let comment = state
        .projects
        .add_comment(project.id.unwrap(), auth.user_id, body.content)
        .await?;
    Ok(Json(comment.into()))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(comment_id): Path<String>,
    Json(body): Json<CommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    let cid = parse_id(&comment_id, "comment_id")?;
    let comment = state.projects.comments.find_by_id(cid).await?;
    if comment.user_id != auth.user_id && !auth.is_staff {
        return Err(ApiError::Forbidden(
            "Only the author can edit a comment".to_string(),
        ));
    }

    let comment = state.projects.edit_comment(cid, body.content).await?;
    Ok(Json(comment.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(comment_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cid = parse_id(&comment_id, "comment_id")?;
    let comment = state.projects.comments.find_by_id(cid).await?;
    if comment.user_id != auth.user_id && !auth.is_staff {
        return Err(ApiError::Forbidden(
            "Only the author can delete a comment".to_string(),
        ));
    }

    state
        .projects
        .comments
        .delete_one(bson::doc! { "_id": cid })
        .await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
