use alloctrack_db::models::{Collaborator, Project, ProjectStatus};
use axum::{Json, extract::{Path, State}};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

use super::parse_id;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub consortium_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: String,
    pub consortium_id: String,
    pub fairshare: f64,
    pub tags: Vec<String>,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id.unwrap().to_hex(),
            name: p.name,
            description: p.description,
            status: p.status.as_str().to_string(),
            consortium_id: p.consortium_id.to_hex(),
            fairshare: p.fairshare,
            tags: p.tags,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CollaboratorResponse {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub role: String,
}

impl From<Collaborator> for CollaboratorResponse {
    fn from(c: Collaborator) -> Self {
        Self {
            id: c.id.unwrap().to_hex(),
            project_id: c.project_id.to_hex(),
            user_id: c.user_id.to_hex(),
            role: c.role.as_str().to_string(),
        }
    }
}

pub(crate) async fn load_for_collaborator(
    state: &AppState,
    auth: &AuthUser,
    project_id: &str,
) -> Result<Project, ApiError> {
    let pid = parse_id(project_id, "project_id")?;
    let project = state.projects.base.find_by_id(pid).await?;
    if auth.is_staff {
        return Ok(project);
    }
    if state.projects.is_collaborator(pid, auth.user_id).await? {
        return Ok(project);
    }
    // The consortium manager can see the projects they review
    let consortium = state
        .consortia
        .base
        .find_by_id(project.consortium_id)
        .await?;
    if consortium.manager_id == auth.user_id {
        return Ok(project);
    }
    Err(ApiError::Forbidden(
        "Not a collaborator on this project".to_string(),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = state.projects.find_user_projects(auth.user_id).await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let cid = parse_id(&body.consortium_id, "consortium_id")?;
    let consortium = state.consortia.base.find_by_id(cid).await?;
    if !consortium.is_public && !auth.is_staff && consortium.manager_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Consortium is not open for new projects".to_string(),
        ));
    }

    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("A project name is required".to_string()));
    }

    let project = state
        .projects
        .create(body.name, body.description, cid, body.tags, auth.user_id)
        .await?;
    Ok(Json(project.into()))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = load_for_collaborator(&state, &auth, &project_id).await?;
    Ok(Json(project.into()))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = load_for_collaborator(&state, &auth, &project_id).await?;
    if project.status != ProjectStatus::Editable {
        return Err(ApiError::Conflict(
            "Project is not currently editable".to_string(),
        ));
    }
    let project = state
        .projects
        .update_details(project.id.unwrap(), body.name, body.description, body.tags)
        .await?;
    Ok(Json(project.into()))
}

pub async fn submit_for_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let project = state.workflow.submit_for_review(pid, auth.actor()).await?;
    Ok(Json(project.into()))
}

pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let project = state.workflow.approve_project(pid, auth.actor()).await?;
    Ok(Json(project.into()))
}

pub async fn request_changes(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let project = state.workflow.request_changes(pid, auth.actor()).await?;
    Ok(Json(project.into()))
}

pub async fn collaborators(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<CollaboratorResponse>>, ApiError> {
    let project = load_for_collaborator(&state, &auth, &project_id).await?;
    let collaborators = state
        .projects
        .list_collaborators(project.id.unwrap())
        .await?;
    Ok(Json(collaborators.into_iter().map(Into::into).collect()))
}
