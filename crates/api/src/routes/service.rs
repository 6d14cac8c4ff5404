use alloctrack_db::models::{ProjectStatus, Requirement, Service};
use axum::{Json, extract::{Path, State}};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

use super::parse_id;
use super::project::load_for_collaborator;

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub category_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequirementRequest {
    pub resource_id: String,
    pub amount: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub category_id: String,
}

impl From<Service> for ServiceResponse {
    fn from(s: Service) -> Self {
        Self {
            id: s.id.unwrap().to_hex(),
            name: s.name,
            project_id: s.project_id.to_hex(),
            category_id: s.category_id.to_hex(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RequirementResponse {
    pub id: String,
    pub service_id: String,
    pub resource_id: String,
    pub project_id: String,
    pub status: String,
    pub amount: i64,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
}

impl From<Requirement> for RequirementResponse {
    fn from(r: Requirement) -> Self {
        Self {
            id: r.id.unwrap().to_hex(),
            service_id: r.service_id.to_hex(),
            resource_id: r.resource_id.to_hex(),
            project_id: r.project_id.to_hex(),
            status: r.status.as_str().to_string(),
            amount: r.amount,
            start_date: r.start_date.to_string(),
            end_date: r.end_date.to_string(),
            location: r.location,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<ServiceResponse>>, ApiError> {
    let project = load_for_collaborator(&state, &auth, &project_id).await?;
    let services = state
        .services
        .list_for_project(project.id.unwrap())
        .await?;
    Ok(Json(services.into_iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<CreateServiceRequest>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let project = load_for_collaborator(&state, &auth, &project_id).await?;
    if project.status != ProjectStatus::Editable {
        return Err(ApiError::Conflict(
            "Project is not currently editable".to_string(),
        ));
    }
    let category_id = parse_id(&body.category_id, "category_id")?;

    let service = state
        .services
        .create(project.id.unwrap(), category_id, body.name)
        .await?;
    Ok(Json(service.into()))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(service_id): Path<String>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let sid = parse_id(&service_id, "service_id")?;
    let service = state.services.base.find_by_id(sid).await?;
    load_for_collaborator(&state, &auth, &service.project_id.to_hex()).await?;
    Ok(Json(service.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(service_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sid = parse_id(&service_id, "service_id")?;
    let service = state.services.base.find_by_id(sid).await?;
    let project = load_for_collaborator(&state, &auth, &service.project_id.to_hex()).await?;
    if project.status != ProjectStatus::Editable {
        return Err(ApiError::Conflict(
            "Project is not currently editable".to_string(),
        ));
    }

    state.services.delete(sid).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn requirements(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(service_id): Path<String>,
) -> Result<Json<Vec<RequirementResponse>>, ApiError> {
    let sid = parse_id(&service_id, "service_id")?;
    let service = state.services.base.find_by_id(sid).await?;
    load_for_collaborator(&state, &auth, &service.project_id.to_hex()).await?;

    let requirements = state.services.list_requirements(sid).await?;
    Ok(Json(requirements.into_iter().map(Into::into).collect()))
}

pub async fn create_requirement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(service_id): Path<String>,
    Json(body): Json<CreateRequirementRequest>,
) -> Result<Json<RequirementResponse>, ApiError> {
    let sid = parse_id(&service_id, "service_id")?;
    let service = state.services.base.find_by_id(sid).await?;
    let project = load_for_collaborator(&state, &auth, &service.project_id.to_hex()).await?;
    if project.status != ProjectStatus::Editable {
        return Err(ApiError::Conflict(
            "Project is not currently editable".to_string(),
        ));
    }
    let resource_id = parse_id(&body.resource_id, "resource_id")?;

    let requirement = state
        .services
        .create_requirement(
            &service,
            project.consortium_id,
            resource_id,
            body.amount,
            body.start_date,
            body.end_date,
        )
        .await?;
    Ok(Json(requirement.into()))
}
