use alloctrack_db::models::Resource;
use axum::{Json, extract::{Path, State}};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

use super::parse_id;

#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub description: String,
    pub total_available: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResourceRequest {
    pub short_name: Option<String>,
    pub units: Option<String>,
    pub description: Option<String>,
    pub total_available: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub units: String,
    pub description: String,
    pub total_available: i64,
}

impl From<Resource> for ResourceResponse {
    fn from(r: Resource) -> Self {
        Self {
            id: r.id.unwrap().to_hex(),
            name: r.name,
            short_name: r.short_name,
            units: r.units,
            description: r.description,
            total_available: r.total_available,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<ResourceResponse>>, ApiError> {
    let resources = state.resources.list().await?;
    Ok(Json(resources.into_iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateResourceRequest>,
) -> Result<Json<ResourceResponse>, ApiError> {
    if !auth.is_staff {
        return Err(ApiError::Forbidden("Staff only".to_string()));
    }
    let resource = state
        .resources
        .create(
            body.name,
            body.short_name,
            body.units,
            body.description,
            body.total_available,
        )
        .await?;
    Ok(Json(resource.into()))
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(resource_id): Path<String>,
) -> Result<Json<ResourceResponse>, ApiError> {
    let rid = parse_id(&resource_id, "resource_id")?;
    let resource = state.resources.base.find_by_id(rid).await?;
    Ok(Json(resource.into()))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(resource_id): Path<String>,
    Json(body): Json<UpdateResourceRequest>,
) -> Result<Json<ResourceResponse>, ApiError> {
    if !auth.is_staff {
        return Err(ApiError::Forbidden("Staff only".to_string()));
    }
    let rid = parse_id(&resource_id, "resource_id")?;
    let resource = state
        .resources
        .update(
            rid,
            body.short_name,
            body.units,
            body.description,
            body.total_available,
        )
        .await?;
    Ok(Json(resource.into()))
}
