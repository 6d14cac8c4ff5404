use alloctrack_db::models::Consortium;
use alloctrack_services::workflow::QuotaUsage;
use axum::{Json, extract::{Path, State}};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

use super::parse_id;
use super::project::ProjectResponse;

#[derive(Debug, Deserialize)]
pub struct CreateConsortiumRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub manager_id: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "default_fairshare")]
    pub fairshare: f64,
}

fn default_fairshare() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct SetQuotaRequest {
    pub resource_id: String,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct ConsortiumResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub manager_id: String,
    pub is_public: bool,
    pub fairshare: f64,
}

impl From<Consortium> for ConsortiumResponse {
    fn from(c: Consortium) -> Self {
        Self {
            id: c.id.unwrap().to_hex(),
            name: c.name,
            description: c.description,
            manager_id: c.manager_id.to_hex(),
            is_public: c.is_public,
            fairshare: c.fairshare,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuotaUsageResponse {
    pub resource_id: String,
    pub resource_name: String,
    pub units: String,
    pub quota: i64,
    pub requested_total: i64,
    pub requested_count: i64,
    pub approved_total: i64,
    pub approved_count: i64,
    pub provisioned_total: i64,
    pub provisioned_count: i64,
    pub declined_total: i64,
    pub declined_count: i64,
    pub consumed: i64,
    pub available: i64,
}

impl From<QuotaUsage> for QuotaUsageResponse {
    fn from(u: QuotaUsage) -> Self {
        Self {
            resource_id: u.resource_id.to_hex(),
            resource_name: u.resource_name,
            units: u.units,
            quota: u.quota,
            requested_total: u.requested_total,
            requested_count: u.requested_count,
            approved_total: u.approved_total,
            approved_count: u.approved_count,
            provisioned_total: u.provisioned_total,
            provisioned_count: u.provisioned_count,
            declined_total: u.declined_total,
            declined_count: u.declined_count,
            consumed: u.consumed,
            available: u.available,
        }
    }
}

async fn load_visible(
    state: &AppState,
    auth: &AuthUser,
    consortium_id: &str,
) -> Result<Consortium, ApiError> {
    let cid = parse_id(consortium_id, "consortium_id")?;
    let consortium = state.consortia.base.find_by_id(cid).await?;
    if !consortium.is_public && !auth.is_staff && consortium.manager_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Consortium is not visible to you".to_string(),
        ));
    }
    Ok(consortium)
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ConsortiumResponse>>, ApiError> {
    let consortia = state
        .consortia
        .find_visible(auth.user_id, auth.is_staff)
        .await?;
    Ok(Json(consortia.into_iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateConsortiumRequest>,
) -> Result<Json<ConsortiumResponse>, ApiError> {
    if !auth.is_staff {
        return Err(ApiError::Forbidden("Staff only".to_string()));
    }
    let manager_id = parse_id(&body.manager_id, "manager_id")?;
    // The manager must be a real user
    state.users.base.find_by_id(manager_id).await?;

    let consortium = state
        .consortia
        .create(
            body.name,
            body.description,
            manager_id,
            body.is_public,
            body.fairshare,
        )
        .await?;
    Ok(Json(consortium.into()))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(consortium_id): Path<String>,
) -> Result<Json<ConsortiumResponse>, ApiError> {
    let consortium = load_visible(&state, &auth, &consortium_id).await?;
    Ok(Json(consortium.into()))
}

/// Quotas for the consortium with live usage per resource: the quota
/// amount, per-status totals, and what is still available.
pub async fn quotas(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(consortium_id): Path<String>,
) -> Result<Json<Vec<QuotaUsageResponse>>, ApiError> {
    let consortium = load_visible(&state, &auth, &consortium_id).await?;
    let report = state.workflow.consumption(consortium.id.unwrap()).await?;
    Ok(Json(report.into_iter().map(Into::into).collect()))
}

pub async fn set_quota(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(consortium_id): Path<String>,
    Json(body): Json<SetQuotaRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !auth.is_staff {
        return Err(ApiError::Forbidden("Staff only".to_string()));
    }
    let cid = parse_id(&consortium_id, "consortium_id")?;
    let rid = parse_id(&body.resource_id, "resource_id")?;
    // The consortium must exist
    state.consortia.base.find_by_id(cid).await?;

    let quota = state.consortia.set_quota(cid, rid, body.amount).await?;
    Ok(Json(serde_json::json!({
        "consortium_id": quota.consortium_id.to_hex(),
        "resource_id": quota.resource_id.to_hex(),
        "amount": quota.amount,
    })))
}

pub async fn projects(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(consortium_id): Path<String>,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let cid = parse_id(&consortium_id, "consortium_id")?;
    let consortium = state.consortia.base.find_by_id(cid).await?;
    if !auth.is_staff && consortium.manager_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Only the consortium manager can list its projects".to_string(),
        ));
    }
    let projects = state.projects.find_by_consortium(cid).await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}
