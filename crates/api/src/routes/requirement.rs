use alloctrack_services::workflow::RequirementAmendment;
use axum::{Json, extract::{Path, State}};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

use super::parse_id;
use super::project::load_for_collaborator;
use super::service::RequirementResponse;

#[derive(Debug, Deserialize)]
pub struct AmendRequirementRequest {
    pub amount: Option<i64>,
    pub resource_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ProvisionRequest {
    pub location: String,
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(requirement_id): Path<String>,
) -> Result<Json<RequirementResponse>, ApiError> {
    let rid = parse_id(&requirement_id, "requirement_id")?;
    let requirement = state.services.requirements.find_by_id(rid).await?;
    load_for_collaborator(&state, &auth, &requirement.project_id.to_hex()).await?;
    Ok(Json(requirement.into()))
}

/// Amend a requirement while it is still requested. The quota check only
/// happens at approval time.
pub async fn amend(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(requirement_id): Path<String>,
    Json(body): Json<AmendRequirementRequest>,
) -> Result<Json<RequirementResponse>, ApiError> {
    let rid = parse_id(&requirement_id, "requirement_id")?;
    let resource_id = body
        .resource_id
        .as_deref()
        .map(|id| parse_id(id, "resource_id"))
        .transpose()?;

    let requirement = state
        .workflow
        .amend_requirement(
            rid,
            RequirementAmendment {
                amount: body.amount,
                resource_id,
                start_date: body.start_date,
                end_date: body.end_date,
            },
            auth.actor(),
        )
        .await?;
    Ok(Json(requirement.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(requirement_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rid = parse_id(&requirement_id, "requirement_id")?;
    state.workflow.delete_requirement(rid, auth.actor()).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(requirement_id): Path<String>,
) -> Result<Json<RequirementResponse>, ApiError> {
    let rid = parse_id(&requirement_id, "requirement_id")?;
    let requirement = state.workflow.approve_requirement(rid, auth.actor()).await?;
    Ok(Json(requirement.into()))
}

pub async fn decline(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(requirement_id): Path<String>,
) -> Result<Json<RequirementResponse>, ApiError> {
    let rid = parse_id(&requirement_id, "requirement_id")?;
    let requirement = state.workflow.decline_requirement(rid, auth.actor()).await?;
    Ok(Json(requirement.into()))
}

pub async fn provision(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(requirement_id): Path<String>,
    Json(body): Json<ProvisionRequest>,
) -> Result<Json<RequirementResponse>, ApiError> {
    let rid = parse_id(&requirement_id, "requirement_id")?;
    let requirement = state
        .workflow
        .provision_requirement(rid, body.location, auth.actor())
        .await?;
    Ok(Json(requirement.into()))
}
