use alloctrack_db::models::Category;
use axum::{Json, extract::{Path, State}};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

use super::parse_id;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub resource_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub resource_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub is_public: bool,
    pub resource_ids: Vec<String>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id.unwrap().to_hex(),
            name: c.name,
            is_public: c.is_public,
            resource_ids: c.resource_ids.iter().map(|r| r.to_hex()).collect(),
        }
    }
}

fn parse_resource_ids(ids: &[String]) -> Result<Vec<ObjectId>, ApiError> {
    ids.iter().map(|id| parse_id(id, "resource_id")).collect()
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.categories.list(auth.is_staff).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    if !auth.is_staff {
        return Err(ApiError::Forbidden("Staff only".to_string()));
    }
    let resource_ids = parse_resource_ids(&body.resource_ids)?;
    let category = state
        .categories
        .create(body.name, body.is_public, resource_ids)
        .await?;
    Ok(Json(category.into()))
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(category_id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let cid = parse_id(&category_id, "category_id")?;
    let category = state.categories.base.find_by_id(cid).await?;
    Ok(Json(category.into()))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<String>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    if !auth.is_staff {
        return Err(ApiError::Forbidden("Staff only".to_string()));
    }
    let cid = parse_id(&category_id, "category_id")?;
    let resource_ids = parse_resource_ids(&body.resource_ids)?;
    let category = state.categories.update_resources(cid, resource_ids).await?;
    Ok(Json(category.into()))
}
