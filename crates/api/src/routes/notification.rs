use alloctrack_db::models::Notification;
use alloctrack_services::dao::base::PaginationParams;
use axum::{Json, extract::{Path, Query, State}};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

use super::parse_id;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub unread_only: bool,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub event: String,
    pub entity_type: String,
    pub entity_id: String,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub items: Vec<NotificationResponse>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id.unwrap().to_hex(),
            event: n.event,
            entity_type: n.source.entity_type,
            entity_id: n.source.entity_id.to_hex(),
            is_read: n.is_read,
            created_at: n.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let defaults = PaginationParams::default();
    let pagination = PaginationParams {
        page: params.page.unwrap_or(defaults.page),
        per_page: params.per_page.unwrap_or(defaults.per_page),
    };
    let page = state
        .notifications
        .list_for_email(&auth.email, params.unread_only, &pagination)
        .await?;
    Ok(Json(NotificationListResponse {
        items: page.items.into_iter().map(Into::into).collect(),
        total: page.total,
        page: page.page,
        total_pages: page.total_pages,
    }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<String>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let nid = parse_id(&notification_id, "notification_id")?;
    let notification = state.notifications.mark_read(nid, &auth.email).await?;
    Ok(Json(notification.into()))
}
