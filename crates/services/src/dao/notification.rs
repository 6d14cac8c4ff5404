use alloctrack_db::models::Notification;
use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};

pub struct NotificationDao {
    pub base: BaseDao<Notification>,
}

impl NotificationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
        }
    }

    pub async fn list_for_email(
        &self,
        email: &str,
        unread_only: bool,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Notification>> {
        let mut filter = doc! { "email": email.to_lowercase() };
        if unread_only {
            filter.insert("is_read", false);
        }
        self.base
            .find_paginated(filter, Some(doc! { "created_at": -1 }), params)
            .await
    }

    pub async fn mark_read(&self, notification_id: ObjectId, email: &str) -> DaoResult<Notification> {
        let updated = self
            .base
            .update_one(
                doc! { "_id": notification_id, "email": email.to_lowercase() },
                doc! { "$set": { "is_read": true, "read_at": DateTime::now() } },
            )
            .await?;
        if !updated {
            // Either missing or someone else's notification
            let exists = self
                .base
                .find_one(doc! { "_id": notification_id, "email": email.to_lowercase() })
                .await?;
            if exists.is_none() {
                return Err(DaoError::NotFound);
            }
        }
        self.base.find_by_id(notification_id).await
    }
}
