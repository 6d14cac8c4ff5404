use alloctrack_db::models::{Quota, Resource};
use bson::{DateTime, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct ResourceDao {
    pub base: BaseDao<Resource>,
    quotas: BaseDao<Quota>,
}

impl ResourceDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Resource::COLLECTION),
            quotas: BaseDao::new(db, Quota::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        name: String,
        short_name: String,
        units: String,
        description: String,
        total_available: i64,
    ) -> DaoResult<Resource> {
        if total_available < 0 {
            return Err(DaoError::Validation(
                "Total available cannot be negative".to_string(),
            ));
        }
        let now = DateTime::now();
        let resource = Resource {
            id: None,
            name,
            short_name,
            units,
            description,
            total_available,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&resource).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list(&self) -> DaoResult<Vec<Resource>> {
        self.base.find_many(doc! {}, Some(doc! { "name": 1 })).await
    }

    pub async fn update(
        &self,
        resource_id: ObjectId,
        short_name: Option<String>,
        units: Option<String>,
        description: Option<String>,
        total_available: Option<i64>,
    ) -> DaoResult<Resource> {
        let mut update = bson::Document::new();
        if let Some(short_name) = short_name {
            update.insert("short_name", short_name);
        }
        if let Some(units) = units {
            update.insert("units", units);
        }
        if let Some(description) = description {
            update.insert("description", description);
        }
        if let Some(total) = total_available {
            // The total available must stay at or above the sum of the quotas
            // already granted against the resource.
            let granted = self.total_granted(resource_id).await?;
            if total < granted {
                return Err(DaoError::Validation(format!(
                    "Total available ({}) cannot be less than total quotas ({})",
                    total, granted
                )));
            }
            update.insert("total_available", total);
        }

        if !update.is_empty() {
            self.base
                .update_by_id(resource_id, doc! { "$set": update })
                .await?;
        }
        self.base.find_by_id(resource_id).await
    }

    /// Sum of quota amounts granted against a resource across all consortia.
    pub async fn total_granted(&self, resource_id: ObjectId) -> DaoResult<i64> {
        let pipeline = vec![
            doc! { "$match": { "resource_id": resource_id } },
            doc! { "$group": { "_id": null, "total": { "$sum": "$amount" } } },
        ];
        let mut cursor = self.quotas.collection().aggregate(pipeline).await?;
        if let Some(doc) = cursor.try_next().await? {
            Ok(doc.get_i64("total").unwrap_or_default())
        } else {
            Ok(0)
        }
    }
}
