use alloctrack_db::models::{Category, Resource};
use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct CategoryDao {
    pub base: BaseDao<Category>,
    resources: BaseDao<Resource>,
}

impl CategoryDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Category::COLLECTION),
            resources: BaseDao::new(db, Resource::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        name: String,
        is_public: bool,
        resource_ids: Vec<ObjectId>,
    ) -> DaoResult<Category> {
        self.check_resources_exist(&resource_ids).await?;

        let now = DateTime::now();
        let category = Category {
            id: None,
            name,
            is_public,
            resource_ids,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&category).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list(&self, include_private: bool) -> DaoResult<Vec<Category>> {
        let filter = if include_private {
            doc! {}
        } else {
            doc! { "is_public": true }
        };
        self.base.find_many(filter, Some(doc! { "name": 1 })).await
    }

    pub async fn update_resources(
        &self,
        category_id: ObjectId,
        resource_ids: Vec<ObjectId>,
    ) -> DaoResult<Category> {
        self.check_resources_exist(&resource_ids).await?;
        self.base
            .update_by_id(category_id, doc! { "$set": { "resource_ids": resource_ids } })
            .await?;
        self.base.find_by_id(category_id).await
    }

    async fn check_resources_exist(&self, resource_ids: &[ObjectId]) -> DaoResult<()> {
        if resource_ids.is_empty() {
            return Ok(());
        }
        let count = self
            .resources
            .count(doc! { "_id": { "$in": resource_ids } })
            .await?;
        if count as usize != resource_ids.len() {
            return Err(DaoError::Validation(
                "One or more resources do not exist".to_string(),
            ));
        }
        Ok(())
    }
}
