use alloctrack_db::models::{Consortium, Quota, Resource};
use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct ConsortiumDao {
    pub base: BaseDao<Consortium>,
    pub quotas: BaseDao<Quota>,
    resources: BaseDao<Resource>,
}

impl ConsortiumDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Consortium::COLLECTION),
            quotas: BaseDao::new(db, Quota::COLLECTION),
            resources: BaseDao::new(db, Resource::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        name: String,
        description: String,
        manager_id: ObjectId,
        is_public: bool,
        fairshare: f64,
    ) -> DaoResult<Consortium> {
        let now = DateTime::now();
        let consortium = Consortium {
            id: None,
            name,
            description,
            manager_id,
            is_public,
            fairshare,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&consortium).await?;
        self.base.find_by_id(id).await
    }

    /// Consortia visible to a user: public ones plus any they manage.
    /// Staff see everything.
    pub async fn find_visible(&self, user_id: ObjectId, is_staff: bool) -> DaoResult<Vec<Consortium>> {
        let filter = if is_staff {
            doc! {}
        } else {
            doc! { "$or": [ { "is_public": true }, { "manager_id": user_id } ] }
        };
        self.base.find_many(filter, Some(doc! { "name": 1 })).await
    }

    /// Creates or replaces the quota for a consortium/resource pair.
    ///
    /// The sum of quotas granted against a resource must not exceed the
    /// amount of the resource that exists.
    pub async fn set_quota(
        &self,
        consortium_id: ObjectId,
        resource_id: ObjectId,
        amount: i64,
    ) -> DaoResult<Quota> {
        if amount < 0 {
            return Err(DaoError::Validation(
                "Quota amount cannot be negative".to_string(),
            ));
        }

        let resource = self.resources.find_by_id(resource_id).await?;

        let granted_elsewhere = {
            use futures::TryStreamExt;
            let pipeline = vec![
                doc! { "$match": {
                    "resource_id": resource_id,
                    "consortium_id": { "$ne": consortium_id },
                } },
                doc! { "$group": { "_id": null, "total": { "$sum": "$amount" } } },
            ];
            let mut cursor = self.quotas.collection().aggregate(pipeline).await?;
            match cursor.try_next().await? {
                Some(doc) => doc.get_i64("total").unwrap_or_default(),
                None => 0,
            }
        };

        if granted_elsewhere + amount > resource.total_available {
            return Err(DaoError::Validation(format!(
                "Quota would take total granted to {} but only {} of {} is available",
                granted_elsewhere + amount,
                resource.format_amount(resource.total_available),
                resource.name,
            )));
        }

        let now = DateTime::now();
        self.quotas
            .collection()
            .update_one(
                doc! { "consortium_id": consortium_id, "resource_id": resource_id },
                doc! {
                    "$set": { "amount": amount, "updated_at": now },
                    "$setOnInsert": {
                        "consortium_id": consortium_id,
                        "resource_id": resource_id,
                        "version": 0i64,
                        "created_at": now,
                    },
                },
            )
            .upsert(true)
            .await?;

        self.quotas
            .find_one(doc! { "consortium_id": consortium_id, "resource_id": resource_id })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn list_quotas(&self, consortium_id: ObjectId) -> DaoResult<Vec<Quota>> {
        self.quotas
            .find_many(doc! { "consortium_id": consortium_id }, Some(doc! { "created_at": 1 }))
            .await
    }
}
