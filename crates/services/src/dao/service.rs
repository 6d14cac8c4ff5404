use alloctrack_db::models::{Category, Requirement, RequirementStatus, Service};
use bson::{DateTime, doc, oid::ObjectId};
use chrono::{Months, NaiveDate, Utc};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct ServiceDao {
    pub base: BaseDao<Service>,
    pub requirements: BaseDao<Requirement>,
    categories: BaseDao<Category>,
}

impl ServiceDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Service::COLLECTION),
            requirements: BaseDao::new(db, Requirement::COLLECTION),
            categories: BaseDao::new(db, Category::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        project_id: ObjectId,
        category_id: ObjectId,
        name: String,
    ) -> DaoResult<Service> {
        check_service_name(&name)?;
        // The category must exist
        self.categories.find_by_id(category_id).await?;

        let now = DateTime::now();
        let service = Service {
            id: None,
            name,
            project_id,
            category_id,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&service).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list_for_project(&self, project_id: ObjectId) -> DaoResult<Vec<Service>> {
        self.base
            .find_many(doc! { "project_id": project_id }, Some(doc! { "name": 1 }))
            .await
    }

    /// Deletes a service. Services with requirements that are anything other
    /// than declined cannot be removed.
    pub async fn delete(&self, service_id: ObjectId) -> DaoResult<()> {
        let live = self
            .requirements
            .count(doc! {
                "service_id": service_id,
                "status": { "$ne": RequirementStatus::Declined.as_str() },
            })
            .await?;
        if live > 0 {
            return Err(DaoError::Validation(
                "Service still has active requirements".to_string(),
            ));
        }
        self.requirements
            .delete_many(doc! { "service_id": service_id })
            .await?;
        self.base.delete_one(doc! { "_id": service_id }).await?;
        Ok(())
    }

    pub async fn create_requirement(
        &self,
        service: &Service,
        consortium_id: ObjectId,
        resource_id: ObjectId,
        amount: i64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> DaoResult<Requirement> {
        check_amount(amount)?;

        // The resource must belong to the category of the service
        let category = self.categories.find_by_id(service.category_id).await?;
        if !category.resource_ids.contains(&resource_id) {
            return Err(DaoError::Validation(
                "Resource is not valid for the selected service".to_string(),
            ));
        }

        let start_date = start_date.unwrap_or_else(|| Utc::now().date_naive());
        let end_date = end_date.unwrap_or_else(|| default_end_date(start_date));
        check_dates(start_date, end_date)?;

        let now = DateTime::now();
        let requirement = Requirement {
            id: None,
            service_id: service.id.expect("persisted service has an id"),
            resource_id,
            project_id: service.project_id,
            consortium_id,
            status: RequirementStatus::Requested,
            amount,
            start_date,
            end_date,
            location: "TBC".to_string(),
            created_at: now,
            updated_at: now,
        };

        let id = self.requirements.insert_one(&requirement).await?;
        self.requirements.find_by_id(id).await
    }

    pub async fn list_requirements(&self, service_id: ObjectId) -> DaoResult<Vec<Requirement>> {
        self.requirements
            .find_many(
                doc! { "service_id": service_id },
                Some(doc! { "created_at": -1 }),
            )
            .await
    }
}

pub(crate) fn check_amount(amount: i64) -> DaoResult<()> {
    if amount < 1 {
        return Err(DaoError::Validation(
            "Amount must be a positive number of units".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_dates(start_date: NaiveDate, end_date: NaiveDate) -> DaoResult<()> {
    if end_date < start_date {
        return Err(DaoError::Validation(
            "End date cannot be before start date".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn default_end_date(start_date: NaiveDate) -> NaiveDate {
    start_date
        .checked_add_months(Months::new(60))
        .unwrap_or(start_date)
}

fn check_service_name(name: &str) -> DaoResult<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !valid {
        return Err(DaoError::Validation(
            "Service name must start with a letter and contain lower-case \
             letters, numbers, underscores and hyphens only"
                .to_string(),
        ));
    }
    Ok(())
}
