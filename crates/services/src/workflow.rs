use std::sync::Arc;

use alloctrack_db::models::{
    Category, Collaborator, CollaboratorRole, Consortium, Invitation, Project, ProjectStatus,
    Quota, Requirement, RequirementStatus, Resource, Service, User,
};
use bson::{DateTime, doc, oid::ObjectId};
use chrono::{Duration, NaiveDate, Utc};
use mongodb::error::{TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT};
use mongodb::options::{ReadConcern, WriteConcern};
use mongodb::{ClientSession, Collection, Database};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::dao::base::DaoError;
use crate::dao::service::{check_amount, check_dates};
use crate::notify::NotificationService;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Cannot {action} a {entity} with status {status}")]
    InvalidTransition {
        entity: &'static str,
        action: &'static str,
        status: String,
    },
    #[error(
        "Approving would exceed the quota for {resource} in {consortium}: \
         requested {requested}, available {available}"
    )]
    QuotaExceeded {
        consortium: String,
        resource: String,
        requested: i64,
        available: i64,
    },
    #[error("Entity not found")]
    NotFound,
    #[error("Invitation has expired")]
    Expired,
    #[error("User is already a collaborator on this project")]
    AlreadyCollaborator,
    #[error("Conflicted with a concurrent request; safe to retry")]
    Conflict,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Validation: {0}")]
    Validation(String),
    #[error(transparent)]
    Dao(#[from] DaoError),
    #[error("MongoDB error: {0}")]
    Mongo(mongodb::error::Error),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl From<mongodb::error::Error> for WorkflowError {
    fn from(e: mongodb::error::Error) -> Self {
        // A transaction that lost a write conflict (or whose commit outcome
        // is unknown) is retryable by the caller, unlike a hard storage error.
        if e.contains_label(TRANSIENT_TRANSACTION_ERROR)
            || e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
        {
            WorkflowError::Conflict
        } else if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(
            ref write_error,
        )) = *e.kind
        {
            if write_error.code == 11000 {
                WorkflowError::Dao(DaoError::DuplicateKey(write_error.message.clone()))
            } else {
                WorkflowError::Mongo(e)
            }
        } else {
            WorkflowError::Mongo(e)
        }
    }
}

/// The identity the API layer established for the caller.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: ObjectId,
    pub is_staff: bool,
}

/// Explicit engine configuration; no ambient process state.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub invitation_ttl_days: i64,
}

/// Per-resource quota usage for a consortium, computed from the live
/// requirement documents in a single aggregation snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaUsage {
    pub resource_id: ObjectId,
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
    /// Approved + provisioned total: what counts against the quota.
    pub consumed: i64,
    pub available: i64,
}

/// Changes a collaborator may make to a requirement while it is still in
/// the requested state.
#[derive(Debug, Clone, Default)]
pub struct RequirementAmendment {
    pub amount: Option<i64>,
    pub resource_id: Option<ObjectId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// The approval workflow engine: project review lifecycle, requirement
/// approval/provisioning gated by consortium quotas, and the invitation
/// mechanism for adding collaborators.
pub struct WorkflowService {
    db: Database,
    settings: WorkflowSettings,
    notifier: Arc<NotificationService>,
    projects: Collection<Project>,
    services: Collection<Service>,
    requirements: Collection<Requirement>,
    quotas: Collection<Quota>,
    consortia: Collection<Consortium>,
    collaborators: Collection<Collaborator>,
    invitations: Collection<Invitation>,
    resources: Collection<Resource>,
    categories: Collection<Category>,
    users: Collection<User>,
}

impl WorkflowService {
    pub fn new(
        db: &Database,
        settings: WorkflowSettings,
        notifier: Arc<NotificationService>,
    ) -> Self {
        Self {
            db: db.clone(),
            settings,
            notifier,
            projects: db.collection(Project::COLLECTION),
            services: db.collection(Service::COLLECTION),
            requirements: db.collection(Requirement::COLLECTION),
            quotas: db.collection(Quota::COLLECTION),
            consortia: db.collection(Consortium::COLLECTION),
            collaborators: db.collection(Collaborator::COLLECTION),
            invitations: db.collection(Invitation::COLLECTION),
            resources: db.collection(Resource::COLLECTION),
            categories: db.collection(Category::COLLECTION),
            users: db.collection(User::COLLECTION),
        }
    }

    // ---- project lifecycle ----

    /// Submits an editable project for review. Requires the actor to be a
    /// project owner and the project to have at least one service with at
    /// least one requirement.
    pub async fn submit_for_review(
        &self,
        project_id: ObjectId,
        actor: Actor,
    ) -> WorkflowResult<Project> {
        let project = self.load_project(project_id).await?;
        self.require_owner(project_id, actor).await?;

        if project.status != ProjectStatus::Editable {
            return Err(invalid_transition(
                "project",
                "submit",
                project.status.as_str(),
            ));
        }

        let requirement_count = self
            .requirements
            .count_documents(doc! { "project_id": project_id })
            .await?;
        if requirement_count == 0 {
            return Err(WorkflowError::InvalidTransition {
                entity: "project",
                action: "submit",
                status: "editable with no requirements".to_string(),
            });
        }

        let project = self
            .transition_project(project_id, ProjectStatus::Editable, ProjectStatus::UnderReview)
            .await?;

        info!(%project_id, "Project submitted for review");
        self.notifier
            .project_event(
                "project.submitted_for_review",
                &project,
                Some(actor.user_id),
                true,
            )
            .await;

        Ok(project)
    }

    /// Approves a project under review. Consortium manager (or staff) only.
    pub async fn approve_project(
        &self,
        project_id: ObjectId,
        actor: Actor,
    ) -> WorkflowResult<Project> {
        let project = self.load_project(project_id).await?;
        self.require_manager(project.consortium_id, actor).await?;

        if project.status != ProjectStatus::UnderReview {
            return Err(invalid_transition(
                "project",
                "approve",
                project.status.as_str(),
            ));
        }

        let project = self
            .transition_project(project_id, ProjectStatus::UnderReview, ProjectStatus::Approved)
            .await?;

        info!(%project_id, "Project approved");
        self.notifier
            .project_event("project.approved", &project, Some(actor.user_id), false)
            .await;

        Ok(project)
    }

    /// Returns a project under review to its collaborators for changes.
    /// Consortium manager (or staff) only.
    pub async fn request_changes(
        &self,
        project_id: ObjectId,
        actor: Actor,
    ) -> WorkflowResult<Project> {
        let project = self.load_project(project_id).await?;
        self.require_manager(project.consortium_id, actor).await?;

        if project.status != ProjectStatus::UnderReview {
            return Err(invalid_transition(
                "project",
                "request changes for",
                project.status.as_str(),
            ));
        }

        let project = self
            .transition_project(project_id, ProjectStatus::UnderReview, ProjectStatus::Editable)
            .await?;

        info!(%project_id, "Changes requested for project");
        self.notifier
            .project_event(
                "project.changes_requested",
                &project,
                Some(actor.user_id),
                false,
            )
            .await;

        Ok(project)
    }

    async fn transition_project(
        &self,
        project_id: ObjectId,
        from: ProjectStatus,
        to: ProjectStatus,
    ) -> WorkflowResult<Project> {
        let result = self
            .projects
            .update_one(
                doc! { "_id": project_id, "status": from.as_str() },
                doc! { "$set": { "status": to.as_str(), "updated_at": DateTime::now() } },
            )
            .await?;
        if result.modified_count == 0 {
            // Status moved under us between the check and the write
            return Err(WorkflowError::Conflict);
        }
        self.load_project(project_id).await
    }

    // ---- requirement lifecycle ----

    /// Approves a requested requirement, provided the consortium's quota for
    /// the resource can absorb it.
    ///
    /// The check-then-set runs inside a transaction that first locks the
    /// quota document, so two concurrent approvals for the same
    /// consortium/resource pair cannot both observe pre-update consumption.
    pub async fn approve_requirement(
        &self,
        requirement_id: ObjectId,
        actor: Actor,
    ) -> WorkflowResult<Requirement> {
        let requirement = self.load_requirement(requirement_id).await?;
        let consortium = self.require_manager(requirement.consortium_id, actor).await?;

        if requirement.status != RequirementStatus::Requested {
            return Err(invalid_transition(
                "requirement",
                "approve",
                requirement.status.as_str(),
            ));
        }

        let resource = self
            .resources
            .find_one(doc! { "_id": requirement.resource_id })
            .await?
            .ok_or(WorkflowError::NotFound)?;

        let mut session = self.db.client().start_session().await?;
        session
            .start_transaction()
            .read_concern(ReadConcern::majority())
            .write_concern(WriteConcern::majority())
            .await?;

        match self
            .approve_in_txn(&mut session, &requirement, &consortium, &resource)
            .await
        {
            Ok(()) => session.commit_transaction().await?,
            Err(e) => {
                let _ = session.abort_transaction().await;
                return Err(e);
            }
        }

        let requirement = self.load_requirement(requirement_id).await?;

        info!(%requirement_id, amount = requirement.amount, "Requirement approved");
        self.notifier
            .requirement_event("requirement.approved", &requirement, Some(actor.user_id))
            .await;

        Ok(requirement)
    }

    async fn approve_in_txn(
        &self,
        session: &mut ClientSession,
        requirement: &Requirement,
        consortium: &Consortium,
        resource: &Resource,
    ) -> WorkflowResult<()> {
        let requirement_id = requirement.id.ok_or(WorkflowError::NotFound)?;

        // Take a write lock on the quota document. Concurrent approvals for
        // the same consortium/resource conflict here instead of both passing
        // the consumption check below.
        let quota = self
            .quotas
            .find_one_and_update(
                doc! {
                    "consortium_id": requirement.consortium_id,
                    "resource_id": requirement.resource_id,
                },
                doc! { "$inc": { "version": 1i64 } },
            )
            .session(&mut *session)
            .await?;

        // No quota document means a quota of zero
        let quota_amount = quota.map(|q| q.amount).unwrap_or(0);

        let consumed = self
            .consumed_in_txn(
                session,
                requirement.consortium_id,
                requirement.resource_id,
                requirement_id,
            )
            .await?;

        let available = (quota_amount - consumed).max(0);
        if consumed + requirement.amount > quota_amount {
            return Err(WorkflowError::QuotaExceeded {
                consortium: consortium.name.clone(),
                resource: resource.name.clone(),
                requested: requirement.amount,
                available,
            });
        }

        let result = self
            .requirements
            .update_one(
                doc! {
                    "_id": requirement_id,
                    "status": RequirementStatus::Requested.as_str(),
                },
                doc! { "$set": {
                    "status": RequirementStatus::Approved.as_str(),
                    "updated_at": DateTime::now(),
                } },
            )
            .session(&mut *session)
            .await?;
        if result.modified_count == 0 {
            // Declined or amended out from under us
            return Err(WorkflowError::Conflict);
        }

        Ok(())
    }

    /// Live sum of amounts counting against the quota for a
    /// consortium/resource pair, excluding the candidate itself. The
    /// recomputation, not a cached counter, is the source of truth.
    async fn consumed_in_txn(
        &self,
        session: &mut ClientSession,
        consortium_id: ObjectId,
        resource_id: ObjectId,
        exclude: ObjectId,
    ) -> WorkflowResult<i64> {
        let statuses: Vec<&str> = RequirementStatus::QUOTA_CONSUMING
            .iter()
            .map(|s| s.as_str())
            .collect();
        let pipeline = vec![
            doc! { "$match": {
                "consortium_id": consortium_id,
                "resource_id": resource_id,
                "status": { "$in": statuses },
                "_id": { "$ne": exclude },
            } },
            doc! { "$group": { "_id": null, "total": { "$sum": "$amount" } } },
        ];

        let mut cursor = self
            .requirements
            .aggregate(pipeline)
            .session(&mut *session)
            .await?;

        match cursor.next(&mut *session).await.transpose()? {
            Some(doc) => Ok(doc.get_i64("total").unwrap_or_default()),
            None => Ok(0),
        }
    }

    /// Declines a requirement. Permitted from requested or approved;
    /// declined is terminal.
    pub async fn decline_requirement(
        &self,
        requirement_id: ObjectId,
        actor: Actor,
    ) -> WorkflowResult<Requirement> {
        let requirement = self.load_requirement(requirement_id).await?;
        self.require_manager(requirement.consortium_id, actor).await?;

        if !requirement
            .status
            .can_transition_to(RequirementStatus::Declined)
        {
            return Err(invalid_transition(
                "requirement",
                "decline",
                requirement.status.as_str(),
            ));
        }

        let result = self
            .requirements
            .update_one(
                doc! {
                    "_id": requirement_id,
                    "status": { "$in": [
                        RequirementStatus::Requested.as_str(),
                        RequirementStatus::Approved.as_str(),
                    ] },
                },
                doc! { "$set": {
                    "status": RequirementStatus::Declined.as_str(),
                    "updated_at": DateTime::now(),
                } },
            )
            .await?;
        if result.modified_count == 0 {
            return Err(WorkflowError::Conflict);
        }

        info!(%requirement_id, "Requirement declined");
        self.load_requirement(requirement_id).await
    }

    /// Marks an approved requirement as provisioned at the given location.
    /// Staff only.
    pub async fn provision_requirement(
        &self,
        requirement_id: ObjectId,
        location: String,
        actor: Actor,
    ) -> WorkflowResult<Requirement> {
        if !actor.is_staff {
            return Err(WorkflowError::Forbidden(
                "Only staff can provision requirements".to_string(),
            ));
        }
        let location = location.trim().to_string();
        if location.is_empty() {
            return Err(WorkflowError::Validation(
                "A location is required to provision".to_string(),
            ));
        }

        let requirement = self.load_requirement(requirement_id).await?;
        if requirement.status != RequirementStatus::Approved {
            return Err(invalid_transition(
                "requirement",
                "provision",
                requirement.status.as_str(),
            ));
        }

        let result = self
            .requirements
            .update_one(
                doc! {
                    "_id": requirement_id,
                    "status": RequirementStatus::Approved.as_str(),
                },
                doc! { "$set": {
                    "status": RequirementStatus::Provisioned.as_str(),
                    "location": &location,
                    "updated_at": DateTime::now(),
                } },
            )
            .await?;
        if result.modified_count == 0 {
            return Err(WorkflowError::Conflict);
        }

        let requirement = self.load_requirement(requirement_id).await?;

        info!(%requirement_id, %location, "Requirement provisioned");
        self.notifier
            .requirement_event("requirement.provisioned", &requirement, Some(actor.user_id))
            .await;

        Ok(requirement)
    }

    /// Amends a requirement while it is still requested. No quota check
    /// happens here; that is approval's job.
    pub async fn amend_requirement(
        &self,
        requirement_id: ObjectId,
        amendment: RequirementAmendment,
        actor: Actor,
    ) -> WorkflowResult<Requirement> {
        let requirement = self.load_requirement(requirement_id).await?;
        self.require_collaborator(requirement.project_id, actor).await?;

        if requirement.status != RequirementStatus::Requested {
            return Err(invalid_transition(
                "requirement",
                "amend",
                requirement.status.as_str(),
            ));
        }

        let mut update = bson::Document::new();

        if let Some(amount) = amendment.amount {
            check_amount(amount)?;
            update.insert("amount", amount);
        }

        let start_date = amendment.start_date.unwrap_or(requirement.start_date);
        let end_date = amendment.end_date.unwrap_or(requirement.end_date);
        check_dates(start_date, end_date)?;
        if amendment.start_date.is_some() {
            update.insert("start_date", start_date.to_string());
        }
        if amendment.end_date.is_some() {
            update.insert("end_date", end_date.to_string());
        }

        if let Some(resource_id) = amendment.resource_id {
            self.check_resource_allowed(requirement.service_id, resource_id)
                .await?;
            update.insert("resource_id", resource_id);
        }

        if update.is_empty() {
            return Ok(requirement);
        }
        update.insert("updated_at", DateTime::now());

        let result = self
            .requirements
            .update_one(
                doc! {
                    "_id": requirement_id,
                    "status": RequirementStatus::Requested.as_str(),
                },
                doc! { "$set": update },
            )
            .await?;
        if result.modified_count == 0 {
            return Err(WorkflowError::Conflict);
        }

        self.load_requirement(requirement_id).await
    }

    /// Deletes a requirement that has not yet been through review.
    pub async fn delete_requirement(
        &self,
        requirement_id: ObjectId,
        actor: Actor,
    ) -> WorkflowResult<()> {
        let requirement = self.load_requirement(requirement_id).await?;
        self.require_collaborator(requirement.project_id, actor).await?;

        if requirement.status != RequirementStatus::Requested {
            return Err(invalid_transition(
                "requirement",
                "delete",
                requirement.status.as_str(),
            ));
        }

        let result = self
            .requirements
            .delete_one(doc! {
                "_id": requirement_id,
                "status": RequirementStatus::Requested.as_str(),
            })
            .await?;
        if result.deleted_count == 0 {
            return Err(WorkflowError::Conflict);
        }
        Ok(())
    }

    // ---- invitations ----

    /// Creates an invitation to collaborate on a project, redeemable by the
    /// returned code until it expires.
    pub async fn create_invitation(
        &self,
        project_id: ObjectId,
        email: String,
        actor: Actor,
    ) -> WorkflowResult<Invitation> {
        use validator::ValidateEmail;

        self.load_project(project_id).await?;
        self.require_owner(project_id, actor).await?;

        let email = email.trim().to_lowercase();
        if !email.validate_email() {
            return Err(WorkflowError::Validation(
                "A valid email address is required".to_string(),
            ));
        }

        // A user with this email who already collaborates does not need
        // an invitation
        if let Some(user) = self.users.find_one(doc! { "email": &email }).await? {
            let existing = self
                .collaborators
                .find_one(doc! { "project_id": project_id, "user_id": user.id })
                .await?;
            if existing.is_some() {
                return Err(WorkflowError::AlreadyCollaborator);
            }
        }

        let existing = self
            .invitations
            .find_one(doc! { "project_id": project_id, "email": &email })
            .await?;
        if existing.is_some() {
            return Err(WorkflowError::Validation(
                "Email address already has an invitation for this project".to_string(),
            ));
        }

        let now = Utc::now();
        let expires_at = now + Duration::days(self.settings.invitation_ttl_days);
        let invitation = Invitation {
            id: None,
            project_id,
            email,
            code: uuid::Uuid::new_v4().simple().to_string(),
            created_by: actor.user_id,
            expires_at: DateTime::from_chrono(expires_at),
            created_at: DateTime::from_chrono(now),
            updated_at: DateTime::from_chrono(now),
        };

        let insert = self.invitations.insert_one(&invitation).await?;
        let invitation = self
            .invitations
            .find_one(doc! { "_id": insert.inserted_id })
            .await?
            .ok_or(WorkflowError::NotFound)?;

        info!(%project_id, email = %invitation.email, "Invitation created");
        self.notifier.invitation_created(&invitation).await;

        Ok(invitation)
    }

    /// Redeems an invitation code for the calling user, making them a
    /// contributor on the project and consuming the invitation, atomically.
    pub async fn accept_invitation(
        &self,
        code: &str,
        actor: Actor,
    ) -> WorkflowResult<(Project, Collaborator)> {
        let mut session = self.db.client().start_session().await?;
        session
            .start_transaction()
            .read_concern(ReadConcern::majority())
            .write_concern(WriteConcern::majority())
            .await?;

        let result = self.accept_in_txn(&mut session, code, actor).await;
        let collaborator_id = match result {
            Ok(id) => {
                session.commit_transaction().await?;
                id
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                return Err(e);
            }
        };

        let collaborator = self
            .collaborators
            .find_one(doc! { "_id": collaborator_id })
            .await?
            .ok_or(WorkflowError::NotFound)?;
        let project = self.load_project(collaborator.project_id).await?;

        info!(project = %project.name, user = %actor.user_id, "Invitation accepted");
        self.notifier.collaborator_created(&collaborator).await;

        Ok((project, collaborator))
    }

    async fn accept_in_txn(
        &self,
        session: &mut ClientSession,
        code: &str,
        actor: Actor,
    ) -> WorkflowResult<ObjectId> {
        let invitation = self
            .invitations
            .find_one(doc! { "code": code })
            .session(&mut *session)
            .await?
            .ok_or(WorkflowError::NotFound)?;

        // Rejected from the expiry instant onwards
        if DateTime::now() >= invitation.expires_at {
            return Err(WorkflowError::Expired);
        }

        let existing = self
            .collaborators
            .find_one(doc! {
                "project_id": invitation.project_id,
                "user_id": actor.user_id,
            })
            .session(&mut *session)
            .await?;
        if existing.is_some() {
            return Err(WorkflowError::AlreadyCollaborator);
        }

        let now = DateTime::now();
        let collaborator = Collaborator {
            id: None,
            project_id: invitation.project_id,
            user_id: actor.user_id,
            role: CollaboratorRole::Contributor,
            created_at: now,
            updated_at: now,
        };
        let insert = self
            .collaborators
            .insert_one(&collaborator)
            .session(&mut *session)
            .await
            .map_err(|e| match WorkflowError::from(e) {
                // Unique (project, user) index beat us to it
                WorkflowError::Dao(DaoError::DuplicateKey(_)) => {
                    WorkflowError::AlreadyCollaborator
                }
                other => other,
            })?;

        let deleted = self
            .invitations
            .delete_one(doc! { "_id": invitation.id })
            .session(&mut *session)
            .await?;
        if deleted.deleted_count == 0 {
            // Another acceptance consumed the code first
            return Err(WorkflowError::Conflict);
        }

        insert
            .inserted_id
            .as_object_id()
            .ok_or(WorkflowError::NotFound)
    }

    /// Explicit garbage collection of expired invitations. Staff only;
    /// expired codes are otherwise kept (and rejected at acceptance).
    pub async fn prune_invitations(&self, actor: Actor) -> WorkflowResult<u64> {
        if !actor.is_staff {
            return Err(WorkflowError::Forbidden(
                "Only staff can prune invitations".to_string(),
            ));
        }
        let result = self
            .invitations
            .delete_many(doc! { "expires_at": { "$lte": DateTime::now() } })
            .await?;
        info!(pruned = result.deleted_count, "Expired invitations pruned");
        Ok(result.deleted_count)
    }

    // ---- reporting ----

    /// Per-resource quota, consumption and headroom for a consortium, in a
    /// single aggregation pass. The same status arithmetic backs the
    /// approval check.
    pub async fn consumption(&self, consortium_id: ObjectId) -> WorkflowResult<Vec<QuotaUsage>> {
        let pipeline = vec![
            doc! { "$match": { "consortium_id": consortium_id } },
            doc! { "$lookup": {
                "from": Requirement::COLLECTION,
                "let": { "rid": "$resource_id", "cid": "$consortium_id" },
                "pipeline": [
                    { "$match": { "$expr": { "$and": [
                        { "$eq": ["$resource_id", "$$rid"] },
                        { "$eq": ["$consortium_id", "$$cid"] },
                    ] } } },
                    { "$group": {
                        "_id": "$status",
                        "total": { "$sum": "$amount" },
                        "count": { "$sum": 1 },
                    } },
                ],
                "as": "usage",
            } },
            doc! { "$lookup": {
                "from": Resource::COLLECTION,
                "localField": "resource_id",
                "foreignField": "_id",
                "as": "resource",
            } },
            doc! { "$unwind": "$resource" },
            doc! { "$sort": { "resource.name": 1 } },
        ];

        let mut cursor = self.quotas.aggregate(pipeline).await?;

        let mut report = Vec::new();
        use futures::TryStreamExt;
        while let Some(doc) = cursor.try_next().await? {
            report.push(parse_quota_usage(&doc)?);
        }
        Ok(report)
    }

    // ---- shared lookups ----

    async fn load_project(&self, project_id: ObjectId) -> WorkflowResult<Project> {
        self.projects
            .find_one(doc! { "_id": project_id })
            .await?
            .ok_or(WorkflowError::NotFound)
    }

    async fn load_requirement(&self, requirement_id: ObjectId) -> WorkflowResult<Requirement> {
        self.requirements
            .find_one(doc! { "_id": requirement_id })
            .await?
            .ok_or(WorkflowError::NotFound)
    }

    async fn require_manager(
        &self,
        consortium_id: ObjectId,
        actor: Actor,
    ) -> WorkflowResult<Consortium> {
        let consortium = self
            .consortia
            .find_one(doc! { "_id": consortium_id })
            .await?
            .ok_or(WorkflowError::NotFound)?;
        if !actor.is_staff && consortium.manager_id != actor.user_id {
            return Err(WorkflowError::Forbidden(
                "Only the consortium manager can do this".to_string(),
            ));
        }
        Ok(consortium)
    }

    async fn require_owner(&self, project_id: ObjectId, actor: Actor) -> WorkflowResult<()> {
        if actor.is_staff {
            return Ok(());
        }
        let collaborator = self
            .collaborators
            .find_one(doc! { "project_id": project_id, "user_id": actor.user_id })
            .await?;
        match collaborator {
            Some(c) if c.role == CollaboratorRole::Owner => Ok(()),
            _ => Err(WorkflowError::Forbidden(
                "Only a project owner can do this".to_string(),
            )),
        }
    }

    async fn require_collaborator(
        &self,
        project_id: ObjectId,
        actor: Actor,
    ) -> WorkflowResult<()> {
        if actor.is_staff {
            return Ok(());
        }
        let collaborator = self
            .collaborators
            .find_one(doc! { "project_id": project_id, "user_id": actor.user_id })
            .await?;
        if collaborator.is_none() {
            return Err(WorkflowError::Forbidden(
                "Only project collaborators can do this".to_string(),
            ));
        }
        Ok(())
    }

    async fn check_resource_allowed(
        &self,
        service_id: ObjectId,
        resource_id: ObjectId,
    ) -> WorkflowResult<()> {
        let service = self
            .services
            .find_one(doc! { "_id": service_id })
            .await?
            .ok_or(WorkflowError::NotFound)?;
        let category = self
            .categories
            .find_one(doc! { "_id": service.category_id })
            .await?
            .ok_or(WorkflowError::NotFound)?;
        if !category.resource_ids.contains(&resource_id) {
            return Err(WorkflowError::Validation(
                "Resource is not valid for the selected service".to_string(),
            ));
        }
        Ok(())
    }
}

fn invalid_transition(entity: &'static str, action: &'static str, status: &str) -> WorkflowError {
    WorkflowError::InvalidTransition {
        entity,
        action,
        status: status.to_string(),
    }
}

fn parse_quota_usage(doc: &bson::Document) -> WorkflowResult<QuotaUsage> {
    let resource = doc
        .get_document("resource")
        .map_err(|_| WorkflowError::NotFound)?;

    let mut usage = QuotaUsage {
        resource_id: doc.get_object_id("resource_id").unwrap_or_default(),
        resource_name: resource.get_str("name").unwrap_or_default().to_string(),
        units: resource.get_str("units").unwrap_or_default().to_string(),
        quota: get_amount(doc, "amount"),
        requested_total: 0,
        requested_count: 0,
        approved_total: 0,
        approved_count: 0,
        provisioned_total: 0,
        provisioned_count: 0,
        declined_total: 0,
        declined_count: 0,
        consumed: 0,
        available: 0,
    };

    if let Ok(groups) = doc.get_array("usage") {
        for group in groups.iter().filter_map(|g| g.as_document()) {
            let total = get_amount(group, "total");
            let count = get_amount(group, "count");
            match group.get_str("_id").unwrap_or_default() {
                "requested" => {
                    usage.requested_total = total;
                    usage.requested_count = count;
                }
                "approved" => {
                    usage.approved_total = total;
                    usage.approved_count = count;
                }
                "provisioned" => {
                    usage.provisioned_total = total;
                    usage.provisioned_count = count;
                }
                "declined" => {
                    usage.declined_total = total;
                    usage.declined_count = count;
                }
                _ => {}
            }
        }
    }

    usage.consumed = usage.approved_total + usage.provisioned_total;
    usage.available = (usage.quota - usage.consumed).max(0);
    Ok(usage)
}

// Aggregation sums come back as i32 or i64 depending on the inputs
fn get_amount(doc: &bson::Document, key: &str) -> i64 {
    match doc.get(key) {
        Some(bson::Bson::Int64(v)) => *v,
        Some(bson::Bson::Int32(v)) => *v as i64,
        Some(bson::Bson::Double(v)) => *v as i64,
        _ => 0,
    }
}
