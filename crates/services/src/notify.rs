use alloctrack_db::models::{
    Collaborator, Consortium, Invitation, Notification, NotificationSource, Project, Requirement,
    User,
};
use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use tracing::{debug, warn};

use crate::dao::base::BaseDao;

/// Records workflow events as stored notifications, one per recipient.
///
/// Rendering and delivery (email, webhooks, ...) are downstream concerns;
/// this service only decides who hears about an event and persists it.
pub struct NotificationService {
    notifications: BaseDao<Notification>,
    collaborators: BaseDao<Collaborator>,
    users: BaseDao<User>,
    consortia: BaseDao<Consortium>,
    enabled: bool,
}

impl NotificationService {
    pub fn new(db: &Database, enabled: bool) -> Self {
        Self {
            notifications: BaseDao::new(db, Notification::COLLECTION),
            collaborators: BaseDao::new(db, Collaborator::COLLECTION),
            users: BaseDao::new(db, User::COLLECTION),
            consortia: BaseDao::new(db, Consortium::COLLECTION),
            enabled,
        }
    }

    /// Notify all collaborators of a project event, except the acting user.
    /// When `include_manager` is set, the consortium manager hears about it
    /// too (unless they are the actor).
    pub async fn project_event(
        &self,
        event: &str,
        project: &Project,
        actor: Option<ObjectId>,
        include_manager: bool,
    ) {
        let project_id = match project.id {
            Some(id) => id,
            None => return,
        };
        let source = NotificationSource {
            entity_type: "project".to_string(),
            entity_id: project_id,
            actor_id: actor,
        };

        self.notify_collaborators(event, project_id, actor, &source)
            .await;

        if include_manager {
            match self.consortia.find_by_id(project.consortium_id).await {
                Ok(consortium) => {
                    if actor != Some(consortium.manager_id) {
                        if let Ok(manager) = self.manager_user(&consortium).await {
                            self.store(
                                event,
                                &manager.email,
                                manager.id,
                                &source,
                                doc! { "consortium_manager": true },
                            )
                            .await;
                        }
                    }
                }
                Err(e) => warn!(event, error = %e, "Could not resolve consortium manager"),
            }
        }
    }

    /// Notify the collaborators of the requirement's project.
    pub async fn requirement_event(
        &self,
        event: &str,
        requirement: &Requirement,
        actor: Option<ObjectId>,
    ) {
        let entity_id = match requirement.id {
            Some(id) => id,
            None => return,
        };
        let source = NotificationSource {
            entity_type: "requirement".to_string(),
            entity_id,
            actor_id: actor,
        };
        self.notify_collaborators(event, requirement.project_id, actor, &source)
            .await;
    }

    /// Notify the invitee that an invitation exists for them.
    pub async fn invitation_created(&self, invitation: &Invitation) {
        let entity_id = match invitation.id {
            Some(id) => id,
            None => return,
        };
        let source = NotificationSource {
            entity_type: "invitation".to_string(),
            entity_id,
            actor_id: Some(invitation.created_by),
        };
        self.store(
            "invitation.created",
            &invitation.email,
            None,
            &source,
            doc! {},
        )
        .await;
    }

    /// Notify existing collaborators that someone joined the project.
    pub async fn collaborator_created(&self, collaborator: &Collaborator) {
        let entity_id = match collaborator.id {
            Some(id) => id,
            None => return,
        };
        let source = NotificationSource {
            entity_type: "collaborator".to_string(),
            entity_id,
            actor_id: Some(collaborator.user_id),
        };
        self.notify_collaborators(
            "collaborator.created",
            collaborator.project_id,
            Some(collaborator.user_id),
            &source,
        )
        .await;
    }

    async fn notify_collaborators(
        &self,
        event: &str,
        project_id: ObjectId,
        actor: Option<ObjectId>,
        source: &NotificationSource,
    ) {
        let collaborators = match self
            .collaborators
            .find_many(doc! { "project_id": project_id }, None)
            .await
        {
            Ok(collaborators) => collaborators,
            Err(e) => {
                warn!(event, %project_id, error = %e, "Could not resolve collaborators");
                return;
            }
        };

        for collaborator in collaborators {
            if Some(collaborator.user_id) == actor {
                continue;
            }
            match self.users.find_by_id(collaborator.user_id).await {
                Ok(user) => {
                    self.store(
                        event,
                        &user.email,
                        user.id,
                        source,
                        doc! { "project_role": collaborator.role.as_str() },
                    )
                    .await;
                }
                Err(e) => warn!(event, error = %e, "Could not resolve collaborator user"),
            }
        }
    }

    async fn manager_user(&self, consortium: &Consortium) -> Result<User, crate::dao::base::DaoError> {
        self.users.find_by_id(consortium.manager_id).await
    }

    async fn store(
        &self,
        event: &str,
        email: &str,
        user_id: Option<ObjectId>,
        source: &NotificationSource,
        context: bson::Document,
    ) {
        if !self.enabled {
            debug!(event, email, "Notifications disabled, skipping");
            return;
        }

        let notification = Notification {
            id: None,
            email: email.to_lowercase(),
            user_id,
            event: event.to_string(),
            source: source.clone(),
            context,
            is_read: false,
            read_at: None,
            created_at: DateTime::now(),
        };

        if let Err(e) = self.notifications.insert_one(&notification).await {
            // The transition has already committed; a lost notification is
            // not worth failing the request over.
            warn!(event, email, error = %e, "Failed to store notification");
        } else {
            debug!(event, email, "Notification stored");
        }
    }
}
