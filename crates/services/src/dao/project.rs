use alloctrack_db::models::{
    Collaborator, CollaboratorRole, Comment, Invitation, Project, ProjectStatus,
};
use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct ProjectDao {
    pub base: BaseDao<Project>,
    pub collaborators: BaseDao<Collaborator>,
    pub invitations: BaseDao<Invitation>,
    pub comments: BaseDao<Comment>,
}

impl ProjectDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Project::COLLECTION),
            collaborators: BaseDao::new(db, Collaborator::COLLECTION),
            invitations: BaseDao::new(db, Invitation::COLLECTION),
            comments: BaseDao::new(db, Comment::COLLECTION),
        }
    }

    /// Creates a project and installs its creator as the first owner.
    pub async fn create(
        &self,
        name: String,
        description: String,
        consortium_id: ObjectId,
        tags: Vec<String>,
        owner_id: ObjectId,
    ) -> DaoResult<Project> {
        let now = DateTime::now();
        let project = Project {
            id: None,
            name,
            description,
            status: ProjectStatus::Editable,
            consortium_id,
            fairshare: 1.0,
            tags,
            created_at: now,
            updated_at: now,
        };

        let project_id = self.base.insert_one(&project).await?;
        self.add_collaborator(project_id, owner_id, CollaboratorRole::Owner)
            .await?;

        self.base.find_by_id(project_id).await
    }

    /// Projects the user collaborates on, ordered by name.
    pub async fn find_user_projects(&self, user_id: ObjectId) -> DaoResult<Vec<Project>> {
        let memberships = self
            .collaborators
            .find_many(doc! { "user_id": user_id }, None)
            .await?;

        let project_ids: Vec<ObjectId> = memberships.iter().map(|m| m.project_id).collect();

        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.base
            .find_many(
                doc! { "_id": { "$in": project_ids } },
                Some(doc! { "name": 1 }),
            )
            .await
    }

    pub async fn find_by_consortium(&self, consortium_id: ObjectId) -> DaoResult<Vec<Project>> {
        self.base
            .find_many(doc! { "consortium_id": consortium_id }, Some(doc! { "name": 1 }))
            .await
    }

    pub async fn update_details(
        &self,
        project_id: ObjectId,
        name: Option<String>,
        description: Option<String>,
        tags: Option<Vec<String>>,
    ) -> DaoResult<Project> {
        let mut update = bson::Document::new();
        if let Some(name) = name {
            update.insert("name", name);
        }
        if let Some(description) = description {
            update.insert("description", description);
        }
        if let Some(tags) = tags {
            update.insert("tags", tags);
        }

        if !update.is_empty() {
            self.base
                .update_by_id(project_id, doc! { "$set": update })
                .await?;
        }
        self.base.find_by_id(project_id).await
    }

    pub async fn add_collaborator(
        &self,
        project_id: ObjectId,
        user_id: ObjectId,
        role: CollaboratorRole,
    ) -> DaoResult<Collaborator> {
        let now = DateTime::now();
        let collaborator = Collaborator {
            id: None,
            project_id,
            user_id,
            role,
            created_at: now,
            updated_at: now,
        };

        let id = self.collaborators.insert_one(&collaborator).await?;
        self.collaborators.find_by_id(id).await
    }

    pub async fn list_collaborators(&self, project_id: ObjectId) -> DaoResult<Vec<Collaborator>> {
        self.collaborators
            .find_many(doc! { "project_id": project_id }, Some(doc! { "created_at": 1 }))
            .await
    }

    pub async fn get_role(
        &self,
        project_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<CollaboratorRole>> {
        let collaborator = self
            .collaborators
            .find_one(doc! { "project_id": project_id, "user_id": user_id })
            .await?;
        Ok(collaborator.map(|c| c.role))
    }

    pub async fn is_collaborator(
        &self,
        project_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<bool> {
        let count = self
            .collaborators
            .count(doc! { "project_id": project_id, "user_id": user_id })
            .await?;
        Ok(count > 0)
    }

    /// Changes a collaborator's role. A project must always keep at least
    /// one owner.
    pub async fn update_collaborator_role(
        &self,
        collaborator_id: ObjectId,
        role: CollaboratorRole,
    ) -> DaoResult<Collaborator> {
        let collaborator = self.collaborators.find_by_id(collaborator_id).await?;

        if collaborator.role == CollaboratorRole::Owner && role != CollaboratorRole::Owner {
            self.check_not_last_owner(&collaborator).await?;
        }

        self.collaborators
            .update_by_id(
                collaborator_id,
                doc! { "$set": { "role": bson::to_bson(&role).map_err(bson::ser::Error::from)? } },
            )
            .await?;
        self.collaborators.find_by_id(collaborator_id).await
    }

    /// Removes a collaborator, refusing to remove the last owner.
    pub async fn remove_collaborator(&self, collaborator_id: ObjectId) -> DaoResult<Collaborator> {
        let collaborator = self.collaborators.find_by_id(collaborator_id).await?;

        if collaborator.role == CollaboratorRole::Owner {
            self.check_not_last_owner(&collaborator).await?;
        }

        self.collaborators
            .delete_one(doc! { "_id": collaborator_id })
            .await?;
        Ok(collaborator)
    }

    async fn check_not_last_owner(&self, collaborator: &Collaborator) -> DaoResult<()> {
        let owners = self
            .collaborators
            .count(doc! {
                "project_id": collaborator.project_id,
                "role": "owner",
                "_id": { "$ne": collaborator.id },
            })
            .await?;
        if owners == 0 {
            return Err(DaoError::Validation(
                "A project must have at least one owner".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn list_invitations(&self, project_id: ObjectId) -> DaoResult<Vec<Invitation>> {
        self.invitations
            .find_many(doc! { "project_id": project_id }, Some(doc! { "created_at": -1 }))
            .await
    }

    pub async fn add_comment(
        &self,
        project_id: ObjectId,
        user_id: ObjectId,
        content: String,
    ) -> DaoResult<Comment> {
        if content.trim().is_empty() {
            return Err(DaoError::Validation("Comment cannot be empty".to_string()));
        }
        let now = DateTime::now();
        let comment = Comment {
            id: None,
            project_id,
            user_id,
            content,
            created_at: now,
            edited_at: now,
        };

        let id = self.comments.insert_one(&comment).await?;
        self.comments.find_by_id(id).await
    }

    pub async fn list_comments(&self, project_id: ObjectId) -> DaoResult<Vec<Comment>> {
        self.comments
            .find_many(doc! { "project_id": project_id }, Some(doc! { "created_at": -1 }))
            .await
    }

    pub async fn edit_comment(&self, comment_id: ObjectId, content: String) -> DaoResult<Comment> {
        if content.trim().is_empty() {
            return Err(DaoError::Validation("Comment cannot be empty".to_string()));
        }
        self.comments
            .update_by_id(
                comment_id,
                doc! { "$set": { "content": content, "edited_at": DateTime::now() } },
            )
            .await?;
        self.comments.find_by_id(comment_id).await
    }
}
