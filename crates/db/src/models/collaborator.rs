use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaborator {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub user_id: ObjectId,
    #[serde(default)]
    pub role: CollaboratorRole,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorRole {
    /// A contributor is permitted to create services and requirements.
    #[default]
    Contributor,
    /// An owner can also invite collaborators and submit the project for review.
    Owner,
}

impl CollaboratorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaboratorRole::Contributor => "contributor",
            CollaboratorRole::Owner => "owner",
        }
    }
}

impl Collaborator {
    pub const COLLECTION: &'static str = "collaborators";
}
