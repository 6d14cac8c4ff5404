use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A comment on a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub user_id: ObjectId,
    /// Can contain markdown syntax.
    pub content: String,
    pub created_at: DateTime,
    pub edited_at: DateTime,
}

impl Comment {
    pub const COLLECTION: &'static str = "comments";
}
