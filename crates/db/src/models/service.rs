use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A service requested by a project, e.g. a group workspace or a cloud
/// tenancy. Requirements hang off services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Must start with a letter and contain lower-case letters, numbers,
    /// underscores and hyphens only. Unique within a category.
    pub name: String,
    pub project_id: ObjectId,
    pub category_id: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Service {
    pub const COLLECTION: &'static str = "services";
}
