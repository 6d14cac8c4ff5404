use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A category of service, defining the collection of resources available to
/// services of that kind, e.g. Group Workspace, Cloud Tenancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub resource_ids: Vec<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Category {
    pub const COLLECTION: &'static str = "categories";
}
