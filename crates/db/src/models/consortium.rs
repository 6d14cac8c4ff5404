use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A science area to which projects belong. Consortia are allocated resource
/// quotas to be distributed among their projects by a consortium manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consortium {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub manager_id: ObjectId,
    /// Public consortia are visible to every user.
    #[serde(default)]
    pub is_public: bool,
    /// Opaque scheduling weight. Stored and reported, never computed with.
    #[serde(default = "default_fairshare")]
    pub fairshare: f64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

fn default_fairshare() -> f64 {
    1.0
}

impl Consortium {
    pub const COLLECTION: &'static str = "consortia";
}
