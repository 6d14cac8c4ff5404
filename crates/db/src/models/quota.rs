use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A quota of a resource granted to a consortium.
///
/// If no quota exists for a consortium/resource combination, it is assumed
/// to be zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quota {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub consortium_id: ObjectId,
    pub resource_id: ObjectId,
    pub amount: i64,
    /// Bumped by every approval that locks this quota. The write serializes
    /// concurrent approvals for the same consortium/resource pair.
    #[serde(default)]
    pub version: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Quota {
    pub const COLLECTION: &'static str = "quotas";
}
