use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// An invitation to collaborate on a project, redeemable by code.
///
/// Invitations past their expiry are rejected at acceptance time; they stay
/// stored until explicitly pruned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub email: String,
    pub code: String,
    pub created_by: ObjectId,
    pub expires_at: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Invitation {
    pub const COLLECTION: &'static str = "invitations";
}
