use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A stored workflow notification. One document per recipient per event;
/// rendering and delivery are a consumer's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Recipient email. Invitees may not have a user record yet.
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ObjectId>,
    /// Event name, e.g. "requirement.provisioned".
    pub event: String,
    pub source: NotificationSource,
    /// Extra template context, e.g. the recipient's project role.
    #[serde(default)]
    pub context: bson::Document,
    #[serde(default)]
    pub is_read: bool,
    pub read_at: Option<DateTime>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSource {
    pub entity_type: String,
    pub entity_id: ObjectId,
    pub actor_id: Option<ObjectId>,
}

impl Notification {
    pub const COLLECTION: &'static str = "notifications";
}
