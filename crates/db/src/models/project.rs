use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    /// Can contain markdown syntax.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    pub consortium_id: ObjectId,
    /// Opaque scheduling weight. Stored and reported, never computed with.
    #[serde(default = "default_fairshare")]
    pub fairshare: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

fn default_fairshare() -> f64 {
    1.0
}

/// The statuses form a progression; status only ever changes through the
/// workflow operations, never by direct assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Editable,
    UnderReview,
    Approved,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Editable => "editable",
            ProjectStatus::UnderReview => "under_review",
            ProjectStatus::Approved => "approved",
        }
    }
}

impl Project {
    pub const COLLECTION: &'static str = "projects";
}
