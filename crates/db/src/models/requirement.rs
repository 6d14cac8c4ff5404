use bson::{DateTime, oid::ObjectId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An amount of a resource required by a project, with its own approval
/// lifecycle. The resource must be one allowed for the service via its
/// category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: ObjectId,
    pub resource_id: ObjectId,
    // Stamped from the service at creation so quota queries stay on one
    // collection.
    pub project_id: ObjectId,
    pub consortium_id: ObjectId,
    #[serde(default)]
    pub status: RequirementStatus,
    pub amount: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Where the provisioned resource lives. "TBC" until provisioned.
    #[serde(default = "default_location")]
    pub location: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

fn default_location() -> String {
    "TBC".to_string()
}

/// The requirement lifecycle. Transitions only move forward, or sideways to
/// `Declined` from a non-terminal state; `Provisioned` and `Declined` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    #[default]
    Requested,
    Approved,
    Provisioned,
    Declined,
}

impl RequirementStatus {
    /// Statuses whose amounts count against the consortium quota.
    pub const QUOTA_CONSUMING: [RequirementStatus; 2] =
        [RequirementStatus::Approved, RequirementStatus::Provisioned];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementStatus::Requested => "requested",
            RequirementStatus::Approved => "approved",
            RequirementStatus::Provisioned => "provisioned",
            RequirementStatus::Declined => "declined",
        }
    }

    pub fn can_transition_to(&self, next: RequirementStatus) -> bool {
        use RequirementStatus::*;
        matches!(
            (self, next),
            (Requested, Approved) | (Approved, Provisioned) | (Requested | Approved, Declined)
        )
    }
}

impl Requirement {
    pub const COLLECTION: &'static str = "requirements";
}
