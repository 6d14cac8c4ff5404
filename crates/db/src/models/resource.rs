use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// An allocatable resource, e.g. cloud CPUs, disk, tape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Full name, used when the resource is referenced standalone,
    /// e.g. "Cloud Disk", "Panasas Disk".
    pub name: String,
    /// Short name used in the context of a category or service, e.g. "Disk".
    /// Empty means the full name is used in all contexts.
    #[serde(default)]
    pub short_name: String,
    /// Canonical units. Empty for a unit-less resource, e.g. CPUs.
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub description: String,
    /// The total amount of the resource available across the facility.
    /// The sum of consortium quotas must stay within it.
    pub total_available: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Resource {
    pub const COLLECTION: &'static str = "resources";

    /// Renders an amount with the resource's units.
    pub fn format_amount(&self, amount: i64) -> String {
        if self.units.is_empty() {
            amount.to_string()
        } else {
            format!("{} {}", amount, self.units)
        }
    }
}
