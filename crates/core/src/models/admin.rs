use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directory-backed administrator ("collaborator"), keyed by member id.
///
/// The master identity is never stored as an `Admin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub member_id: String,
    pub password: String,
    pub added_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Admin {
    pub fn matches(&self, member_id: &str, password: &str) -> bool {
        self.member_id == member_id && self.password == password
    }
}
