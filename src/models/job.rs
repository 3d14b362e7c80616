use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a submitted job.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Init,
    Running,
    Succeeded,
    Killed,
    Failed,
    Invalid,
}

impl JobStatus {
    /// Statuses a job can still leave on its own.
    pub const ACTIVE: [JobStatus; 2] = [JobStatus::Running, JobStatus::Init];
}

impl TryFrom<String> for JobStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A persisted job as read back from the `jobs` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobRecord {
    pub id: String,
    pub name: String,
    #[sqlx(rename = "user_name")]
    pub user: String,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub status_msg: Option<String>,
    pub cluster_name: Option<String>,
    pub cluster_id: Option<String>,
    pub command_name: Option<String>,
    pub command_id: Option<String>,
    /// Encoded tag token, see [`crate::specs::tags::sorted_tag_string`].
    pub sorted_tags: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Values needed to insert a job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub id: String,
    pub name: String,
    pub user: String,
    pub status: JobStatus,
    pub cluster_name: Option<String>,
    pub cluster_id: Option<String>,
    pub command_name: Option<String>,
    pub command_id: Option<String>,
    pub tags: Vec<String>,
    pub updated: DateTime<Utc>,
}
