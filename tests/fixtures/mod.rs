//! Job records used across the test suites

use chrono::{DateTime, Duration, TimeZone, Utc};
use job_specs::models::job::{JobRecord, JobStatus};
use job_specs::specs::tags::sorted_tag_string;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
}

/// A fully scheduled job, updated at [`epoch`].
pub fn job(id: &str, user: &str, status: JobStatus, tags: &[&str]) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        name: format!("{id}_name"),
        user: user.to_string(),
        status,
        status_msg: None,
        cluster_name: Some("hprod2".to_string()),
        cluster_id: Some("prod".to_string()),
        command_name: Some("pig".to_string()),
        command_id: Some("pig14".to_string()),
        sorted_tags: sorted_tag_string(tags),
        created: epoch(),
        updated: epoch(),
    }
}

/// A job that was never scheduled onto a cluster or command.
pub fn unscheduled(id: &str, user: &str) -> JobRecord {
    JobRecord {
        cluster_name: None,
        cluster_id: None,
        command_name: None,
        command_id: None,
        ..job(id, user, JobStatus::Init, &[])
    }
}

pub fn updated_ago(mut record: JobRecord, age: Duration) -> JobRecord {
    record.updated = epoch() - age;
    record
}
