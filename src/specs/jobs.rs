//! Filters over job records.

use chrono::{DateTime, Duration, Utc};

use crate::models::criteria::{present, present_set, JobSearchCriteria};
use crate::models::job::JobStatus;
use crate::specs::filter::{fields, FilterExpr};
use crate::specs::tags::tag_like_string;

/// Build the search filter for `criteria`.
///
/// Each present field contributes one term and the terms are AND-ed:
/// - `id`, `name`: `LIKE` against the value as given
/// - `user`, `cluster_name`, `cluster_id`, `command_name`, `command_id`: equality
/// - `statuses`: one OR of equalities, one per status
/// - `tags`: `LIKE` against the encoded tag column
///
/// With nothing present the filter is [`FilterExpr::True`].
pub fn find(criteria: &JobSearchCriteria) -> FilterExpr {
    let mut terms = Vec::new();

    if let Some(id) = present(&criteria.id) {
        terms.push(FilterExpr::like(fields::ID, id));
    }
    if let Some(name) = present(&criteria.name) {
        terms.push(FilterExpr::like(fields::NAME, name));
    }
    if let Some(user) = present(&criteria.user) {
        terms.push(FilterExpr::equals(fields::USER, user.to_string()));
    }
    if let Some(statuses) = present_set(&criteria.statuses) {
        terms.push(FilterExpr::or(
            statuses
                .iter()
                .map(|status| FilterExpr::equals(fields::STATUS, *status))
                .collect(),
        ));
    }
    if let Some(tags) = present_set(&criteria.tags) {
        terms.push(FilterExpr::like(fields::TAGS, tag_like_string(tags)));
    }
    if let Some(cluster_name) = present(&criteria.cluster_name) {
        terms.push(FilterExpr::equals(fields::CLUSTER_NAME, cluster_name.to_string()));
    }
    if let Some(cluster_id) = present(&criteria.cluster_id) {
        terms.push(FilterExpr::equals(fields::CLUSTER_ID, cluster_id.to_string()));
    }
    if let Some(command_name) = present(&criteria.command_name) {
        terms.push(FilterExpr::equals(fields::COMMAND_NAME, command_name.to_string()));
    }
    if let Some(command_id) = present(&criteria.command_id) {
        terms.push(FilterExpr::equals(fields::COMMAND_ID, command_id.to_string()));
    }

    tracing::trace!(terms = terms.len(), "Built job search filter");
    FilterExpr::and(terms)
}

/// Build the filter for jobs still claiming to be active but not updated
/// since `cutoff`: `updated < cutoff AND (status = RUNNING OR status = INIT)`.
pub fn find_zombies(now: DateTime<Utc>, cutoff: DateTime<Utc>) -> FilterExpr {
    if cutoff > now {
        tracing::debug!(%now, %cutoff, "Zombie cutoff is in the future");
    }

    FilterExpr::and(vec![
        FilterExpr::less_than(fields::UPDATED, cutoff),
        FilterExpr::or(
            JobStatus::ACTIVE
                .iter()
                .map(|status| FilterExpr::equals(fields::STATUS, *status))
                .collect(),
        ),
    ])
}

/// Resolve the zombie cutoff for a liveness `threshold`.
///
/// Saturates at the earliest representable instant instead of overflowing.
pub fn zombie_cutoff(now: DateTime<Utc>, threshold: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(threshold)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
