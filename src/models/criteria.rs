use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::job::JobStatus;

/// Search fields for [`crate::specs::jobs::find`].
///
/// Every field is optional. `None`, `""` and all-whitespace strings all mean
/// "no constraint"; `None` and an empty set mean the same for the set fields.
/// A tag set holding only `""` is not empty and does constrain the search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSearchCriteria {
    pub id: Option<String>,
    pub name: Option<String>,
    pub user: Option<String>,
    pub statuses: Option<BTreeSet<JobStatus>>,
    pub tags: Option<BTreeSet<String>>,
    pub cluster_name: Option<String>,
    pub cluster_id: Option<String>,
    pub command_name: Option<String>,
    pub command_id: Option<String>,
}

impl JobSearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn statuses(mut self, statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        self.statuses = Some(statuses.into_iter().collect());
        self
    }

    pub fn tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn cluster_name(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = Some(cluster_name.into());
        self
    }

    pub fn cluster_id(mut self, cluster_id: impl Into<String>) -> Self {
        self.cluster_id = Some(cluster_id.into());
        self
    }

    pub fn command_name(mut self, command_name: impl Into<String>) -> Self {
        self.command_name = Some(command_name.into());
        self
    }

    pub fn command_id(mut self, command_id: impl Into<String>) -> Self {
        self.command_id = Some(command_id.into());
        self
    }
}

/// Returns the value when it carries any non-whitespace character.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Returns the set when it has at least one member.
pub(crate) fn present_set<T>(value: &Option<BTreeSet<T>>) -> Option<&BTreeSet<T>> {
    value.as_ref().filter(|set| !set.is_empty())
}
