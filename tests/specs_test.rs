mod fixtures;

use chrono::Duration;
use fixtures::*;
use job_specs::models::criteria::JobSearchCriteria;
use job_specs::models::job::{JobRecord, JobStatus};
use job_specs::specs::filter::{fields, Attribute, FilterExpr, Value};
use job_specs::specs::tags::tag_like_string;
use job_specs::specs::{find, find_zombies, zombie_cutoff};

const ID: &str = "f0c1c3a5-5d3e-4b69-9d0c-2b1f0f8e7a11";
const JOB_NAME: &str = "jobName";
const USER_NAME: &str = "tgianos";
const CLUSTER_NAME: &str = "hprod2";
const CLUSTER_ID: &str = "prod";
const COMMAND_NAME: &str = "pig";
const COMMAND_ID: &str = "pig14";
const TAG: &str = "type:nightly";

fn terms(filter: &FilterExpr) -> &[FilterExpr] {
    match filter {
        FilterExpr::And { terms } => terms,
        other => panic!("expected an AND filter, got {other:?}"),
    }
}

fn like(attribute: Attribute, pattern: &str) -> FilterExpr {
    FilterExpr::Like {
        attribute,
        pattern: pattern.to_string(),
    }
}

fn text_eq(attribute: Attribute, value: &str) -> FilterExpr {
    FilterExpr::Equals {
        attribute,
        value: Value::Text(value.to_string()),
    }
}

fn status_or(statuses: &[JobStatus]) -> FilterExpr {
    FilterExpr::or(
        statuses
            .iter()
            .map(|s| FilterExpr::equals(fields::STATUS, *s))
            .collect(),
    )
}

fn full_criteria() -> JobSearchCriteria {
    JobSearchCriteria::new()
        .id(ID)
        .name(JOB_NAME)
        .user(USER_NAME)
        .statuses([JobStatus::Init, JobStatus::Failed])
        .tags([TAG])
        .cluster_name(CLUSTER_NAME)
        .cluster_id(CLUSTER_ID)
        .command_name(COMMAND_NAME)
        .command_id(COMMAND_ID)
}

#[test]
fn test_find_with_all() {
    let filter = find(&full_criteria());

    assert_eq!(
        terms(&filter),
        [
            like(Attribute::Id, ID),
            like(Attribute::Name, JOB_NAME),
            text_eq(Attribute::User, USER_NAME),
            status_or(&[JobStatus::Init, JobStatus::Failed]),
            like(Attribute::Tags, &tag_like_string([TAG])),
            text_eq(Attribute::ClusterName, CLUSTER_NAME),
            text_eq(Attribute::ClusterId, CLUSTER_ID),
            text_eq(Attribute::CommandName, COMMAND_NAME),
            text_eq(Attribute::CommandId, COMMAND_ID),
        ]
    );
}

#[test]
fn test_find_with_nothing_matches_all() {
    let filter = find(&JobSearchCriteria::default());
    assert_eq!(filter, FilterExpr::True);

    for record in [
        job("a", "bob", JobStatus::Running, &["x"]),
        unscheduled("b", "alice"),
    ] {
        assert!(filter.matches(&record));
    }
}

#[test]
fn test_find_with_single_field() {
    let cases: Vec<(JobSearchCriteria, FilterExpr)> = vec![
        (JobSearchCriteria::new().id(ID), like(Attribute::Id, ID)),
        (
            JobSearchCriteria::new().name(JOB_NAME),
            like(Attribute::Name, JOB_NAME),
        ),
        (
            JobSearchCriteria::new().user(USER_NAME),
            text_eq(Attribute::User, USER_NAME),
        ),
        (
            JobSearchCriteria::new().statuses([JobStatus::Running]),
            status_or(&[JobStatus::Running]),
        ),
        (
            JobSearchCriteria::new().tags([TAG]),
            like(Attribute::Tags, &format!("%|{TAG}|%")),
        ),
        (
            JobSearchCriteria::new().cluster_name(CLUSTER_NAME),
            text_eq(Attribute::ClusterName, CLUSTER_NAME),
        ),
        (
            JobSearchCriteria::new().cluster_id(CLUSTER_ID),
            text_eq(Attribute::ClusterId, CLUSTER_ID),
        ),
        (
            JobSearchCriteria::new().command_name(COMMAND_NAME),
            text_eq(Attribute::CommandName, COMMAND_NAME),
        ),
        (
            JobSearchCriteria::new().command_id(COMMAND_ID),
            text_eq(Attribute::CommandId, COMMAND_ID),
        ),
    ];

    for (criteria, expected) in cases {
        let filter = find(&criteria);
        assert_eq!(terms(&filter), [expected], "criteria: {criteria:?}");
    }
}

#[test]
fn test_blank_scalars_are_absent() {
    let setters: [fn(JobSearchCriteria, &str) -> JobSearchCriteria; 7] = [
        |c, v| c.id(v),
        |c, v| c.name(v),
        |c, v| c.user(v),
        |c, v| c.cluster_name(v),
        |c, v| c.cluster_id(v),
        |c, v| c.command_name(v),
        |c, v| c.command_id(v),
    ];

    for setter in setters {
        for blank in ["", " ", "   \t"] {
            let criteria = setter(JobSearchCriteria::new(), blank);
            assert_eq!(find(&criteria), FilterExpr::True, "criteria: {criteria:?}");
        }
    }
}

#[test]
fn test_find_without_each_field() {
    let mut criteria = full_criteria();
    criteria.id = None;
    assert!(!terms(&find(&criteria)).contains(&like(Attribute::Id, ID)));
    assert_eq!(terms(&find(&criteria)).len(), 8);

    let mut criteria = full_criteria();
    criteria.name = Some(String::new());
    assert!(!terms(&find(&criteria)).contains(&like(Attribute::Name, JOB_NAME)));
    assert_eq!(terms(&find(&criteria)).len(), 8);

    let mut criteria = full_criteria();
    criteria.user = Some(" ".to_string());
    assert!(!terms(&find(&criteria)).contains(&text_eq(Attribute::User, USER_NAME)));
    assert_eq!(terms(&find(&criteria)).len(), 8);

    let mut criteria = full_criteria();
    criteria.tags = None;
    assert!(terms(&find(&criteria))
        .iter()
        .all(|t| !matches!(t, FilterExpr::Like { attribute: Attribute::Tags, .. })));
    assert_eq!(terms(&find(&criteria)).len(), 8);

    let mut criteria = full_criteria();
    criteria.command_id = None;
    assert!(!terms(&find(&criteria)).contains(&text_eq(Attribute::CommandId, COMMAND_ID)));
    assert_eq!(terms(&find(&criteria)).len(), 8);
}

#[test]
fn test_empty_and_missing_statuses_are_identical() {
    let mut missing = full_criteria();
    missing.statuses = None;

    let mut empty = full_criteria();
    empty.statuses = Some(Default::default());

    assert_eq!(find(&missing), find(&empty));
    assert!(terms(&find(&empty))
        .iter()
        .all(|t| !matches!(t, FilterExpr::Or { .. })));
}

#[test]
fn test_find_with_empty_tag() {
    let criteria = full_criteria().tags([TAG, ""]);
    let filter = find(&criteria);

    let tag_terms: Vec<&FilterExpr> = terms(&filter)
        .iter()
        .filter(|t| matches!(t, FilterExpr::Like { attribute: Attribute::Tags, .. }))
        .collect();

    assert_eq!(tag_terms, [&like(Attribute::Tags, &format!("%||{TAG}|%"))]);
    assert_eq!(terms(&filter).len(), 9);
}

#[test]
fn test_only_empty_tag_is_still_a_filter() {
    let filter = find(&JobSearchCriteria::new().tags([""]));
    assert_eq!(terms(&filter), [like(Attribute::Tags, "%||%")]);
}

#[test]
fn test_tag_encoding_is_order_independent() {
    assert_eq!(tag_like_string(["b", "a"]), tag_like_string(["a", "b"]));

    let forward = find(&JobSearchCriteria::new().tags(["b", "a"]));
    let reverse = find(&JobSearchCriteria::new().tags(["a", "b"]));
    assert_eq!(forward, reverse);
}

#[test]
fn test_find_zombies() {
    let now = epoch();
    let before = now - Duration::milliseconds(54_000);
    let filter = find_zombies(now, before);

    let terms = terms(&filter);
    assert_eq!(terms.len(), 2);

    let less_than: Vec<_> = terms
        .iter()
        .filter(|t| matches!(t, FilterExpr::LessThan { .. }))
        .collect();
    assert_eq!(
        less_than,
        [&FilterExpr::LessThan {
            attribute: Attribute::Updated,
            value: Value::Timestamp(before),
        }]
    );

    let ors: Vec<_> = terms
        .iter()
        .filter_map(|t| match t {
            FilterExpr::Or { terms } => Some(terms),
            _ => None,
        })
        .collect();
    assert_eq!(ors.len(), 1);
    assert_eq!(
        ors[0],
        &vec![
            FilterExpr::equals(fields::STATUS, JobStatus::Running),
            FilterExpr::equals(fields::STATUS, JobStatus::Init),
        ]
    );
}

#[test]
fn test_scenario_six_terms() {
    let criteria = JobSearchCriteria {
        id: Some("X".to_string()),
        name: Some(String::new()),
        user: Some("bob".to_string()),
        statuses: Some([JobStatus::Init, JobStatus::Failed].into()),
        tags: Some(["t1".to_string()].into()),
        cluster_name: None,
        cluster_id: Some("prod".to_string()),
        command_name: Some("pig".to_string()),
        command_id: None,
    };

    assert_eq!(
        terms(&find(&criteria)),
        [
            like(Attribute::Id, "X"),
            text_eq(Attribute::User, "bob"),
            status_or(&[JobStatus::Init, JobStatus::Failed]),
            like(Attribute::Tags, "%|t1|%"),
            text_eq(Attribute::ClusterId, "prod"),
            text_eq(Attribute::CommandName, "pig"),
        ]
    );
}

fn ids<'a>(filter: &FilterExpr, records: &'a [JobRecord]) -> Vec<&'a str> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| r.id.as_str())
        .collect()
}

#[test]
fn test_search_evaluates_against_records() {
    let records = vec![
        job("job-1", "bob", JobStatus::Running, &["etl", "nightly", "prod"]),
        job("job-2", "bob", JobStatus::Failed, &["adhoc"]),
        job("job-3", "alice", JobStatus::Init, &["etl", "nightly"]),
        unscheduled("job-4", "bob"),
    ];

    let by_user = find(&JobSearchCriteria::new().user("bob"));
    assert_eq!(ids(&by_user, &records), ["job-1", "job-2", "job-4"]);

    let by_status = find(&JobSearchCriteria::new().statuses([JobStatus::Init, JobStatus::Failed]));
    assert_eq!(ids(&by_status, &records), ["job-2", "job-3", "job-4"]);

    let by_tags = find(&JobSearchCriteria::new().tags(["nightly", "etl"]));
    assert_eq!(ids(&by_tags, &records), ["job-1", "job-3"]);

    let by_id_prefix = find(&JobSearchCriteria::new().id("job-%").cluster_id("prod"));
    assert_eq!(ids(&by_id_prefix, &records), ["job-1", "job-2", "job-3"]);

    let combined = find(
        &JobSearchCriteria::new()
            .user("bob")
            .tags(["etl"])
            .command_name("pig"),
    );
    assert_eq!(ids(&combined, &records), ["job-1"]);
}

#[test]
fn test_zombies_evaluate_against_records() {
    let threshold = Duration::minutes(15);
    let records = vec![
        updated_ago(job("stale-running", "bob", JobStatus::Running, &[]), Duration::hours(1)),
        updated_ago(job("stale-init", "bob", JobStatus::Init, &[]), Duration::minutes(16)),
        updated_ago(job("stale-done", "bob", JobStatus::Succeeded, &[]), Duration::hours(1)),
        updated_ago(job("stale-killed", "bob", JobStatus::Killed, &[]), Duration::hours(1)),
        updated_ago(job("fresh-running", "bob", JobStatus::Running, &[]), Duration::minutes(1)),
        updated_ago(job("edge-running", "bob", JobStatus::Running, &[]), threshold),
    ];

    let now = epoch();
    let filter = find_zombies(now, zombie_cutoff(now, threshold));
    assert_eq!(ids(&filter, &records), ["stale-running", "stale-init"]);
}

#[test]
fn test_filters_can_be_built_concurrently() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FilterExpr>();

    let expected = find(&full_criteria());
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| find(&full_criteria()))).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_tag_wildcards_match_literally() {
    let records = vec![
        job("underscore", "bob", JobStatus::Running, &["a_b"]),
        job("letter", "bob", JobStatus::Running, &["axb"]),
        job("percent", "bob", JobStatus::Running, &["100%"]),
        job("digits", "bob", JobStatus::Running, &["1000"]),
    ];

    let filter = find(&JobSearchCriteria::new().tags(["a_b"]));
    assert_eq!(ids(&filter, &records), ["underscore"]);

    let filter = find(&JobSearchCriteria::new().tags(["100%"]));
    assert_eq!(ids(&filter, &records), ["percent"]);
}

#[test]
fn test_search_filters_survive_json() {
    let filters = [find(&full_criteria()), find_zombies(epoch(), epoch() - Duration::hours(1))];
    for filter in filters {
        assert_eq!(filter.validate(), Ok(()));
        let json = serde_json::to_string(&filter).unwrap();
        assert_eq!(serde_json::from_str::<FilterExpr>(&json).unwrap(), filter);
    }
}

#[test]
fn test_mistyped_json_filter_is_rejected() {
    let json = r#"{"op":"equals","attribute":"status","value":{"type":"text","value":"INIT"}}"#;
    assert!(serde_json::from_str::<FilterExpr>(json).is_err());

    let json = r#"{"op":"less_than","attribute":"updated","value":{"type":"text","value":"x"}}"#;
    assert!(serde_json::from_str::<FilterExpr>(json).is_err());

    let hand_built = FilterExpr::Equals {
        attribute: Attribute::Status,
        value: Value::Text("INIT".to_string()),
    };
    assert!(hand_built.validate().is_err());
    assert!(!hand_built.matches(&job("job-1", "bob", JobStatus::Init, &[])));
}
