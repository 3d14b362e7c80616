use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::filter_sql::{self, check_filter, push_filter, JOB_COLUMNS};
use crate::models::job::{JobRecord, JobStatus, NewJob};
use crate::specs::filter::FilterExpr;
use crate::specs::tags::sorted_tag_string;

/// Insert a new job
pub async fn insert_job(pool: &PgPool, job: &NewJob) -> Result<JobRecord, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO jobs (id, name, user_name, status, cluster_name, cluster_id,
                          command_name, command_id, sorted_tags, updated)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {JOB_COLUMNS}
        "#
    );

    sqlx::query_as::<_, JobRecord>(&sql)
        .bind(&job.id)
        .bind(&job.name)
        .bind(&job.user)
        .bind(job.status.to_string())
        .bind(&job.cluster_name)
        .bind(&job.cluster_id)
        .bind(&job.command_name)
        .bind(&job.command_id)
        .bind(sorted_tag_string(&job.tags))
        .bind(job.updated)
        .fetch_one(pool)
        .await
}

/// Get all jobs matching a filter
pub async fn find_jobs(pool: &PgPool, filter: &FilterExpr) -> Result<Vec<JobRecord>, sqlx::Error> {
    check_filter(filter)?;
    let mut builder = filter_sql::select_jobs(filter);
    builder.build_query_as::<JobRecord>().fetch_all(pool).await
}

/// Mark every job matching `filter` as failed.
///
/// The filter is re-evaluated inside the `UPDATE`, so a job that changed
/// since it was read is left alone. Returns the ids that were updated.
pub async fn fail_jobs(
    pool: &PgPool,
    filter: &FilterExpr,
    message: &str,
) -> Result<Vec<String>, sqlx::Error> {
    check_filter(filter)?;
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE jobs SET status = ");
    builder
        .push_bind(JobStatus::Failed.to_string())
        .push(", status_msg = ")
        .push_bind(message.to_string())
        .push(", updated = NOW() WHERE ");
    push_filter(&mut builder, filter);
    builder.push(" RETURNING id");

    builder.build_query_scalar::<String>().fetch_all(pool).await
}
