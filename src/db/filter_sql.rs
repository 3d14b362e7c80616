//! Lowering of [`FilterExpr`] into PostgreSQL `WHERE` clauses.
//!
//! Every literal is bound as a parameter; only column names from
//! [`crate::specs::filter::Attribute::column`] are written into the SQL text.

use sqlx::{Postgres, QueryBuilder};

use crate::specs::filter::{FilterExpr, Value};

/// Columns selected for a [`crate::models::job::JobRecord`].
pub const JOB_COLUMNS: &str = "id, name, user_name, status, status_msg, cluster_name, cluster_id, \
     command_name, command_id, sorted_tags, created, updated";

/// Reject a filter Postgres would evaluate differently from
/// [`FilterExpr::matches`], before any SQL is built for it.
pub fn check_filter(filter: &FilterExpr) -> Result<(), sqlx::Error> {
    filter
        .validate()
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Append `filter` to `builder` as a boolean SQL expression.
///
/// The filter is lowered as given; run [`check_filter`] first.
pub fn push_filter<'args>(builder: &mut QueryBuilder<'args, Postgres>, filter: &FilterExpr) {
    match filter {
        FilterExpr::True => {
            builder.push("TRUE");
        }
        FilterExpr::Equals { attribute, value } => {
            builder.push(attribute.column()).push(" = ");
            push_value(builder, value);
        }
        FilterExpr::LessThan { attribute, value } => {
            builder.push(attribute.column()).push(" < ");
            push_value(builder, value);
        }
        FilterExpr::Like { attribute, pattern } => {
            builder
                .push(attribute.column())
                .push(" LIKE ")
                .push_bind(pattern.clone());
        }
        FilterExpr::And { terms } => push_joined(builder, terms, " AND ", "TRUE"),
        FilterExpr::Or { terms } => push_joined(builder, terms, " OR ", "FALSE"),
    }
}

fn push_joined<'args>(
    builder: &mut QueryBuilder<'args, Postgres>,
    terms: &[FilterExpr],
    op: &str,
    empty: &str,
) {
    if terms.is_empty() {
        builder.push(empty);
        return;
    }

    builder.push("(");
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            builder.push(op);
        }
        push_filter(builder, term);
    }
    builder.push(")");
}

fn push_value<'args>(builder: &mut QueryBuilder<'args, Postgres>, value: &Value) {
    match value {
        Value::Text(text) => builder.push_bind(text.clone()),
        // Stored as its text form.
        Value::Status(status) => builder.push_bind(status.to_string()),
        Value::Timestamp(ts) => builder.push_bind(*ts),
    };
}

/// `SELECT` of all job columns restricted by `filter`.
pub fn select_jobs(filter: &FilterExpr) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE "));
    push_filter(&mut builder, filter);
    builder
}
