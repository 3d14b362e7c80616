//! Filter expression tree over job attributes.
//!
//! A [`FilterExpr`] is a plain description of a predicate. It performs no I/O;
//! persistence adapters lower it into their native query form (see
//! [`crate::db::filter_sql`]) and [`FilterExpr::matches`] evaluates it in memory.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::models::job::{JobRecord, JobStatus};

/// Job attributes a filter can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Attribute {
    Id,
    Name,
    User,
    Status,
    ClusterName,
    ClusterId,
    CommandName,
    CommandId,
    Tags,
    Updated,
}

/// Declared value type of an [`Attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Status,
    Timestamp,
}

impl Attribute {
    pub const fn value_type(self) -> ValueType {
        match self {
            Attribute::Status => ValueType::Status,
            Attribute::Updated => ValueType::Timestamp,
            _ => ValueType::Text,
        }
    }

    /// Column backing the attribute in the `jobs` table.
    pub const fn column(self) -> &'static str {
        match self {
            Attribute::Id => "id",
            Attribute::Name => "name",
            Attribute::User => "user_name",
            Attribute::Status => "status",
            Attribute::ClusterName => "cluster_name",
            Attribute::ClusterId => "cluster_id",
            Attribute::CommandName => "command_name",
            Attribute::CommandId => "command_id",
            Attribute::Tags => "sorted_tags",
            Attribute::Updated => "updated",
        }
    }
}

/// A literal compared against an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Text(String),
    Status(JobStatus),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Text(_) => ValueType::Text,
            Value::Status(_) => ValueType::Status,
            Value::Timestamp(_) => ValueType::Timestamp,
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<JobStatus> for Value {
    fn from(value: JobStatus) -> Self {
        Value::Status(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => write!(f, "'{text}'"),
            Value::Status(status) => write!(f, "{status}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

/// Typed handle on an [`Attribute`].
///
/// The only handles are the constants in [`fields`], each pairing an attribute
/// with its declared value type, so a mistyped comparison does not compile.
pub struct Field<T> {
    attribute: Attribute,
    _value: PhantomData<fn() -> T>,
}

impl<T> Field<T> {
    const fn new(attribute: Attribute) -> Self {
        Self {
            attribute,
            _value: PhantomData,
        }
    }

    pub const fn attribute(&self) -> Attribute {
        self.attribute
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.attribute).finish()
    }
}

pub mod fields {
    use chrono::{DateTime, Utc};

    use super::{Attribute, Field};
    use crate::models::job::JobStatus;

    pub const ID: Field<String> = Field::new(Attribute::Id);
    pub const NAME: Field<String> = Field::new(Attribute::Name);
    pub const USER: Field<String> = Field::new(Attribute::User);
    pub const STATUS: Field<JobStatus> = Field::new(Attribute::Status);
    pub const CLUSTER_NAME: Field<String> = Field::new(Attribute::ClusterName);
    pub const CLUSTER_ID: Field<String> = Field::new(Attribute::ClusterId);
    pub const COMMAND_NAME: Field<String> = Field::new(Attribute::CommandName);
    pub const COMMAND_ID: Field<String> = Field::new(Attribute::CommandId);
    pub const TAGS: Field<String> = Field::new(Attribute::Tags);
    pub const UPDATED: Field<DateTime<Utc>> = Field::new(Attribute::Updated);
}

/// Value types with an ordering usable in [`FilterExpr::less_than`].
pub trait Ordered: Into<Value> {}

impl Ordered for String {}
impl Ordered for DateTime<Utc> {}

/// Why a filter node cannot be evaluated or lowered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("{attribute} holds {expected:?} values, got {found:?}")]
    TypeMismatch {
        attribute: Attribute,
        expected: ValueType,
        found: ValueType,
    },
    #[error("{0} is not a text attribute and cannot be used with LIKE")]
    NotText(Attribute),
    #[error("{0} has no ordering")]
    Unordered(Attribute),
    #[error("LIKE pattern ends with an unescaped backslash: {0:?}")]
    DanglingEscape(String),
}

/// A composable predicate over job records.
///
/// Deserializing checks every node the way [`FilterExpr::validate`] does, so a
/// filter read from JSON carries the same typing as one built from [`fields`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", try_from = "RawFilterExpr")]
pub enum FilterExpr {
    /// Matches every record.
    True,
    Equals {
        attribute: Attribute,
        value: Value,
    },
    LessThan {
        attribute: Attribute,
        value: Value,
    },
    /// SQL `LIKE`: `%` matches any run, `_` one character, `\` escapes.
    Like {
        attribute: Attribute,
        pattern: String,
    },
    And {
        terms: Vec<FilterExpr>,
    },
    Or {
        terms: Vec<FilterExpr>,
    },
}

impl FilterExpr {
    pub fn equals<T: Into<Value>>(field: Field<T>, value: T) -> Self {
        FilterExpr::Equals {
            attribute: field.attribute(),
            value: value.into(),
        }
    }

    pub fn less_than<T: Ordered>(field: Field<T>, value: T) -> Self {
        FilterExpr::LessThan {
            attribute: field.attribute(),
            value: value.into(),
        }
    }

    pub fn like(field: Field<String>, pattern: impl Into<String>) -> Self {
        FilterExpr::Like {
            attribute: field.attribute(),
            pattern: pattern.into(),
        }
    }

    /// Conjunction of `terms`; no terms is [`FilterExpr::True`].
    pub fn and(terms: Vec<FilterExpr>) -> Self {
        if terms.is_empty() {
            FilterExpr::True
        } else {
            FilterExpr::And { terms }
        }
    }

    /// Disjunction of `terms`; no terms matches nothing.
    pub fn or(terms: Vec<FilterExpr>) -> Self {
        FilterExpr::Or { terms }
    }

    /// Check that every node compares an attribute with a value of its
    /// declared type.
    ///
    /// Filters built through [`fields`] always pass; variants assembled by
    /// hand may not.
    pub fn validate(&self) -> Result<(), FilterError> {
        if let Some(err) = self.node_error() {
            return Err(err);
        }
        match self {
            FilterExpr::And { terms } | FilterExpr::Or { terms } => {
                terms.iter().try_for_each(FilterExpr::validate)
            }
            _ => Ok(()),
        }
    }

    /// Problem with this node alone, ignoring nested terms.
    fn node_error(&self) -> Option<FilterError> {
        match self {
            FilterExpr::Equals { attribute, value } => type_error(*attribute, value),
            FilterExpr::LessThan { attribute, value } => {
                if attribute.value_type() == ValueType::Status {
                    Some(FilterError::Unordered(*attribute))
                } else {
                    type_error(*attribute, value)
                }
            }
            FilterExpr::Like { attribute, pattern } => {
                if attribute.value_type() != ValueType::Text {
                    Some(FilterError::NotText(*attribute))
                } else if tokenize(pattern).is_none() {
                    Some(FilterError::DanglingEscape(pattern.clone()))
                } else {
                    None
                }
            }
            FilterExpr::True | FilterExpr::And { .. } | FilterExpr::Or { .. } => None,
        }
    }

    /// Evaluate the filter against one record.
    ///
    /// Unset optional columns behave like SQL `NULL`: they never satisfy a
    /// comparison. A node that fails [`FilterExpr::validate`] matches nothing.
    pub fn matches(&self, job: &JobRecord) -> bool {
        if self.node_error().is_some() {
            return false;
        }
        match self {
            FilterExpr::True => true,
            FilterExpr::Equals { attribute, value } => {
                compare(read(job, *attribute), value) == Some(Ordering::Equal)
            }
            FilterExpr::LessThan { attribute, value } => {
                compare(read(job, *attribute), value) == Some(Ordering::Less)
            }
            FilterExpr::Like { attribute, pattern } => match read(job, *attribute) {
                Some(Cell::Text(text)) => like_matches(text, pattern),
                _ => false,
            },
            FilterExpr::And { terms } => terms.iter().all(|t| t.matches(job)),
            FilterExpr::Or { terms } => terms.iter().any(|t| t.matches(job)),
        }
    }
}

fn type_error(attribute: Attribute, value: &Value) -> Option<FilterError> {
    let (expected, found) = (attribute.value_type(), value.value_type());
    (expected != found).then_some(FilterError::TypeMismatch {
        attribute,
        expected,
        found,
    })
}

/// Wire form of [`FilterExpr`] before its nodes are type checked.
#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum RawFilterExpr {
    True,
    Equals { attribute: Attribute, value: Value },
    LessThan { attribute: Attribute, value: Value },
    Like { attribute: Attribute, pattern: String },
    And { terms: Vec<FilterExpr> },
    Or { terms: Vec<FilterExpr> },
}

impl TryFrom<RawFilterExpr> for FilterExpr {
    type Error = FilterError;

    fn try_from(raw: RawFilterExpr) -> Result<Self, Self::Error> {
        let expr = match raw {
            RawFilterExpr::True => FilterExpr::True,
            RawFilterExpr::Equals { attribute, value } => FilterExpr::Equals { attribute, value },
            RawFilterExpr::LessThan { attribute, value } => {
                FilterExpr::LessThan { attribute, value }
            }
            RawFilterExpr::Like { attribute, pattern } => FilterExpr::Like { attribute, pattern },
            RawFilterExpr::And { terms } => FilterExpr::And { terms },
            RawFilterExpr::Or { terms } => FilterExpr::Or { terms },
        };
        // Nested terms were checked when they were deserialized.
        match expr.node_error() {
            Some(err) => Err(err),
            None => Ok(expr),
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, terms: &[FilterExpr], op: &str) -> fmt::Result {
            f.write_str("(")?;
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                write!(f, "{term}")?;
            }
            f.write_str(")")
        }

        match self {
            FilterExpr::True => f.write_str("TRUE"),
            FilterExpr::Equals { attribute, value } => write!(f, "{attribute} = {value}"),
            FilterExpr::LessThan { attribute, value } => write!(f, "{attribute} < {value}"),
            FilterExpr::Like { attribute, pattern } => write!(f, "{attribute} LIKE '{pattern}'"),
            FilterExpr::And { terms } if terms.is_empty() => f.write_str("TRUE"),
            FilterExpr::And { terms } => join(f, terms, "AND"),
            FilterExpr::Or { terms } if terms.is_empty() => f.write_str("FALSE"),
            FilterExpr::Or { terms } => join(f, terms, "OR"),
        }
    }
}

/// Borrowed column value of a record.
enum Cell<'a> {
    Text(&'a str),
    Status(JobStatus),
    Timestamp(DateTime<Utc>),
}

fn read(job: &JobRecord, attribute: Attribute) -> Option<Cell<'_>> {
    match attribute {
        Attribute::Id => Some(Cell::Text(&job.id)),
        Attribute::Name => Some(Cell::Text(&job.name)),
        Attribute::User => Some(Cell::Text(&job.user)),
        Attribute::Status => Some(Cell::Status(job.status)),
        Attribute::ClusterName => job.cluster_name.as_deref().map(Cell::Text),
        Attribute::ClusterId => job.cluster_id.as_deref().map(Cell::Text),
        Attribute::CommandName => job.command_name.as_deref().map(Cell::Text),
        Attribute::CommandId => job.command_id.as_deref().map(Cell::Text),
        Attribute::Tags => Some(Cell::Text(&job.sorted_tags)),
        Attribute::Updated => Some(Cell::Timestamp(job.updated)),
    }
}

fn compare(cell: Option<Cell<'_>>, value: &Value) -> Option<Ordering> {
    match (cell?, value) {
        (Cell::Text(a), Value::Text(b)) => Some(a.cmp(b.as_str())),
        // Status is stored as text, so it orders as text.
        (Cell::Status(a), Value::Status(b)) => Some(a.to_string().cmp(&b.to_string())),
        (Cell::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[derive(Debug, PartialEq)]
enum LikeToken {
    AnyRun,
    AnyChar,
    Literal(char),
}

/// `None` when the pattern ends in an unescaped `\`, which Postgres rejects.
fn tokenize(pattern: &str) -> Option<Vec<LikeToken>> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyChar,
            '\\' => LikeToken::Literal(chars.next()?),
            c => LikeToken::Literal(c),
        });
    }
    Some(tokens)
}

/// Match `value` against a SQL `LIKE` pattern.
///
/// A pattern ending in an unescaped `\` is malformed and matches nothing.
pub fn like_matches(value: &str, pattern: &str) -> bool {
    let Some(tokens) = tokenize(pattern) else {
        return false;
    };
    let text: Vec<char> = value.chars().collect();

    let (mut t, mut p) = (0, 0);
    // Position of the last `%` and the text index it is currently absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(LikeToken::AnyRun) => {
                backtrack = Some((p, t));
                p += 1;
                continue;
            }
            Some(LikeToken::AnyChar) => {
                p += 1;
                t += 1;
                continue;
            }
            Some(LikeToken::Literal(c)) if *c == text[t] => {
                p += 1;
                t += 1;
                continue;
            }
            _ => {}
        }

        match backtrack {
            Some((star, absorbed)) => {
                p = star + 1;
                t = absorbed + 1;
                backtrack = Some((star, absorbed + 1));
            }
            None => return false,
        }
    }

    tokens[p..].iter().all(|token| *token == LikeToken::AnyRun)
}
