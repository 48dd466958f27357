use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::revision::Revision;

/// A predicate or rank callable failed against one revision's metadata.
///
/// Metadata schemas are caller-defined and drift across a filename's
/// history, so [`select`] swallows these per revision instead of
/// aborting the whole query: a failing predicate excludes the revision,
/// a failing rank sorts it last.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("metadata field '{0}' is missing")]
    MissingField(String),
    #[error("metadata field '{field}' is not {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

/// Read-only view of one revision's metadata handed to predicate and
/// rank callables, plus the synthetic upload date.
///
/// The typed accessors return [`EvalError`] on missing or mistyped
/// fields so callables can lean on `?` and leave the failure policy to
/// [`select`].
pub struct MetadataView<'a> {
    revision: &'a Revision,
}

impl<'a> MetadataView<'a> {
    fn new(revision: &'a Revision) -> Self {
        Self { revision }
    }

    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.revision.metadata().get(field)
    }

    pub fn require(&self, field: &str) -> Result<&'a Value, EvalError> {
        self.get(field)
            .ok_or_else(|| EvalError::MissingField(field.to_string()))
    }

    pub fn str(&self, field: &str) -> Result<&'a str, EvalError> {
        self.require(field)?.as_str().ok_or(EvalError::WrongType {
            field: field.to_string(),
            expected: "a string",
        })
    }

    pub fn i64(&self, field: &str) -> Result<i64, EvalError> {
        self.require(field)?.as_i64().ok_or(EvalError::WrongType {
            field: field.to_string(),
            expected: "an integer",
        })
    }

    pub fn f64(&self, field: &str) -> Result<f64, EvalError> {
        self.require(field)?.as_f64().ok_or(EvalError::WrongType {
            field: field.to_string(),
            expected: "a number",
        })
    }

    pub fn bool(&self, field: &str) -> Result<bool, EvalError> {
        self.require(field)?.as_bool().ok_or(EvalError::WrongType {
            field: field.to_string(),
            expected: "a boolean",
        })
    }

    /// A field as a rank key, for `rank_by` callables.
    pub fn rank(&self, field: &str) -> Result<RankKey, EvalError> {
        match self.require(field)? {
            Value::Bool(value) => Ok(RankKey::Bool(*value)),
            Value::Number(number) => match number.as_i64() {
                Some(value) => Ok(RankKey::Int(value)),
                None => number.as_f64().map(RankKey::Float).ok_or(EvalError::WrongType {
                    field: field.to_string(),
                    expected: "a representable number",
                }),
            },
            Value::String(value) => Ok(RankKey::Text(value.clone())),
            _ => Err(EvalError::WrongType {
                field: field.to_string(),
                expected: "a comparable scalar",
            }),
        }
    }

    /// Synthetic upload-date field: the store-assigned timestamp, not
    /// part of the user metadata map.
    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.revision.uploaded_at()
    }
}

/// Totally ordered rank key.
///
/// Numbers compare numerically across `Int` and `Float`; otherwise keys
/// of different kinds order by kind (booleans, numbers, text, times).
/// Floats use `total_cmp`, so the order is total even with NaN in
/// caller metadata.
#[derive(Debug, Clone)]
pub enum RankKey {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Time(DateTime<Utc>),
}

impl RankKey {
    fn kind(&self) -> u8 {
        match self {
            RankKey::Bool(_) => 0,
            RankKey::Int(_) | RankKey::Float(_) => 1,
            RankKey::Text(_) => 2,
            RankKey::Time(_) => 3,
        }
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        use RankKey::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Int(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Int(b)) => a.total_cmp(&(*b as f64)),
            (Text(a), Text(b)) => a.cmp(b),
            (Time(a), Time(b)) => a.cmp(b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankKey {}

impl From<bool> for RankKey {
    fn from(value: bool) -> Self {
        RankKey::Bool(value)
    }
}

impl From<i64> for RankKey {
    fn from(value: i64) -> Self {
        RankKey::Int(value)
    }
}

impl From<f64> for RankKey {
    fn from(value: f64) -> Self {
        RankKey::Float(value)
    }
}

impl From<&str> for RankKey {
    fn from(value: &str) -> Self {
        RankKey::Text(value.to_string())
    }
}

impl From<String> for RankKey {
    fn from(value: String) -> Self {
        RankKey::Text(value)
    }
}

impl From<DateTime<Utc>> for RankKey {
    fn from(value: DateTime<Utc>) -> Self {
        RankKey::Time(value)
    }
}

type PredicateFn<'a> = Box<dyn Fn(&MetadataView<'_>) -> Result<bool, EvalError> + Send + Sync + 'a>;
type RankFn<'a> = Box<dyn Fn(&MetadataView<'_>) -> Result<RankKey, EvalError> + Send + Sync + 'a>;

/// Query options for [`select`]: optional predicate, optional rank key,
/// direction, and limit.
///
/// The default matches every revision, ranks by upload date, newest
/// first, unbounded.
pub struct Select<'a> {
    predicate: Option<PredicateFn<'a>>,
    rank: Option<RankFn<'a>>,
    descending: bool,
    limit: Option<usize>,
}

impl Default for Select<'_> {
    fn default() -> Self {
        Self {
            predicate: None,
            rank: None,
            descending: true,
            limit: None,
        }
    }
}

impl<'a> Select<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only revisions the predicate matches. A predicate that
    /// fails on a revision excludes that revision.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&MetadataView<'_>) -> Result<bool, EvalError> + Send + Sync + 'a,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Order by a caller-supplied key instead of the upload date. A
    /// rank that fails on a revision sorts that revision last.
    pub fn rank_by<F>(mut self, rank: F) -> Self
    where
        F: Fn(&MetadataView<'_>) -> Result<RankKey, EvalError> + Send + Sync + 'a,
    {
        self.rank = Some(Box::new(rank));
        self
    }

    pub fn ascending(mut self) -> Self {
        self.descending = false;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Filter, order, and truncate candidate revisions.
///
/// Pure and deterministic: no I/O, no mutation of the inputs beyond
/// reordering. The sort is stable, so revisions with equal keys keep
/// store insertion order.
pub fn select(revisions: Vec<Revision>, query: &Select<'_>) -> Vec<Revision> {
    let matched: Vec<Revision> = revisions
        .into_iter()
        .filter(|revision| match &query.predicate {
            None => true,
            Some(predicate) => match predicate(&MetadataView::new(revision)) {
                Ok(keep) => keep,
                Err(err) => {
                    debug!(
                        filename = %revision.filename(),
                        id = %revision.id(),
                        %err,
                        "predicate failed, excluding revision"
                    );
                    false
                }
            },
        })
        .collect();

    // A failed rank becomes None, the smallest key: last when
    // descending, first when ascending.
    let mut keyed: Vec<(Option<RankKey>, Revision)> = matched
        .into_iter()
        .map(|revision| {
            let key = match &query.rank {
                None => Some(RankKey::Time(revision.uploaded_at())),
                Some(rank) => match rank(&MetadataView::new(&revision)) {
                    Ok(key) => Some(key),
                    Err(err) => {
                        debug!(
                            filename = %revision.filename(),
                            id = %revision.id(),
                            %err,
                            "rank failed, sorting revision last"
                        );
                        None
                    }
                },
            };
            (key, revision)
        })
        .collect();

    if query.descending {
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
    } else {
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
    }

    let mut selected: Vec<Revision> = keyed.into_iter().map(|(_, revision)| revision).collect();
    if let Some(limit) = query.limit {
        selected.truncate(limit);
    }
    selected
}
