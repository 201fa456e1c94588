//! Turns the flat `key -> value` filter map of a list request into a typed,
//! parameterized `WHERE` clause for one collection.
//!
//! Every key resolves to at most one [`Condition`]. Column names always come
//! from the static per-collection tables below, never from the request, and
//! every value is bound as a parameter.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::error::{AppError, Result};
use crate::types::Collection;

/// Raw filters as they arrive from a query string.
pub type Filters = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Per-collection column tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Real,
    Text,
    Bool,
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
struct Column {
    name: &'static str,
    kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

/// "Parent has at least N active children" filter.
#[derive(Debug, Clone, Copy)]
struct ChildThreshold {
    key: &'static str,
    child_table: &'static str,
    parent_fk: &'static str,
}

struct Schema {
    columns: &'static [Column],
    /// Columns accepting `_gte` / `_lte` suffixes.
    ranged: &'static [&'static str],
    /// Columns accepting the `_regex` suffix.
    matchable: &'static [&'static str],
    threshold: Option<ChildThreshold>,
}

const SPORTS: Schema = Schema {
    columns: &[
        col("id", ColumnKind::Integer),
        col("name", ColumnKind::Text),
        col("slug", ColumnKind::Text),
        col("active", ColumnKind::Bool),
    ],
    ranged: &[],
    matchable: &["name"],
    threshold: Some(ChildThreshold {
        key: "min_active_events",
        child_table: "events",
        parent_fk: "sport_id",
    }),
};

const EVENTS: Schema = Schema {
    columns: &[
        col("id", ColumnKind::Integer),
        col("name", ColumnKind::Text),
        col("slug", ColumnKind::Text),
        col("active", ColumnKind::Bool),
        col("type", ColumnKind::Text),
        col("sport_id", ColumnKind::Integer),
        col("status", ColumnKind::Text),
        col("scheduled_start", ColumnKind::Timestamp),
        col("actual_start", ColumnKind::Timestamp),
    ],
    ranged: &["scheduled_start"],
    matchable: &["name"],
    threshold: Some(ChildThreshold {
        key: "min_active_selections",
        child_table: "selections",
        parent_fk: "event_id",
    }),
};

const SELECTIONS: Schema = Schema {
    columns: &[
        col("id", ColumnKind::Integer),
        col("name", ColumnKind::Text),
        col("event_id", ColumnKind::Integer),
        col("price", ColumnKind::Real),
        col("active", ColumnKind::Bool),
        col("outcome", ColumnKind::Text),
    ],
    ranged: &["price"],
    matchable: &["name"],
    threshold: None,
};

impl Schema {
    fn of(collection: Collection) -> &'static Schema {
        match collection {
            Collection::Sports => &SPORTS,
            Collection::Events => &EVENTS,
            Collection::Selections => &SELECTIONS,
        }
    }

    fn column(&self, name: &str) -> Option<Column> {
        self.columns.iter().copied().find(|c| c.name == name)
    }
}

// ---------------------------------------------------------------------------
// Compiled conditions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Gte,
    Lte,
}

impl RangeBound {
    fn operator(self) -> &'static str {
        match self {
            RangeBound::Gte => " >= ",
            RangeBound::Lte => " <= ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Range {
        column: &'static str,
        bound: RangeBound,
        value: BoundValue,
    },
    Regex {
        column: &'static str,
        pattern: String,
    },
    MinActiveChildren {
        child_table: &'static str,
        parent_fk: &'static str,
        threshold: i64,
    },
    Equals {
        column: &'static str,
        value: BoundValue,
    },
}

/// AND-joined conditions. Empty means "match everything".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryCondition {
    conditions: Vec<Condition>,
}

impl QueryCondition {
    pub fn is_match_all(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Appends ` WHERE ...` to `qb`, or nothing for a match-all condition.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        for (i, condition) in self.conditions.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            match condition {
                Condition::Range { column, bound, value } => {
                    qb.push(*column).push(bound.operator());
                    push_value(qb, value);
                }
                Condition::Regex { column, pattern } => {
                    qb.push(*column).push(" REGEXP ").push_bind(pattern.clone());
                }
                Condition::MinActiveChildren { child_table, parent_fk, threshold } => {
                    qb.push(format!(
                        "id IN (SELECT {parent_fk} FROM {child_table} WHERE active = 1 \
                         GROUP BY {parent_fk} HAVING COUNT(*) >= "
                    ))
                    .push_bind(*threshold)
                    .push(")");
                }
                Condition::Equals { column, value } => {
                    qb.push(*column).push(" = ");
                    push_value(qb, value);
                }
            }
        }
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &BoundValue) {
    match value {
        BoundValue::Bool(b) => qb.push_bind(*b),
        BoundValue::Integer(i) => qb.push_bind(*i),
        BoundValue::Real(r) => qb.push_bind(*r),
        BoundValue::Text(s) => qb.push_bind(s.clone()),
        BoundValue::Timestamp(ts) => qb.push_bind(*ts),
    };
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compiles `filters` into a condition over `collection`.
///
/// Keys are resolved in this order, first match wins:
/// 1. `<column>_gte` / `<column>_lte` on a ranged column
/// 2. `<column>_regex` on a matchable column
/// 3. the collection's child-threshold key (`min_active_events`, `min_active_selections`)
/// 4. equality on a column of the same name
///
/// A key matching none of these is a [`AppError::Validation`].
pub fn compile(collection: Collection, filters: &Filters) -> Result<QueryCondition> {
    let schema = Schema::of(collection);
    let mut conditions = Vec::with_capacity(filters.len());
    for (key, raw) in filters {
        if let Some(condition) = resolve(schema, collection, key, raw)? {
            conditions.push(condition);
        }
    }
    Ok(QueryCondition { conditions })
}

fn resolve(
    schema: &Schema,
    collection: Collection,
    key: &str,
    raw: &str,
) -> Result<Option<Condition>> {
    for (suffix, bound) in [("_gte", RangeBound::Gte), ("_lte", RangeBound::Lte)] {
        let Some(name) = key.strip_suffix(suffix) else { continue };
        if let Some(column) = schema.ranged.iter().copied().find(|c| *c == name) {
            let value = parse_range_value(schema, column, key, raw)?;
            return Ok(Some(Condition::Range { column, bound, value }));
        }
    }

    if let Some(name) = key.strip_suffix("_regex") {
        if let Some(column) = schema.matchable.iter().copied().find(|c| *c == name) {
            regex::Regex::new(raw).map_err(|e| {
                AppError::validation(format!("invalid pattern for \"{key}\": {e}"))
            })?;
            return Ok(Some(Condition::Regex { column, pattern: raw.to_string() }));
        }
    }

    if let Some(threshold) = schema.threshold.filter(|t| t.key == key) {
        let n = raw.trim().parse::<i64>().map_err(|_| {
            AppError::validation(format!("\"{key}\" expects an integer, got \"{raw}\""))
        })?;
        if n < 0 {
            return Err(AppError::validation(format!("\"{key}\" must not be negative")));
        }
        // at least zero active children holds for every row
        if n == 0 {
            return Ok(None);
        }
        return Ok(Some(Condition::MinActiveChildren {
            child_table: threshold.child_table,
            parent_fk: threshold.parent_fk,
            threshold: n,
        }));
    }

    let column = schema.column(key).ok_or_else(|| {
        AppError::validation(format!(
            "unknown filter \"{key}\" for collection \"{collection}\""
        ))
    })?;
    Ok(Some(Condition::Equals {
        column: column.name,
        value: equality_value(column.kind, raw),
    }))
}

fn parse_range_value(schema: &Schema, column: &str, key: &str, raw: &str) -> Result<BoundValue> {
    let kind = schema.column(column).map(|c| c.kind);
    let value = match kind {
        Some(ColumnKind::Timestamp) => parse_timestamp(raw).map(BoundValue::Timestamp),
        Some(ColumnKind::Real) => raw.trim().parse::<f64>().ok().map(BoundValue::Real),
        Some(ColumnKind::Integer) => raw.trim().parse::<i64>().ok().map(BoundValue::Integer),
        _ => None,
    };
    value.ok_or_else(|| AppError::validation(format!("invalid value \"{raw}\" for \"{key}\"")))
}

/// Equality operands are typed by their column where the raw string parses,
/// otherwise they pass through as text.
fn equality_value(kind: ColumnKind, raw: &str) -> BoundValue {
    let typed = match kind {
        ColumnKind::Bool => parse_bool(raw).map(BoundValue::Bool),
        ColumnKind::Integer => raw.trim().parse::<i64>().ok().map(BoundValue::Integer),
        ColumnKind::Real => raw.trim().parse::<f64>().ok().map(BoundValue::Real),
        ColumnKind::Timestamp => parse_timestamp(raw).map(BoundValue::Timestamp),
        ColumnKind::Text => None,
    };
    typed.unwrap_or_else(|| BoundValue::Text(raw.to_string()))
}

/// Accepts the usual truthy/falsy tokens, case-insensitively.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// RFC 3339, or a naive date-time / date taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
