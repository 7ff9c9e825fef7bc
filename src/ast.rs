//! Abstract syntax tree for GenQuery2 queries.

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

/// A parsed `SELECT` statement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Select {
    pub distinct: bool,
    pub projections: Vec<Projection>,
    pub conditions: Vec<LogicalTerm>,
    pub group_by: Vec<Column>,
    pub order_by: Vec<SortExpr>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumAsInner)]
pub enum Projection {
    Column(Column),
    Aggregate(AggregateCall),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCall {
    pub func: AggregateFunc,
    pub column: Column,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// A column reference, optionally carrying the SQL type of a `CAST(col AS
/// type)` written in the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub cast_type: Option<String>,
}

impl Column {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Column {
            name: name.into(),
            cast_type: None,
        }
    }
}

/// One element of the WHERE clause. The clause is a flat sequence: the first
/// term stands alone, every following term carries the connective it was
/// joined with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumAsInner)]
pub enum LogicalTerm {
    Condition(Condition),
    And(Box<LogicalTerm>),
    Or(Box<LogicalTerm>),
    Not(Box<LogicalTerm>),
    Group(Vec<LogicalTerm>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub column: Column,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumAsInner)]
pub enum Predicate {
    Eq(String),
    NotEq(String),
    Lt(String),
    Le(String),
    Gt(String),
    Ge(String),
    Between(String, String),
    In(Vec<String>),
    Like(String),
    IsNull,
    IsNotNull,
    Not(Box<Predicate>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortExpr {
    pub column: Column,
    pub ascending: bool,
}

/// Row range of the result set. `limit` falls back to
/// [Options::default_number_of_rows](crate::Options::default_number_of_rows)
/// when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
