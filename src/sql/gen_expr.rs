//! The gather walk: renders select-list and WHERE fragments while recording
//! tables, aliases, special-join flags, and bind values into [State].

use anyhow::Result;
use itertools::Itertools;

use super::context::State;
use crate::ast::{AggregateCall, Column, Condition, LogicalTerm, Predicate, Projection};
use crate::catalog::{self, Classification};
use crate::error::{Error, ErrorKind};

/// Registers the tables and flags a column reference requires. Special
/// columns never insert their own table; they insert the table their join
/// pattern anchors to.
pub(super) fn gather_column(state: &mut State, column: &Column) -> Result<()> {
    let info = catalog::lookup(&column.name)?;
    state.remember_column(column);

    let class = catalog::classify(&column.name);
    match class {
        Classification::MetaData => state.joins_for_meta_data = true,
        Classification::MetaColl => state.joins_for_meta_coll = true,
        Classification::MetaResc => state.joins_for_meta_resc = true,
        Classification::MetaUser => state.joins_for_meta_user = true,
        Classification::DataRescHier => state.sql_for_data_resc_hier = true,
        _ => {}
    }

    match class.anchor_table() {
        Some(anchor) => state.ensure_table(anchor),
        None => state.ensure_table(info.table),
    }

    Ok(())
}

/// The alias a column renders through: reserved for special columns, the
/// generated alias of its physical table otherwise.
pub(super) fn column_alias(state: &State, name: &str) -> Result<String> {
    if let Some(alias) = catalog::classify(name).reserved_alias() {
        return Ok(alias.to_string());
    }

    let info = catalog::lookup(name)?;
    match state.alias_of(info.table) {
        Some(alias) => Ok(alias.to_string()),
        None => Err(Error::new(ErrorKind::Internal(format!(
            "table {} was never assigned an alias",
            info.table
        )))
        .into()),
    }
}

fn column_sql(state: &mut State, column: &Column) -> Result<String> {
    gather_column(state, column)?;

    let info = catalog::lookup(&column.name)?;
    let alias = column_alias(state, &column.name)?;

    Ok(match &column.cast_type {
        Some(ty) => format!("CAST({alias}.{} AS {ty})", info.name),
        None => format!("{alias}.{}", info.name),
    })
}

fn aggregate_sql(state: &mut State, call: &AggregateCall) -> Result<String> {
    if !state.in_select_clause {
        return Err(Error::new(ErrorKind::AggregateInWhere).into());
    }

    let inner = column_sql(state, &call.column)?;
    Ok(format!("{}({inner})", call.func))
}

fn projection_sql(state: &mut State, projection: &Projection) -> Result<String> {
    match projection {
        Projection::Column(column) => column_sql(state, column),
        Projection::Aggregate(call) => aggregate_sql(state, call),
    }
}

pub(super) fn selections_sql(state: &mut State, projections: &[Projection]) -> Result<String> {
    if projections.is_empty() {
        return Err(Error::new(ErrorKind::EmptySelection).into());
    }

    state.in_select_clause = true;
    let columns = projections
        .iter()
        .map(|projection| projection_sql(state, projection))
        .collect::<Result<Vec<_>>>();
    state.in_select_clause = false;

    Ok(columns?.iter().join(", "))
}

pub(super) fn conditions_sql(state: &mut State, terms: &[LogicalTerm]) -> Result<String> {
    let mut sql = String::new();
    for term in terms {
        sql.push_str(&term_sql(state, term)?);
    }
    Ok(sql)
}

fn term_sql(state: &mut State, term: &LogicalTerm) -> Result<String> {
    Ok(match term {
        LogicalTerm::Condition(condition) => condition_sql(state, condition)?,
        LogicalTerm::And(term) => format!(" AND {}", term_sql(state, term)?),
        LogicalTerm::Or(term) => format!(" OR {}", term_sql(state, term)?),
        LogicalTerm::Not(term) => format!("NOT {}", term_sql(state, term)?),
        LogicalTerm::Group(terms) => format!("({})", conditions_sql(state, terms)?),
    })
}

fn condition_sql(state: &mut State, condition: &Condition) -> Result<String> {
    let column = column_sql(state, &condition.column)?;
    let predicate = predicate_sql(state, &condition.predicate);
    Ok(format!("{column}{predicate}"))
}

/// Renders the operator side of a condition. Literal values never reach the
/// statement text; each one becomes a `?` and lands in the bind list.
fn predicate_sql(state: &mut State, predicate: &Predicate) -> String {
    match predicate {
        Predicate::Eq(value) => {
            state.values.push(value.clone());
            " = ?".to_string()
        }
        Predicate::NotEq(value) => {
            state.values.push(value.clone());
            " != ?".to_string()
        }
        Predicate::Lt(value) => {
            state.values.push(value.clone());
            " < ?".to_string()
        }
        Predicate::Le(value) => {
            state.values.push(value.clone());
            " <= ?".to_string()
        }
        Predicate::Gt(value) => {
            state.values.push(value.clone());
            " > ?".to_string()
        }
        Predicate::Ge(value) => {
            state.values.push(value.clone());
            " >= ?".to_string()
        }
        Predicate::Between(lo, hi) => {
            state.values.push(lo.clone());
            state.values.push(hi.clone());
            " BETWEEN ? AND ?".to_string()
        }
        Predicate::In(values) => {
            state.values.extend(values.iter().cloned());
            format!(" IN ({})", itertools::repeat_n("?", values.len()).join(", "))
        }
        Predicate::Like(value) => {
            state.values.push(value.clone());
            " LIKE ?".to_string()
        }
        Predicate::IsNull => " IS NULL".to_string(),
        Predicate::IsNotNull => " IS NOT NULL".to_string(),
        Predicate::Not(inner) => format!(" NOT{}", predicate_sql(state, inner)),
    }
}
