//! Clause assembly: turns the gathered state and rendered fragments into the
//! final statement.

use anyhow::Result;
use itertools::Itertools;
use log::{debug, trace};

use super::context::State;
use super::dialect::DialectHandler;
use super::gen_expr;
use crate::ast::{Column, Select, SortExpr};
use crate::catalog;
use crate::error::{Error, ErrorKind};
use crate::schema;
use crate::Options;

// The permission value for "null" is 1000. Admins are allowed to view all
// objects, which is achieved by lowering the minimum permission level to it;
// everyone else needs at least "read object" (1050). The permission model is
// linear.
const MIN_PERM_ADMIN: i32 = 1000;
const MIN_PERM_USER: i32 = 1050;

pub(super) fn translate_query(select: &Select, opts: &Options) -> Result<(String, Vec<String>)> {
    let mut state = State::new();

    trace!("phase 1: gather");

    let cols = gen_expr::selections_sql(&mut state, &select.projections)?;
    debug!("select columns => {cols}");

    let conds = gen_expr::conditions_sql(&mut state, &select.conditions)?;
    debug!("conditions => {conds}");

    // GROUP BY and ORDER BY may mention columns that appear nowhere else in
    // the query; gather them too so their tables are joined and aliased.
    for column in &select.group_by {
        gen_expr::gather_column(&mut state, column)?;
    }
    for sort in &select.order_by {
        gen_expr::gather_column(&mut state, &sort.column)?;
    }

    if state.sql_tables.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    for table in &state.sql_tables {
        debug!(
            "table => {table} [alias={}]",
            state.alias_of(table).unwrap_or("")
        );
    }
    debug!("requires metadata joins for R_DATA_MAIN? {}", state.joins_for_meta_data);
    debug!("requires metadata joins for R_COLL_MAIN? {}", state.joins_for_meta_coll);
    debug!("requires metadata joins for R_RESC_MAIN? {}", state.joins_for_meta_resc);
    debug!("requires metadata joins for R_USER_MAIN? {}", state.joins_for_meta_user);
    debug!("requires table joins for DATA_RESC_HIER? {}", state.sql_for_data_resc_hier);

    trace!("phase 2: sql generation");

    let handler = opts.database.handler();

    let anchor = state.sql_tables[0];
    let anchor_alias = alias_of(&state, anchor)?;

    let mut sql = with_clause(&state, handler.as_ref());
    sql.push_str("SELECT ");
    if select.distinct {
        sql.push_str("DISTINCT ");
    }
    sql.push_str(&cols);
    sql.push_str(&format!(" FROM {anchor} {anchor_alias}"));

    for join in inner_joins(&state)? {
        sql.push(' ');
        sql.push_str(&join);
    }

    sql.push_str(&metadata_joins(&state)?);
    sql.push_str(&permission_joins(&state));

    if state.sql_for_data_resc_hier {
        let resc_alias = alias_of(&state, "R_RESC_MAIN")?;
        sql.push_str(&format!(
            " INNER JOIN cte_drh ON cte_drh.resc_id = {resc_alias}.resc_id"
        ));
    }

    sql.push_str(&condition_clause(&mut state, opts, &conds));
    sql.push_str(&group_by_clause(&state, &select.group_by)?);
    sql.push_str(&order_by_clause(&state, &select.order_by)?);
    sql.push_str(&limit_clause(opts, handler.as_ref(), select.range.limit));

    // MySQL requires OFFSET after LIMIT, so OFFSET always comes last.
    if let Some(offset) = select.range.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    for value in &state.values {
        debug!("bindable value => {value}");
    }
    debug!("generated sql => [{sql}]");

    Ok((sql, state.values))
}

fn alias_of(state: &State, table: &str) -> Result<String> {
    match state.alias_of(table) {
        Some(alias) => Ok(alias.to_string()),
        None => Err(Error::new(ErrorKind::Internal(format!(
            "table {table} was never assigned an alias"
        )))
        .into()),
    }
}

/// Joins every table after the anchor through schema-graph edges. Tables may
/// only become joinable after an intermediate hop lands in `processed`, hence
/// the multi-pass scan; each pass tries to attach remaining tables to the
/// most recently joined one.
fn inner_joins(state: &State) -> Result<Vec<String>> {
    let graph = schema::graph();

    let mut joins = Vec::with_capacity(state.sql_tables.len().saturating_sub(1));
    let mut processed: Vec<&'static str> = vec![state.sql_tables[0]];
    let mut remaining: Vec<&'static str> = state.sql_tables[1..].to_vec();
    debug!("remaining = [{}]", remaining.iter().join(", "));

    for _ in 0..state.sql_tables.len() {
        if remaining.is_empty() {
            break;
        }

        let last = processed[processed.len() - 1];

        let mut i = 0;
        while i < remaining.len() {
            let candidate = remaining[i];
            match graph.edge(last, candidate) {
                Some(edge) => {
                    let lhs = alias_of(state, edge.lhs)?;
                    let rhs = alias_of(state, edge.rhs)?;
                    let alias = alias_of(state, candidate)?;

                    let join = format!(
                        "INNER JOIN {candidate} {alias} ON {}",
                        edge.predicate(&lhs, &rhs)
                    );
                    debug!("inner join => {join}");

                    joins.push(join);
                    processed.push(candidate);
                    remaining.remove(i);
                }
                None => i += 1,
            }
        }
    }

    if !remaining.is_empty() {
        return Err(Error::new(ErrorKind::UnjoinableTables {
            tables: remaining.iter().map(|t| t.to_string()).collect(),
        })
        .into());
    }

    Ok(joins)
}

/// Metadata attaches through a LEFT JOIN pair per entity type so that mixed
/// searches (criteria on both data objects and collections, say) do not drop
/// rows without metadata.
fn metadata_joins(state: &State) -> Result<String> {
    let mut sql = String::new();

    if state.joins_for_meta_data {
        let alias = alias_of(state, "R_DATA_MAIN")?;
        sql.push_str(&format!(
            " LEFT JOIN R_OBJT_METAMAP ommd ON {alias}.data_id = ommd.object_id \
              LEFT JOIN R_META_MAIN mmd ON ommd.meta_id = mmd.meta_id"
        ));
    }

    if state.joins_for_meta_coll {
        let alias = alias_of(state, "R_COLL_MAIN")?;
        sql.push_str(&format!(
            " LEFT JOIN R_OBJT_METAMAP ommc ON {alias}.coll_id = ommc.object_id \
              LEFT JOIN R_META_MAIN mmc ON ommc.meta_id = mmc.meta_id"
        ));
    }

    if state.joins_for_meta_resc {
        let alias = alias_of(state, "R_RESC_MAIN")?;
        sql.push_str(&format!(
            " LEFT JOIN R_OBJT_METAMAP ommr ON {alias}.resc_id = ommr.object_id \
              LEFT JOIN R_META_MAIN mmr ON ommr.meta_id = mmr.meta_id"
        ));
    }

    if state.joins_for_meta_user {
        let alias = alias_of(state, "R_USER_MAIN")?;
        sql.push_str(&format!(
            " LEFT JOIN R_OBJT_METAMAP ommu ON {alias}.user_id = ommu.object_id \
              LEFT JOIN R_META_MAIN mmu ON ommu.meta_id = mmu.meta_id"
        ));
    }

    Ok(sql)
}

/// Any query touching R_DATA_MAIN or R_COLL_MAIN is permission-filtered, so
/// the access/token/user joins are emitted whenever those tables are present,
/// independent of which columns triggered them.
fn permission_joins(state: &State) -> String {
    let mut sql = String::new();

    if let Some(alias) = state.alias_of("R_DATA_MAIN") {
        sql.push_str(&format!(
            " INNER JOIN R_OBJT_ACCESS pdoa ON {alias}.data_id = pdoa.object_id \
              INNER JOIN R_TOKN_MAIN pdt ON pdoa.access_type_id = pdt.token_id \
              INNER JOIN R_USER_MAIN pdu ON pdoa.user_id = pdu.user_id"
        ));
    }

    if let Some(alias) = state.alias_of("R_COLL_MAIN") {
        sql.push_str(&format!(
            " INNER JOIN R_OBJT_ACCESS pcoa ON {alias}.coll_id = pcoa.object_id \
              INNER JOIN R_TOKN_MAIN pct ON pcoa.access_type_id = pct.token_id \
              INNER JOIN R_USER_MAIN pcu ON pcoa.user_id = pcu.user_id"
        ));
    }

    sql
}

/// WHERE clause: the user's conditions followed by the permission predicates.
/// Non-admin compiles additionally pin the permission rows to the calling
/// user, binding the username once per guarded table.
fn condition_clause(state: &mut State, opts: &Options, conditions: &str) -> String {
    let min_perm = if opts.admin_mode {
        MIN_PERM_ADMIN
    } else {
        MIN_PERM_USER
    };

    let data = state.alias_of("R_DATA_MAIN").is_some();
    let coll = state.alias_of("R_COLL_MAIN").is_some();

    let mut sql = String::new();
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(conditions);
    }

    let lead = if conditions.is_empty() { " WHERE " } else { " AND " };

    match (data, coll, opts.admin_mode) {
        (true, true, true) => {
            sql.push_str(&format!(
                "{lead}pdoa.access_type_id >= {min_perm} AND pcoa.access_type_id >= {min_perm}"
            ));
        }
        (true, false, true) => {
            sql.push_str(&format!("{lead}pdoa.access_type_id >= {min_perm}"));
        }
        (false, true, true) => {
            sql.push_str(&format!("{lead}pcoa.access_type_id >= {min_perm}"));
        }
        (true, true, false) => {
            sql.push_str(&format!(
                "{lead}pdu.user_name = ? AND pcu.user_name = ? \
                 AND pdoa.access_type_id >= {min_perm} AND pcoa.access_type_id >= {min_perm}"
            ));
            state.values.push(opts.username.clone());
            state.values.push(opts.username.clone());
        }
        (true, false, false) => {
            sql.push_str(&format!(
                "{lead}pdu.user_name = ? AND pdoa.access_type_id >= {min_perm}"
            ));
            state.values.push(opts.username.clone());
        }
        (false, true, false) => {
            sql.push_str(&format!(
                "{lead}pcu.user_name = ? AND pcoa.access_type_id >= {min_perm}"
            ));
            state.values.push(opts.username.clone());
        }
        (false, false, _) => {}
    }

    sql
}

/// Renders a GROUP BY / ORDER BY column. The cast comes from the column
/// itself when written inline, falling back to the cast recorded for the
/// column's first appearance in the query.
fn clause_column_sql(state: &State, column: &Column) -> Result<String> {
    let info = catalog::lookup(&column.name)?;
    let alias = gen_expr::column_alias(state, &column.name)?;

    let cast = column
        .cast_type
        .as_deref()
        .or_else(|| state.cast_of(&column.name));

    Ok(match cast {
        Some(ty) => format!("CAST({alias}.{} AS {ty})", info.name),
        None => format!("{alias}.{}", info.name),
    })
}

fn group_by_clause(state: &State, group_by: &[Column]) -> Result<String> {
    if group_by.is_empty() {
        return Ok(String::new());
    }

    let columns = group_by
        .iter()
        .map(|column| clause_column_sql(state, column))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(" GROUP BY {}", columns.iter().join(", ")))
}

fn order_by_clause(state: &State, order_by: &[SortExpr]) -> Result<String> {
    if order_by.is_empty() {
        return Ok(String::new());
    }

    let expressions = order_by
        .iter()
        .map(|sort| {
            let column = clause_column_sql(state, &sort.column)?;
            let direction = if sort.ascending { "ASC" } else { "DESC" };
            Ok(format!("{column} {direction}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(" ORDER BY {}", expressions.iter().join(", ")))
}

/// Recursive CTE producing every resource hierarchy as a `;`-separated
/// string. Walks from the leaves toward the roots, concatenating parent
/// names; rows with `parent_id = 0` hold complete hierarchies.
fn with_clause(state: &State, handler: &dyn DialectHandler) -> String {
    if !state.sql_for_data_resc_hier {
        return String::new();
    }

    let int_type = handler.cast_int_type();
    let char_type = handler.cast_char_type();

    format!(
        "WITH{recursive} cte_drh AS (\
         SELECT resc_id, resc_name hier, \
         CASE WHEN resc_parent = '' THEN 0 ELSE CAST(resc_parent AS {int_type}) END parent_id \
         FROM R_RESC_MAIN WHERE resc_id > 0 \
         UNION ALL \
         SELECT cte_drh.resc_id, \
         CAST(CONCAT(CONCAT(U.resc_name, ';'), cte_drh.hier) AS {char_type}(250)), \
         CASE WHEN U.resc_parent = '' THEN 0 ELSE CAST(U.resc_parent AS {int_type}) END parent_id \
         FROM cte_drh INNER JOIN R_RESC_MAIN U ON U.resc_id = cte_drh.parent_id) ",
        recursive = handler.recursive_keyword(),
    )
}

fn limit_clause(opts: &Options, handler: &dyn DialectHandler, limit: Option<u64>) -> String {
    let rows = limit.unwrap_or(u64::from(opts.default_number_of_rows));

    if handler.use_limit() {
        format!(" LIMIT {rows}")
    } else {
        format!(" FETCH FIRST {rows} ROWS ONLY")
    }
}
