//! Backend for translating the GenQuery2 AST into SQL.

mod context;
mod dialect;
mod gen_expr;
mod gen_query;

pub use dialect::Dialect;

use anyhow::Result;

use crate::ast::Select;
use crate::Options;

/// Translate a parsed query into a SQL string and its ordered bind values.
pub(crate) fn compile(select: &Select, options: &Options) -> Result<(String, Vec<String>)> {
    let (sql, values) = gen_query::translate_query(select, options)?;

    // formatting
    let sql = if options.format && !sql.is_empty() {
        sqlformat::format(
            &sql,
            &sqlformat::QueryParams::default(),
            sqlformat::FormatOptions::default(),
        )
    } else {
        sql
    };

    Ok((sql, values))
}
