//! Feature map for the supported catalog databases.
//!
//! The generic output targets PostgreSQL, which also follows ISO/IEC 9075
//! closely enough to serve as the default. Dialect-specifics exist only where
//! the default form is not accepted: MySQL's LIMIT and CAST types, Oracle's
//! recursion keyword and CAST types.

use core::fmt::Debug;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target database dialect.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    Oracle,
}

impl Dialect {
    pub(super) fn handler(&self) -> Box<dyn DialectHandler> {
        match self {
            Dialect::MySql => Box::new(MySqlDialect),
            Dialect::Oracle => Box::new(OracleDialect),
            Dialect::Postgres => Box::new(PostgresDialect),
        }
    }

    /// Parse a dialect name. Unrecognized values fall back to the default.
    pub fn from_name(name: &str) -> Self {
        Self::from_str(name).unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct PostgresDialect;
#[derive(Debug)]
pub struct MySqlDialect;
#[derive(Debug)]
pub struct OracleDialect;

pub(super) trait DialectHandler: Debug {
    /// Spelled after `WITH` when a recursive CTE is emitted. Oracle rejects
    /// the keyword and treats every CTE as potentially recursive.
    fn recursive_keyword(&self) -> &'static str {
        " RECURSIVE"
    }

    /// Integer type for CAST in the resource-hierarchy CTE.
    /// See https://modern-sql.com/caniuse/cast_as_bigint for the MySQL and
    /// Oracle choices.
    fn cast_int_type(&self) -> &'static str {
        "BIGINT"
    }

    /// Character type for CAST in the resource-hierarchy CTE.
    fn cast_char_type(&self) -> &'static str {
        "VARCHAR"
    }

    /// Whether row limits use `LIMIT n` instead of `FETCH FIRST n ROWS ONLY`.
    fn use_limit(&self) -> bool {
        false
    }
}

impl DialectHandler for PostgresDialect {}

impl DialectHandler for MySqlDialect {
    fn cast_int_type(&self) -> &'static str {
        "SIGNED"
    }

    fn cast_char_type(&self) -> &'static str {
        "CHAR"
    }

    fn use_limit(&self) -> bool {
        true
    }
}

impl DialectHandler for OracleDialect {
    fn recursive_keyword(&self) -> &'static str {
        ""
    }

    fn cast_int_type(&self) -> &'static str {
        "INTEGER"
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use insta::assert_debug_snapshot;

    use super::Dialect;

    #[test]
    fn test_dialect_from_str() {
        assert_debug_snapshot!(Dialect::from_str("postgres"), @r###"
        Ok(
            Postgres,
        )
        "###);

        assert_debug_snapshot!(Dialect::from_str("MySQL"), @r###"
        Ok(
            MySql,
        )
        "###);

        assert_debug_snapshot!(Dialect::from_str("foo"), @r###"
        Err(
            VariantNotFound,
        )
        "###);
    }

    #[test]
    fn test_unknown_dialect_falls_back_to_default() {
        assert_eq!(Dialect::from_name("sqlite"), Dialect::Postgres);
        assert_eq!(Dialect::from_name("oracle"), Dialect::Oracle);
    }
}
