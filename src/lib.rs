//! Compiler for the GenQuery2 query language.
//! Targets parameterized SQL for PostgreSQL, MySQL and Oracle.
//!
//! You probably want to start with the [compile] wrapper function.
//!
//! For more granular access, refer to this diagram:
//! ```ascii
//!         GenQuery2 string
//!
//!          (parse) │
//!  ast_of_genquery │
//!                  │
//!                  ▼        ast_of_json
//!                         ────────►
//!            Select AST              JSON
//!                         ◄────────
//!                  │        json_of_ast
//!       sql_of_ast │
//!                  ▼
//!
//!        (sql, bind values)
//! ```
//!
//! Compilation is a pure function of the query string and [Options]: no I/O,
//! no shared mutable state. The column catalog and schema graph are
//! initialized once and only ever read, so concurrent compiles need no
//! synchronization.

pub mod ast;
mod catalog;
mod error;
mod parser;
pub mod rows;
mod schema;
pub mod sql;
mod utils;

pub use error::{Error, ErrorKind, SourceLocation, Span};
pub use sql::Dialect;

use serde::{Deserialize, Serialize};

/// Compilation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// The effective calling user. Non-admin compiles bind this into the
    /// permission predicates.
    pub username: String,

    /// Target database dialect.
    pub database: Dialect,

    /// Row count emitted when the query carries no LIMIT / FETCH FIRST.
    pub default_number_of_rows: u16,

    /// Admins bypass the `user_name` predicate and see rows at the "null"
    /// permission level (1000) instead of "read object" (1050).
    pub admin_mode: bool,

    /// Pretty-print the generated statement.
    pub format: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            username: String::new(),
            database: Dialect::default(),
            default_number_of_rows: 16,
            admin_mode: false,
            format: false,
        }
    }
}

impl Options {
    pub fn with_username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_database(mut self, database: Dialect) -> Self {
        self.database = database;
        self
    }

    pub fn with_default_number_of_rows(mut self, rows: u16) -> Self {
        self.default_number_of_rows = rows;
        self
    }

    pub fn admin(mut self) -> Self {
        self.admin_mode = true;
        self
    }

    pub fn formatted(mut self) -> Self {
        self.format = true;
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if !self.admin_mode && self.username.is_empty() {
            return Err(Error::new(ErrorKind::InvalidOption { field: "username" })
                .with_help("non-admin compiles bind the username into the permission predicate"));
        }
        Ok(())
    }
}

/// Compile a GenQuery2 string into a SQL string and its ordered bind values.
///
/// This is a wrapper for:
/// - [ast_of_genquery] — build the AST from a GenQuery2 string
/// - [sql_of_ast] — resolve tables and joins, generate SQL and the bind list
pub fn compile(query: &str, options: &Options) -> Result<(String, Vec<String>), Error> {
    options.validate()?;
    parser::parse(query)
        .and_then(|ast| sql::compile(&ast, options))
        .map_err(error::downcast)
}

/// Parse a GenQuery2 string into its AST.
pub fn ast_of_genquery(query: &str) -> Result<ast::Select, Error> {
    parser::parse(query).map_err(error::downcast)
}

/// Generate SQL from an already-parsed query.
pub fn sql_of_ast(select: &ast::Select, options: &Options) -> Result<(String, Vec<String>), Error> {
    options.validate()?;
    sql::compile(select, options).map_err(error::downcast)
}

/// JSON serialization
pub fn json_of_ast(select: &ast::Select) -> Result<String, Error> {
    serde_json::to_string(select).map_err(|e| error::downcast(anyhow::anyhow!(e)))
}

/// JSON deserialization
pub fn ast_of_json(json: &str) -> Result<ast::Select, Error> {
    serde_json::from_str(json).map_err(|e| error::downcast(anyhow::anyhow!(e)))
}
