use std::collections::HashMap;

use crate::ast::Column;
use crate::utils::NameGenerator;

/// Mutable state for a single compile. Owns the table list (first entry is
/// the FROM anchor), the generated aliases, the bind values gathered so far,
/// and the flags that trigger the specialized join patterns.
#[derive(Debug)]
pub(super) struct State {
    pub sql_tables: Vec<&'static str>,
    pub table_aliases: HashMap<&'static str, String>,
    alias_gen: NameGenerator,

    pub values: Vec<String>,

    pub in_select_clause: bool,

    pub joins_for_meta_data: bool,
    pub joins_for_meta_coll: bool,
    pub joins_for_meta_resc: bool,
    pub joins_for_meta_user: bool,

    pub sql_for_data_resc_hier: bool,

    // Every column mentioned anywhere in the query, with the CAST type of its
    // first occurrence. GROUP BY and ORDER BY resolve casts through this.
    seen_columns: HashMap<String, Option<String>>,
}

impl State {
    pub fn new() -> Self {
        State {
            sql_tables: Vec::new(),
            table_aliases: HashMap::new(),
            alias_gen: NameGenerator::new("t"),
            values: Vec::new(),
            in_select_clause: false,
            joins_for_meta_data: false,
            joins_for_meta_coll: false,
            joins_for_meta_resc: false,
            joins_for_meta_user: false,
            sql_for_data_resc_hier: false,
            seen_columns: HashMap::new(),
        }
    }

    /// Registers `table` in the join list, assigning the next generated
    /// alias. Idempotent.
    pub fn ensure_table(&mut self, table: &'static str) {
        if !self.sql_tables.contains(&table) {
            let alias = self.alias_gen.gen();
            self.sql_tables.push(table);
            self.table_aliases.insert(table, alias);
        }
    }

    pub fn alias_of(&self, table: &str) -> Option<&str> {
        self.table_aliases.get(table).map(String::as_str)
    }

    pub fn remember_column(&mut self, column: &Column) {
        self.seen_columns
            .entry(column.name.clone())
            .or_insert_with(|| column.cast_type.clone());
    }

    pub fn cast_of(&self, name: &str) -> Option<&str> {
        self.seen_columns.get(name).and_then(|cast| cast.as_deref())
    }
}
