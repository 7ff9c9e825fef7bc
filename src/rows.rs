//! Iterator-style access to rows a caller already holds, keyed by opaque
//! handles. Query results arrive as a JSON array of rows (arrays of
//! strings); rule-engine style consumers walk them one row at a time through
//! `open` / `next_row` / `column` / `destroy`.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use serde_json::Value;

#[derive(Debug, Default)]
pub struct CursorTable {
    cursors: HashMap<u64, Cursor>,
    next_handle: u64,
}

#[derive(Debug)]
struct Cursor {
    rows: Vec<Value>,
    // None until the first next_row call.
    current_row: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    UnknownHandle(String),
    NoCurrentRow,
    ColumnOutOfRange(usize),
    InvalidRows(String),
}

impl Display for CursorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CursorError::UnknownHandle(handle) => write!(f, "unknown context handle: {handle}"),
            CursorError::NoCurrentRow => {
                f.write_str("no current row; call next_row before reading columns")
            }
            CursorError::ColumnOutOfRange(index) => write!(f, "column index out of range: {index}"),
            CursorError::InvalidRows(message) => write!(f, "invalid row data: {message}"),
        }
    }
}

impl StdError for CursorError {}

impl CursorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of rows and registers a cursor over it, positioned
    /// before the first row. The returned handle is an opaque string of
    /// decimal digits.
    pub fn open(&mut self, rows: &str) -> Result<String, CursorError> {
        let rows: Vec<Value> =
            serde_json::from_str(rows).map_err(|e| CursorError::InvalidRows(e.to_string()))?;

        let handle = self.next_handle;
        self.next_handle += 1;
        self.cursors.insert(
            handle,
            Cursor {
                rows,
                current_row: None,
            },
        );

        Ok(handle.to_string())
    }

    /// Advances the cursor. Returns false once the rows are exhausted; the
    /// cursor then stays on the last row.
    pub fn next_row(&mut self, handle: &str) -> Result<bool, CursorError> {
        let cursor = self.cursor_mut(handle)?;

        let next = cursor.current_row.map_or(0, |row| row + 1);
        if next < cursor.rows.len() {
            cursor.current_row = Some(next);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// The value at `index` within the current row.
    pub fn column(&self, handle: &str, index: usize) -> Result<&str, CursorError> {
        let cursor = self.cursor(handle)?;
        let row = cursor.current_row.ok_or(CursorError::NoCurrentRow)?;

        let value = cursor.rows[row]
            .get(index)
            .ok_or(CursorError::ColumnOutOfRange(index))?;

        value
            .as_str()
            .ok_or_else(|| CursorError::InvalidRows(format!("column {index} is not a string")))
    }

    /// Drops the cursor; the handle becomes invalid.
    pub fn destroy(&mut self, handle: &str) -> Result<(), CursorError> {
        let key = parse_handle(handle)?;
        self.cursors
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| CursorError::UnknownHandle(handle.to_string()))
    }

    fn cursor(&self, handle: &str) -> Result<&Cursor, CursorError> {
        self.cursors
            .get(&parse_handle(handle)?)
            .ok_or_else(|| CursorError::UnknownHandle(handle.to_string()))
    }

    fn cursor_mut(&mut self, handle: &str) -> Result<&mut Cursor, CursorError> {
        self.cursors
            .get_mut(&parse_handle(handle)?)
            .ok_or_else(|| CursorError::UnknownHandle(handle.to_string()))
    }
}

fn parse_handle(handle: &str) -> Result<u64, CursorError> {
    handle
        .parse::<u64>()
        .map_err(|_| CursorError::UnknownHandle(handle.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    const ROWS: &str = r#"[["/tempZone/home/alice", "1"], ["/tempZone/home/bob", "2"]]"#;

    #[test]
    fn test_cursor_lifecycle() {
        let mut table = CursorTable::new();
        let handle = table.open(ROWS).unwrap();
        assert!(handle.chars().all(|c| c.is_ascii_digit()));

        assert!(table.next_row(&handle).unwrap());
        assert_eq!(table.column(&handle, 0).unwrap(), "/tempZone/home/alice");
        assert_eq!(table.column(&handle, 1).unwrap(), "1");

        assert!(table.next_row(&handle).unwrap());
        assert_eq!(table.column(&handle, 0).unwrap(), "/tempZone/home/bob");

        // Exhausted; the cursor stays on the last row.
        assert!(!table.next_row(&handle).unwrap());
        assert_eq!(table.column(&handle, 1).unwrap(), "2");

        table.destroy(&handle).unwrap();
        assert_eq!(
            table.next_row(&handle).unwrap_err(),
            CursorError::UnknownHandle(handle)
        );
    }

    #[test]
    fn test_column_before_next_row() {
        let mut table = CursorTable::new();
        let handle = table.open(ROWS).unwrap();
        assert_eq!(
            table.column(&handle, 0).unwrap_err(),
            CursorError::NoCurrentRow
        );
    }

    #[test]
    fn test_column_out_of_range() {
        let mut table = CursorTable::new();
        let handle = table.open(ROWS).unwrap();
        table.next_row(&handle).unwrap();
        assert_eq!(
            table.column(&handle, 7).unwrap_err(),
            CursorError::ColumnOutOfRange(7)
        );
    }

    #[test]
    fn test_empty_rows() {
        let mut table = CursorTable::new();
        let handle = table.open("[]").unwrap();
        assert!(!table.next_row(&handle).unwrap());
    }

    #[test]
    fn test_invalid_input() {
        let mut table = CursorTable::new();
        assert!(matches!(
            table.open(r#"{"not": "an array"}"#),
            Err(CursorError::InvalidRows(_))
        ));
        assert_eq!(
            table.next_row("bogus").unwrap_err(),
            CursorError::UnknownHandle("bogus".to_string())
        );
    }

    #[test]
    fn test_handles_are_distinct() {
        let mut table = CursorTable::new();
        let first = table.open("[]").unwrap();
        let second = table.open("[]").unwrap();
        assert_ne!(first, second);

        // Destroying one cursor leaves the other addressable.
        table.destroy(&first).unwrap();
        assert!(!table.next_row(&second).unwrap());
    }
}
