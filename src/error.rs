pub use anyhow::Result;

use ariadne::{Config, Label, Report, ReportKind, Source};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Range;

/// Character offsets into the query string.
#[derive(Clone, PartialEq, Eq, Copy, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub help: Option<String>,
}

/// Location within the query string.
/// Tuples contain:
/// - line number (0-based),
/// - column number within that line (0-based),
#[derive(Debug, Clone, Serialize)]
pub struct SourceLocation {
    pub start: (usize, usize),
    pub end: (usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The lexer or parser rejected the input.
    Parse { message: String },
    /// A column name that is not part of the catalog.
    UnknownColumn { name: String },
    /// An aggregate function call outside of the select list.
    AggregateInWhere,
    /// The join planner could not reach these tables from the anchor.
    UnjoinableTables { tables: Vec<String> },
    /// The select list is empty.
    EmptySelection,
    /// An option value is unusable for this compile.
    InvalidOption { field: &'static str },
    /// A bug; not expected to surface.
    Internal(String),
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error {
            kind,
            span: None,
            help: None,
        }
    }

    pub fn with_help<S: Into<String>>(mut self, help: S) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    /// Line/column lookup of the error span within `source`.
    pub fn location(&self, source: &str) -> Option<SourceLocation> {
        let span = self.span?;
        let source = Source::from(source);

        let start = source.get_offset_line(span.start)?;
        let end = source.get_offset_line(span.end)?;
        Some(SourceLocation {
            start: (start.1, start.2),
            end: (end.1, end.2),
        })
    }

    /// Builds the annotated report for this error, underlining its span
    /// within `source`.
    pub fn composed(&self, source: &str, color: bool) -> Option<String> {
        let config = Config::default().with_color(color);
        let source_id = "query";

        let span = Range::from(self.span?);

        let mut report = Report::build(ReportKind::Error, source_id, span.start)
            .with_config(config)
            .with_message("")
            .with_label(Label::new((source_id, span)).with_message(self.kind.message()));

        if let Some(help) = &self.help {
            report.set_help(help);
        }

        let mut out = Vec::new();
        report
            .finish()
            .write((source_id, Source::from(source)), &mut out)
            .ok()?;
        String::from_utf8(out).ok()
    }
}

impl StdError for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind.message())
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl ErrorKind {
    fn message(&self) -> String {
        match self {
            ErrorKind::Parse { message } => message.clone(),
            ErrorKind::UnknownColumn { name } => format!("unknown column: {name}"),
            ErrorKind::AggregateInWhere => {
                "aggregate functions are not allowed in the where clause".to_string()
            }
            ErrorKind::UnjoinableTables { tables } => {
                format!("cannot join tables into query: {}", tables.join(", "))
            }
            ErrorKind::EmptySelection => "no columns selected".to_string(),
            ErrorKind::InvalidOption { field } => format!("invalid option: {field}"),
            ErrorKind::Internal(message) => format!("internal compiler error: {message}"),
        }
    }
}

/// Recovers the typed compile error at the public API boundary.
pub fn downcast(error: anyhow::Error) -> Error {
    match error.downcast::<Error>() {
        Ok(error) => error,
        // default to basic Display
        Err(error) => Error::new(ErrorKind::Internal(format!("{error:#?}"))),
    }
}

impl From<Span> for Range<usize> {
    fn from(a: Span) -> Self {
        a.start..a.end
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "span-chars-{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::new(ErrorKind::UnknownColumn {
                name: "DATA_SIZE_X".to_string()
            })
            .to_string(),
            "unknown column: DATA_SIZE_X"
        );
        assert_eq!(
            Error::new(ErrorKind::UnjoinableTables {
                tables: vec!["R_ZONE_MAIN".to_string(), "R_DATA_MAIN".to_string()]
            })
            .to_string(),
            "cannot join tables into query: R_ZONE_MAIN, R_DATA_MAIN"
        );
        assert_eq!(
            Error::new(ErrorKind::EmptySelection).to_string(),
            "no columns selected"
        );
    }

    #[test]
    fn test_location() {
        let source = "select\nBAD_COLUMN";
        let error = Error::new(ErrorKind::UnknownColumn {
            name: "BAD_COLUMN".to_string(),
        })
        .with_span(Some(Span { start: 7, end: 17 }));

        let location = error.location(source).unwrap();
        assert_eq!(location.start, (1, 0));
        assert_eq!(location.end, (1, 10));
    }

    #[test]
    fn test_composed_report() {
        let source = "select NOPE";
        let error = Error::new(ErrorKind::UnknownColumn {
            name: "NOPE".to_string(),
        })
        .with_span(Some(Span { start: 7, end: 11 }))
        .with_help("column names are case-sensitive");

        let report = error.composed(source, false).unwrap();
        assert!(report.contains("unknown column: NOPE"));
        assert!(report.contains("case-sensitive"));
    }
}
