//! This module contains the parser, which is responsible for converting a
//! GenQuery2 string into a [Select] AST: a char-level lexer producing spanned
//! tokens, and a token-level grammar over the resulting stream.

mod lexer;
mod query;

use anyhow::{anyhow, Result};
use chumsky::error::SimpleReason;
use chumsky::{Parser, Stream};
use itertools::Itertools;

use self::lexer::Token;
use crate::ast::Select;
use crate::error::{Error, ErrorKind, Span};

pub(crate) const AGGREGATE_IN_WHERE: &str =
    "aggregate functions are not allowed in the where clause";

/// Build a [Select] AST from a GenQuery2 query string.
pub(crate) fn parse(input: &str) -> Result<Select> {
    let tokens = lexer::lexer()
        .parse(input)
        .map_err(|errors| anyhow!(convert_char_error(errors)))?;

    let len = input.chars().count();
    let stream = Stream::from_iter(len..len + 1, tokens.into_iter());

    query::query().parse(stream).map_err(|errors| {
        // The bison-era parser stopped at the first offending token; reporting
        // the first rejection matches that behavior.
        let error = errors
            .into_iter()
            .map(convert_error)
            .next()
            .unwrap_or_else(|| Error::new(ErrorKind::Internal("parser returned no error".to_string())));
        anyhow!(error)
    })
}

fn convert_char_error(mut errors: Vec<chumsky::prelude::Simple<char>>) -> Error {
    let e = errors.remove(0);
    let span = Some(Span {
        start: e.span().start,
        end: e.span().end,
    });

    let message = if let SimpleReason::Custom(message) = e.reason() {
        message.clone()
    } else {
        match e.found() {
            Some(c) => format!("unexpected character {c:?}"),
            None => "unexpected end of input".to_string(),
        }
    };

    Error::new(ErrorKind::Parse { message }).with_span(span)
}

fn convert_error(e: chumsky::prelude::Simple<Token>) -> Error {
    let span = Some(Span {
        start: e.span().start,
        end: e.span().end,
    });

    if let SimpleReason::Custom(message) = e.reason() {
        if message == AGGREGATE_IN_WHERE {
            return Error::new(ErrorKind::AggregateInWhere).with_span(span);
        }
        return Error::new(ErrorKind::Parse {
            message: message.clone(),
        })
        .with_span(span);
    }

    let expected = e
        .expected()
        .filter_map(|t| t.as_ref().map(ToString::to_string))
        .collect_vec();
    let found = e
        .found()
        .map(ToString::to_string)
        .unwrap_or_else(|| "end of input".to_string());

    let message = if expected.is_empty() {
        format!("unexpected {found}")
    } else {
        format!("expected {}, but found {found}", expected.join(", "))
    };

    Error::new(ErrorKind::Parse { message }).with_span(span)
}

#[cfg(test)]
mod test {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::ast::*;

    #[test]
    fn test_parse_simple_select() {
        let ast = parse("select COLL_NAME, DATA_NAME").unwrap();
        assert_eq!(
            ast,
            Select {
                projections: vec![
                    Projection::Column(Column::new("COLL_NAME")),
                    Projection::Column(Column::new("DATA_NAME")),
                ],
                ..Select::default()
            }
        );
    }

    #[test]
    fn test_parse_distinct_and_cast() {
        let ast = parse("select distinct cast(DATA_SIZE as bigint)").unwrap();
        assert!(ast.distinct);
        assert_eq!(
            ast.projections[0].as_column().unwrap(),
            &Column {
                name: "DATA_SIZE".to_string(),
                cast_type: Some("bigint".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_aggregate() {
        let ast = parse("select count(DATA_ID), sum(DATA_SIZE)").unwrap();
        assert_eq!(
            ast.projections[0].as_aggregate().unwrap(),
            &AggregateCall {
                func: AggregateFunc::Count,
                column: Column::new("DATA_ID"),
            }
        );
        assert_eq!(
            ast.projections[1].as_aggregate().unwrap().func,
            AggregateFunc::Sum
        );
    }

    #[test]
    fn test_parse_conditions() {
        let ast = parse(
            "select DATA_NAME where DATA_NAME like 'a%' and not (DATA_SIZE > '0' or DATA_SIZE is null)",
        )
        .unwrap();

        assert_eq!(
            ast.conditions,
            vec![
                LogicalTerm::Condition(Condition {
                    column: Column::new("DATA_NAME"),
                    predicate: Predicate::Like("a%".to_string()),
                }),
                LogicalTerm::And(Box::new(LogicalTerm::Not(Box::new(LogicalTerm::Group(
                    vec![
                        LogicalTerm::Condition(Condition {
                            column: Column::new("DATA_SIZE"),
                            predicate: Predicate::Gt("0".to_string()),
                        }),
                        LogicalTerm::Or(Box::new(LogicalTerm::Condition(Condition {
                            column: Column::new("DATA_SIZE"),
                            predicate: Predicate::IsNull,
                        }))),
                    ]
                ))))),
            ]
        );
    }

    #[test]
    fn test_parse_not_predicates() {
        let ast = parse("select DATA_NAME where DATA_NAME not like 'x%' and DATA_ID not in ('1', '2')")
            .unwrap();

        let first = ast.conditions[0].as_condition().unwrap();
        assert_eq!(
            first.predicate,
            Predicate::Not(Box::new(Predicate::Like("x%".to_string())))
        );

        let second = ast.conditions[1].as_and().unwrap().as_condition().unwrap();
        assert_eq!(
            second.predicate,
            Predicate::Not(Box::new(Predicate::In(vec![
                "1".to_string(),
                "2".to_string()
            ])))
        );
    }

    #[test]
    fn test_parse_between_and_is_not_null() {
        let ast = parse(
            "select DATA_ID where DATA_SIZE between '1' and '100' or DATA_CHECKSUM is not null",
        )
        .unwrap();

        assert_eq!(
            ast.conditions[0].as_condition().unwrap().predicate,
            Predicate::Between("1".to_string(), "100".to_string())
        );
        assert_eq!(
            ast.conditions[1].as_or().unwrap().as_condition().unwrap().predicate,
            Predicate::IsNotNull
        );
    }

    #[test]
    fn test_parse_group_order_range() {
        let ast = parse(
            "select count(DATA_ID) group by COLL_NAME order by COLL_NAME desc, DATA_NAME fetch first 5 rows only offset 10",
        )
        .unwrap();

        assert_eq!(ast.group_by, vec![Column::new("COLL_NAME")]);
        assert_eq!(
            ast.order_by,
            vec![
                SortExpr {
                    column: Column::new("COLL_NAME"),
                    ascending: false,
                },
                SortExpr {
                    column: Column::new("DATA_NAME"),
                    ascending: true,
                },
            ]
        );
        assert_eq!(ast.range.limit, Some(5));
        assert_eq!(ast.range.offset, Some(10));
    }

    #[test]
    fn test_parse_limit_spelling() {
        let ast = parse("select DATA_ID limit 32").unwrap();
        assert_eq!(ast.range.limit, Some(32));
        assert_eq!(ast.range.offset, None);
    }

    #[test]
    fn test_keywords_any_case() {
        let upper = parse("SELECT DATA_ID WHERE DATA_NAME LIKE 'x%' ORDER BY DATA_ID DESC").unwrap();
        let lower = parse("select DATA_ID where DATA_NAME like 'x%' order by DATA_ID desc").unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_parse_error_has_offset() {
        let err = crate::error::downcast(parse("select ,").unwrap_err());
        assert!(matches!(err.kind, ErrorKind::Parse { .. }));
        assert_eq!(err.span.map(|s| s.start), Some(7));
    }

    #[test]
    fn test_aggregate_in_where_is_rejected() {
        let err = crate::error::downcast(parse("select DATA_ID where count(DATA_ID) = '5'").unwrap_err());
        assert_eq!(err.kind, ErrorKind::AggregateInWhere);
    }

    #[test]
    fn test_missing_projection_is_rejected() {
        assert!(parse("select").is_err());
        assert!(parse("select where DATA_NAME = 'x'").is_err());
        assert!(parse("").is_err());
    }
}
