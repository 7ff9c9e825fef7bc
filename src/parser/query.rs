use chumsky::prelude::*;

use super::lexer::{Keyword, Token};
use super::AGGREGATE_IN_WHERE;
use crate::ast::*;

fn kw(keyword: Keyword) -> impl Parser<Token, (), Error = Simple<Token>> + Clone {
    just(Token::Keyword(keyword)).ignored()
}

fn ctrl(c: &'static str) -> impl Parser<Token, (), Error = Simple<Token>> + Clone {
    just(Token::Control(c.to_string())).ignored()
}

fn ident() -> impl Parser<Token, String, Error = Simple<Token>> + Clone {
    select! { Token::Ident(name) => name }
}

fn string_literal() -> impl Parser<Token, String, Error = Simple<Token>> + Clone {
    select! { Token::Literal(value) => value }
}

fn integer() -> impl Parser<Token, u64, Error = Simple<Token>> + Clone {
    select! { Token::Integer(value) => value }
}

fn column() -> impl Parser<Token, Column, Error = Simple<Token>> + Clone {
    let cast = kw(Keyword::Cast)
        .ignore_then(ctrl("("))
        .ignore_then(ident())
        .then_ignore(kw(Keyword::As))
        .then(ident())
        .then_ignore(ctrl(")"))
        .map(|(name, ty)| Column {
            name,
            cast_type: Some(ty),
        });

    cast.or(ident().map(Column::new))
}

fn aggregate_function() -> impl Parser<Token, AggregateFunc, Error = Simple<Token>> + Clone {
    select! {
        Token::Keyword(Keyword::Count) => AggregateFunc::Count,
        Token::Keyword(Keyword::Sum) => AggregateFunc::Sum,
        Token::Keyword(Keyword::Avg) => AggregateFunc::Avg,
        Token::Keyword(Keyword::Min) => AggregateFunc::Min,
        Token::Keyword(Keyword::Max) => AggregateFunc::Max,
    }
}

fn projection() -> impl Parser<Token, Projection, Error = Simple<Token>> + Clone {
    aggregate_function()
        .then(column().delimited_by(ctrl("("), ctrl(")")))
        .map(|(func, column)| Projection::Aggregate(AggregateCall { func, column }))
        .or(column().map(Projection::Column))
}

fn predicate() -> impl Parser<Token, Predicate, Error = Simple<Token>> + Clone {
    let comparison = filter_map(|span, tok| match tok {
        Token::Control(op) if matches!(op.as_str(), "=" | "!=" | "<" | "<=" | ">" | ">=") => Ok(op),
        tok => Err(Simple::expected_input_found(span, Vec::new(), Some(tok))),
    })
    .then(string_literal())
    .map(|(op, value)| match op.as_str() {
        "=" => Predicate::Eq(value),
        "!=" => Predicate::NotEq(value),
        "<" => Predicate::Lt(value),
        "<=" => Predicate::Le(value),
        ">" => Predicate::Gt(value),
        _ => Predicate::Ge(value),
    });

    let between = kw(Keyword::Between)
        .ignore_then(string_literal())
        .then_ignore(kw(Keyword::And))
        .then(string_literal())
        .map(|(lo, hi)| Predicate::Between(lo, hi));

    let in_list = kw(Keyword::In)
        .ignore_then(
            string_literal()
                .separated_by(ctrl(","))
                .at_least(1)
                .delimited_by(ctrl("("), ctrl(")")),
        )
        .map(Predicate::In);

    let like = kw(Keyword::Like)
        .ignore_then(string_literal())
        .map(Predicate::Like);

    let is_null = kw(Keyword::Is)
        .ignore_then(kw(Keyword::Not).or_not())
        .then_ignore(kw(Keyword::Null))
        .map(|not| {
            if not.is_some() {
                Predicate::IsNotNull
            } else {
                Predicate::IsNull
            }
        });

    // `col not between/in/like ...`; `is not null` is handled above.
    let negated = kw(Keyword::Not)
        .ignore_then(choice((between.clone(), in_list.clone(), like.clone())))
        .map(|predicate| Predicate::Not(Box::new(predicate)));

    choice((comparison, between, in_list, like, is_null, negated))
}

fn conditions() -> impl Parser<Token, Vec<LogicalTerm>, Error = Simple<Token>> + Clone {
    recursive(|conditions| {
        let grouping = conditions
            .delimited_by(ctrl("("), ctrl(")"))
            .map(LogicalTerm::Group);

        // Aggregates are select-list only; recognizing the call shape here
        // produces a precise error instead of a generic expectation list.
        let aggregate = aggregate_function()
            .then(ctrl("("))
            .try_map(|_, span| Err::<LogicalTerm, _>(Simple::custom(span, AGGREGATE_IN_WHERE)));

        let term = recursive(|term| {
            choice((
                kw(Keyword::Not)
                    .ignore_then(term)
                    .map(|t| LogicalTerm::Not(Box::new(t))),
                grouping,
                aggregate,
                column()
                    .then(predicate())
                    .map(|(column, predicate)| LogicalTerm::Condition(Condition { column, predicate })),
            ))
        });

        let connective = kw(Keyword::And).to(true).or(kw(Keyword::Or).to(false));

        term.clone()
            .then(connective.then(term).repeated())
            .map(|(first, rest)| {
                let mut terms = vec![first];
                for (is_and, term) in rest {
                    terms.push(if is_and {
                        LogicalTerm::And(Box::new(term))
                    } else {
                        LogicalTerm::Or(Box::new(term))
                    });
                }
                terms
            })
    })
}

pub(crate) fn query() -> impl Parser<Token, Select, Error = Simple<Token>> {
    let projections = projection().separated_by(ctrl(",")).at_least(1);

    let group_by = kw(Keyword::Group)
        .ignore_then(kw(Keyword::By))
        .ignore_then(column().separated_by(ctrl(",")).at_least(1));

    let sort = column()
        .then(kw(Keyword::Asc).to(true).or(kw(Keyword::Desc).to(false)).or_not())
        .map(|(column, ascending)| SortExpr {
            column,
            ascending: ascending.unwrap_or(true),
        });

    let order_by = kw(Keyword::Order)
        .ignore_then(kw(Keyword::By))
        .ignore_then(sort.separated_by(ctrl(",")).at_least(1));

    let limit = kw(Keyword::Fetch)
        .ignore_then(kw(Keyword::First))
        .ignore_then(integer())
        .then_ignore(kw(Keyword::Rows))
        .then_ignore(kw(Keyword::Only))
        .or(kw(Keyword::Limit).ignore_then(integer()));

    let offset = kw(Keyword::Offset).ignore_then(integer());

    kw(Keyword::Select)
        .ignore_then(kw(Keyword::Distinct).or_not())
        .then(projections)
        .then(kw(Keyword::Where).ignore_then(conditions()).or_not())
        .then(group_by.or_not())
        .then(order_by.or_not())
        .then(limit.or_not())
        .then(offset.or_not())
        .then_ignore(end())
        .map(
            |((((((distinct, projections), conditions), group_by), order_by), limit), offset)| {
                Select {
                    distinct: distinct.is_some(),
                    projections,
                    conditions: conditions.unwrap_or_default(),
                    group_by: group_by.unwrap_or_default(),
                    order_by: order_by.unwrap_or_default(),
                    range: Range { limit, offset },
                }
            },
        )
}
