use std::str::FromStr;

use chumsky::prelude::*;

/// Reserved words of the query language. Matching is case-insensitive; the
/// display form is the lowercase canonical spelling.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub(crate) enum Keyword {
    Select,
    Distinct,
    Where,
    And,
    Or,
    Not,
    Between,
    In,
    Like,
    Is,
    Null,
    Group,
    By,
    Order,
    Asc,
    Desc,
    Offset,
    Fetch,
    First,
    Rows,
    Only,
    Limit,
    Cast,
    As,
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) enum Token {
    Keyword(Keyword),
    Ident(String),
    Literal(String),
    Integer(u64),
    Control(String),
}

pub(crate) fn lexer() -> impl Parser<char, Vec<(Token, std::ops::Range<usize>)>, Error = Simple<char>>
{
    let control = just("!=")
        .or(just("<="))
        .or(just(">="))
        .map(|s: &str| s.to_string())
        .or(one_of(",()=<>").map(|c: char| c.to_string()))
        .map(Token::Control);

    let integer = text::digits(10)
        .try_map(|s: String, span| {
            s.parse::<u64>()
                .map_err(|_| Simple::custom(span, "integer literal is too large"))
        })
        .map(Token::Integer);

    // Keywords are case-insensitive, column names are not; anything that is
    // not a reserved word passes through as an identifier.
    let ident = ident_part().map(|s| match Keyword::from_str(&s) {
        Ok(keyword) => Token::Keyword(keyword),
        Err(_) => Token::Ident(s),
    });

    let literal = string_literal().map(Token::Literal);

    let token = choice((literal, integer, control, ident));

    token
        .map_with_span(|tok, span| (tok, span))
        .padded()
        .repeated()
        .then_ignore(end())
}

fn ident_part() -> impl Parser<char, String, Error = Simple<char>> {
    filter(|c: &char| c.is_ascii_alphabetic() || *c == '_')
        .map(Some)
        .chain::<char, Vec<_>, _>(
            filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_').repeated(),
        )
        .collect()
}

/// Single-quoted string. A doubled quote embeds a literal quote; the usual
/// backslash escapes are decoded.
fn string_literal() -> impl Parser<char, String, Error = Simple<char>> {
    let escape = just('\\').ignore_then(
        just('\\')
            .or(just('\''))
            .or(just('n').to('\n'))
            .or(just('r').to('\r'))
            .or(just('t').to('\t')),
    );

    just('\'')
        .ignore_then(
            just("''")
                .to('\'')
                .or(escape)
                .or(filter(|c: &char| *c != '\'' && *c != '\\'))
                .repeated(),
        )
        .then_ignore(just('\''))
        .collect::<String>()
        .labelled("string")
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "{keyword}"),
            Self::Ident(name) => write!(f, "`{name}`"),
            Self::Literal(value) => write!(f, "'{value}'"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Control(c) => write!(f, "{c}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lexer()
            .parse(input)
            .unwrap()
            .into_iter()
            .map(|(tok, _)| tok)
            .collect()
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            tokens("SELECT select SeLeCt"),
            vec![
                Token::Keyword(Keyword::Select),
                Token::Keyword(Keyword::Select),
                Token::Keyword(Keyword::Select),
            ]
        );
    }

    #[test]
    fn test_idents_and_controls() {
        assert_eq!(
            tokens("COLL_NAME, DATA_ID >= '5'"),
            vec![
                Token::Ident("COLL_NAME".to_string()),
                Token::Control(",".to_string()),
                Token::Ident("DATA_ID".to_string()),
                Token::Control(">=".to_string()),
                Token::Literal("5".to_string()),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r"'it''s' 'a\'b' 'c\nd'"),
            vec![
                Token::Literal("it's".to_string()),
                Token::Literal("a'b".to_string()),
                Token::Literal("c\nd".to_string()),
            ]
        );
        assert_eq!(tokens("''"), vec![Token::Literal(String::new())]);
    }

    #[test]
    fn test_spans_are_char_offsets() {
        let spanned = lexer().parse("select COLL_NAME").unwrap();
        assert_eq!(spanned[0].1, 0..6);
        assert_eq!(spanned[1].1, 7..16);
    }

    #[test]
    fn test_unterminated_string_is_rejected() {
        assert!(lexer().parse("'oops").is_err());
    }
}
