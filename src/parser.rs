use crate::{
    ast::Expr,
    error::LexicalError,
    lexer::{Lexer, Token},
};
use lalrpop_util::{lalrpop_mod, ParseError};

lalrpop_mod!(
    #[allow(clippy::all)]
    grammar
);

use self::grammar::FilterParser;

pub type FilterParseError<'a> = ParseError<usize, Token<'a>, LexicalError>;

/// Parses an expression into its syntax tree. The parser keeps no state between calls.
#[inline]
pub fn parse(input: &str) -> Result<Box<Expr>, FilterParseError<'_>> {
    let lexer = Lexer::new(input);
    FilterParser::new().parse(lexer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Field, Literal, Operator};

    fn compare(name: &str, offset: usize, operator: Operator, value: (&str, usize)) -> Box<Expr> {
        Box::new(Expr::Compare {
            field: Field::new(name, offset),
            operator,
            value: Literal::new(value.0, value.1),
        })
    }

    #[test]
    fn return_an_error_on_empty_input() {
        let parsed = parse("");

        assert!(parsed.is_err());
    }

    #[test]
    fn return_an_error_on_invalid_input() {
        let parsed = parse(")(invalid-");

        assert!(parsed.is_err());
    }

    #[test]
    fn return_an_error_on_empty_parenthesis() {
        let parsed = parse("()");

        assert!(parsed.is_err());
    }

    #[test]
    fn can_parse_equal_expression() {
        let parsed = parse("proto = 6");

        assert_eq!(Ok(compare("proto", 0, Operator::Equal, ("6", 8))), parsed);
    }

    #[test]
    fn can_parse_every_comparison_operator() {
        let cases = [
            ("bytes == 1", Operator::Equal),
            ("bytes eq 1", Operator::Equal),
            ("bytes != 1", Operator::NotEqual),
            ("bytes < 1", Operator::LessThan),
            ("bytes lt 1", Operator::LessThan),
            ("bytes <= 1", Operator::LessThanEqual),
            ("bytes > 1", Operator::GreaterThan),
            ("bytes >= 1", Operator::GreaterThanEqual),
            ("bytes & 1", Operator::IsSet),
            ("bytes isset 1", Operator::IsSet),
        ];

        for (input, operator) in cases {
            let parsed = parse(input);

            assert!(
                matches!(parsed.as_deref(), Ok(Expr::Compare { operator: actual, .. }) if *actual == operator),
                "{input} => {parsed:?}"
            );
        }
    }

    #[test]
    fn can_parse_a_quoted_literal() {
        let parsed = parse(r#"ifname = "eth 0""#);

        assert_eq!(
            Ok(compare("ifname", 0, Operator::Equal, ("eth 0", 9))),
            parsed
        );
    }

    #[test]
    fn can_parse_a_field_followed_by_a_literal() {
        let parsed = parse("port 80");

        assert_eq!(
            Ok(Box::new(Expr::Implied {
                field: Field::new("port", 0),
                value: Literal::new("80", 5),
            })),
            parsed
        );
    }

    #[test]
    fn can_parse_a_bare_field() {
        let parsed = parse("tcp");

        assert_eq!(Ok(Box::new(Expr::Bare(Field::new("tcp", 0)))), parsed);
    }

    #[test]
    fn can_parse_an_exist_expression() {
        let parsed = parse("exists vlan");

        assert_eq!(Ok(Box::new(Expr::Exist(Field::new("vlan", 7)))), parsed);
    }

    #[test]
    fn can_parse_any_and_none() {
        assert_eq!(Ok(Box::new(Expr::Any)), parse("any"));
        assert_eq!(Ok(Box::new(Expr::Nothing)), parse("NONE"));
    }

    #[test]
    fn can_parse_in_expression() {
        let parsed = parse("port in [22, 80 443]");

        assert_eq!(
            Ok(Box::new(Expr::In {
                field: Field::new("port", 0),
                values: vec![
                    Literal::new("22", 9),
                    Literal::new("80", 13),
                    Literal::new("443", 16),
                ],
            })),
            parsed
        );
    }

    #[test]
    fn return_an_error_on_in_expression_with_an_empty_list() {
        let parsed = parse("port in []");

        assert!(parsed.is_err());
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let parsed = parse("a = 1 or b = 2 and c = 3");

        assert_eq!(
            Ok(Box::new(Expr::Or(
                compare("a", 0, Operator::Equal, ("1", 4)),
                Box::new(Expr::And(
                    compare("b", 9, Operator::Equal, ("2", 13)),
                    compare("c", 19, Operator::Equal, ("3", 23)),
                )),
            ))),
            parsed
        );
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let parsed = parse("a 1 and b 2 and c 3");

        let Ok(expr) = parsed else {
            panic!("failed to parse: {parsed:?}");
        };
        let Expr::And(left, _) = *expr else {
            panic!("expected a conjunction");
        };
        assert!(matches!(*left, Expr::And(_, _)));
    }

    #[test]
    fn not_binds_tighter_than_and() {
        let parsed = parse("not a = 1 and b = 2");

        assert_eq!(
            Ok(Box::new(Expr::And(
                Box::new(Expr::Not(compare("a", 4, Operator::Equal, ("1", 8)))),
                compare("b", 14, Operator::Equal, ("2", 18)),
            ))),
            parsed
        );
    }

    #[test]
    fn can_parse_an_expression_enclosed_in_parenthesis() {
        let parsed = parse("!(a = 1 || b = 2) && c = 3");

        assert_eq!(
            Ok(Box::new(Expr::And(
                Box::new(Expr::Not(Box::new(Expr::Or(
                    compare("a", 2, Operator::Equal, ("1", 6)),
                    compare("b", 11, Operator::Equal, ("2", 15)),
                )))),
                compare("c", 21, Operator::Equal, ("3", 25)),
            ))),
            parsed
        );
    }

    #[test]
    fn return_an_error_on_a_dangling_operator() {
        assert!(parse("a = 1 and").is_err());
        assert!(parse("a =").is_err());
        assert!(parse("a = 1 b = 2").is_err());
    }
}
