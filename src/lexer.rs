use crate::error::LexicalError;
use logos::{Logos, SpannedIter};
use std::fmt;

pub type Spanned<Tok, Loc, Error> = Result<(Loc, Tok, Loc), Error>;

#[derive(Logos, Clone, Copy, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(error = LexicalError)]
pub enum Token<'input> {
    #[token("(")]
    LeftParenthesis,
    #[token(")")]
    RightParenthesis,
    #[token("[")]
    LeftSquareBracket,
    #[token("]")]
    RightSquareBracket,
    #[token(",")]
    Comma,

    #[token("or", ignore(case))]
    #[token("||")]
    Or,
    #[token("and", ignore(case))]
    #[token("&&")]
    And,
    #[token("not", ignore(case))]
    #[token("!")]
    Not,

    #[token("=")]
    #[token("==")]
    #[token("eq", ignore(case))]
    Equal,
    #[token("!=")]
    #[token("ne", ignore(case))]
    NotEqual,
    #[token("<")]
    #[token("lt", ignore(case))]
    LessThan,
    #[token("<=")]
    #[token("le", ignore(case))]
    LessThanEqual,
    #[token(">")]
    #[token("gt", ignore(case))]
    GreaterThan,
    #[token(">=")]
    #[token("ge", ignore(case))]
    GreaterThanEqual,
    #[token("&")]
    #[token("isset", ignore(case))]
    IsSet,
    #[token("in", ignore(case))]
    In,
    #[token("exist", ignore(case))]
    #[token("exists", ignore(case))]
    Exist,
    #[token("any", ignore(case))]
    Any,
    #[token("none", ignore(case))]
    Nothing,

    #[regex(r#""[^"]*""#, |lex| { let slice = lex.slice(); &slice[1..slice.len() - 1] })]
    String(&'input str),
    #[regex(r#"[^\s()\[\],"!=<>&|]+"#, |lex| lex.slice())]
    Word(&'input str),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftParenthesis => write!(f, "'('"),
            Self::RightParenthesis => write!(f, "')'"),
            Self::LeftSquareBracket => write!(f, "'['"),
            Self::RightSquareBracket => write!(f, "']'"),
            Self::Comma => write!(f, "','"),
            Self::Or => write!(f, "'or'"),
            Self::And => write!(f, "'and'"),
            Self::Not => write!(f, "'not'"),
            Self::Equal => write!(f, "'='"),
            Self::NotEqual => write!(f, "'!='"),
            Self::LessThan => write!(f, "'<'"),
            Self::LessThanEqual => write!(f, "'<='"),
            Self::GreaterThan => write!(f, "'>'"),
            Self::GreaterThanEqual => write!(f, "'>='"),
            Self::IsSet => write!(f, "'&'"),
            Self::In => write!(f, "'in'"),
            Self::Exist => write!(f, "'exist'"),
            Self::Any => write!(f, "'any'"),
            Self::Nothing => write!(f, "'none'"),
            Self::String(value) => write!(f, "string \"{value}\""),
            Self::Word(value) => write!(f, "'{value}'"),
        }
    }
}

pub struct Lexer<'input> {
    token_stream: SpannedIter<'input, Token<'input>>,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        Self {
            token_stream: Token::lexer(input).spanned(),
        }
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Spanned<Token<'input>, usize, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.token_stream
            .next()
            .map(|(token, span)| Ok((span.start, token?, span.end)))
    }
}
