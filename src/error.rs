use crate::{lexer::Token, types::ValueType};
use itertools::Itertools;
use lalrpop_util::ParseError;
use thiserror::Error;

/// Coarse classification of every failure the engine reports.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    OutOfMemory,
    /// An unresolvable field name or literal.
    Unknown,
    /// A type/operator pairing the engine does not implement.
    Unsupported,
    Other,
}

#[derive(Error, Clone, Default, Debug, PartialEq)]
pub enum LexicalError {
    #[default]
    #[error("invalid token")]
    InvalidToken,
}

/// Errors reported by the host through one of its callbacks.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum CallbackError {
    #[error("out of memory")]
    OutOfMemory,
    #[error("unknown identifier")]
    Unknown,
    #[error("unsupported")]
    Unsupported,
    #[error("callback failed")]
    Other,
    #[error("{0}")]
    Message(String),
}

impl CallbackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfMemory => ErrorKind::OutOfMemory,
            Self::Unknown => ErrorKind::Unknown,
            Self::Unsupported => ErrorKind::Unsupported,
            Self::Other | Self::Message(_) => ErrorKind::Other,
        }
    }
}

#[derive(Error, Clone, Debug, PartialEq)]
pub enum FilterError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("field '{field}' resolved to {count} identifiers, expected between 1 and {max}", max = crate::MULTINODE_MAX)]
    InvalidLvalue { field: String, count: usize },
    #[error("unknown literal '{literal}' for {ty} field '{field}'")]
    UnknownLiteral {
        field: String,
        literal: String,
        ty: ValueType,
    },
    #[error("operator '{operator}' is not supported for {ty} field '{field}'")]
    UnsupportedOperator {
        field: String,
        operator: &'static str,
        ty: ValueType,
    },
    #[error("literal for field '{field}' is {length} bytes long, the limit is {max}", max = crate::MAX_STRING)]
    LiteralTooLong { field: String, length: usize },
    #[error("{0}")]
    Callback(#[from] CallbackError),
}

impl FilterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownField(_) | Self::UnknownLiteral { .. } => ErrorKind::Unknown,
            Self::UnsupportedOperator { .. } => ErrorKind::Unsupported,
            Self::Callback(error) => error.kind(),
            Self::Syntax(_) | Self::InvalidLvalue { .. } | Self::LiteralTooLong { .. } => {
                ErrorKind::Other
            }
        }
    }
}

impl<'input> From<ParseError<usize, Token<'input>, LexicalError>> for FilterError {
    fn from(error: ParseError<usize, Token<'input>, LexicalError>) -> Self {
        let message = match error {
            ParseError::InvalidToken { location } => format!("invalid token at offset {location}"),
            ParseError::UnrecognizedEof { location, expected } => format!(
                "unexpected end of expression at offset {location}, expected one of {}",
                expected.iter().join(", ")
            ),
            ParseError::UnrecognizedToken {
                token: (start, token, _),
                expected,
            } => format!(
                "unexpected {token} at offset {start}, expected one of {}",
                expected.iter().join(", ")
            ),
            ParseError::ExtraToken {
                token: (start, token, _),
            } => format!("unexpected trailing {token} at offset {start}"),
            ParseError::User { error } => error.to_string(),
        };
        Self::Syntax(message)
    }
}
