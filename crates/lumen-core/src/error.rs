//! Error types for lumen-core
//!
//! Only entity bookkeeping can fail. Signal reads and writes are total and
//! expression syntax errors are stored as data on the expression itself
//! (see [`crate::ParseError`]).

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid entity name: {0:?}")]
    InvalidName(String),

    #[error("Duplicate entity name: {0}")]
    DuplicateName(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Reason a signal expression failed to parse
///
/// A failed parse still produces an [`crate::Expression`]; this value is kept
/// on it so tools can show why the binding reads as `0.0`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token '{token}' at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    #[error("unexpected trailing token '{token}' at offset {offset}")]
    TrailingInput { token: String, offset: usize },

    #[error("missing '{expected}' to match offset {offset}")]
    Unbalanced { expected: char, offset: usize },

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{func}' expects {expected} argument(s), got {got}")]
    WrongArgCount {
        func: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid signal reference '{0}'")]
    InvalidSignal(String),

    #[error("expression exceeds {0} nodes")]
    TooManyNodes(usize),

    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}
