use crate::{
    events::EventError, parser::BeTreeParseError, predicates::ComparisonOperator,
    values::ValueKind,
};
use std::num::ParseIntError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BeTreeError<'a> {
    #[error("failed to parse the expression with {0:?}")]
    ParseError(BeTreeParseError<'a>),
    #[error("failed with {0:?}")]
    Event(EventError),
}

/// Lexical errors raised while tokenizing an expression.
#[derive(Error, Clone, PartialEq, Default, Debug)]
pub enum ParserError {
    #[default]
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid integer literal: {0}")]
    InvalidInteger(String),
    #[error("invalid float literal: {0}")]
    InvalidFloat(String),
    #[error("invalid escape sequence in string literal: {0}")]
    InvalidEscape(String),
}

impl From<ParseIntError> for ParserError {
    fn from(error: ParseIntError) -> Self {
        Self::InvalidInteger(error.to_string())
    }
}

impl From<rust_decimal::Error> for ParserError {
    fn from(error: rust_decimal::Error) -> Self {
        Self::InvalidFloat(error.to_string())
    }
}

/// Failure to evaluate a single predicate against an event.
#[derive(Error, Clone, PartialEq, Debug)]
pub enum EvalError {
    #[error("{name:?}: mismatching types => expected: {expected}, found: {actual}")]
    TypeMismatch {
        name: String,
        expected: ValueKind,
        actual: ValueKind,
    },
    #[error("{name:?}: operator {operator} is not supported for {kind} values")]
    UnsupportedOperator {
        name: String,
        operator: ComparisonOperator,
        kind: ValueKind,
    },
}
