//! Error results that can be returned from the core parser
use crate::tokenizer::Token;
use corecss_shared::byte_stream::Location;
use thiserror::Error;

/// The two grammar error subkinds and the structural errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A closing `}`, `)` or `]` that does not belong to any open container
    Unmatched,
    /// A token that is not allowed by the `any` or `block` productions
    Unexpected,
    /// Malformed at-rule head, selector or declaration, incomplete constructs and unknown
    /// or misplaced at-rules
    Structural,
}

/// A recoverable parse error. It drops a single rule or declaration, never the whole stylesheet.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("Parse error at {location}, {reason}")]
pub struct ParseError {
    pub kind: ErrorKind,
    /// The token the error is about, if there is one
    pub subject: Option<Token>,
    pub reason: String,
    /// Location of the subject
    pub location: Location,
}

impl ParseError {
    /// Structural error about the given token
    #[must_use]
    pub fn new(subject: &Token, reason: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Structural, subject, reason)
    }

    /// Error of the given kind about the given token
    #[must_use]
    pub fn with_kind(kind: ErrorKind, subject: &Token, reason: impl Into<String>) -> Self {
        Self {
            kind,
            subject: Some(subject.clone()),
            reason: reason.into(),
            location: subject.location.clone(),
        }
    }

    /// Structural error without a subject token, e.g. on empty input
    #[must_use]
    pub fn at(location: Location, reason: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Structural,
            subject: None,
            reason: reason.into(),
            location,
        }
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.location.line
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.location.column
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TokenType;

    #[test]
    fn message_contains_position_and_reason() {
        let token = Token::new(TokenType::Colon, Location::new(3, 7, 20), ":");
        let error = ParseError::new(&token, "expected a property value");

        assert_eq!(error.kind, ErrorKind::Structural);
        assert_eq!(error.to_string(), "Parse error at 3:7, expected a property value");
        assert_eq!((error.line(), error.column()), (3, 7));
    }
}
