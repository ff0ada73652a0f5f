//! Error types for the Newick parser.
//!
//! This module provides [ParsingError] and [ParsingErrorType] for representing
//! and reporting errors that occur while parsing phylogenetic tree files.
//! Every error kind carries a stable numeric [code](ParsingErrorType::code).

use crate::parser::byte_parser::{ByteParser, DEFAULT_CONTEXT_LENGTH};
use crate::parser::byte_source::ByteSource;
use std::error::Error;
use std::fmt;

// =#========================================================================#=
// PARSING ERROR TYPE
// =#========================================================================€=
/// Error types that can occur during Newick parsing.
#[derive(thiserror::Error, PartialEq, Debug, Clone)]
pub enum ParsingErrorType {
    #[error("IO error - {0}")]
    Io(String),
    #[error("Cannot open a child list here")]
    UnexpectedOpenParen,
    #[error("Cannot have ',' at root level")]
    CommaAtRootLevel,
    #[error("Cannot have ',' here")]
    UnexpectedComma,
    #[error("Too many ')'")]
    TooManyCloseParens,
    #[error("Cannot have ')' here")]
    UnexpectedCloseParen,
    #[error("Unclosed comment")]
    UnclosedComment,
    #[error("Cannot have ':' here")]
    UnexpectedColon,
    #[error("Terminating ';' before all child lists are closed")]
    PrematureSemicolon,
    #[error("Node is named twice: {0}")]
    NamedTwice(String),
    #[error("Cannot have a name here")]
    UnexpectedName,
    #[error("Missing terminating ';'")]
    MissingSemicolon,
    #[error("Tree has unnamed leaves")]
    UnnamedLeaves,
    #[error("Unmatched ']'")]
    UnmatchedBracket,
    #[error("Cannot parse edge length '{0}'")]
    InvalidEdgeLength(String),
}

impl ParsingErrorType {
    /// Stable numeric code of this error kind.
    ///
    /// # Example
    /// ```
    /// use phylocount::parser::ParsingErrorType;
    ///
    /// assert_eq!(ParsingErrorType::MissingSemicolon.code(), 11);
    /// assert_eq!(ParsingErrorType::InvalidEdgeLength("x".into()).code(), 99);
    /// ```
    pub fn code(&self) -> u32 {
        match self {
            ParsingErrorType::Io(_) => 0,
            ParsingErrorType::UnexpectedOpenParen => 1,
            ParsingErrorType::CommaAtRootLevel => 2,
            ParsingErrorType::UnexpectedComma => 3,
            ParsingErrorType::TooManyCloseParens => 4,
            ParsingErrorType::UnexpectedCloseParen => 5,
            ParsingErrorType::UnclosedComment => 6,
            ParsingErrorType::UnexpectedColon => 7,
            ParsingErrorType::PrematureSemicolon => 8,
            ParsingErrorType::NamedTwice(_) => 9,
            ParsingErrorType::UnexpectedName => 10,
            ParsingErrorType::MissingSemicolon => 11,
            ParsingErrorType::UnnamedLeaves => 12,
            ParsingErrorType::UnmatchedBracket => 13,
            ParsingErrorType::InvalidEdgeLength(_) => 99,
        }
    }
}

// =#========================================================================#=
// PARSING ERROR
// =#========================================================================$=
/// Parsing error with contextual information (position and surrounding bytes).
#[derive(Debug)]
pub struct ParsingError {
    kind: ParsingErrorType,
    position: usize,
    context: String,
}

impl ParsingError {
    /// Create a ParsingError from an error type and parser state
    pub fn from_parser<S: ByteSource>(kind: ParsingErrorType, parser: &mut ByteParser<S>) -> Self {
        Self {
            kind,
            position: parser.position(),
            context: parser.get_context_as_string(DEFAULT_CONTEXT_LENGTH),
        }
    }

    /// Convenience constructor for UnclosedComment
    pub fn unclosed_comment<S: ByteSource>(parser: &mut ByteParser<S>) -> Self {
        Self::from_parser(ParsingErrorType::UnclosedComment, parser)
    }

    /// Convenience constructor for MissingSemicolon
    pub fn missing_semicolon<S: ByteSource>(parser: &mut ByteParser<S>) -> Self {
        Self::from_parser(ParsingErrorType::MissingSemicolon, parser)
    }

    /// Convenience constructor for InvalidEdgeLength
    pub fn invalid_edge_length<S: ByteSource>(parser: &mut ByteParser<S>, value: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidEdgeLength(value), parser)
    }

    /// Create a ParsingError without parser context (for builder errors)
    pub fn without_context(kind: ParsingErrorType) -> Self {
        Self {
            kind,
            position: 0,
            context: String::new(),
        }
    }

    /// Sets the position, keeping kind and context.
    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    /// Get the numeric code of the error kind
    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    /// Get the position where the error occurred
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Main error message
        write!(f, "{}", self.kind)?;

        // Additional position information
        write!(f, " at position {}", self.position)?;

        // Additional context if available
        if !self.context.is_empty() {
            write!(f, "\n  Context (next {} bytes): {}", self.context.len(), self.context)?;
        }

        Ok(())
    }
}

impl Error for ParsingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl From<std::io::Error> for ParsingError {
    fn from(err: std::io::Error) -> Self {
        ParsingError {
            kind: ParsingErrorType::Io(err.to_string()),
            position: 0,
            context: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_has_position_and_context() {
        let mut parser = ByteParser::for_str("(A,B");
        parser.next_byte();
        let err = ParsingError::missing_semicolon(&mut parser);
        let msg = err.to_string();
        assert!(msg.starts_with("Missing terminating ';' at position 1"));
        assert!(msg.contains("A,B"));
        assert_eq!(err.code(), 11);
    }

    #[test]
    fn test_io_error_has_code_zero() {
        let err = ParsingError::from(std::io::Error::other("disk on fire"));
        assert_eq!(err.code(), 0);
        assert_eq!(err.position(), 0);
    }
}
