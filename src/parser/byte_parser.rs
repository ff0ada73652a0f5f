//! Low-level byte-by-byte parser for ASCII text.
//!
//! This module provides [ByteParser] for parsing text-based file formats with
//! support for peeking, consuming, and skipping whitespace and comments. Used
//! as the foundation for the Newick parser.

use crate::parser::byte_source::ByteSource;
use crate::parser::in_memory_byte_source::InMemoryByteSource;
use crate::parser::parsing_error::ParsingError;

/// Default length of context provided by errors from parser
pub(crate) const DEFAULT_CONTEXT_LENGTH: usize = 50;

// =#========================================================================#=
// COMMENT STYLE
// =#========================================================================$=
/// Which kinds of comments are skipped between tokens.
///
/// Bracket comments `[...]` are always recognized.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommentStyle {
    /// Whether `[` inside a bracket comment opens a nested comment,
    /// so that `[a [b] c]` is a single comment.
    pub nested: bool,
    /// Whether `#` starts a comment running to the end of the line.
    pub hashmark: bool,
}

impl Default for CommentStyle {
    fn default() -> Self {
        Self {
            nested: false,
            hashmark: true,
        }
    }
}

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================$=
/// A byte-by-byte parser for ASCII text with support for peeking, consuming,
/// and skipping.
///
/// [ByteParser] operates on any [ByteSource] and assumes ASCII encoding for
/// the structural characters; other bytes are passed through untouched.
///
/// # Features
/// - Works with any ByteSource (in-memory or buffered)
/// - Whitespace and comment skipping (bracket comments, optionally nested,
///   and `#` line comments)
/// - Context extraction for error reporting
///
/// # Example
/// ```
/// use phylocount::parser::byte_parser::{ByteParser, CommentStyle};
///
/// let mut parser = ByteParser::for_str("  [a comment] # another one\n (A,B);");
/// parser.skip_comment_and_whitespace(CommentStyle::default()).unwrap();
/// assert_eq!(parser.peek(), Some(b'('));
/// ```
pub struct ByteParser<S: ByteSource> {
    source: S,
}

impl ByteParser<InMemoryByteSource> {
    /// Creates a new `ByteParser` from a byte slice by copying it into a Vec.
    ///
    /// # Arguments
    /// * `input` - The byte slice to parse
    pub fn for_bytes(input: &[u8]) -> Self {
        Self::new(InMemoryByteSource::from_vec(input.to_vec()))
    }

    /// Creates a new `ByteParser` from a string by copying it into a Vec.
    ///
    /// # Arguments
    /// * `input` - The string to parse
    pub fn for_str(input: &str) -> Self {
        Self::for_bytes(input.as_bytes())
    }
}

impl<S: ByteSource> ByteParser<S> {
    /// Creates a new `ByteParser` from a byte source.
    ///
    /// # Arguments
    /// * `source` - The byte source to parse
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Peeks at the current byte without consuming it.
    ///
    /// # Returns
    /// * `Some(u8)` - The current byte if available
    /// * `None` - If at end of data (EOF)
    #[inline(always)]
    pub fn peek(&mut self) -> Option<u8> {
        self.source.peek()
    }

    /// Gets the current byte and advances the position (consumes it).
    ///
    /// # Returns
    /// * `Some(u8)` - The current byte if available
    /// * `None` - If at end of data (EOF)
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        self.source.next_byte()
    }

    /// Skips (consumes) all consecutive ASCII whitespace characters.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.next_byte();
            } else {
                break;
            }
        }
    }

    /// Skips (consumes) a single comment if one starts at the current position.
    ///
    /// # Arguments
    /// * `style` - Whether bracket comments nest and whether `#` starts a comment
    ///
    /// # Returns
    /// * `Ok(true)` - A comment was found and consumed
    /// * `Ok(false)` - No comment at current position
    /// * `Err(ParsingError)` - Bracket comment was opened but never closed
    pub fn skip_comment(&mut self, style: CommentStyle) -> Result<bool, ParsingError> {
        if self.consume_if(b'[') {
            let mut depth = 1usize;
            while depth > 0 {
                match self.next_byte() {
                    Some(b']') => depth -= 1,
                    Some(b'[') if style.nested => depth += 1,
                    Some(_) => {}
                    None => {
                        self.check_stream()?;
                        return Err(ParsingError::unclosed_comment(self));
                    }
                }
            }
            return Ok(true);
        }

        if style.hashmark && self.consume_if(b'#') {
            self.consume_until_any(b"\n\r", ConsumeMode::Exclusive);
            return Ok(true);
        }

        Ok(false)
    }

    /// Skips (consumes) all consecutive whitespace and comments.
    ///
    /// This method repeatedly skips whitespace and comments until no more are
    /// found, leaving the parser at the next meaningful token.
    ///
    /// # Errors
    /// Returns an error if an unclosed comment is encountered.
    pub fn skip_comment_and_whitespace(&mut self, style: CommentStyle) -> Result<(), ParsingError> {
        self.skip_whitespace();

        while self.skip_comment(style)? {
            self.skip_whitespace();
        }

        Ok(())
    }

    /// Consumes the current byte if it equals the target byte.
    ///
    /// # Arguments
    /// * `ch` - The byte to match and consume
    ///
    /// # Returns
    /// `true` if the byte was matched and consumed, `false` otherwise
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek() == Some(ch) {
            self.next_byte();
            true
        } else {
            false
        }
    }

    /// Consumes bytes until the target byte is found.
    ///
    /// # Arguments
    /// * `target` - The byte to search for
    /// * `mode` - Whether to consume the target byte (`Inclusive`) or stop before it (`Exclusive`)
    ///
    /// # Returns
    /// `true` if the target was found, `false` if EOF was reached first
    pub fn consume_until(&mut self, target: u8, mode: ConsumeMode) -> bool {
        self.consume_until_any(&[target], mode).is_some()
    }

    /// Consumes bytes until any of the target bytes is found.
    ///
    /// # Arguments
    /// * `targets` - The set of bytes to search for
    /// * `mode` - Whether to consume the found byte (`Inclusive`) or stop before it (`Exclusive`)
    ///
    /// # Returns
    /// `Some(u8)` with the found byte, or `None` if EOF was reached first
    pub fn consume_until_any(&mut self, targets: &[u8], mode: ConsumeMode) -> Option<u8> {
        while let Some(b) = self.peek() {
            if targets.contains(&b) {
                if mode == ConsumeMode::Inclusive {
                    self.next_byte();
                }
                return Some(b);
            }

            self.next_byte();
        }
        None
    }

    /// Returns whether the end of data (EOF) has been reached.
    pub fn is_eof(&mut self) -> bool {
        self.source.is_eof()
    }

    /// Returns the current parser position (byte offset) in the input.
    pub fn position(&self) -> usize {
        self.source.position()
    }

    /// Returns up to `k` bytes from the current position for error context.
    pub fn get_context(&mut self, k: usize) -> Vec<u8> {
        self.source.get_context(k)
    }

    /// Returns a string from up to `k` bytes from the current position for error context.
    ///
    /// Invalid UTF-8 sequences are replaced with the Unicode replacement character.
    pub fn get_context_as_string(&mut self, k: usize) -> String {
        let context_bytes = self.get_context(k);
        String::from_utf8_lossy(&context_bytes).into_owned()
    }

    /// Turns a failure of the underlying stream into an error.
    ///
    /// Parsers call this whenever they hit EOF, since a failing stream
    /// looks like a regular end of data otherwise.
    ///
    /// # Errors
    /// Returns [ParsingErrorType::Io](crate::parser::ParsingErrorType::Io)
    /// if the stream was aborted.
    pub fn check_stream(&mut self) -> Result<(), ParsingError> {
        match self.source.take_error() {
            Some(err) => Err(ParsingError::from(err).at(self.position())),
            None => Ok(()),
        }
    }
}

/// Specifies whether to consume or leave the target when using `consume_until` methods.
///
/// # Examples
/// ```
/// use phylocount::parser::byte_parser::{ByteParser, ConsumeMode};
///
/// let mut parser = ByteParser::for_str("[&R] ((A:0.5,B:0.5):0.3,C:0.8);");
///
/// // Inclusive: consume up to and including ']', e.g. to skip a rooting tag
/// parser.consume_until(b']', ConsumeMode::Inclusive);
/// assert_eq!(parser.peek(), Some(b' '));
///
/// // Exclusive: consume up to but not including ':'
/// parser.consume_until(b':', ConsumeMode::Exclusive);
/// assert_eq!(parser.peek(), Some(b':'));
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ConsumeMode {
    /// Consume the target byte along with everything before it.
    Inclusive,

    /// Stop before the target byte without consuming it.
    Exclusive,
}
