//! Low-level reading infrastructure for tree files.
//!
//! This module provides byte sources (in-memory and buffered), a byte-by-byte
//! parser with whitespace and comment skipping, and the error type shared by
//! the format parsers built on top of it.

pub mod buffered_byte_source;
pub mod byte_parser;
pub mod byte_source;
pub mod in_memory_byte_source;
pub mod parsing_error;

pub use buffered_byte_source::BufferedByteSource;
pub use byte_parser::{ByteParser, CommentStyle, ConsumeMode};
pub use byte_source::ByteSource;
pub use in_memory_byte_source::InMemoryByteSource;
pub use parsing_error::{ParsingError, ParsingErrorType};
