//! Forward-only byte input for the tree parsers.
//!
//! [ByteSource] hides whether a Newick text lives in memory or is streamed
//! from a reader; [ByteParser](crate::parser::ByteParser) builds the
//! tokenizing helpers on top of it.

// =#========================================================================#=
// BYTE SOURCE (Trait)
// =#========================================================================T=
/// One-byte-lookahead input consumed by the Newick parser.
///
/// Implemented by:
/// - [InMemoryByteSource](crate::parser::InMemoryByteSource) for whole files
///   or strings held in memory
/// - [BufferedByteSource](crate::parser::BufferedByteSource) for streaming
///   from any [Read](std::io::Read)
///
/// There is no rewinding; the grammar never needs to look back.
pub trait ByteSource {
    /// Byte at the cursor, or `None` once the input is exhausted
    /// (or a read failed, see [take_error](Self::take_error)).
    fn peek(&mut self) -> Option<u8>;

    /// Like [peek](Self::peek), but also moves the cursor past the byte.
    fn next_byte(&mut self) -> Option<u8>;

    /// At most `k` bytes starting at the cursor, without consuming them.
    /// Used to show where a parse error happened.
    fn get_context(&mut self, k: usize) -> Vec<u8>;

    /// Number of bytes consumed so far.
    fn position(&self) -> usize;

    /// Whether no byte is left at the cursor.
    fn is_eof(&mut self) -> bool;

    /// Takes the I/O error that ended the stream early, if there was one.
    ///
    /// Sources reading from memory never fail and keep the default.
    fn take_error(&mut self) -> Option<std::io::Error> {
        None
    }
}
