//! Byte source over an owned buffer.

use crate::parser::byte_source::ByteSource;
use std::fs;
use std::path::Path;

// =#========================================================================#=
// IN MEMORY BYTE SOURCE
// =#========================================================================$=
/// Byte source holding the whole input.
///
/// Tree files are small next to the models built from them, so reading
/// them at once is the default for [parse_file](crate::newick::parse_file).
pub struct InMemoryByteSource {
    input: Vec<u8>,
    /// Cursor into `input`
    pos: usize,
}

impl InMemoryByteSource {
    /// Takes ownership of `bytes`, with the cursor at the first one.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            input: bytes,
            pos: 0,
        }
    }

    /// Loads the file at `path`.
    ///
    /// # Errors
    /// The I/O error of [fs::read].
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<InMemoryByteSource> {
        Ok(Self::from_vec(fs::read(path)?))
    }

    /// Number of bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.input.len().saturating_sub(self.pos)
    }
}

impl ByteSource for InMemoryByteSource {
    #[inline(always)]
    fn peek(&mut self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline(always)]
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn get_context(&mut self, k: usize) -> Vec<u8> {
        let start = self.pos.min(self.input.len());
        let end = (self.pos + k).min(self.input.len());
        self.input[start..end].to_vec()
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    fn is_eof(&mut self) -> bool {
        self.pos >= self.input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_clipped_at_end() {
        let mut source = InMemoryByteSource::from_vec(b"(A,B);".to_vec());
        for _ in 0..3 {
            source.next_byte();
        }
        assert_eq!(source.get_context(10), b"B);".to_vec());
        assert_eq!(source.remaining(), 3);
        assert_eq!(source.position(), 3);
    }
}
