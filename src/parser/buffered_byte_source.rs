//! Streaming byte source.
//!
//! [BufferedByteSource] reads through a [BufReader], for standard input or
//! for tree collections too large to load at once.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::parser::byte_source::ByteSource;

// =#========================================================================#=
// BUFFERED BYTE SOURCE
// =#========================================================================$=
/// Byte source pulling chunks from a reader on demand.
///
/// A read failure ends the stream:
/// the source then reports EOF and keeps the error for
/// [take_error](ByteSource::take_error), so that the parser can discard the
/// partially read tree and report the failure.
pub struct BufferedByteSource<R: Read> {
    reader: BufReader<R>,
    /// Set once a read fails; the stream is over from then on
    error: Option<std::io::Error>,
    /// Bytes consumed since the start of the stream
    pos: usize,
}

impl BufferedByteSource<File> {
    /// Opens `path` for streaming.
    ///
    /// # Errors
    /// The I/O error of [File::open].
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> BufferedByteSource<R> {
    /// Streams from `reader`, e.g. standard input.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            error: None,
            pos: 0,
        }
    }

    fn buffer(&mut self) -> &[u8] {
        if self.error.is_some() {
            return &[];
        }
        match self.reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) => {
                self.error = Some(e);
                &[]
            }
        }
    }
}

impl<R: Read> ByteSource for BufferedByteSource<R> {
    fn peek(&mut self) -> Option<u8> {
        self.buffer().first().copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.reader.consume(1);
        self.pos += 1;
        Some(byte)
    }

    fn get_context(&mut self, k: usize) -> Vec<u8> {
        // Only what is already buffered; context must not consume input
        let buf = self.buffer();
        buf[..k.min(buf.len())].to_vec()
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn is_eof(&mut self) -> bool {
        self.buffer().is_empty()
    }

    fn take_error(&mut self) -> Option<std::io::Error> {
        self.error.take()
    }
}

// =#========================================================================#=
// TESTS - BUFFERED BYTE SOURCE
// =#========================================================================$=
#[cfg(test)]
mod tests {
    use crate::newick::NewickParser;
    use crate::parser::buffered_byte_source::BufferedByteSource;
    use crate::parser::byte_parser::ByteParser;
    use crate::parser::byte_source::ByteSource;
    use std::io::Read;

    /// Reader that fails after handing out its data once.
    struct FailingReader {
        data: &'static [u8],
        done: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.done {
                return Err(std::io::Error::other("connection dropped"));
            }
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            if self.data.is_empty() {
                self.done = true;
            }
            Ok(n)
        }
    }

    #[test]
    fn test_buffered_parse_newick_file() {
        let source = BufferedByteSource::from_file("tests/fixtures/primates.nwk").unwrap();
        let byte_parser = ByteParser::new(source);
        let mut newick_parser = NewickParser::default();

        let trees = newick_parser.parse_all(byte_parser).unwrap();
        assert_eq!(trees.len(), 2);
    }

    #[test]
    fn test_stream_failure_is_kept() {
        let mut source = BufferedByteSource::from_reader(FailingReader {
            data: b"(A,B",
            done: false,
        });
        let mut consumed = 0;
        while source.next_byte().is_some() {
            consumed += 1;
        }
        assert_eq!(consumed, 4);
        assert!(source.is_eof());
        assert!(source.take_error().is_some());
    }
}
