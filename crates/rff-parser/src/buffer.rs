//! Refillable input window over a byte source.

use std::io::{self, Read};

use rff_error::{Result, RffError};
use rff_types::limits::MIN_BUFFER_CAPACITY;
use rff_types::FileEncoding;

use crate::reencode::{ReencodingReader, Utf16Endian};

/// A buffer of bytes read ahead from a source.
///
/// The valid window is `bytes[start..end)`. The caller drives the window:
/// it advances `start` as it consumes bytes and calls [`refill`] when it
/// needs more; `refill` compacts the unconsumed window to the front and
/// fills the tail from the source. Reading ahead in large chunks is what
/// keeps the per-byte parsing loop free of I/O calls.
///
/// Construction sniffs the first bytes for a byte-order mark. A UTF-16
/// mark swaps the source for a [`ReencodingReader`], so the window always
/// holds UTF-8 regardless of the input encoding; the mark itself is
/// consumed.
///
/// [`refill`]: InputBuffer::refill
#[derive(Debug)]
pub struct InputBuffer<R> {
    bytes: Vec<u8>,
    start: usize,
    end: usize,
    at_eof: bool,
    file_encoding: Option<FileEncoding>,
    source: Source<R>,
}

#[derive(Debug)]
enum Source<R> {
    Plain(R),
    Utf16(ReencodingReader<R>),
}

impl<R: Read> Source<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(r) => r.read(buf),
            Self::Utf16(r) => r.read(buf),
        }
    }
}

/// Read until `buf` is full or the source is exhausted; returns the count.
fn read_up_to<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl<R: Read> InputBuffer<R> {
    /// Wrap `source` in a buffer of the given capacity and perform the
    /// initial fill.
    ///
    /// Fails if `capacity` is below [`MIN_BUFFER_CAPACITY`].
    pub fn new(capacity: usize, mut source: R) -> Result<Self> {
        if capacity < MIN_BUFFER_CAPACITY {
            return Err(RffError::InvalidOption {
                what: "buffer capacity",
                value: capacity,
                minimum: MIN_BUFFER_CAPACITY,
            });
        }

        let mut bytes = vec![0u8; capacity];
        let mut file_encoding = None;

        // Detect UTF-16 encodings or a UTF-8 BOM from the first bytes.
        let mut head = [0u8; 3];
        let mut head_len = read_up_to(&mut source, &mut head[..2])?;

        let source = if head_len == 2 {
            match [head[0], head[1]] {
                [0xFF, 0xFE] => {
                    file_encoding = Some(FileEncoding::Utf16Le);
                    head_len = 0;
                    Source::Utf16(ReencodingReader::new(source, Utf16Endian::Le))
                }
                [0xFE, 0xFF] => {
                    file_encoding = Some(FileEncoding::Utf16Be);
                    head_len = 0;
                    Source::Utf16(ReencodingReader::new(source, Utf16Endian::Be))
                }
                [0xEF, 0xBB] => {
                    head_len += read_up_to(&mut source, &mut head[2..])?;
                    if head_len == 3 && head[2] == 0xBF {
                        // Drop the UTF-8 BOM sequence EF BB BF.
                        file_encoding = Some(FileEncoding::Utf8Bom);
                        head_len = 0;
                    }
                    Source::Plain(source)
                }
                _ => Source::Plain(source),
            }
        } else {
            Source::Plain(source)
        };

        bytes[..head_len].copy_from_slice(&head[..head_len]);

        let mut buffer = Self {
            bytes,
            start: 0,
            end: head_len,
            at_eof: false,
            file_encoding,
            source,
        };
        buffer.refill()?;
        Ok(buffer)
    }

    /// The backing bytes; only `[start, end)` is valid.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable access to the backing bytes. The caller may rewrite the
    /// window in place (quote collapsing does).
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Index of the first valid byte. The caller advances this as it
    /// consumes input.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn set_start(&mut self, start: usize) {
        debug_assert!(start <= self.end);
        self.start = start;
    }

    /// Index one past the last valid byte.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The number of valid bytes in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once the source has reported end of stream.
    #[must_use]
    pub fn at_end_of_stream(&self) -> bool {
        self.at_eof
    }

    /// True if [`refill`](Self::refill) can make no further progress:
    /// either the window already fills the buffer or the stream is
    /// exhausted.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() == self.bytes.len() || self.at_eof
    }

    /// The encoding detected from the byte-order mark, if any.
    #[must_use]
    pub fn file_encoding(&self) -> Option<FileEncoding> {
        self.file_encoding
    }

    /// Move the window to the front of the buffer, preserving its bytes.
    fn move_data_to_front(&mut self) {
        if self.start == 0 {
            return;
        }
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
            return;
        }
        self.bytes.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;
    }

    /// Compact the window and read from the source until the buffer is
    /// full or the stream ends. Bytes in `[start, end)` are preserved.
    pub fn refill(&mut self) -> Result<()> {
        self.move_data_to_front();
        while self.end < self.bytes.len() && !self.at_eof {
            match self.source.read(&mut self.bytes[self.end..]) {
                Ok(0) => self.at_eof = true,
                Ok(n) => self.end += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
