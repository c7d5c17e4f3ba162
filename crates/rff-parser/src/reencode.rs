//! UTF-16 to UTF-8 re-encoding adapter.

use std::io::{self, Read};

/// Byte order of a UTF-16 source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf16Endian {
    Le,
    Be,
}

/// Bytes consumed from the source per decoding round.
const READ_SIZE: usize = 4096;

/// A read-only adapter that decodes a UTF-16 stream and serves it back as
/// UTF-8.
///
/// Decoding works in chunks of at most [`READ_SIZE`] source bytes. Two
/// pieces of state survive between chunks so that no code unit is ever
/// split by a read boundary: a trailing odd byte (half a code unit) and an
/// unpaired high surrogate waiting for its low half. Malformed input (a
/// lone surrogate, or a dangling half unit at end of stream) decodes to
/// U+FFFD rather than failing; the parser downstream treats text
/// problems as data, not errors.
#[derive(Debug)]
pub struct ReencodingReader<R> {
    source: R,
    endian: Utf16Endian,
    /// Re-encoded UTF-8 pending delivery, drained from `out_pos`.
    out: Vec<u8>,
    out_pos: usize,
    /// Trailing odd byte of the previous chunk.
    carry: Option<u8>,
    /// High surrogate waiting for a low surrogate in the next chunk.
    pending_high: Option<u16>,
    source_eof: bool,
}

impl<R: Read> ReencodingReader<R> {
    pub fn new(source: R, endian: Utf16Endian) -> Self {
        Self {
            source,
            endian,
            out: Vec::new(),
            out_pos: 0,
            carry: None,
            pending_high: None,
            source_eof: false,
        }
    }

    fn push_char(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn push_unit(&mut self, unit: u16) {
        // A high surrogate defers until we see what follows it.
        if (0xD800..=0xDBFF).contains(&unit) {
            if self.pending_high.replace(unit).is_some() {
                // Two highs in a row: the first one was lone.
                self.push_char(char::REPLACEMENT_CHARACTER);
            }
            return;
        }

        if let Some(high) = self.pending_high.take() {
            if (0xDC00..=0xDFFF).contains(&unit) {
                let code = 0x10000
                    + (u32::from(high) - 0xD800) * 0x400
                    + (u32::from(unit) - 0xDC00);
                let c = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                self.push_char(c);
                return;
            }
            // Lone high surrogate; the current unit still stands on its own.
            self.push_char(char::REPLACEMENT_CHARACTER);
        }

        if (0xDC00..=0xDFFF).contains(&unit) {
            // Low surrogate with no preceding high.
            self.push_char(char::REPLACEMENT_CHARACTER);
            return;
        }

        let c = char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER);
        self.push_char(c);
    }

    /// Pull one chunk from the source and decode it into `out`.
    fn fill(&mut self) -> io::Result<()> {
        self.out.clear();
        self.out_pos = 0;

        let mut raw = [0u8; READ_SIZE];
        let mut len = 0usize;
        if let Some(b) = self.carry.take() {
            raw[0] = b;
            len = 1;
        }

        let n = loop {
            match self.source.read(&mut raw[len..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        };
        len += n;

        if n == 0 {
            self.source_eof = true;
            // Flush incomplete state: a half unit or an unpaired high
            // surrogate at end of stream each decode to U+FFFD.
            if len == 1 {
                self.push_char(char::REPLACEMENT_CHARACTER);
            }
            if self.pending_high.take().is_some() {
                self.push_char(char::REPLACEMENT_CHARACTER);
            }
            return Ok(());
        }

        let even = len & !1;
        let mut i = 0;
        while i < even {
            let pair = [raw[i], raw[i + 1]];
            let unit = match self.endian {
                Utf16Endian::Le => u16::from_le_bytes(pair),
                Utf16Endian::Be => u16::from_be_bytes(pair),
            };
            self.push_unit(unit);
            i += 2;
        }

        if len > even {
            self.carry = Some(raw[len - 1]);
        }

        Ok(())
    }
}

impl<R: Read> Read for ReencodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.out_pos < self.out.len() {
                let n = (self.out.len() - self.out_pos).min(buf.len());
                buf[..n].copy_from_slice(&self.out[self.out_pos..self.out_pos + n]);
                self.out_pos += n;
                return Ok(n);
            }
            if self.source_eof {
                return Ok(0);
            }
            self.fill()?;
        }
    }
}
