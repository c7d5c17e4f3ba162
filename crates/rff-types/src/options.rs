//! Parser configuration.

use rff_error::{Result, RffError};

use crate::limits::{DEFAULT_READ_BUFFER, MIN_READ_BUFFER};

/// Options passed to the flat-file parser.
///
/// The line and cell limits do not count the header line: the parser adds
/// one header line (or `columns` header cells) on top of the configured
/// limit before truncating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    max_line_count: usize,
    max_cell_count: usize,
    read_buffer_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_line_count: usize::MAX,
            max_cell_count: usize::MAX,
            read_buffer_size: DEFAULT_READ_BUFFER,
        }
    }
}

impl ParserOptions {
    /// Options with unbounded limits and the default 100 MiB read buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of non-header lines read from the input.
    #[must_use]
    pub fn with_max_line_count(mut self, count: usize) -> Self {
        self.max_line_count = count;
        self
    }

    /// Limit the number of non-header cells read from the input.
    #[must_use]
    pub fn with_max_cell_count(mut self, count: usize) -> Self {
        self.max_cell_count = count;
        self
    }

    /// Set the read buffer size. Fails below [`MIN_READ_BUFFER`].
    ///
    /// When `max_line_count` is set, 2 KiB + 1 KiB per expected line is a
    /// reasonable size; otherwise the default favors few refills.
    pub fn with_read_buffer_size(mut self, size: usize) -> Result<Self> {
        if size < MIN_READ_BUFFER {
            return Err(RffError::InvalidOption {
                what: "readBufferSize",
                value: size,
                minimum: MIN_READ_BUFFER,
            });
        }
        self.read_buffer_size = size;
        Ok(self)
    }

    #[must_use]
    pub fn max_line_count(&self) -> usize {
        self.max_line_count
    }

    #[must_use]
    pub fn max_cell_count(&self) -> usize {
        self.max_cell_count
    }

    #[must_use]
    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }
}
