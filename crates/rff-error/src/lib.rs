//! Error types for the RFF flat-file toolkit.
//!
//! A single structured enum covers every failure the core can surface:
//! deserialization problems, consistency violations, and option validation.
//! Parsing itself never fails on malformed *text* — ill-formed quotes,
//! oversize cells and overflow columns all degrade gracefully — so the
//! variants here are about binary input and caller mistakes.

use thiserror::Error;

/// Primary error type for RFF operations.
#[derive(Error, Debug)]
pub enum RffError {
    // === I/O errors ===
    /// File or stream I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source produced fewer bytes than the format requires.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    // === Binary format errors ===
    /// The version byte at the head of the stream is not recognized.
    #[error("unknown version number {version}")]
    UnknownVersion { version: u8 },

    /// A varint encoding ran past the 5 bytes a 32-bit value may occupy.
    #[error("varint exceeds 32-bit range")]
    VarintTooLong,

    /// A size field does not fit the 32-bit wire format.
    #[error("{what} count {count} does not fit the 32-bit wire format")]
    TooLarge { what: &'static str, count: usize },

    // === Consistency violations ===
    /// `content[0]` must be the empty byte array.
    #[error("content[0] should be the empty byte array")]
    ContentMissingEmpty,

    /// No cells are allowed when `columns == 0`.
    #[error("no cells allowed if columns = 0 (found {cells})")]
    CellsWithoutColumns { cells: usize },

    /// No content beyond the empty entry is allowed when `columns == 0`.
    #[error("no content allowed if columns = 0 (found {content} entries)")]
    ContentWithoutColumns { content: usize },

    /// The cell array length must be a multiple of the column count.
    #[error("cells.len() = {cells} should be a multiple of columns = {columns}")]
    CellCountNotMultiple { cells: usize, columns: u16 },

    /// A cell identifier appeared before all smaller identifiers.
    #[error("cells[{index}] = {value} when {next_new} has not appeared yet")]
    CellOutOfOrder {
        index: usize,
        value: u32,
        next_new: u32,
    },

    /// A cell identifier does not index into the content dictionary.
    #[error("cells[{index}] = {value} >= content.len() = {content}")]
    CellOutOfBounds {
        index: usize,
        value: u32,
        content: usize,
    },

    // === Option validation ===
    /// A configuration value is below its required minimum.
    #[error("{what} '{value}' is too small (minimum {minimum})")]
    InvalidOption {
        what: &'static str,
        value: usize,
        minimum: usize,
    },
}

impl RffError {
    /// Create a short-read error.
    pub const fn short_read(expected: usize, actual: usize) -> Self {
        Self::ShortRead { expected, actual }
    }

    /// Whether this error indicates corrupt or truncated binary input, as
    /// opposed to an I/O failure or a caller mistake.
    pub const fn is_corrupt_input(&self) -> bool {
        matches!(
            self,
            Self::ShortRead { .. }
                | Self::UnknownVersion { .. }
                | Self::VarintTooLong
                | Self::ContentMissingEmpty
                | Self::CellsWithoutColumns { .. }
                | Self::ContentWithoutColumns { .. }
                | Self::CellCountNotMultiple { .. }
                | Self::CellOutOfOrder { .. }
                | Self::CellOutOfBounds { .. }
        )
    }

    /// Get the process exit code for this error (for CLI use).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) | Self::ShortRead { .. } => 2,
            Self::InvalidOption { .. } | Self::TooLarge { .. } => 3,
            _ => 1,
        }
    }
}

/// Result type alias using `RffError`.
pub type Result<T> = std::result::Result<T, RffError>;
