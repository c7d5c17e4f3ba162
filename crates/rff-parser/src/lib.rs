//! Flat-file parsing: byte buffering, encoding normalization, tokenization.
//!
//! The pipeline is linear: a source of bytes feeds an [`InputBuffer`]
//! (which sniffs byte-order marks and, for UTF-16 inputs, transparently
//! re-encodes to UTF-8 through [`ReencodingReader`]); the [`Parser`] drives
//! the buffer window cell by cell, interns cell contents in a dictionary
//! trie, and assembles the cell-reference matrix of a
//! [`rff_types::RawFlatFile`].

pub mod buffer;
pub mod parser;
pub mod reencode;

pub use buffer::InputBuffer;
pub use parser::Parser;
pub use reencode::{ReencodingReader, Utf16Endian};
