//! Compact, content-addressed representation of delimited flat files.
//!
//! A TSV/CSV-like input is parsed into a [`RawFlatFile`]: a column count,
//! a dense array of integer cell references, and a deduplicated content
//! dictionary in which every distinct cell byte-sequence is stored exactly
//! once. The representation serializes to and from a compact binary form.
//!
//! ```
//! use rff::{Parser, ParserOptions};
//!
//! let rff = Parser::default().parse(&b"sku\tqty\nwidget\t3\nwidget\t5\n"[..])?;
//! assert_eq!(rff.columns(), 2);
//! assert_eq!(rff.cell(1, 0), b"widget");
//!
//! let mut bytes = Vec::new();
//! rff::format::write(&mut bytes, &rff)?;
//! let back = rff::format::read(&mut bytes.as_slice())?;
//! assert_eq!(back.cells(), rff.cells());
//! # Ok::<(), rff::RffError>(())
//! ```

pub use rff_error::{Result, RffError};
pub use rff_parser::{InputBuffer, Parser, ReencodingReader};
pub use rff_trie::Trie;
pub use rff_types::{limits, varint, FileEncoding, ParserOptions, RawFlatFile, UnexpectedCell};

pub mod format {
    //! Binary serialization of raw flat files.
    pub use rff_format::{read, write, FORMAT_VERSION};
}
