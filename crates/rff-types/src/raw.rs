//! The compact in-memory representation of a parsed flat file.

use rff_error::{Result, RffError};

use crate::cell::UnexpectedCell;
use crate::encoding::FileEncoding;

/// A flat file reduced to a column count, a dense cell-reference array and
/// a deduplicated content dictionary.
///
/// Line `x`, column `y` lives at `cells[x * columns + y]`; the value is an
/// index into `content`. `content[0]` is always the empty byte array, so
/// empty cells cost one integer and nothing else.
///
/// A `RawFlatFile` is immutable once constructed. All mutation happens in
/// the parser (or in the consuming `with_*` builders before the value is
/// exposed), which makes a parsed file safe to share across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFlatFile {
    columns: u16,
    cells: Vec<u32>,
    content: Vec<Vec<u8>>,
    separator: u8,
    space_separated_headers: bool,
    file_encoding: Option<FileEncoding>,
    unexpected_cells: Vec<UnexpectedCell>,
    is_truncated: bool,
}

// Compile-time assertion: a constructed file is safe to share across
// threads (owned containers, no interior mutability).
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RawFlatFile>();
};

impl RawFlatFile {
    /// Create a raw flat file from external values.
    ///
    /// No consistency checks are performed and the inputs are not copied;
    /// call [`check_consistency`](Self::check_consistency) yourself if the
    /// values come from an untrusted source. Diagnostic fields take their
    /// defaults (TAB separator, no detected encoding, not truncated).
    #[must_use]
    pub fn from_parts(columns: u16, cells: Vec<u32>, content: Vec<Vec<u8>>) -> Self {
        Self {
            columns,
            cells,
            content,
            separator: b'\t',
            space_separated_headers: false,
            file_encoding: None,
            unexpected_cells: Vec::new(),
            is_truncated: false,
        }
    }

    /// Set the separator the parser settled on.
    #[must_use]
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Record that the header line was SPACE-separated.
    #[must_use]
    pub fn with_space_separated_headers(mut self, value: bool) -> Self {
        self.space_separated_headers = value;
        self
    }

    /// Record the encoding detected from the input's byte-order mark.
    #[must_use]
    pub fn with_file_encoding(mut self, encoding: Option<FileEncoding>) -> Self {
        self.file_encoding = encoding;
        self
    }

    /// Attach the out-of-bounds cell diagnostics gathered during parsing.
    #[must_use]
    pub fn with_unexpected_cells(mut self, cells: Vec<UnexpectedCell>) -> Self {
        self.unexpected_cells = cells;
        self
    }

    /// Record whether parsing stopped at a configured limit.
    #[must_use]
    pub fn with_truncated(mut self, value: bool) -> Self {
        self.is_truncated = value;
        self
    }

    /// The number of columns per row, including the header row.
    #[must_use]
    pub fn columns(&self) -> u16 {
        self.columns
    }

    /// The dense cell-reference array.
    #[must_use]
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// The deduplicated cell contents; `content[0]` is the empty array.
    #[must_use]
    pub fn content(&self) -> &[Vec<u8>] {
        &self.content
    }

    /// The separator used for parsing the input.
    #[must_use]
    pub fn separator(&self) -> u8 {
        self.separator
    }

    /// True when the header line used SPACE while the body uses TAB.
    #[must_use]
    pub fn space_separated_headers(&self) -> bool {
        self.space_separated_headers
    }

    /// The encoding detected from the input's BOM, if any.
    #[must_use]
    pub fn file_encoding(&self) -> Option<FileEncoding> {
        self.file_encoding
    }

    /// Non-empty cells that fell beyond the declared column count.
    #[must_use]
    pub fn unexpected_cells(&self) -> &[UnexpectedCell] {
        &self.unexpected_cells
    }

    /// True if a configured limit caused data to be discarded.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.is_truncated
    }

    /// The number of lines, including the header.
    #[must_use]
    pub fn lines(&self) -> usize {
        if self.columns == 0 {
            0
        } else {
            self.cells.len() / usize::from(self.columns)
        }
    }

    /// The number of lines, not counting the header.
    #[must_use]
    pub fn content_lines(&self) -> usize {
        self.lines().saturating_sub(1)
    }

    /// The bytes in the specified cell.
    ///
    /// # Panics
    ///
    /// Panics if `line` or `column` is out of range for this file.
    #[must_use]
    pub fn cell(&self, line: usize, column: usize) -> &[u8] {
        let index = line * usize::from(self.columns) + column;
        &self.content[self.cells[index] as usize]
    }

    /// Verify the structural invariants, failing on the first violation.
    ///
    /// The parser never produces an inconsistent file; this exists for
    /// values built through [`from_parts`](Self::from_parts) or read back
    /// from external bytes. The invariants:
    ///
    /// - `content[0]` is the empty byte array;
    /// - if `columns == 0`, there are no cells and no content beyond the
    ///   empty entry;
    /// - the cell count is a multiple of `columns`;
    /// - identifiers appear in first-use order, and every referenced
    ///   identifier indexes into `content`.
    pub fn check_consistency(&self) -> Result<()> {
        if !self.content.first().is_some_and(|c| c.is_empty()) {
            return Err(RffError::ContentMissingEmpty);
        }

        if self.columns == 0 {
            if !self.cells.is_empty() {
                return Err(RffError::CellsWithoutColumns {
                    cells: self.cells.len(),
                });
            }
            if self.content.len() > 1 {
                return Err(RffError::ContentWithoutColumns {
                    content: self.content.len(),
                });
            }
            return Ok(());
        }

        if self.cells.len() % usize::from(self.columns) != 0 {
            return Err(RffError::CellCountNotMultiple {
                cells: self.cells.len(),
                columns: self.columns,
            });
        }

        let mut next_new: u32 = 1;
        for (index, &value) in self.cells.iter().enumerate() {
            if value > next_new {
                return Err(RffError::CellOutOfOrder {
                    index,
                    value,
                    next_new,
                });
            }
            if value == next_new {
                next_new += 1;
                if value as usize >= self.content.len() {
                    return Err(RffError::CellOutOfBounds {
                        index,
                        value,
                        content: self.content.len(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(items: &[&[u8]]) -> Vec<Vec<u8>> {
        items.iter().map(|i| i.to_vec()).collect()
    }

    #[test]
    fn empty_file_is_consistent() {
        let rff = RawFlatFile::from_parts(0, vec![], content(&[b""]));
        rff.check_consistency().expect("empty file");
        assert_eq!(rff.lines(), 0);
        assert_eq!(rff.content_lines(), 0);
    }

    #[test]
    fn simple_file_accessors() {
        let rff = RawFlatFile::from_parts(
            2,
            vec![1, 2, 1, 0],
            content(&[b"", b"alpha", b"beta"]),
        );
        rff.check_consistency().expect("consistent");
        assert_eq!(rff.lines(), 2);
        assert_eq!(rff.content_lines(), 1);
        assert_eq!(rff.cell(0, 0), b"alpha");
        assert_eq!(rff.cell(0, 1), b"beta");
        assert_eq!(rff.cell(1, 0), b"alpha");
        assert_eq!(rff.cell(1, 1), b"");
    }

    #[test]
    fn missing_empty_content_rejected() {
        let rff = RawFlatFile::from_parts(1, vec![1], content(&[b"x", b"y"]));
        let err = rff.check_consistency().expect_err("content[0] not empty");
        assert!(matches!(err, RffError::ContentMissingEmpty));

        let rff = RawFlatFile::from_parts(1, vec![], vec![]);
        let err = rff.check_consistency().expect_err("no content at all");
        assert!(matches!(err, RffError::ContentMissingEmpty));
    }

    #[test]
    fn zero_columns_rejects_cells_and_content() {
        let rff = RawFlatFile::from_parts(0, vec![0], content(&[b""]));
        assert!(matches!(
            rff.check_consistency(),
            Err(RffError::CellsWithoutColumns { cells: 1 })
        ));

        let rff = RawFlatFile::from_parts(0, vec![], content(&[b"", b"x"]));
        assert!(matches!(
            rff.check_consistency(),
            Err(RffError::ContentWithoutColumns { content: 2 })
        ));
    }

    #[test]
    fn cell_count_multiple_enforced() {
        let rff = RawFlatFile::from_parts(2, vec![1, 1, 1], content(&[b"", b"x"]));
        assert!(matches!(
            rff.check_consistency(),
            Err(RffError::CellCountNotMultiple {
                cells: 3,
                columns: 2
            })
        ));
    }

    #[test]
    fn first_use_order_enforced() {
        // Identifier 2 appears before 1 was ever used.
        let rff = RawFlatFile::from_parts(1, vec![2], content(&[b"", b"x", b"y"]));
        assert!(matches!(
            rff.check_consistency(),
            Err(RffError::CellOutOfOrder {
                index: 0,
                value: 2,
                next_new: 1
            })
        ));
    }

    #[test]
    fn content_bounds_enforced() {
        let rff = RawFlatFile::from_parts(1, vec![1, 2], content(&[b"", b"x"]));
        assert!(matches!(
            rff.check_consistency(),
            Err(RffError::CellOutOfBounds {
                index: 1,
                value: 2,
                content: 2
            })
        ));
    }

    #[test]
    fn zero_cells_need_no_content_reference() {
        // Zeros reference content[0] and never advance the first-use cursor.
        let rff = RawFlatFile::from_parts(3, vec![0, 0, 0], content(&[b""]));
        rff.check_consistency().expect("all-empty row");
    }

    #[test]
    fn builders_set_diagnostics() {
        let rff = RawFlatFile::from_parts(1, vec![1], content(&[b"", b"x"]))
            .with_separator(b';')
            .with_space_separated_headers(true)
            .with_file_encoding(Some(FileEncoding::Utf16Le))
            .with_truncated(true)
            .with_unexpected_cells(vec![UnexpectedCell::new(0, 1, b"spill", None)]);
        assert_eq!(rff.separator(), b';');
        assert!(rff.space_separated_headers());
        assert_eq!(rff.file_encoding(), Some(FileEncoding::Utf16Le));
        assert!(rff.is_truncated());
        assert_eq!(rff.unexpected_cells().len(), 1);
    }
}
