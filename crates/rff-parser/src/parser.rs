//! The flat-file tokenizer and row assembler.

use std::io::Read;

use memchr::{memchr, memchr3};
use tracing::{debug, warn};

use rff_error::Result;
use rff_trie::Trie;
use rff_types::limits::MAX_VALUE_LENGTH;
use rff_types::{ParserOptions, RawFlatFile, UnexpectedCell};

use crate::buffer::InputBuffer;

const TAB: u8 = 0x09;
const LF: u8 = 0x0A;
const CR: u8 = 0x0D;
const SPACE: u8 = 0x20;
const QUOTE: u8 = 0x22;

/// Separator candidates in priority order.
const CANDIDATES: [u8; 5] = [TAB, b';', b',', b'|', SPACE];

/// Reads delimited text into a [`RawFlatFile`].
///
/// One `parse` call is one pass: the separator is guessed from the first
/// line, then cells are scanned, interned through the dictionary trie and
/// laid out row by row. The parser never fails on malformed *text* —
/// ill-formed quotes are treated as data, oversize cells are truncated to
/// [`MAX_VALUE_LENGTH`], and non-empty cells past the last column are
/// recorded as diagnostics instead of raised. Errors only come from the
/// underlying source or from option validation.
pub struct Parser {
    options: ParserOptions,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl Parser {
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parse `source` to completion.
    pub fn parse<R: Read>(&self, source: R) -> Result<RawFlatFile> {
        let mut buffer = InputBuffer::new(self.options.read_buffer_size(), source)?;
        let file_encoding = buffer.file_encoding();

        let guess = guess_separator(&mut buffer);
        let space_separated_headers = guess.separator == SPACE;
        // A SPACE-separated header is taken as a formatting accident: the
        // guessed separator splits the header line only, and the body is
        // split on TAB from line 2 onward.
        let separator = if space_separated_headers {
            TAB
        } else {
            guess.separator
        };
        // The column count is bounded by the 16-bit wire format.
        let columns = guess.columns.min(usize::from(u16::MAX));

        debug!(
            separator = %char::from(separator),
            columns,
            space_separated_headers,
            encoding = ?file_encoding,
            "guessed input shape"
        );

        // Both limits are header-exclusive, so each effective cap grants
        // one extra line worth of cells.
        let max_cells_from_lines = columns.saturating_mul(
            self.options.max_line_count().saturating_add(1),
        );
        let max_cells = self
            .options
            .max_cell_count()
            .saturating_add(columns)
            .min(max_cells_from_lines);

        let mut run = Run::new(columns);

        // The separator in force for the current line; reset at every end
        // of line so a SPACE-split header reverts to TAB for the body.
        let mut active = guess.separator;

        // Each iteration extracts one cell starting at `buffer.start()`.
        while (!buffer.at_end_of_stream() || !buffer.is_empty())
            && run.cells.len() < max_cells
        {
            let mut in_quote = false;
            let mut n_quotes: usize = 0;

            // Scan forward for a cell terminator.
            let mut i = buffer.start();
            loop {
                if i >= buffer.end() {
                    // Out of buffered data. Normally: refill and rescan
                    // the cell. But if the window already fills the
                    // buffer, the token is too long to ever fit — take
                    // what we have.
                    if buffer.is_full() {
                        let (start, end) = (buffer.start(), buffer.end());
                        run.extract_cell(buffer.bytes_mut(), start, end, n_quotes);
                        buffer.set_start(end);
                    }
                    buffer.refill()?;
                    break;
                }

                let b = buffer.bytes()[i];

                if b == QUOTE {
                    if i == buffer.start() {
                        // A quote at the very start of the cell opens it.
                        n_quotes += 1;
                        in_quote = true;
                    } else if in_quote {
                        if i + 1 < buffer.end() && buffer.bytes()[i + 1] == QUOTE {
                            // Doubled quote: an escaped literal.
                            i += 1;
                            n_quotes += 1;
                        } else {
                            in_quote = false;
                        }
                    }
                    i += 1;
                    continue;
                }

                if in_quote {
                    // Separators and line breaks are data inside quotes:
                    // jump straight to the next quote.
                    i = match memchr(QUOTE, &buffer.bytes()[i..buffer.end()]) {
                        Some(offset) => i + offset,
                        None => buffer.end(),
                    };
                    continue;
                }

                if b == CR || b == LF {
                    let start = buffer.start();
                    run.extract_cell(buffer.bytes_mut(), start, i, n_quotes);
                    run.end_line();
                    active = separator;
                    buffer.set_start(i + 1);
                    break;
                }

                if b == active {
                    let start = buffer.start();
                    run.extract_cell(buffer.bytes_mut(), start, i, n_quotes);
                    buffer.set_start(i + 1);
                    break;
                }

                // Plain data: skip ahead to the next byte that can matter.
                i = match memchr3(CR, LF, active, &buffer.bytes()[i + 1..buffer.end()]) {
                    Some(offset) => i + 1 + offset,
                    None => buffer.end(),
                };
            }
        }

        // In case the input had no final line terminator.
        run.end_line();

        let is_truncated = run.cells.len() >= max_cells;
        if is_truncated {
            warn!(cells = run.cells.len(), "input truncated at configured limit");
        }
        if !run.unexpected.is_empty() {
            debug!(
                count = run.unexpected.len(),
                "cells found beyond the declared column count"
            );
        }

        // An input with no committed cells has no columns either.
        #[allow(clippy::cast_possible_truncation)]
        let columns = if run.cells.is_empty() { 0 } else { columns as u16 };

        Ok(
            RawFlatFile::from_parts(columns, run.cells, run.trie.into_values())
                .with_separator(separator)
                .with_space_separated_headers(space_separated_headers)
                .with_file_encoding(file_encoding)
                .with_unexpected_cells(run.unexpected)
                .with_truncated(is_truncated),
        )
    }
}

struct SeparatorGuess {
    separator: u8,
    columns: usize,
}

/// Guess the separator by scanning the first logical line of the window.
///
/// Leading line breaks and spaces are skipped first. Candidates are
/// counted outside quoted regions only; the first candidate (in priority
/// order) with a non-zero count wins and fixes the column count. An input
/// with no candidate at all is a single TAB-separated column.
fn guess_separator<R: Read>(buffer: &mut InputBuffer<R>) -> SeparatorGuess {
    // Skip to the first byte that could start a header.
    for i in buffer.start()..buffer.end() {
        let b = buffer.bytes()[i];
        if b == LF || b == CR || b == SPACE {
            continue;
        }
        buffer.set_start(i);
        break;
    }

    let mut counts = [0usize; CANDIDATES.len()];
    let mut in_quote = false;

    for i in buffer.start()..buffer.end() {
        let b = buffer.bytes()[i];
        if b == QUOTE {
            in_quote = !in_quote;
            continue;
        }
        if in_quote {
            continue;
        }
        if b == LF || b == CR {
            break;
        }
        for (c, &candidate) in CANDIDATES.iter().enumerate() {
            if candidate == b {
                counts[c] += 1;
            }
        }
    }

    for (c, &candidate) in CANDIDATES.iter().enumerate() {
        if counts[c] > 0 {
            return SeparatorGuess {
                separator: candidate,
                columns: counts[c] + 1,
            };
        }
    }

    SeparatorGuess {
        separator: TAB,
        columns: 1,
    }
}

/// Mutable parsing state: the dictionary, the growing cell matrix, and the
/// per-line bookkeeping.
struct Run {
    trie: Trie,
    cells: Vec<u32>,
    unexpected: Vec<UnexpectedCell>,
    columns: usize,
    /// Cells committed on the current line; 0 while only empties were seen.
    line_size: usize,
    /// Length of the unbroken empty-cell prefix of the current line. Empty
    /// cells are withheld until a non-empty cell proves the line exists.
    empty_streak: usize,
}

impl Run {
    fn new(columns: usize) -> Self {
        Self {
            trie: Trie::new(),
            cells: Vec::new(),
            unexpected: Vec::new(),
            columns,
            line_size: 0,
            empty_streak: 0,
        }
    }

    /// Reduce the raw cell slice `[start, end)` to its contents, intern it,
    /// and place the reference in the matrix.
    ///
    /// Quote handling: the slice counts as quoted only when it both starts
    /// and ends with a quote — anything else is an ill-formed quoting that
    /// is taken literally. Inner doubled quotes are collapsed by rewriting
    /// the slice in place; those bytes are never re-read after extraction,
    /// and the trie copies on identifier allocation.
    fn extract_cell(&mut self, source: &mut [u8], mut start: usize, mut end: usize, n_quotes: usize) {
        if n_quotes > 0 && end > start && source[end - 1] == QUOTE {
            start += 1;
            end -= 1;

            if n_quotes > 1 {
                // Skip to just past the first doubled quote...
                let mut j = start;
                while j < end && source[j] != QUOTE {
                    j += 1;
                }
                if j < end {
                    j += 1;
                    // ...and start compacting: keep one quote per pair.
                    let mut i = j + 1;
                    while i < end {
                        source[j] = source[i];
                        if source[i] == QUOTE {
                            i += 1;
                        }
                        i += 1;
                        j += 1;
                    }
                    end = j;
                }
            }
        }

        while start < end && source[start] == SPACE {
            start += 1;
        }
        while start < end && source[end - 1] == SPACE {
            end -= 1;
        }

        if end - start > MAX_VALUE_LENGTH {
            end = start + MAX_VALUE_LENGTH;
        }

        let id = self.trie.hash(&source[start..end]);

        if id == 0 {
            if self.line_size == 0 {
                // Withhold: an all-empty line must vanish entirely.
                self.empty_streak += 1;
            } else {
                if self.line_size < self.columns {
                    self.cells.push(0);
                }
                self.line_size += 1;
            }
        } else {
            // The line is real: flush the withheld empty prefix first.
            while self.empty_streak > 0 {
                self.empty_streak -= 1;
                if self.line_size < self.columns {
                    self.cells.push(0);
                }
                self.line_size += 1;
            }

            if self.line_size < self.columns {
                self.cells.push(id);
            } else {
                let line = self.cells.len() / self.columns - 1;
                self.unexpected.push(UnexpectedCell::new(
                    line,
                    self.line_size,
                    &self.trie.values()[id as usize],
                    None,
                ));
            }
            self.line_size += 1;
        }
    }

    /// Close the current line: pad short lines with empty cells, discard
    /// lines that never produced a non-empty cell.
    fn end_line(&mut self) {
        if self.line_size > 0 {
            while self.line_size < self.columns {
                self.cells.push(0);
                self.line_size += 1;
            }
        }
        self.line_size = 0;
        self.empty_streak = 0;
    }
}
