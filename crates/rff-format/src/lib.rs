//! Binary serialization of [`RawFlatFile`].
//!
//! Wire layout, version 1 (fixed-width fields little-endian, varints as in
//! [`rff_types::varint`]):
//!
//! ```text
//! [HEADER]  version(u8 = 1) | columns(u16) | cell_count(u32) | content_count(u32)
//! [CELLS]   repeated cell_count times: cell(varint)
//! [CONTENT] repeated content_count times: len(varint) | bytes
//! ```
//!
//! The first content blob is always the empty array and contributes exactly
//! one `0x00` byte. Reading is strict: every field must arrive in full
//! (`ShortRead` otherwise), the version byte must match, and varints must
//! stay within the 32-bit range. Reading does *not* validate the aggregate
//! invariants; callers that distrust the bytes run
//! [`RawFlatFile::check_consistency`] on the result.

use std::io::{self, Read, Write};

use rff_error::{Result, RffError};
use rff_types::varint::{write_varint, MAX_VARINT_LEN};
use rff_types::RawFlatFile;

/// The version byte at the head of every serialized flat file.
pub const FORMAT_VERSION: u8 = 1;

/// Write `rff` to `writer`.
///
/// Assumes `rff` is consistent (the parser's output always is; for
/// hand-built values run [`RawFlatFile::check_consistency`] first).
pub fn write<W: Write>(writer: &mut W, rff: &RawFlatFile) -> Result<()> {
    let cell_count = count_as_u32("cell", rff.cells().len())?;
    let content_count = count_as_u32("content", rff.content().len())?;

    writer.write_all(&[FORMAT_VERSION])?;
    writer.write_all(&rff.columns().to_le_bytes())?;
    writer.write_all(&cell_count.to_le_bytes())?;
    writer.write_all(&content_count.to_le_bytes())?;

    let mut varint = [0u8; MAX_VARINT_LEN];
    for &cell in rff.cells() {
        let n = write_varint(&mut varint, cell);
        writer.write_all(&varint[..n])?;
    }

    for blob in rff.content() {
        let len = count_as_u32("content blob length", blob.len())?;
        let n = write_varint(&mut varint, len);
        writer.write_all(&varint[..n])?;
        writer.write_all(blob)?;
    }

    Ok(())
}

/// Read a flat file previously written by [`write`].
pub fn read<R: Read>(reader: &mut R) -> Result<RawFlatFile> {
    let version = read_u8(reader)?;
    if version != FORMAT_VERSION {
        return Err(RffError::UnknownVersion { version });
    }

    let columns = u16::from_le_bytes(read_array(reader)?);
    let cell_count = u32::from_le_bytes(read_array(reader)?) as usize;
    let content_count = u32::from_le_bytes(read_array(reader)?) as usize;

    let mut cells = Vec::with_capacity(cell_count);
    for _ in 0..cell_count {
        cells.push(read_varint(reader)?);
    }

    let mut content = Vec::with_capacity(content_count);
    for _ in 0..content_count {
        let len = read_varint(reader)? as usize;
        let mut blob = vec![0u8; len];
        read_full(reader, &mut blob)?;
        content.push(blob);
    }

    Ok(RawFlatFile::from_parts(columns, cells, content))
}

fn count_as_u32(what: &'static str, count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| RffError::TooLarge { what, count })
}

/// Read exactly `buf.len()` bytes, failing with the achieved count.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Err(RffError::short_read(buf.len(), filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    read_full(reader, &mut buf)?;
    Ok(buf)
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    Ok(read_array::<R, 1>(reader)?[0])
}

/// Decode one varint from the stream, byte at a time.
fn read_varint<R: Read>(reader: &mut R) -> Result<u32> {
    let mut value: u32 = 0;
    let mut shift = 0;
    loop {
        let b = read_u8(reader)?;
        if shift == 28 && (b & 0x80 != 0 || b > 0x0F) {
            return Err(RffError::VarintTooLong);
        }
        value |= u32::from(b & 0x7F) << shift;
        if b & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(items: &[&[u8]]) -> Vec<Vec<u8>> {
        items.iter().map(|i| i.to_vec()).collect()
    }

    fn roundtrip(rff: &RawFlatFile) -> RawFlatFile {
        let mut bytes = Vec::new();
        write(&mut bytes, rff).expect("write");
        read(&mut bytes.as_slice()).expect("read")
    }

    #[test]
    fn empty_file_wire_bytes() {
        let rff = RawFlatFile::from_parts(0, vec![], content(&[b""]));
        let mut bytes = Vec::new();
        write(&mut bytes, &rff).expect("write");
        assert_eq!(
            bytes,
            [
                1, // version
                0, 0, // columns
                0, 0, 0, 0, // cell count
                1, 0, 0, 0, // content count
                0, // empty blob: varint length 0, no payload
            ]
        );

        let back = read(&mut bytes.as_slice()).expect("read");
        back.check_consistency().expect("consistent");
        assert_eq!(back, rff);
    }

    #[test]
    fn simple_file_wire_bytes() {
        let rff = RawFlatFile::from_parts(2, vec![1, 2, 1, 0], content(&[b"", b"ab", b"c"]));
        let mut bytes = Vec::new();
        write(&mut bytes, &rff).expect("write");
        assert_eq!(
            bytes,
            [
                1, // version
                2, 0, // columns
                4, 0, 0, 0, // cell count
                3, 0, 0, 0, // content count
                1, 2, 1, 0, // cells as varints
                0, // ""
                2, b'a', b'b', // "ab"
                1, b'c', // "c"
            ]
        );
    }

    #[test]
    fn roundtrip_preserves_table() {
        let rff = RawFlatFile::from_parts(
            3,
            vec![1, 2, 3, 0, 2, 4],
            content(&[b"", b"alpha", b"beta", b"gamma", b"delta"]),
        );
        let back = roundtrip(&rff);
        assert_eq!(back.columns(), rff.columns());
        assert_eq!(back.cells(), rff.cells());
        assert_eq!(back.content(), rff.content());
        for line in 0..rff.lines() {
            for column in 0..usize::from(rff.columns()) {
                assert_eq!(back.cell(line, column), rff.cell(line, column));
            }
        }
    }

    #[test]
    fn roundtrip_large_identifiers() {
        // Push identifiers across every varint length boundary.
        let mut cells = Vec::new();
        let mut blobs: Vec<Vec<u8>> = vec![Vec::new()];
        for i in 1..=300u32 {
            cells.push(i);
            blobs.push(format!("value-{i}").into_bytes());
        }
        let rff = RawFlatFile::from_parts(300, cells, blobs);
        rff.check_consistency().expect("consistent input");
        let back = roundtrip(&rff);
        assert_eq!(back, rff);
    }

    #[test]
    fn unknown_version_rejected() {
        let rff = RawFlatFile::from_parts(0, vec![], content(&[b""]));
        let mut bytes = Vec::new();
        write(&mut bytes, &rff).expect("write");
        bytes[0] = 2;
        let err = read(&mut bytes.as_slice()).expect_err("version mismatch");
        assert!(matches!(err, RffError::UnknownVersion { version: 2 }));
        assert_eq!(err.to_string(), "unknown version number 2");
    }

    #[test]
    fn truncated_streams_are_short_reads() {
        let rff = RawFlatFile::from_parts(2, vec![1, 0], content(&[b"", b"payload"]));
        let mut bytes = Vec::new();
        write(&mut bytes, &rff).expect("write");

        // Cutting the stream at every point must yield ShortRead, never a
        // partial success or a panic.
        for cut in 0..bytes.len() {
            let err = read(&mut &bytes[..cut]).expect_err("truncated input");
            assert!(
                matches!(err, RffError::ShortRead { .. }),
                "cut at {cut} gave {err:?}"
            );
        }

        // The full stream still reads back.
        let back = read(&mut bytes.as_slice()).expect("full read");
        assert_eq!(back, rff);
    }

    #[test]
    fn empty_stream_is_short_read() {
        let err = read(&mut &[][..]).expect_err("empty stream");
        assert!(matches!(
            err,
            RffError::ShortRead {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn overlong_cell_varint_rejected() {
        let mut bytes = vec![
            1, // version
            1, 0, // columns
            1, 0, 0, 0, // cell count
            1, 0, 0, 0, // content count
        ];
        bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF]); // 5 continuation bytes
        let err = read(&mut bytes.as_slice()).expect_err("overlong varint");
        assert!(matches!(err, RffError::VarintTooLong));
    }

    #[test]
    fn read_does_not_validate_invariants() {
        // An inconsistent but well-framed stream reads fine; the checker
        // is a separate, explicit step.
        let rff = RawFlatFile::from_parts(2, vec![1, 1, 1], content(&[b"", b"x"]));
        let back = roundtrip(&rff);
        assert!(back.check_consistency().is_err());
    }

    #[test]
    fn diagnostics_do_not_survive_serialization() {
        // The wire format carries the table, not the parse diagnostics.
        let rff = RawFlatFile::from_parts(1, vec![1], content(&[b"", b"x"]))
            .with_separator(b';')
            .with_truncated(true);
        let back = roundtrip(&rff);
        assert_eq!(back.separator(), b'\t');
        assert!(!back.is_truncated());
    }
}
