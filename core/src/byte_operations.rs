//! Little-endian field extraction for the fixed-layout terrain records.
//!
//! Every record in the `.pmg` / `.pog` streams is read into a byte buffer of
//! its exact on-disk size first, then split into fields with the macros
//! below. Each macro takes the buffer and a mutable cursor and advances the
//! cursor past the field it read, so a record decoder reads top to bottom in
//! the same order as the on-disk layout.

use std::io::{self, Read};

use crate::error::{MapError, MapResult};

macro_rules! read_u8 {
    ($bytes:expr, $offset:expr) => {{
        let val = $bytes[$offset];
        $offset += 1;
        val
    }};
}

macro_rules! read_u16 {
    ($bytes:expr, $offset:expr) => {{
        let val = u16::from_le_bytes([$bytes[$offset], $bytes[$offset + 1]]);
        $offset += 2;
        val
    }};
}

macro_rules! read_i16 {
    ($bytes:expr, $offset:expr) => {{
        let val = i16::from_le_bytes([$bytes[$offset], $bytes[$offset + 1]]);
        $offset += 2;
        val
    }};
}

macro_rules! read_u32 {
    ($bytes:expr, $offset:expr) => {{
        let val = u32::from_le_bytes([
            $bytes[$offset],
            $bytes[$offset + 1],
            $bytes[$offset + 2],
            $bytes[$offset + 3],
        ]);
        $offset += 4;
        val
    }};
}

/// Reads `N` consecutive bytes into a fixed array.
macro_rules! read_bytes {
    ($bytes:expr, $offset:expr, $len:expr) => {{
        let mut arr = [0u8; $len];
        arr.copy_from_slice(&$bytes[$offset..$offset + $len]);
        $offset += $len;
        arr
    }};
}

/// Advances the cursor over reserved bytes without reading them.
macro_rules! skip_bytes {
    ($offset:expr, $len:expr) => {{
        $offset += $len;
    }};
}

/// Fills `buf` from `reader`, mapping a short read to [`MapError::Truncated`].
///
/// # Arguments
/// * `reader` - The stream positioned at the start of the record.
/// * `buf` - Destination buffer; its length is the record size.
/// * `stage` - Human readable record name used in the error message.
/// * `source` - Path or logical name of the stream, for diagnostics.
pub fn read_record<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    stage: &'static str,
    source: &str,
) -> MapResult<()> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => MapError::Truncated {
            stage,
            source_name: source.to_string(),
            needed: buf.len(),
        },
        _ => MapError::Read {
            stage,
            source_name: source.to_string(),
            source: err,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_vertex_fields() {
        // height -2, lighting 0x1234
        let bytes = [0xFE, 0xFF, 0x34, 0x12];
        let mut offset = 0;

        assert_eq!(read_i16!(bytes, offset), -2);
        assert_eq!(offset, 2);
        assert_eq!(read_u16!(bytes, offset), 0x1234);
        assert_eq!(offset, 4);
    }

    #[test]
    fn test_read_tile_record_layout() {
        let mut bytes = [0u8; 16];
        bytes[6] = 0x41; // grass | mine
        bytes[7] = 9;
        bytes[10] = 3;
        bytes[11..15].copy_from_slice(&0xDEADBEEFu32.to_le_bytes());

        let mut offset = 0;
        skip_bytes!(offset, 6);
        assert_eq!(read_u8!(bytes, offset), 0x41);
        assert_eq!(read_u8!(bytes, offset), 9);
        assert_eq!(read_i16!(bytes, offset), 0);
        assert_eq!(read_u8!(bytes, offset), 3);
        assert_eq!(read_u32!(bytes, offset), 0xDEADBEEF);
        skip_bytes!(offset, 1);
        assert_eq!(offset, 16);
    }

    #[test]
    fn test_read_bytes_copies_slice() {
        let bytes = *b"pig\0\0xyz";
        let mut offset = 0;

        let name: [u8; 5] = read_bytes!(bytes, offset, 5);
        assert_eq!(&name, b"pig\0\0");
        assert_eq!(offset, 5);
    }

    #[test]
    fn read_record_reports_truncation() {
        let data = [1u8, 2, 3];
        let mut cursor = io::Cursor::new(&data[..]);
        let mut buf = [0u8; 8];

        let err = read_record(&mut cursor, &mut buf, "chunk header", "test.pmg").unwrap_err();
        match err {
            MapError::Truncated {
                stage,
                source_name,
                needed,
            } => {
                assert_eq!(stage, "chunk header");
                assert_eq!(source_name, "test.pmg");
                assert_eq!(needed, 8);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn read_record_fills_exact_buffer() {
        let data = [1u8, 2, 3, 4, 5];
        let mut cursor = io::Cursor::new(&data[..]);
        let mut buf = [0u8; 4];

        read_record(&mut cursor, &mut buf, "vertex", "test.pmg").unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(cursor.position(), 4);
    }
}
