//! Little-endian primitives and offset-chasing for the QCT wire format.
//!
//! Everything multi-byte in a QCT file is little-endian, and all internal
//! pointers are 32-bit offsets absolute from the start of the file. Strings
//! and sub-records are reached by reading an offset at the current position,
//! excursioning to it, and restoring the position to just after the offset
//! field.

use std::io::{Read, Seek, SeekFrom};

use crate::Error;

pub(crate) fn read_u8(r: &mut impl Read) -> Result<u8, Error> {
    let mut buf = [0; 1];
    r.read_exact(&mut buf).map_err(Error::from_read)?;
    Ok(buf[0])
}

pub(crate) fn read_u32_le(r: &mut impl Read) -> Result<u32, Error> {
    let mut buf = [0; 4];
    r.read_exact(&mut buf).map_err(Error::from_read)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_f64_le(r: &mut impl Read) -> Result<f64, Error> {
    let mut buf = [0; 8];
    r.read_exact(&mut buf).map_err(Error::from_read)?;
    Ok(f64::from_le_bytes(buf))
}

/// Runs `f` with the stream positioned at `offset`, restoring the previous
/// position afterwards whether or not `f` succeeds.
pub(crate) fn with_position<R, T>(
    r: &mut R,
    offset: u64,
    f: impl FnOnce(&mut R) -> Result<T, Error>,
) -> Result<T, Error>
where
    R: Read + Seek,
{
    let saved = r.stream_position()?;
    r.seek(SeekFrom::Start(offset))?;
    let result = f(r);
    let restored = r.seek(SeekFrom::Start(saved));
    match result {
        Ok(value) => {
            restored?;
            Ok(value)
        }
        // The excursion failure is the interesting one
        Err(e) => Err(e),
    }
}

/// Reads a 32-bit offset at the current position and follows it to a
/// NUL-terminated string, leaving the stream just after the offset field.
///
/// A zero offset means "no string" and yields `""` without seeking. The
/// on-disk bytes have no declared encoding, so invalid UTF-8 is replaced
/// rather than rejected.
pub(crate) fn read_string(r: &mut (impl Read + Seek)) -> Result<String, Error> {
    let offset = read_u32_le(r)?;
    if offset == 0 {
        return Ok(String::new());
    }
    with_position(r, u64::from(offset), |r| {
        let mut bytes = Vec::new();
        loop {
            let b = read_u8(r)?;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    })
}
