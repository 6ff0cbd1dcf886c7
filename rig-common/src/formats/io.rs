//! Little-endian primitives shared by the codecs
//!
//! Reads run against `impl Read` so truncated input surfaces as
//! `UnexpectedEof`, which converts into [`FormatError::Io`].

use std::io::{self, Read, Write};

use super::FormatError;

pub(crate) fn read_bytes<const N: usize>(r: &mut impl Read) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

pub(crate) fn read_u16(r: &mut impl Read) -> io::Result<u16> {
    read_bytes::<2>(r).map(u16::from_le_bytes)
}

pub(crate) fn read_i16(r: &mut impl Read) -> io::Result<i16> {
    read_bytes::<2>(r).map(i16::from_le_bytes)
}

pub(crate) fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    read_bytes::<4>(r).map(u32::from_le_bytes)
}

pub(crate) fn read_f32(r: &mut impl Read) -> io::Result<f32> {
    read_bytes::<4>(r).map(f32::from_le_bytes)
}

pub(crate) fn read_f32s<const N: usize>(r: &mut impl Read) -> io::Result<[f32; N]> {
    let mut out = [0.0f32; N];
    for value in &mut out {
        *value = read_f32(r)?;
    }
    Ok(out)
}

/// NUL-padded string in a fixed-size field
pub(crate) fn read_fixed_string(r: &mut impl Read, size: usize) -> io::Result<String> {
    let mut buf = vec![0u8; size];
    r.read_exact(&mut buf)?;
    Ok(decode_fixed_string(&buf))
}

pub(crate) fn decode_fixed_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// u16 length followed by UTF-8 bytes
pub(crate) fn read_prefixed_string(r: &mut impl Read) -> Result<String, FormatError> {
    let len = read_u16(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| FormatError::invalid("name is not valid UTF-8"))
}

pub(crate) fn write_u16(w: &mut impl Write, value: u16) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

pub(crate) fn write_i16(w: &mut impl Write, value: i16) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

pub(crate) fn write_u32(w: &mut impl Write, value: u32) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

pub(crate) fn write_f32s(w: &mut impl Write, values: &[f32]) -> io::Result<()> {
    for value in values {
        w.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

/// Encode a string into a NUL-padded field, leaving room for the terminator
pub(crate) fn encode_fixed_string<const N: usize>(
    what: &'static str,
    value: &str,
) -> Result<[u8; N], FormatError> {
    FormatError::check_limit(what, value.len(), N - 1)?;
    let mut out = [0u8; N];
    out[..value.len()].copy_from_slice(value.as_bytes());
    Ok(out)
}

pub(crate) fn write_prefixed_string(w: &mut impl Write, value: &str) -> Result<(), FormatError> {
    FormatError::check_limit("name bytes", value.len(), u16::MAX as usize)?;
    write_u16(w, value.len() as u16)?;
    w.write_all(value.as_bytes())?;
    Ok(())
}

/// Convert a collection length to a u32 count field
pub(crate) fn count_u32(what: &'static str, len: usize) -> Result<u32, FormatError> {
    FormatError::check_limit(what, len, u32::MAX as usize)?;
    Ok(len as u32)
}
