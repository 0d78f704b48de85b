//! Low level read helpers
use std::io::{self, Read};

/// Single byte `u8` reader
#[inline]
pub fn rdu8<R: Read>(r: &mut R) -> Result<u8, io::Error> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Little endian `u16` reader
#[inline]
pub fn rdu16le<R: Read>(r: &mut R) -> Result<u16, io::Error> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Little endian `i16` reader
#[inline]
pub fn rdi16le<R: Read>(r: &mut R) -> Result<i16, io::Error> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(i16::from_le_bytes(buf))
}

/// Little endian `u32` reader
#[inline]
pub fn rdu32le<R: Read>(r: &mut R) -> Result<u32, io::Error> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Little endian `i32` reader
#[inline]
pub fn rdi32le<R: Read>(r: &mut R) -> Result<i32, io::Error> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Little endian `u64` reader
#[inline]
pub fn rdu64le<R: Read>(r: &mut R) -> Result<u64, io::Error> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Little endian `i64` reader
#[inline]
pub fn rdi64le<R: Read>(r: &mut R) -> Result<i64, io::Error> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

/// Little endian `f32` reader
#[inline]
pub fn rdf32le<R: Read>(r: &mut R) -> Result<f32, io::Error> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Little endian `f64` reader
#[inline]
pub fn rdf64le<R: Read>(r: &mut R) -> Result<f64, io::Error> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Converts a wire length field to `usize`
#[inline]
pub fn into_usize(v: u32) -> Result<usize, io::Error> {
    usize::try_from(v)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Cannot convert value to usize"))
}

/// Takes `len` bytes off the front of the window
///
/// The declared length is validated against the remaining bytes before
/// anything is sliced or allocated
#[inline]
pub fn take_bytes<'a>(r: &mut &'a [u8], len: usize) -> Result<&'a [u8], io::Error> {
    if len > r.len() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Length field exceeds the remaining data",
        ));
    }
    let (head, tail) = r.split_at(len);
    *r = tail;
    Ok(head)
}

/// Skips the padding that brings a `consumed`-byte element to a 4-byte boundary
///
/// Padding which lies beyond the end of the window is forgiven: the last
/// element of a blob is commonly emitted without its trailing pad
#[inline]
pub fn skip_align4(r: &mut &[u8], consumed: usize) {
    let pad = consumed.wrapping_neg() % 4;
    *r = &r[pad.min(r.len())..];
}

/// Decodes an UTF-16LE byte buffer
///
/// An odd trailing byte is dropped; invalid sequences turn into replacement
/// characters
pub fn decode_utf16le(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Strips trailing NUL bytes
pub fn trim_nul(mut data: &[u8]) -> &[u8] {
    while let [rest @ .., 0] = data {
        data = rest;
    }
    data
}
