//! Fixed-width, big-endian sample I/O. Every other component reads and
//! writes through these two operations.
//!
//! Grounded on `v2f_file_read_big_endian` / `v2f_file_write_big_endian`
//! (`v2f_file.c`) and, for byte-order primitives, the teacher's
//! `read_le32`/`write_le32` helpers in `src/frame/header.rs` (here
//! big-endian, as the wire format requires, instead of little-endian).

use std::io::{Read, Write};

use crate::error::{V2fError, V2fResult};

/// Converts up to 4 big-endian bytes into a sample value. Equivalent to
/// `v2f_entropy_coder_buffer_to_sample`.
#[inline]
pub fn buffer_to_sample(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

/// Writes `sample`'s low `bytes_per_sample` bytes, big-endian, into `out`.
/// Equivalent to `v2f_entropy_coder_sample_to_buffer`.
#[inline]
pub fn sample_to_buffer(sample: u32, bytes_per_sample: u8, out: &mut [u8]) {
    for i in 0..bytes_per_sample as usize {
        let shift = 8 * (bytes_per_sample as usize - 1 - i);
        out[i] = ((sample >> shift) & 0xff) as u8;
    }
}

/// Reads up to `dest.len()` samples of `bytes_per_sample` bytes each,
/// big-endian, returning the count actually read.
///
/// Equivalent to `v2f_file_read_big_endian`. A short read that lands on a
/// whole number of samples returns `Ok(n)` with `n < dest.len()` — callers
/// must check the count, not rely on an error, except that reading zero
/// bytes at the very start of a call is reported as
/// [`V2fError::UnexpectedEndOfFile`] with a read count of zero (used by the
/// envelope driver as its normal end-of-stream sentinel). A short read that
/// ends mid-sample (not a multiple of `bytes_per_sample`) is a hard
/// [`V2fError::Io`] failure.
pub fn read_samples(
    r: &mut impl Read,
    dest: &mut [u32],
    bytes_per_sample: u8,
) -> V2fResult<usize> {
    if dest.is_empty() || !(1..=4).contains(&bytes_per_sample) {
        return Err(V2fError::InvalidParameter(
            "dest must be non-empty and bytes_per_sample in [1,4]".into(),
        ));
    }

    let bps = bytes_per_sample as usize;
    let mut raw = vec![0u8; dest.len() * bps];
    let read_bytes = read_fill_as_much_as_possible(r, &mut raw)?;

    if read_bytes % bps != 0 {
        return Err(V2fError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "short read misaligned to bytes_per_sample",
        )));
    }

    let read_count = read_bytes / bps;
    for (i, chunk) in raw[..read_bytes].chunks_exact(bps).enumerate() {
        dest[i] = buffer_to_sample(chunk);
    }

    if read_count == dest.len() {
        Ok(read_count)
    } else {
        Err(V2fError::UnexpectedEndOfFile)
    }
}

/// Like [`Read::read`] repeated until `buf` is full or the stream is
/// exhausted, returning the total bytes read (which may be less than
/// `buf.len()` on EOF, unlike `read_exact`).
fn read_fill_as_much_as_possible(r: &mut impl Read, buf: &mut [u8]) -> V2fResult<usize> {
    let mut total = 0;
    while total < buf.len() {
        match r.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(V2fError::Io(e)),
        }
    }
    Ok(total)
}

/// Writes `samples` as `bytes_per_sample`-wide big-endian values. Equivalent
/// to `v2f_file_write_big_endian`. Any short write is a hard failure.
pub fn write_samples(w: &mut impl Write, samples: &[u32], bytes_per_sample: u8) -> V2fResult<()> {
    if !(1..=4).contains(&bytes_per_sample) {
        return Err(V2fError::InvalidParameter("bytes_per_sample must be in [1,4]".into()));
    }
    let bps = bytes_per_sample as usize;
    let mut buf = vec![0u8; bps];
    for &s in samples {
        sample_to_buffer(s, bytes_per_sample, &mut buf);
        w.write_all(&buf)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip_two_byte_samples() {
        let samples = [0u32, 1, 255, 65535, 40000];
        let mut buf = Vec::new();
        write_samples(&mut buf, &samples, 2).unwrap();
        assert_eq!(buf.len(), samples.len() * 2);

        let mut dest = [0u32; 5];
        let mut cursor = Cursor::new(buf);
        let n = read_samples(&mut cursor, &mut dest, 2).unwrap();
        assert_eq!(n, 5);
        assert_eq!(dest, samples);
    }

    #[test]
    fn zero_byte_read_is_unexpected_eof_with_zero_count() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let mut dest = [0u32; 4];
        let err = read_samples(&mut cursor, &mut dest, 1).unwrap_err();
        match err {
            V2fError::UnexpectedEndOfFile => {}
            other => panic!("expected UnexpectedEndOfFile, got {other:?}"),
        }
    }

    #[test]
    fn short_read_aligned_reports_count() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3, 4]); // two 2-byte samples
        let mut dest = [0u32; 4];
        let err = read_samples(&mut cursor, &mut dest, 2).unwrap_err();
        match err {
            V2fError::UnexpectedEndOfFile => {}
            other => panic!("expected UnexpectedEndOfFile, got {other:?}"),
        }
    }

    #[test]
    fn short_read_misaligned_is_io_error() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3]); // 3 bytes, bytes_per_sample=2
        let mut dest = [0u32; 4];
        let err = read_samples(&mut cursor, &mut dest, 2).unwrap_err();
        match err {
            V2fError::Io(_) => {}
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
