//! Error taxonomy for the V2F codec.
//!
//! Mirrors the original `v2f_error_t` enum (`v2f.h`) one-for-one so that the
//! numeric discriminants stay stable across a potential C ABI surface, the way
//! the teacher codebase keeps `Lz4FError`'s discriminants aligned with
//! `LZ4F_errorCodes` (`src/frame/types.rs`). Unlike the teacher's block-level
//! errors (`Lz4Error`, buffer-to-buffer, no I/O), this codec is stream
//! oriented, so `V2fError` also wraps `std::io::Error`.

use std::fmt;
use std::io;

/// Discriminants match `v2f_error_t` in `v2f.h` exactly: `NONE = 0` through
/// `FEATURE_NOT_IMPLEMENTED = 8`. `None` is never constructed by this crate —
/// Rust signals success with `Result::Ok` — but the discriminant is reserved
/// at 0 so a C ABI consumer sees the same integer space as the original.
#[derive(Debug)]
#[repr(u8)]
pub enum V2fError {
    /// Reserved for ABI parity with `V2F_E_NONE`; never constructed.
    None = 0,
    /// A read ended at a sample boundary before the requested count.
    UnexpectedEndOfFile = 1,
    /// A read or write failed, or an EOF occurred misaligned to the element size.
    Io(io::Error) = 2,
    /// Forest-file or envelope-stream content violates an invariant.
    CorruptedData(String) = 3,
    /// Caller misuse: out-of-range value, mode/step mismatch, etc.
    InvalidParameter(String) = 4,
    /// Reserved bits were set where the format requires them to be zero.
    NonZeroReservedOrPadding = 5,
    /// Could not create a temporary file (fuzz harness / some test paths).
    UnableToCreateTemporaryFile = 6,
    /// Allocation failed.
    OutOfMemory = 7,
    /// The requested feature (e.g. a non-zero `forest_id`) is not implemented.
    FeatureNotImplemented = 8,
}

impl V2fError {
    /// Stable numeric code, matching `v2f_error_t` in the original header.
    pub fn code(&self) -> u8 {
        match self {
            V2fError::None => 0,
            V2fError::UnexpectedEndOfFile => 1,
            V2fError::Io(_) => 2,
            V2fError::CorruptedData(_) => 3,
            V2fError::InvalidParameter(_) => 4,
            V2fError::NonZeroReservedOrPadding => 5,
            V2fError::UnableToCreateTemporaryFile => 6,
            V2fError::OutOfMemory => 7,
            V2fError::FeatureNotImplemented => 8,
        }
    }
}

impl fmt::Display for V2fError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            V2fError::None => write!(f, "no error"),
            V2fError::UnexpectedEndOfFile => write!(f, "unexpected end of file"),
            V2fError::Io(e) => write!(f, "i/o error: {e}"),
            V2fError::CorruptedData(msg) => write!(f, "corrupted data: {msg}"),
            V2fError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            V2fError::NonZeroReservedOrPadding => write!(f, "reserved field is non-zero"),
            V2fError::UnableToCreateTemporaryFile => write!(f, "unable to create temporary file"),
            V2fError::OutOfMemory => write!(f, "out of memory"),
            V2fError::FeatureNotImplemented => write!(f, "feature not implemented"),
        }
    }
}

impl std::error::Error for V2fError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            V2fError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for V2fError {
    fn from(e: io::Error) -> Self {
        V2fError::Io(e)
    }
}

/// Result alias used throughout the codec, mirroring the teacher's pervasive
/// use of a crate-local `Result` alias in `src/block/*`.
pub type V2fResult<T> = Result<T, V2fError>;
