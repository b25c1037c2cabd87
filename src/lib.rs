//! V2F — a three-stage (quantize, decorrelate, entropy-code) lossless/
//! near-lossless codec for 2D integer sample arrays, centered on the
//! variable-to-fixed (V2F) entropy coder. See `SPEC_FULL.md` for the full
//! design; `src/envelope.rs` is the top-level pipeline driver.

pub mod cli;
pub mod config;
pub mod decorrelator;
pub mod entropy;
pub mod envelope;
pub mod error;
pub mod quantizer;
pub mod sample_io;
pub mod timefn;

#[cfg(feature = "multithread")]
pub mod io;

pub use envelope::{compress, decompress, Overrides};
pub use error::{V2fError, V2fResult};
