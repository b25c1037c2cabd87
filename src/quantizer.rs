//! Uniform scalar quantizer.
//!
//! Grounded on `v2f_quantizer.c` (`v2f_quantizer_create`, `v2f_quantizer_quantize`,
//! `v2f_quantizer_dequantize`, `v2f_quantizer_apply_uniform_division`,
//! `v2f_quantize_apply_uniform_shift`, `v2f_quantizer_inverse_uniform`), kept
//! in the teacher's dispatch-by-enum style (`src/block/types.rs`'s
//! `TableType`/`From<u32>` pattern) rather than function pointers.

use crate::config;
use crate::error::{V2fError, V2fResult};

/// Corresponds to `v2f_quantizer_mode_t` in `v2f.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizerMode {
    None = 0,
    Uniform = 1,
}

impl QuantizerMode {
    pub fn from_u8(v: u8) -> V2fResult<Self> {
        match v {
            0 => Ok(QuantizerMode::None),
            1 => Ok(QuantizerMode::Uniform),
            other => Err(V2fError::InvalidParameter(format!(
                "unknown quantizer mode {other}"
            ))),
        }
    }
}

/// Corresponds to `v2f_quantizer_t` in `v2f.h`.
#[derive(Debug, Clone, Copy)]
pub struct Quantizer {
    pub mode: QuantizerMode,
    pub step_size: u32,
    pub max_sample_value: u32,
}

impl Quantizer {
    /// Equivalent to `v2f_quantizer_create`.
    pub fn new(mode: QuantizerMode, step_size: u32, max_sample_value: u32) -> V2fResult<Self> {
        if mode == QuantizerMode::None && step_size != 1 {
            return Err(V2fError::InvalidParameter(
                "step_size must be 1 when mode is None".into(),
            ));
        }
        if step_size == 0 {
            return Err(V2fError::InvalidParameter("step_size must be >= 1".into()));
        }
        if step_size > config::STEP_SIZE_MAX as u32 {
            return Err(V2fError::InvalidParameter(format!(
                "step_size must be <= {}",
                config::STEP_SIZE_MAX
            )));
        }
        Ok(Quantizer { mode, step_size, max_sample_value })
    }

    /// Equivalent to `v2f_quantizer_quantize`. Divides each sample by
    /// `step_size` in place; power-of-two step sizes use a shift.
    pub fn quantize(&self, samples: &mut [u32]) -> V2fResult<()> {
        match self.mode {
            QuantizerMode::None => Ok(()),
            QuantizerMode::Uniform => {
                match self.step_size {
                    2 => apply_uniform_shift(samples, 1),
                    4 => apply_uniform_shift(samples, 2),
                    8 => apply_uniform_shift(samples, 3),
                    step => apply_uniform_division(samples, step),
                }
                Ok(())
            }
        }
    }

    /// Equivalent to `v2f_quantizer_dequantize` /
    /// `v2f_quantizer_inverse_uniform`. For each quantization index `q`,
    /// reconstructs `min(q*step + step/2, max_sample_value)`; the clamp is
    /// required because the last bin may be truncated by the dynamic range.
    pub fn dequantize(&self, samples: &mut [u32]) -> V2fResult<()> {
        match self.mode {
            QuantizerMode::None => Ok(()),
            QuantizerMode::Uniform => {
                let half = self.step_size / 2;
                for s in samples.iter_mut() {
                    let reconstructed = *s * self.step_size + half;
                    *s = reconstructed.min(self.max_sample_value);
                }
                Ok(())
            }
        }
    }
}

fn apply_uniform_shift(samples: &mut [u32], shift: u32) {
    for s in samples.iter_mut() {
        *s >>= shift;
    }
}

fn apply_uniform_division(samples: &mut [u32], step: u32) {
    for s in samples.iter_mut() {
        *s /= step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_mode_requires_step_one() {
        assert!(Quantizer::new(QuantizerMode::None, 2, 255).is_err());
        assert!(Quantizer::new(QuantizerMode::None, 1, 255).is_ok());
    }

    #[test]
    fn step_size_rejects_out_of_range() {
        assert!(Quantizer::new(QuantizerMode::Uniform, 255, 255).is_ok());
        assert!(Quantizer::new(QuantizerMode::Uniform, 256, 255).is_err());
    }

    #[test]
    fn uniform_shift_matches_division() {
        let q_shift = Quantizer::new(QuantizerMode::Uniform, 4, 255).unwrap();
        let q_div = Quantizer::new(QuantizerMode::Uniform, 3, 255).unwrap();
        let mut a = [17u32, 100, 255];
        let mut b = [17u32, 100, 255];
        q_shift.quantize(&mut a).unwrap();
        q_div.quantize(&mut b).unwrap();
        assert_eq!(a, [4, 25, 63]);
        assert_eq!(b, [5, 33, 85]);
    }

    #[test]
    fn dequantize_clamps_last_bin() {
        let q = Quantizer::new(QuantizerMode::Uniform, 100, 250).unwrap();
        let mut s = [2u32]; // 2*100 + 50 = 250, within range
        q.dequantize(&mut s).unwrap();
        assert_eq!(s[0], 250);

        let q2 = Quantizer::new(QuantizerMode::Uniform, 100, 200).unwrap();
        let mut s2 = [2u32]; // 2*100 + 50 = 250, clamps to 200
        q2.dequantize(&mut s2).unwrap();
        assert_eq!(s2[0], 200);
    }

    #[test]
    fn quantize_dequantize_idempotent_when_step_one() {
        let q = Quantizer::new(QuantizerMode::Uniform, 1, 255).unwrap();
        let mut s = [0u32, 1, 254, 255];
        let orig = s;
        q.quantize(&mut s).unwrap();
        assert_eq!(s, orig);
    }
}
