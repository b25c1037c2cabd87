//! Spatial decorrelation: the five prediction modes plus the bijective
//! signed-to-unsigned prediction-error map shared by all of them.
//!
//! The prediction-error map and the 1-D predictors (`Left`, `TwoLeftAvg`) are
//! grounded directly on `v2f_decorrelator.c`'s
//! `v2f_decorrelator_map_predicted_sample` / `v2f_decorrelator_unmap_sample`
//! and its `v2f_decorrelator_apply_left_prediction` /
//! `v2f_decorrelator_inverse_left_prediction` pair (the 2-left-average
//! functions mirror the same shape with one extra lookback variable).
//!
//! `JpegLs` and `Fgij` are **not** transcribed from that file: the retrieved
//! copy of `v2f_decorrelator.c` is the in-place variant spec.md §4.3 and §9
//! explicitly reject (it reads post-mapping values as neighbours, and it has
//! no `Fgij` mode at all). Both are written fresh here from spec.md §4.3's
//! prediction table, in the scratch-copy form spec.md mandates as canonical:
//! the encoder predicts every sample from an untouched copy of the input row
//! data, then overwrites the live buffer with mapped residuals. The decoder
//! does not need a scratch copy: raster-order reconstruction means every
//! neighbour referenced when reconstructing position `i` was already written
//! in a strictly earlier iteration, so in-place left-to-right, top-to-bottom
//! traversal satisfies "read neighbours after their reconstruction" for free.

use crate::error::{V2fError, V2fResult};

/// Corresponds to `v2f_decorrelator_mode_t` in `v2f.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorrelatorMode {
    None = 0,
    Left = 1,
    TwoLeftAvg = 2,
    JpegLs = 3,
    Fgij = 4,
}

impl DecorrelatorMode {
    pub fn from_u16(v: u16) -> V2fResult<Self> {
        match v {
            0 => Ok(DecorrelatorMode::None),
            1 => Ok(DecorrelatorMode::Left),
            2 => Ok(DecorrelatorMode::TwoLeftAvg),
            3 => Ok(DecorrelatorMode::JpegLs),
            4 => Ok(DecorrelatorMode::Fgij),
            other => Err(V2fError::InvalidParameter(format!(
                "unknown decorrelator mode {other}"
            ))),
        }
    }

    fn needs_row_geometry(self) -> bool {
        matches!(self, DecorrelatorMode::JpegLs | DecorrelatorMode::Fgij)
    }
}

/// Corresponds to `v2f_decorrelator_t` in `v2f.h`.
#[derive(Debug, Clone, Copy)]
pub struct Decorrelator {
    pub mode: DecorrelatorMode,
    pub max_sample_value: u32,
    pub samples_per_row: u32,
}

impl Decorrelator {
    pub fn new(mode: DecorrelatorMode, max_sample_value: u32, samples_per_row: u32) -> V2fResult<Self> {
        if mode.needs_row_geometry() && samples_per_row < 3 {
            return Err(V2fError::InvalidParameter(
                "JpegLs/Fgij require samples_per_row >= 3".into(),
            ));
        }
        Ok(Decorrelator { mode, max_sample_value, samples_per_row })
    }

    fn check_geometry(&self, sample_count: usize) -> V2fResult<()> {
        if self.mode.needs_row_geometry() && sample_count % self.samples_per_row as usize != 0 {
            return Err(V2fError::InvalidParameter(
                "sample_count must be a multiple of samples_per_row for JpegLs/Fgij".into(),
            ));
        }
        Ok(())
    }

    /// Replaces `samples` in place with prediction-error-mapped residuals.
    /// Equivalent to `v2f_decorrelator_decorrelate_block`.
    pub fn decorrelate_block(&self, samples: &mut [u32]) -> V2fResult<()> {
        if samples.is_empty() {
            return Err(V2fError::InvalidParameter("sample_count must be >= 1".into()));
        }
        self.check_geometry(samples.len())?;
        let m = self.max_sample_value;
        match self.mode {
            DecorrelatorMode::None => {}
            DecorrelatorMode::Left => {
                let mut prediction = 0u32;
                for s in samples.iter_mut() {
                    let original = *s;
                    *s = map_predicted_sample(original, prediction, m);
                    prediction = original;
                }
            }
            DecorrelatorMode::TwoLeftAvg => {
                let mut prev = 0u32;
                let mut prev_prev = 0u32;
                for (i, s) in samples.iter_mut().enumerate() {
                    let prediction = match i {
                        0 => 0,
                        1 => prev,
                        _ => (prev + prev_prev + 1) >> 1,
                    };
                    let original = *s;
                    *s = map_predicted_sample(original, prediction, m);
                    prev_prev = prev;
                    prev = original;
                }
            }
            DecorrelatorMode::JpegLs => {
                let original = samples.to_vec();
                let spr = self.samples_per_row as usize;
                for i in 0..samples.len() {
                    let prediction = jpeg_ls_prediction(&original, i, spr);
                    samples[i] = map_predicted_sample(original[i], prediction, m);
                }
            }
            DecorrelatorMode::Fgij => {
                let original = samples.to_vec();
                let spr = self.samples_per_row as usize;
                for i in 0..samples.len() {
                    let prediction = fgij_prediction(&original, i, spr);
                    samples[i] = map_predicted_sample(original[i], prediction, m);
                }
            }
        }
        Ok(())
    }

    /// Reconstructs original samples from prediction-error-mapped residuals,
    /// in place. Equivalent to `v2f_decorrelator_invert_block`.
    pub fn invert_block(&self, samples: &mut [u32]) -> V2fResult<()> {
        if samples.is_empty() {
            return Err(V2fError::InvalidParameter("sample_count must be >= 1".into()));
        }
        self.check_geometry(samples.len())?;
        let m = self.max_sample_value;
        match self.mode {
            DecorrelatorMode::None => {}
            DecorrelatorMode::Left => {
                let mut prediction = 0u32;
                for s in samples.iter_mut() {
                    let reconstructed = unmap_sample(*s, prediction, m)?;
                    *s = reconstructed;
                    prediction = reconstructed;
                }
            }
            DecorrelatorMode::TwoLeftAvg => {
                let mut prev = 0u32;
                let mut prev_prev = 0u32;
                for i in 0..samples.len() {
                    let prediction = match i {
                        0 => 0,
                        1 => prev,
                        _ => (prev + prev_prev + 1) >> 1,
                    };
                    let reconstructed = unmap_sample(samples[i], prediction, m)?;
                    samples[i] = reconstructed;
                    prev_prev = prev;
                    prev = reconstructed;
                }
            }
            DecorrelatorMode::JpegLs => {
                let spr = self.samples_per_row as usize;
                for i in 0..samples.len() {
                    let prediction = jpeg_ls_prediction(samples, i, spr);
                    samples[i] = unmap_sample(samples[i], prediction, m)?;
                }
            }
            DecorrelatorMode::Fgij => {
                let spr = self.samples_per_row as usize;
                for i in 0..samples.len() {
                    let prediction = fgij_prediction(samples, i, spr);
                    samples[i] = unmap_sample(samples[i], prediction, m)?;
                }
            }
        }
        for s in samples.iter() {
            if *s > m {
                return Err(V2fError::CorruptedData(format!(
                    "reconstructed sample {s} exceeds max_sample_value {m}"
                )));
            }
        }
        Ok(())
    }
}

fn jpeg_ls_prediction(neighbours: &[u32], i: usize, spr: usize) -> u32 {
    let row = i / spr;
    let col = i % spr;
    if row == 0 {
        if col == 0 {
            0
        } else {
            neighbours[i - 1] // west
        }
    } else if col == 0 {
        neighbours[i - spr] // north
    } else {
        let w = neighbours[i - 1];
        let n = neighbours[i - spr];
        let nw = neighbours[i - spr - 1];
        if nw >= w.max(n) {
            w.min(n)
        } else if nw <= w.min(n) {
            w.max(n)
        } else {
            w + n - nw
        }
    }
}

fn fgij_prediction(neighbours: &[u32], i: usize, spr: usize) -> u32 {
    let row = i / spr;
    let col = i % spr;
    if row == 0 {
        match col {
            0 => 0,
            1 => neighbours[i - 1],
            _ => (neighbours[i - 1] + neighbours[i - 2]) >> 1,
        }
    } else {
        match col {
            0 => neighbours[i - spr], // north
            1 => {
                let n = neighbours[i - spr];
                let w = neighbours[i - 1];
                let nw = neighbours[i - spr - 1];
                (nw + n + w) / 3
            }
            _ => {
                let w = neighbours[i - 1];
                let ww = neighbours[i - 2];
                let n = neighbours[i - spr];
                let nw = neighbours[i - spr - 1];
                (w + ww + n + nw) >> 2
            }
        }
    }
}

/// Equivalent to `v2f_decorrelator_map_predicted_sample`. Bijective on
/// `[0, max_sample_value]` for a fixed `prediction`.
pub fn map_predicted_sample(sample: u32, prediction: u32, max_sample_value: u32) -> u32 {
    let diff = sample as i64 - prediction as i64;
    let theta = prediction.min(max_sample_value - prediction);
    let abs_value = diff.unsigned_abs() as u32;
    if abs_value <= theta {
        let negative = diff < 0;
        (abs_value << 1) - negative as u32
    } else {
        theta + abs_value
    }
}

/// Equivalent to `v2f_decorrelator_unmap_sample`. Inverts
/// [`map_predicted_sample`] for the same `prediction`.
pub fn unmap_sample(coded_value: u32, prediction: u32, max_sample_value: u32) -> V2fResult<u32> {
    let theta = prediction.min(max_sample_value - prediction);
    let prediction_error: i64 = if coded_value <= theta << 1 {
        if coded_value % 2 == 0 {
            (coded_value >> 1) as i64
        } else {
            -(((coded_value as i64) + 1) >> 1)
        }
    } else if theta == prediction {
        coded_value as i64 - theta as i64
    } else {
        theta as i64 - coded_value as i64
    };
    let reconstructed = prediction as i64 + prediction_error;
    if reconstructed < 0 || reconstructed > max_sample_value as i64 {
        return Err(V2fError::CorruptedData(format!(
            "unmapped sample {reconstructed} out of range [0, {max_sample_value}]"
        )));
    }
    Ok(reconstructed as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_unmap_is_identity_for_all_predictions() {
        let m = 255u32;
        for p in 0..=m {
            for s in 0..=m {
                let coded = map_predicted_sample(s, p, m);
                let back = unmap_sample(coded, p, m).unwrap();
                assert_eq!(back, s, "s={s} p={p} coded={coded}");
            }
        }
    }

    #[test]
    fn left_decorrelation_constant_zero() {
        let d = Decorrelator::new(DecorrelatorMode::Left, 255, 5).unwrap();
        let mut samples = [0u32; 5];
        d.decorrelate_block(&mut samples).unwrap();
        assert_eq!(samples, [0, 0, 0, 0, 0]);
    }

    #[test]
    fn left_decorrelation_constant_five() {
        let d = Decorrelator::new(DecorrelatorMode::Left, 255, 4).unwrap();
        let mut samples = [5u32, 5, 5, 5];
        d.decorrelate_block(&mut samples).unwrap();
        assert_eq!(samples, [10, 0, 0, 0]);
    }

    #[test]
    fn jpeg_ls_linear_ramp_is_exact_at_interior() {
        let d = Decorrelator::new(DecorrelatorMode::JpegLs, 255, 3).unwrap();
        let mut samples = [10u32, 20, 30, 40, 50, 60, 70, 80, 90];
        d.decorrelate_block(&mut samples).unwrap();
        // Bottom-right 2x2 block: predictions are exact on a linear ramp.
        assert_eq!(samples[4], 0); // (1,1)
        assert_eq!(samples[5], 0); // (1,2)
        assert_eq!(samples[7], 0); // (2,1)
        assert_eq!(samples[8], 0); // (2,2)
    }

    #[test]
    fn round_trip_all_modes() {
        let m = 255u32;
        let spr = 4u32;
        let original: Vec<u32> = (0..16).map(|i| ((i * 37 + 11) % 256) as u32).collect();
        for mode in [
            DecorrelatorMode::None,
            DecorrelatorMode::Left,
            DecorrelatorMode::TwoLeftAvg,
            DecorrelatorMode::JpegLs,
            DecorrelatorMode::Fgij,
        ] {
            let d = Decorrelator::new(mode, m, spr).unwrap();
            let mut buf = original.clone();
            d.decorrelate_block(&mut buf).unwrap();
            d.invert_block(&mut buf).unwrap();
            assert_eq!(buf, original, "mode {mode:?} failed to round-trip");
        }
    }
}
