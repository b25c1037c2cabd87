//! Block envelope framing and the compress/decompress stream drivers, per
//! spec.md §4.7. Grounded on the block-loop shape of the teacher's
//! `frame::compress`/`frame::decompress` drivers (read-a-chunk,
//! process, frame, write, repeat until EOF) generalised from LZ4's frame
//! format to V2F's three-field envelope.

use std::io::{Read, Write};

use crate::config;
use crate::decorrelator::{Decorrelator, DecorrelatorMode};
use crate::entropy::{self, persist, Forest};
use crate::error::{V2fError, V2fResult};
use crate::quantizer::{Quantizer, QuantizerMode};
use crate::sample_io;
use crate::timefn::{timed, Stage, TimingSink};

/// One-shot parameter overrides applied on top of whatever a header
/// specifies, mirroring the CLI's `-q`/`-s`/`-d`/`-w` flags (spec.md §6).
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub quantizer_mode: Option<QuantizerMode>,
    pub step_size: Option<u8>,
    pub decorrelator_mode: Option<DecorrelatorMode>,
    pub samples_per_row: Option<u32>,
}

/// The resolved (header defaults + overrides) parameter set for one stream.
/// Crate-visible so [`crate::io`]'s multithreaded driver can build it once
/// and share it (read-only) across a rayon batch.
#[derive(Debug)]
pub(crate) struct Pipeline {
    quantizer: Quantizer,
    decorrelator_mode: DecorrelatorMode,
    decorrelator_max_sample_value: u32,
    samples_per_row_override: Option<u32>,
    pub(crate) forest: Forest,
}

pub(crate) fn build_pipeline(header: &mut impl Read, overrides: &Overrides) -> V2fResult<Pipeline> {
    let codec_header = persist::read_codec_header(header)?;

    let quantizer_mode = overrides.quantizer_mode.unwrap_or(codec_header.quantizer.mode);
    let step_size = overrides
        .step_size
        .map(|s| s as u32)
        .unwrap_or(codec_header.quantizer.step_size);
    let quantizer = Quantizer::new(quantizer_mode, step_size, codec_header.quantizer.max_sample_value)?;

    let decorrelator_mode = overrides.decorrelator_mode.unwrap_or(codec_header.decorrelator_mode);

    if matches!(decorrelator_mode, DecorrelatorMode::JpegLs | DecorrelatorMode::Fgij)
        && overrides.samples_per_row.is_none()
    {
        return Err(V2fError::InvalidParameter(format!(
            "-w/samples_per_row is required when decorrelator mode is {decorrelator_mode:?}"
        )));
    }

    Ok(Pipeline {
        quantizer,
        decorrelator_mode,
        decorrelator_max_sample_value: codec_header.decorrelator_max_sample_value,
        samples_per_row_override: overrides.samples_per_row,
        forest: codec_header.forest,
    })
}

impl Pipeline {
    fn decorrelator(&self, block_sample_count: usize) -> V2fResult<Decorrelator> {
        let samples_per_row = self.samples_per_row_override.unwrap_or(block_sample_count as u32);
        Decorrelator::new(self.decorrelator_mode, self.decorrelator_max_sample_value, samples_per_row)
    }
}

/// Runs the quantize → decorrelate → entropy-code pipeline over one block of
/// already-read samples, producing one envelope's payload. Pulled out of
/// [`compress`]'s loop body so [`crate::io`]'s multithreaded driver can run
/// it per-block inside a `rayon` batch without duplicating the pipeline
/// logic (the single-threaded loop above stays the reference path; this is
/// the same three calls with the per-block timing hooks dropped, since a
/// shared `TimingSink` cannot be driven from multiple threads at once).
pub(crate) fn compress_one_block(pipeline: &Pipeline, mut samples: Vec<u32>) -> V2fResult<(Vec<u8>, u32)> {
    pipeline.quantizer.quantize(&mut samples)?;
    let decorrelator = pipeline.decorrelator(samples.len())?;
    decorrelator.decorrelate_block(&mut samples)?;
    let mut compressed = Vec::new();
    entropy::compress_block(&pipeline.forest, &samples, &mut compressed)?;
    Ok((compressed, samples.len() as u32))
}

/// Inverse of [`compress_one_block`]: entropy-decode, undo decorrelation,
/// dequantize. Returns the recovered raw samples for one block.
pub(crate) fn decompress_one_block(pipeline: &Pipeline, envelope: &Envelope) -> V2fResult<Vec<u32>> {
    let mut samples = Vec::with_capacity(envelope.sample_count as usize);
    entropy::decompress_block(
        &pipeline.forest,
        &envelope.compressed_bitstream,
        envelope.sample_count as usize,
        &mut samples,
    )?;
    if samples.len() != envelope.sample_count as usize {
        return Err(V2fError::CorruptedData(format!(
            "decoder produced {} samples, envelope declared {}",
            samples.len(),
            envelope.sample_count
        )));
    }
    let decorrelator = pipeline.decorrelator(samples.len())?;
    decorrelator.invert_block(&mut samples)?;
    pipeline.quantizer.dequantize(&mut samples)?;
    Ok(samples)
}

/// Compresses `raw` (a stream of `bytes_per_sample`-wide big-endian samples)
/// into a sequence of envelopes written to `out`, using the quantizer /
/// decorrelator / forest described by `header`. Equivalent to the
/// compress-side file driver of spec.md §6.
pub fn compress(
    raw: &mut impl Read,
    header: &mut impl Read,
    out: &mut impl Write,
    overrides: &Overrides,
    mut timing: Option<&mut TimingSink>,
) -> V2fResult<()> {
    let pipeline = build_pipeline(header, overrides)?;
    let bytes_per_sample = pipeline.forest.bytes_per_sample;
    let max_block_samples = config::MAX_BLOCK_SIZE as usize;

    let mut block = vec![0u32; max_block_samples];
    loop {
        let read_count = match sample_io::read_samples(raw, &mut block, bytes_per_sample) {
            Ok(n) => n,
            Err(V2fError::UnexpectedEndOfFile) => 0,
            Err(e) => return Err(e),
        };
        if read_count == 0 {
            break;
        }

        let mut samples = block[..read_count].to_vec();

        timed(timing.as_deref_mut(), Stage::Quantize, || pipeline.quantizer.quantize(&mut samples))
            .map_err(V2fError::Io)??;

        let decorrelator = pipeline.decorrelator(samples.len())?;
        timed(timing.as_deref_mut(), Stage::Decorrelate, || decorrelator.decorrelate_block(&mut samples))
            .map_err(V2fError::Io)??;

        let mut compressed = Vec::new();
        timed(timing.as_deref_mut(), Stage::EntropyCode, || {
            entropy::compress_block(&pipeline.forest, &samples, &mut compressed)
        })
        .map_err(V2fError::Io)??;

        write_envelope(out, &compressed, samples.len() as u32)?;
        if let Some(sink) = timing.as_deref_mut() {
            sink.next_block();
        }

        if read_count < max_block_samples {
            break;
        }
    }

    Ok(())
}

/// Decompresses envelopes read from `compressed` into raw
/// `bytes_per_sample`-wide big-endian samples written to `out`. Equivalent
/// to the decompress-side file driver of spec.md §6.
pub fn decompress(
    compressed: &mut impl Read,
    header: &mut impl Read,
    out: &mut impl Write,
    overrides: &Overrides,
    mut timing: Option<&mut TimingSink>,
) -> V2fResult<()> {
    let pipeline = build_pipeline(header, overrides)?;
    let bytes_per_sample = pipeline.forest.bytes_per_sample;
    let bytes_per_word = pipeline.forest.bytes_per_word;

    loop {
        let envelope = match read_envelope(compressed, bytes_per_word)? {
            Some(e) => e,
            None => break,
        };

        let mut samples = Vec::with_capacity(envelope.sample_count as usize);
        timed(timing.as_deref_mut(), Stage::EntropyCode, || {
            entropy::decompress_block(
                &pipeline.forest,
                &envelope.compressed_bitstream,
                envelope.sample_count as usize,
                &mut samples,
            )
        })
        .map_err(V2fError::Io)??;

        if samples.len() != envelope.sample_count as usize {
            return Err(V2fError::CorruptedData(format!(
                "decoder produced {} samples, envelope declared {}",
                samples.len(),
                envelope.sample_count
            )));
        }

        let decorrelator = pipeline.decorrelator(samples.len())?;
        timed(timing.as_deref_mut(), Stage::Decorrelate, || decorrelator.invert_block(&mut samples))
            .map_err(V2fError::Io)??;

        timed(timing.as_deref_mut(), Stage::Quantize, || pipeline.quantizer.dequantize(&mut samples))
            .map_err(V2fError::Io)??;

        sample_io::write_samples(out, &samples, bytes_per_sample)?;
        if let Some(sink) = timing.as_deref_mut() {
            sink.next_block();
        }
    }

    Ok(())
}

pub(crate) struct Envelope {
    pub(crate) sample_count: u32,
    pub(crate) compressed_bitstream: Vec<u8>,
}

pub(crate) fn write_envelope(w: &mut impl Write, compressed: &[u8], sample_count: u32) -> V2fResult<()> {
    let size = compressed.len() as u32;
    w.write_all(&size.to_be_bytes()).map_err(V2fError::Io)?;
    w.write_all(&sample_count.to_be_bytes()).map_err(V2fError::Io)?;
    w.write_all(compressed).map_err(V2fError::Io)?;
    Ok(())
}

/// Reads one envelope, or `None` at a clean end-of-stream (zero bytes read
/// exactly at an envelope boundary). Any other truncation is
/// [`V2fError::CorruptedData`].
pub(crate) fn read_envelope(r: &mut impl Read, bytes_per_word: u8) -> V2fResult<Option<Envelope>> {
    let mut size_buf = [0u8; 4];
    let n = read_some(r, &mut size_buf)?;
    if n == 0 {
        return Ok(None);
    }
    if n != 4 {
        return Err(V2fError::CorruptedData("truncated envelope size field".into()));
    }
    let compressed_bitstream_size = u32::from_be_bytes(size_buf);

    let mut count_buf = [0u8; 4];
    r.read_exact(&mut count_buf).map_err(|_| {
        V2fError::CorruptedData("truncated envelope sample_count field".into())
    })?;
    let sample_count = u32::from_be_bytes(count_buf);

    if compressed_bitstream_size == 0 || compressed_bitstream_size % bytes_per_word as u32 != 0 {
        return Err(V2fError::CorruptedData(format!(
            "compressed_bitstream_size {compressed_bitstream_size} must be nonzero and a multiple of bytes_per_word {bytes_per_word}"
        )));
    }
    if compressed_bitstream_size > config::MAX_BLOCK_SIZE * bytes_per_word as u32 {
        return Err(V2fError::CorruptedData(format!(
            "compressed_bitstream_size {compressed_bitstream_size} exceeds max_block_size * bytes_per_word"
        )));
    }
    if sample_count == 0 || sample_count > config::MAX_BLOCK_SIZE {
        return Err(V2fError::CorruptedData(format!(
            "sample_count {sample_count} out of range [1, {}]",
            config::MAX_BLOCK_SIZE
        )));
    }

    let mut compressed_bitstream = vec![0u8; compressed_bitstream_size as usize];
    r.read_exact(&mut compressed_bitstream).map_err(|_| {
        V2fError::CorruptedData("truncated envelope bitstream".into())
    })?;

    Ok(Some(Envelope { sample_count, compressed_bitstream }))
}

fn read_some(r: &mut impl Read, buf: &mut [u8]) -> V2fResult<usize> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::forest::{CoderEntry, DecoderEntry, DecoderRootTable, NodeId};
    use std::io::Cursor;
    use std::sync::Arc;

    fn minimal_256_forest_header() -> Vec<u8> {
        let full_children_count = 256u32;
        let mut coder_entries = Vec::with_capacity(256);
        let mut decoder_entries = Vec::with_capacity(256);
        let mut entries_by_word = vec![NodeId(u32::MAX); 256];
        for i in 0u32..256 {
            coder_entries.push(CoderEntry {
                word_bytes: Some(Box::new([i as u8])),
                children: Box::new([]),
                children_count: 0,
            });
            decoder_entries.push(DecoderEntry { samples: Box::new([i]), children_count: 0 });
            entries_by_word[i as usize] = NodeId(i);
        }
        let mut root_children = vec![NodeId(u32::MAX); 256];
        for i in 0u32..256 {
            root_children[i as usize] = NodeId(i);
        }
        let root_coder = vec![CoderEntry {
            word_bytes: None,
            children: root_children.into_boxed_slice(),
            children_count: full_children_count,
        }];
        let root_decoder = vec![DecoderRootTable {
            root_included_count: 256,
            entries_by_word: Arc::from(entries_by_word.into_boxed_slice()),
        }];
        let forest = Forest::new(
            1,
            1,
            255,
            256,
            coder_entries,
            decoder_entries,
            root_coder,
            root_decoder,
            vec![0u32; 256],
            vec![(0, 256)],
        );
        let quantizer = Quantizer::new(QuantizerMode::None, 1, 255).unwrap();
        let mut buf = Vec::new();
        persist::write_codec_header(&mut buf, &quantizer, DecorrelatorMode::None, 255, &forest).unwrap();
        buf
    }

    /// Scenario 5 from spec.md §8: round-trip 1024 uniformly random bytes
    /// with `quantizer=None`, `decorrelator=None`, the 8-bit minimal forest.
    #[test]
    fn envelope_round_trips_random_bytes() {
        let header_bytes = minimal_256_forest_header();
        let raw: Vec<u8> = (0..1024u32).map(|i| ((i.wrapping_mul(2654435761)) % 256) as u8).collect();

        let mut compressed = Vec::new();
        compress(
            &mut Cursor::new(raw.clone()),
            &mut Cursor::new(header_bytes.clone()),
            &mut compressed,
            &Overrides::default(),
            None,
        )
        .unwrap();

        let mut decompressed = Vec::new();
        decompress(
            &mut Cursor::new(compressed),
            &mut Cursor::new(header_bytes),
            &mut decompressed,
            &Overrides::default(),
            None,
        )
        .unwrap();

        assert_eq!(decompressed, raw);
    }

    /// Scenario 6 from spec.md §8: a malformed envelope size must be
    /// rejected without consuming further bytes in a way that panics or
    /// reads out of bounds.
    #[test]
    fn malformed_envelope_size_is_corrupted_data() {
        let header_bytes = minimal_256_forest_header();
        // compressed_bitstream_size = 0 violates "> 0".
        let mut bogus = Vec::new();
        bogus.extend_from_slice(&0u32.to_be_bytes());
        bogus.extend_from_slice(&1u32.to_be_bytes());

        let mut decompressed = Vec::new();
        let err = decompress(
            &mut Cursor::new(bogus),
            &mut Cursor::new(header_bytes),
            &mut decompressed,
            &Overrides::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, V2fError::CorruptedData(_)));
    }

    /// spec.md §6: `-w`/`samples_per_row` is required for the row-based
    /// decorrelator modes and must be rejected, not silently defaulted to
    /// the whole block, when omitted.
    #[test]
    fn jpeg_ls_without_samples_per_row_is_rejected() {
        let header_bytes = minimal_256_forest_header();
        let overrides = Overrides { decorrelator_mode: Some(DecorrelatorMode::JpegLs), ..Default::default() };
        let err = build_pipeline(&mut Cursor::new(header_bytes), &overrides).unwrap_err();
        assert!(matches!(err, V2fError::InvalidParameter(_)));
    }

    #[test]
    fn jpeg_ls_with_samples_per_row_is_accepted() {
        let header_bytes = minimal_256_forest_header();
        let overrides = Overrides {
            decorrelator_mode: Some(DecorrelatorMode::JpegLs),
            samples_per_row: Some(16),
            ..Default::default()
        };
        assert!(build_pipeline(&mut Cursor::new(header_bytes), &overrides).is_ok());
    }
}
