//! Optional coarse-grained parallel file driver (spec.md §5's "blocks are
//! independent and parallelizable"), gated behind the `multithread` feature.
//!
//! Grounded on the teacher's `io::compress_mt::compress_filename_mt`: reads
//! are sequential (one thread can drive a `Read`), a bounded batch of blocks
//! is processed concurrently via `rayon`, and results are written in
//! arrival-index order so the stream stays byte-identical to the
//! single-threaded driver in `src/envelope.rs`. Unlike the teacher's
//! `WriteRegister` (a `BTreeMap` draining out-of-order completions), a batch
//! here is collected with `into_par_iter().map(..).collect()`, which already
//! preserves input order — no explicit reordering buffer is needed.

use std::io::{Read, Write};

use rayon::prelude::*;

use crate::config;
use crate::envelope::{self, Envelope, Overrides};
use crate::error::{V2fError, V2fResult};
use crate::sample_io;

/// Number of blocks processed per `rayon` batch when no explicit worker
/// count is given.
const DEFAULT_BATCH_SIZE: usize = 8;

/// Multithreaded counterpart to [`crate::envelope::compress`]. Reads raw
/// samples, quantizes/decorrelates/entropy-codes a batch of blocks in
/// parallel, and writes envelopes to `out` in the same order the
/// single-threaded driver would.
pub fn compress_mt(
    raw: &mut impl Read,
    header: &mut impl Read,
    out: &mut impl Write,
    overrides: &Overrides,
    nb_workers: usize,
) -> V2fResult<()> {
    let pipeline = envelope::build_pipeline(header, overrides)?;
    let bytes_per_sample = pipeline.forest.bytes_per_sample;
    let max_block_samples = config::MAX_BLOCK_SIZE as usize;
    let batch_size = if nb_workers == 0 { DEFAULT_BATCH_SIZE } else { nb_workers };

    loop {
        let mut batch: Vec<Vec<u32>> = Vec::with_capacity(batch_size);
        let mut reached_eof = false;

        while batch.len() < batch_size {
            let mut block = vec![0u32; max_block_samples];
            let read_count = match sample_io::read_samples(raw, &mut block, bytes_per_sample) {
                Ok(n) => n,
                Err(V2fError::UnexpectedEndOfFile) => 0,
                Err(e) => return Err(e),
            };
            if read_count == 0 {
                reached_eof = true;
                break;
            }
            block.truncate(read_count);
            let short = read_count < max_block_samples;
            batch.push(block);
            if short {
                reached_eof = true;
                break;
            }
        }

        if batch.is_empty() {
            break;
        }

        let results: Vec<V2fResult<(Vec<u8>, u32)>> = batch
            .into_par_iter()
            .map(|samples| envelope::compress_one_block(&pipeline, samples))
            .collect();

        for result in results {
            let (compressed, sample_count) = result?;
            envelope::write_envelope(out, &compressed, sample_count)?;
        }

        if reached_eof {
            break;
        }
    }

    Ok(())
}

/// Multithreaded counterpart to [`crate::envelope::decompress`].
pub fn decompress_mt(
    compressed: &mut impl Read,
    header: &mut impl Read,
    out: &mut impl Write,
    overrides: &Overrides,
    nb_workers: usize,
) -> V2fResult<()> {
    let pipeline = envelope::build_pipeline(header, overrides)?;
    let bytes_per_sample = pipeline.forest.bytes_per_sample;
    let bytes_per_word = pipeline.forest.bytes_per_word;
    let batch_size = if nb_workers == 0 { DEFAULT_BATCH_SIZE } else { nb_workers };

    loop {
        let mut batch: Vec<Envelope> = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            match envelope::read_envelope(compressed, bytes_per_word)? {
                Some(e) => batch.push(e),
                None => break,
            }
        }

        if batch.is_empty() {
            break;
        }

        let reached_eof = batch.len() < batch_size;

        let results: Vec<V2fResult<Vec<u32>>> = batch
            .into_par_iter()
            .map(|envelope| envelope::decompress_one_block(&pipeline, &envelope))
            .collect();

        for result in results {
            let samples = result?;
            sample_io::write_samples(out, &samples, bytes_per_sample)?;
        }

        if reached_eof {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorrelator::DecorrelatorMode;
    use crate::entropy::forest::{CoderEntry, DecoderEntry, DecoderRootTable, Forest, NodeId};
    use crate::entropy::persist;
    use crate::quantizer::{Quantizer, QuantizerMode};
    use std::io::Cursor;
    use std::sync::Arc;

    /// A 256-entry, 1-byte-word forest where every symbol is included at the
    /// root; word = symbol as a single byte. Mirrors the helper used in
    /// `entropy::persist`'s own tests.
    fn minimal_256_forest() -> Forest {
        let mut coder_entries = Vec::with_capacity(256);
        let mut decoder_entries = Vec::with_capacity(256);
        let mut root_children = Vec::with_capacity(256);
        let mut entries_by_word = vec![NodeId(0); 256];

        for symbol in 0u32..256 {
            let id = NodeId(symbol);
            coder_entries.push(CoderEntry {
                word_bytes: Some(Box::new([symbol as u8])),
                children: Box::new([]),
                children_count: 0,
            });
            decoder_entries.push(DecoderEntry {
                samples: Box::new([symbol]),
                children_count: 0,
            });
            root_children.push(id);
            entries_by_word[symbol as usize] = id;
        }

        let root_coder_entry = CoderEntry {
            word_bytes: None,
            children: root_children.into_boxed_slice(),
            children_count: 256,
        };
        let root_decoder = DecoderRootTable {
            root_included_count: 256,
            entries_by_word: Arc::from(entries_by_word),
        };

        Forest::new(
            1,
            1,
            255,
            256,
            coder_entries,
            decoder_entries,
            vec![root_coder_entry],
            vec![root_decoder],
            vec![0u32; 256],
            vec![(0, 256)],
        )
    }

    fn header_bytes() -> Vec<u8> {
        let quantizer = Quantizer::new(QuantizerMode::None, 1, 255).unwrap();
        let mut buf = Vec::new();
        persist::write_codec_header(&mut buf, &quantizer, DecorrelatorMode::None, 255, &minimal_256_forest())
            .unwrap();
        buf
    }

    #[test]
    fn mt_round_trip_matches_single_threaded() {
        let raw: Vec<u8> = (0u8..=255).cycle().take(20_000).collect();

        let mut compressed_mt = Vec::new();
        compress_mt(
            &mut Cursor::new(raw.clone()),
            &mut Cursor::new(header_bytes()),
            &mut compressed_mt,
            &Overrides::default(),
            4,
        )
        .unwrap();

        let mut decompressed = Vec::new();
        decompress_mt(
            &mut Cursor::new(compressed_mt),
            &mut Cursor::new(header_bytes()),
            &mut decompressed,
            &Overrides::default(),
            4,
        )
        .unwrap();

        assert_eq!(decompressed, raw);
    }
}
