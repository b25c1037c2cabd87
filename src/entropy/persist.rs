//! On-disk V2F forest format: header, quantizer/decorrelator parameters,
//! per-root entry runs and root child tables, per spec.md §4.6.
//!
//! Grounded on `v2f_file_write_codec` / `v2f_file_read_codec` and
//! `v2f_file_write_forest` / `v2f_file_read_forest` in `v2f_file.c`. Two
//! deliberate departures from that source, both decided in favour of
//! spec.md's stated contract where the two disagree:
//!
//! - **Single forward-pass load.** The original patches raw indices into
//!   pointer fields in a second pass after every entry is allocated. Because
//!   indices are assigned in strictly ascending order and a [`NodeId`] is
//!   just an integer, nothing stops a child link from naming a `NodeId`
//!   before its target entry has been read — the arena is filled in one
//!   pass.
//! - **Child indices are uniformly global.** Both a regular entry's
//!   `children` and a root's `(entry_index, input_symbol)` table store
//!   indices into the *same* global arena, bounded by `total_entry_count`,
//!   exactly as spec.md's validation list states. (The C prototype's own
//!   bounds check on this path is not fully consistent between the two
//!   index families; spec.md is explicit, so spec.md's simpler rule wins.)

use std::io::{Read, Write};
use std::sync::Arc;

use crate::config;
use crate::decorrelator::DecorrelatorMode;
use crate::entropy::forest::{CoderEntry, DecoderEntry, DecoderRootTable, Forest, NodeId};
use crate::error::{V2fError, V2fResult};
use crate::quantizer::{Quantizer, QuantizerMode};

/// Sentinel used to fill the unreachable low end of a "missing-r" root's
/// full-width children array. Never dereferenced: the encoder only indexes
/// a root's children by a sample value already known to be `>= r`.
const UNUSED_CHILD: NodeId = NodeId(u32::MAX);

/// Parameters read alongside a forest that seed a fresh compressor /
/// decompressor. Corresponds to the non-forest fields read by
/// `v2f_file_read_codec`.
#[derive(Debug)]
pub struct CodecHeader {
    pub quantizer: Quantizer,
    pub decorrelator_mode: DecorrelatorMode,
    /// Shared dynamic-range ceiling for both the quantizer and the
    /// decorrelator (the header stores a single field for it; see spec.md
    /// §4.6's header table).
    pub decorrelator_max_sample_value: u32,
    pub forest: Forest,
}

/// Reads a codec header (quantizer + decorrelator parameters + forest) from
/// `r`. Equivalent to `v2f_file_read_codec`.
pub fn read_codec_header(r: &mut impl Read) -> V2fResult<CodecHeader> {
    let quantizer_mode_raw = read_be(r, 1)? as u8;
    let step_size = read_be(r, 4)? as u32;
    let decorrelator_mode_raw = read_be(r, 2)? as u16;
    let max_sample_value = read_be(r, 4)? as u32;
    let forest_id = read_be(r, 4)? as u32;

    if forest_id != 0 {
        return Err(V2fError::FeatureNotImplemented);
    }

    let quantizer_mode = QuantizerMode::from_u8(quantizer_mode_raw)
        .map_err(|_| V2fError::CorruptedData(format!("unknown quantizer mode {quantizer_mode_raw}")))?;
    let decorrelator_mode = DecorrelatorMode::from_u16(decorrelator_mode_raw).map_err(|_| {
        V2fError::CorruptedData(format!("unknown decorrelator mode {decorrelator_mode_raw}"))
    })?;
    if max_sample_value > config::MAX_SAMPLE_VALUE || max_sample_value < 1 {
        return Err(V2fError::CorruptedData(format!(
            "max_sample_value {max_sample_value} out of range"
        )));
    }

    let quantizer = Quantizer::new(quantizer_mode, step_size, max_sample_value)?;
    let forest = read_forest(r, max_sample_value)?;

    Ok(CodecHeader {
        quantizer,
        decorrelator_mode,
        decorrelator_max_sample_value: max_sample_value,
        forest,
    })
}

/// Writes a codec header (quantizer + decorrelator parameters + forest) to
/// `w`. Equivalent to `v2f_file_write_codec`. Always writes `forest_id = 0`
/// (the only form this crate produces or accepts).
pub fn write_codec_header(
    w: &mut impl Write,
    quantizer: &Quantizer,
    decorrelator_mode: DecorrelatorMode,
    decorrelator_max_sample_value: u32,
    forest: &Forest,
) -> V2fResult<()> {
    write_be(w, quantizer.mode as u64, 1)?;
    write_be(w, quantizer.step_size as u64, 4)?;
    write_be(w, decorrelator_mode as u64, 2)?;
    write_be(w, decorrelator_max_sample_value as u64, 4)?;
    write_be(w, 0, 4)?; // forest_id
    write_forest(w, forest)
}

/// Reads a forest from `r`. `max_sample_value` is the decorrelator's, used
/// only to sanity-check `max_expected_value` does not exceed it (the two
/// are independent fields but a forest wider than the stream it is fed is a
/// sure sign of a mismatched file).
fn read_forest(r: &mut impl Read, max_sample_value: u32) -> V2fResult<Forest> {
    let total_entry_count = read_be(r, 4)? as u32;
    let bytes_per_word = read_be(r, 1)? as u8;
    let bytes_per_sample = read_be(r, 1)? as u8;
    let max_expected_value = read_be(r, 2)? as u32;
    let distinct_root_count = read_be(r, 2)? as u32 + 1;

    if !(config::MIN_BYTES_PER_WORD..=config::MAX_BYTES_PER_WORD).contains(&bytes_per_word)
        || !(config::MIN_BYTES_PER_SAMPLE..=config::MAX_BYTES_PER_SAMPLE)
            .contains(&bytes_per_sample)
    {
        return Err(V2fError::CorruptedData(
            "bytes_per_word / bytes_per_sample out of range".into(),
        ));
    }
    if max_expected_value > max_sample_value {
        return Err(V2fError::CorruptedData(
            "forest max_expected_value exceeds decorrelator max_sample_value".into(),
        ));
    }

    let full_children_count = max_expected_value + 1;
    let max_codeword_value = 1u64 << (8 * bytes_per_word as u32);

    // Regular entries only: on-disk `index` and child-index fields are a
    // single counter spanning every root's regular entries, so arena slot
    // i == on-disk index i exactly as long as no root entry is interleaved
    // here. Roots get their own, separate arena below.
    let mut coder_entries: Vec<CoderEntry> = Vec::with_capacity(total_entry_count as usize);
    let mut decoder_entries: Vec<DecoderEntry> = Vec::with_capacity(total_entry_count as usize);
    let mut root_coder: Vec<CoderEntry> = Vec::with_capacity(distinct_root_count as usize);
    let mut root_decoder: Vec<DecoderRootTable> = Vec::with_capacity(distinct_root_count as usize);
    let mut root_ranges: Vec<(u32, u32)> = Vec::with_capacity(distinct_root_count as usize);

    for root_index in 0..distinct_root_count {
        let root_entry_count = read_be(r, 4)? as u32;
        let root_included_count = read_be(r, 4)? as u32;
        if (root_included_count as u64) > max_codeword_value {
            return Err(V2fError::CorruptedData(format!(
                "root {root_index} root_included_count {root_included_count} exceeds 2^(8*bytes_per_word)"
            )));
        }

        let range_start = coder_entries.len() as u32;
        let mut entries_by_word: Vec<NodeId> = vec![UNUSED_CHILD; root_included_count as usize];

        for _ in 0..root_entry_count {
            let position = coder_entries.len() as u32;
            let index = read_be(r, 4)? as u32;
            if index != position {
                return Err(V2fError::CorruptedData(format!(
                    "entry index {index} does not match position {position}"
                )));
            }

            let children_count = read_be(r, 4)? as u32;
            let mut children = Vec::with_capacity(children_count as usize);
            for _ in 0..children_count {
                let child = read_be(r, 4)? as u32;
                if child >= total_entry_count {
                    return Err(V2fError::CorruptedData(format!(
                        "child index {child} >= total_entry_count {total_entry_count}"
                    )));
                }
                children.push(NodeId(child));
            }

            let included = children_count < full_children_count;
            let (samples, word_bytes) = if included {
                let sample_count = read_be(r, 2)? as u32;
                let mut samples = Vec::with_capacity(sample_count as usize);
                for _ in 0..sample_count {
                    samples.push(read_be(r, bytes_per_sample as u32)? as u32);
                }
                let mut word = vec![0u8; bytes_per_word as usize];
                r.read_exact(&mut word).map_err(V2fError::Io)?;
                let word_value = word.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
                if word_value >= root_included_count as u64 {
                    return Err(V2fError::CorruptedData(format!(
                        "codeword {word_value} >= root_included_count {root_included_count}"
                    )));
                }
                entries_by_word[word_value as usize] = NodeId(position);
                (samples, Some(word.into_boxed_slice()))
            } else {
                (Vec::new(), None)
            };

            coder_entries.push(CoderEntry {
                word_bytes,
                children: children.into_boxed_slice(),
                children_count,
            });
            decoder_entries.push(DecoderEntry {
                samples: samples.into_boxed_slice(),
                children_count,
            });
        }

        if coder_entries.len() as u32 - range_start != root_entry_count {
            return Err(V2fError::CorruptedData("root_entry_count mismatch".into()));
        }
        if entries_by_word.iter().any(|id| *id == UNUSED_CHILD) {
            return Err(V2fError::CorruptedData(format!(
                "root {root_index} entries_by_word has unpopulated codeword slots"
            )));
        }
        root_ranges.push((range_start, root_entry_count));

        let root_children_count = read_be(r, 4)? as u32;
        let expected_full = full_children_count;
        let expected_missing = full_children_count.saturating_sub(root_index);
        if root_children_count != expected_full && root_children_count != expected_missing {
            return Err(V2fError::CorruptedData(format!(
                "root {root_index} children_count {root_children_count} is neither full ({expected_full}) nor missing-{root_index} ({expected_missing})"
            )));
        }

        let mut root_children = vec![UNUSED_CHILD; full_children_count as usize];
        for _ in 0..root_children_count {
            let entry_index = read_be(r, 4)? as u32;
            if entry_index >= total_entry_count {
                return Err(V2fError::CorruptedData(format!(
                    "root entry_index {entry_index} >= total_entry_count {total_entry_count}"
                )));
            }
            let input_symbol = read_be(r, bytes_per_sample as u32)? as u32;
            if input_symbol > max_expected_value {
                return Err(V2fError::CorruptedData(format!(
                    "root input_symbol {input_symbol} exceeds max_expected_value {max_expected_value}"
                )));
            }
            root_children[input_symbol as usize] = NodeId(entry_index);
        }

        root_coder.push(CoderEntry {
            word_bytes: None,
            children: root_children.into_boxed_slice(),
            children_count: root_children_count,
        });
        root_decoder.push(DecoderRootTable {
            root_included_count,
            entries_by_word: Arc::from(entries_by_word.into_boxed_slice()),
        });
    }

    if coder_entries.len() as u32 != total_entry_count {
        return Err(V2fError::CorruptedData(
            "sum of root_entry_count does not equal header total_entry_count".into(),
        ));
    }

    let root_count = full_children_count;
    let mut root_selector: Vec<u32> = (0..distinct_root_count).collect();
    let last_distinct = distinct_root_count - 1;
    root_selector.resize(root_count as usize, last_distinct);

    Ok(Forest::new(
        bytes_per_word,
        bytes_per_sample,
        max_expected_value,
        root_count,
        coder_entries,
        decoder_entries,
        root_coder,
        root_decoder,
        root_selector,
        root_ranges,
    ))
}

/// Writes `forest` in the on-disk layout read by [`read_forest`]. Equivalent
/// to `v2f_file_write_forest`. Only the distinct prefix of roots (up to the
/// last one that differs from its predecessor) is written; trailing
/// aliasing roots are reconstructed by the reader.
fn write_forest(w: &mut impl Write, forest: &Forest) -> V2fResult<()> {
    let distinct_root_count = forest.distinct_root_count();
    let total_entry_count = forest.total_entry_count();

    write_be(w, total_entry_count as u64, 4)?;
    write_be(w, forest.bytes_per_word as u64, 1)?;
    write_be(w, forest.bytes_per_sample as u64, 1)?;
    write_be(w, forest.max_expected_value as u64, 2)?;
    write_be(w, (distinct_root_count - 1) as u64, 2)?;

    let full_children_count = forest.max_expected_value + 1;

    for root_index in 0..distinct_root_count {
        let root_entry = forest.coder_root_entry(root_index);
        let decoder_root = forest.decoder_root(root_index);
        let (root_entry_ids, root_entry_count) = forest.entries_under_root(root_index);

        write_be(w, root_entry_count as u64, 4)?;
        write_be(w, decoder_root.root_included_count as u64, 4)?;

        for (position, id) in root_entry_ids.iter().enumerate() {
            let entry = forest.coder_entry(*id);
            write_be(w, position as u64, 4)?;
            write_be(w, entry.children_count as u64, 4)?;
            for child in entry.children.iter() {
                write_be(w, child.0 as u64, 4)?;
            }
            if entry.children_count < full_children_count {
                let decoder_entry = forest.decoder_entry(*id);
                write_be(w, decoder_entry.samples.len() as u64, 2)?;
                for &s in decoder_entry.samples.iter() {
                    write_be(w, s as u64, forest.bytes_per_sample as u32)?;
                }
                let word = entry
                    .word_bytes
                    .as_ref()
                    .expect("included entry must carry a codeword");
                w.write_all(word).map_err(V2fError::Io)?;
            }
        }

        write_be(w, root_entry.children_count as u64, 4)?;
        let missing_from = full_children_count - root_entry.children_count;
        for symbol in missing_from..full_children_count {
            let child = root_entry.children[symbol as usize];
            write_be(w, child.0 as u64, 4)?;
            write_be(w, symbol as u64, forest.bytes_per_sample as u32)?;
        }
    }

    Ok(())
}

fn read_be(r: &mut impl Read, bytes: u32) -> V2fResult<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf[..bytes as usize]).map_err(V2fError::Io)?;
    Ok(buf[..bytes as usize].iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

fn write_be(w: &mut impl Write, value: u64, bytes: u32) -> V2fResult<()> {
    let mut buf = [0u8; 8];
    for i in 0..bytes as usize {
        let shift = 8 * (bytes as usize - 1 - i);
        buf[i] = ((value >> shift) & 0xff) as u8;
    }
    w.write_all(&buf[..bytes as usize]).map_err(V2fError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorrelator::DecorrelatorMode;
    use crate::quantizer::QuantizerMode;

    /// Builds the minimal 8-bit forest from spec.md's scenario 1: a single
    /// full root of 256 children, each an included leaf emitting its own
    /// index as a 1-byte codeword.
    fn minimal_256_forest() -> Forest {
        let full_children_count = 256u32;
        let mut coder_entries = Vec::with_capacity(256);
        let mut decoder_entries = Vec::with_capacity(256);
        let mut entries_by_word = vec![UNUSED_CHILD; 256];

        for i in 0u32..256 {
            coder_entries.push(CoderEntry {
                word_bytes: Some(Box::new([i as u8])),
                children: Box::new([]),
                children_count: 0,
            });
            decoder_entries.push(DecoderEntry { samples: Box::new([i]), children_count: 0 });
            entries_by_word[i as usize] = NodeId(i);
        }

        let mut root_children = vec![UNUSED_CHILD; 256];
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

        Forest::new(
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
        )
    }

    #[test]
    fn forest_round_trips_through_write_and_read() {
        let forest = minimal_256_forest();
        let mut buf = Vec::new();
        let quantizer = Quantizer::new(QuantizerMode::None, 1, 255).unwrap();
        write_codec_header(&mut buf, &quantizer, DecorrelatorMode::None, 255, &forest).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let header = read_codec_header(&mut cursor).unwrap();

        assert_eq!(header.quantizer.mode, QuantizerMode::None);
        assert_eq!(header.decorrelator_mode, DecorrelatorMode::None);
        assert_eq!(header.forest.total_entry_count(), forest.total_entry_count());
        assert_eq!(header.forest.root_count, 256);

        for sample in 0u32..256 {
            let entry_id = header.forest.decoder_root(0).entries_by_word[sample as usize];
            assert_eq!(header.forest.decoder_entry(entry_id).samples[0], sample);
        }
    }

    #[test]
    fn truncated_forest_header_is_io_error() {
        let forest = minimal_256_forest();
        let mut buf = Vec::new();
        let quantizer = Quantizer::new(QuantizerMode::None, 1, 255).unwrap();
        write_codec_header(&mut buf, &quantizer, DecorrelatorMode::None, 255, &forest).unwrap();
        buf.truncate(buf.len() - 10);

        let mut cursor = std::io::Cursor::new(buf);
        let err = read_codec_header(&mut cursor).unwrap_err();
        assert!(matches!(err, V2fError::Io(_)));
    }
}
