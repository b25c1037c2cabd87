//! V2F block decoder: one codeword in, zero-or-more samples out, per
//! spec.md §4.5.
//!
//! Grounded on `v2f_entropy_decoder_decompress_block` and
//! `v2f_entropy_decoder_decode_next_index` in `v2f_entropy_decoder.c`.

use crate::entropy::forest::Forest;
use crate::error::{V2fError, V2fResult};
use crate::sample_io::buffer_to_sample;

/// Decompresses `compressed` into at most `max_output_sample_count` samples,
/// appending them to `output`. Equivalent to
/// `v2f_entropy_decoder_decompress_block`.
pub fn decompress_block(
    forest: &Forest,
    compressed: &[u8],
    max_output_sample_count: usize,
    output: &mut Vec<u32>,
) -> V2fResult<()> {
    let bpw = forest.bytes_per_word as usize;
    if compressed.is_empty() {
        return Err(V2fError::InvalidParameter("compressed block must be non-empty".into()));
    }
    if compressed.len() % bpw != 0 {
        return Err(V2fError::CorruptedData(
            "compressed block size is not a multiple of bytes_per_word".into(),
        ));
    }

    let mut current_root_index = 0u32;
    let start_len = output.len();

    for word_bytes in compressed.chunks_exact(bpw) {
        if output.len() - start_len >= max_output_sample_count {
            break;
        }
        let word = buffer_to_sample(word_bytes);
        let root = forest.decoder_root(current_root_index);

        if word >= root.root_included_count {
            return Err(V2fError::CorruptedData(format!(
                "codeword {word} >= root_included_count {}",
                root.root_included_count
            )));
        }

        let entry_id = root.entries_by_word[word as usize];
        let entry = forest.decoder_entry(entry_id);

        if entry.children_count >= forest.root_count {
            return Err(V2fError::CorruptedData(format!(
                "decoded node children_count {} has no matching root (root_count {})",
                entry.children_count, forest.root_count
            )));
        }

        for &s in entry.samples.iter() {
            if output.len() - start_len >= max_output_sample_count {
                break;
            }
            output.push(s);
        }

        current_root_index = entry.children_count;
    }

    Ok(())
}
