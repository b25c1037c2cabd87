//! V2F block encoder: the emit-on-miss / follow-child-on-hit walk.
//!
//! Grounded on `v2f_entropy_coder_compress_block` in `v2f_entropy_coder.c`.
//! That function is written branchlessly (boolean-as-integer address
//! arithmetic) to avoid a data-dependent branch per sample; spec.md §9
//! explicitly permits a predictable-branch rewrite ("An implementation may
//! keep the branchless form or use a predictable branch; the contract
//! requires only the output semantics"), so this port uses a plain `if`.

use crate::entropy::forest::{CoderEntry, Forest};
use crate::error::{V2fError, V2fResult};

/// Walks `samples` through `forest`'s encoder trees, appending codewords to
/// `output` as they are emitted. Equivalent to
/// `v2f_entropy_coder_compress_block`.
pub fn compress_block(forest: &Forest, samples: &[u32], output: &mut Vec<u8>) -> V2fResult<()> {
    if samples.is_empty() {
        return Err(V2fError::InvalidParameter("sample_count must be >= 1".into()));
    }

    // Blocks are independently coded: every block starts at root 0.
    let mut current = forest.coder_root_entry(0);

    for &sample in samples {
        let children_count = current.children_count;

        if sample < children_count {
            // Hit: descend without emitting.
            current = forest.coder_entry(current.children[sample as usize]);
        } else {
            // Miss: emit this node's codeword, then jump to the root
            // specialised for having already consumed `children_count`
            // of the smallest symbols.
            let word = current
                .word_bytes
                .as_ref()
                .expect("non-full entry must carry a codeword");
            output.extend_from_slice(word);
            let next_root = forest.coder_root_entry(children_count);
            current = forest.coder_entry(next_root.children[sample as usize]);
        }
    }

    // End-of-block flush: emit whatever node we ended on. If it is a full
    // (non-included) node, descend via child 0 until an included node is
    // found; the decoder is told the true sample count so synthesized
    // trailing samples are discarded downstream.
    let flush_entry = flush_to_included(forest, current);
    let word = flush_entry
        .word_bytes
        .as_ref()
        .expect("flush must land on an included entry");
    output.extend_from_slice(word);

    Ok(())
}

fn flush_to_included<'a>(forest: &'a Forest, mut current: &'a CoderEntry) -> &'a CoderEntry {
    let full_children_count = forest.max_expected_value + 1;
    while current.children_count == full_children_count {
        current = forest.coder_entry(current.children[0]);
    }
    current
}
