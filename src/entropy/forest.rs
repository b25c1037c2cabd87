//! In-memory V2F forest: the arena-of-entries redesign called for by
//! spec.md §9 ("Pointer graph → arena + index"), replacing the original's
//! raw `v2f_entropy_coder_entry_t*` / `v2f_entropy_decoder_entry_t*` graphs
//! (`v2f.h`) with a contiguous arena indexed by [`NodeId`].
//!
//! Grounded on the data model in spec.md §3 and the type definitions in
//! `v2f.h` (`v2f_entropy_coder_entry_t`, `v2f_entropy_decoder_entry_t`,
//! `v2f_entropy_decoder_root_t`).
//!
//! Regular tree entries and root entries are kept in separate arenas.
//! Within the file format, a regular entry's on-disk `index` field and the
//! child-index fields that reference regular entries are both assigned from
//! the same strictly-ascending counter bounded by `total_entry_count`; by
//! storing only regular entries at `coder_entries[i]` / `decoder_entries[i]`
//! (i.e. never interleaving a root's synthesized entry between two
//! regular entries), arena slot `i` coincides with on-disk index `i`
//! exactly, so a child-index value can be turned into a [`NodeId`] the
//! moment it's read — no second pass is needed to patch indices into
//! pointers once every entry exists, unlike the original.

use std::sync::Arc;

/// Index into a [`Forest`]'s regular-entry arena. A newtype over `u32` in
/// place of the original's raw pointers. Never addresses a root; roots are
/// looked up by root index via [`Forest::coder_root_entry`] /
/// [`Forest::decoder_root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Encoder-side tree node. Corresponds to `v2f_entropy_coder_entry_t`. The
/// same shape represents both a regular tree entry and a root: spec.md §4.4
/// treats `roots[0]` as just another `current_entry` to start a block from.
///
/// For a regular entry, `children` is dense and exactly `children_count`
/// long. For a root entry, `children` is allocated at the full
/// `max_expected_value + 1` width regardless of `children_count` (mirroring
/// `v2f_file_read_forest`'s allocation, which lets a root be addressed
/// directly by raw symbol value instead of by an offset from the lowest
/// symbol it covers) and is sparse below `max_expected_value + 1 -
/// children_count` for a "missing-i" root — those slots are never read,
/// since a miss can only land on a root with a symbol already known to be
/// at or above that root's lowest covered symbol.
#[derive(Debug, Clone)]
pub struct CoderEntry {
    /// `None` iff this entry is *full* (`children_count == max_expected_value + 1`);
    /// only a full entry can never miss, so only a full entry has no codeword.
    /// Always `None` for a root entry (never flushed to directly; see
    /// [`crate::entropy::coder`]).
    pub word_bytes: Option<Box<[u8]>>,
    pub children: Box<[NodeId]>,
    pub children_count: u32,
}

/// Decoder-side tree node. Corresponds to `v2f_entropy_decoder_entry_t`.
/// Only entries reachable through some root's `entries_by_word` carry
/// meaningful `samples`; a non-included (full) regular entry is stored with
/// an empty `samples` slice and is never looked up by the decoder, which
/// never walks the tree directly.
#[derive(Debug, Clone)]
pub struct DecoderEntry {
    pub samples: Box<[u32]>,
    pub children_count: u32,
}

/// One distinct decoder root's dense codeword lookup table, shared by every
/// root index that aliases it. Corresponds to `v2f_entropy_decoder_root_t`.
#[derive(Debug, Clone)]
pub struct DecoderRootTable {
    pub root_included_count: u32,
    pub entries_by_word: Arc<[NodeId]>,
}

/// A fully loaded V2F forest: both the encoder and decoder views built from
/// one on-disk file, since the file format (spec.md §4.6) encodes enough
/// information for both sides of the pipeline simultaneously. Corresponds
/// jointly to `v2f_entropy_coder_t` and `v2f_entropy_decoder_t`.
#[derive(Debug)]
pub struct Forest {
    pub bytes_per_word: u8,
    pub bytes_per_sample: u8,
    pub max_expected_value: u32,
    /// `max_expected_value + 1`: both the number of root indices and the
    /// full children-array width of a full entry.
    pub root_count: u32,

    coder_entries: Vec<CoderEntry>,
    decoder_entries: Vec<DecoderEntry>,

    /// One synthesized [`CoderEntry`] per *distinct* stored root.
    root_coder: Vec<CoderEntry>,
    /// Parallel per-distinct-root decoder lookup tables.
    root_decoder: Vec<DecoderRootTable>,
    /// `root_selector[r]` is the index into `root_coder` / `root_decoder`
    /// backing root index `r`. Length is always `root_count`; trailing
    /// indices beyond the stored distinct prefix alias the last one.
    root_selector: Vec<u32>,
    /// `root_ranges[d] = (start, count)`: the contiguous span of `coder_entries`
    /// / `decoder_entries` belonging to distinct root `d`, in file order.
    /// Used only when re-serialising a forest (see [`super::persist`]).
    root_ranges: Vec<(u32, u32)>,
}

impl Forest {
    pub(crate) fn new(
        bytes_per_word: u8,
        bytes_per_sample: u8,
        max_expected_value: u32,
        root_count: u32,
        coder_entries: Vec<CoderEntry>,
        decoder_entries: Vec<DecoderEntry>,
        root_coder: Vec<CoderEntry>,
        root_decoder: Vec<DecoderRootTable>,
        root_selector: Vec<u32>,
        root_ranges: Vec<(u32, u32)>,
    ) -> Self {
        Forest {
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
        }
    }

    #[inline]
    pub fn coder_entry(&self, id: NodeId) -> &CoderEntry {
        &self.coder_entries[id.index()]
    }

    #[inline]
    pub fn decoder_entry(&self, id: NodeId) -> &DecoderEntry {
        &self.decoder_entries[id.index()]
    }

    #[inline]
    pub fn coder_root_entry(&self, root_index: u32) -> &CoderEntry {
        &self.root_coder[self.root_selector[root_index as usize] as usize]
    }

    #[inline]
    pub fn decoder_root(&self, root_index: u32) -> &DecoderRootTable {
        &self.root_decoder[self.root_selector[root_index as usize] as usize]
    }

    /// Number of regular (non-root) entries, i.e. the file format's
    /// `total_entry_count`.
    pub fn total_entry_count(&self) -> u32 {
        self.coder_entries.len() as u32
    }

    /// Number of distinct roots actually stored (before alias fill-in).
    pub fn distinct_root_count(&self) -> u32 {
        self.root_coder.len() as u32
    }

    /// The regular entries belonging to distinct root `root_index`, as a
    /// `NodeId` list and count, in the order they were stored. Used only
    /// when re-serialising a forest; encode/decode never need this.
    pub fn entries_under_root(&self, root_index: u32) -> (Vec<NodeId>, u32) {
        let (start, count) = self.root_ranges[root_index as usize];
        ((start..start + count).map(NodeId).collect(), count)
    }
}
