//! The V2F variable-to-fixed entropy codec: forest data structure, block
//! coder/decoder, and on-disk persistence. Corresponds to
//! `v2f_entropy_coder.c` / `v2f_entropy_decoder.c` / the forest-handling
//! parts of `v2f_file.c`.

pub mod coder;
pub mod decoder;
pub mod forest;
pub mod persist;

pub use coder::compress_block;
pub use decoder::decompress_block;
pub use forest::{CoderEntry, DecoderEntry, DecoderRootTable, Forest, NodeId};
pub use persist::{read_codec_header, write_codec_header, CodecHeader};
