//! Command-line front-end infrastructure shared by `v2f-compress`,
//! `v2f-decompress`, and `v2f-verify`.

pub mod arg_utils;
pub mod args;
pub mod constants;
pub mod help;
