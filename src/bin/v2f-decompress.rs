//! `v2f-decompress` — invert `v2f-compress`'s envelope stream back into raw
//! big-endian samples.

use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

use v2f::cli::args::parse_args;
use v2f::cli::constants::PROGRAM_NAME_DECOMPRESS;
use v2f::cli::help::{print_bad_usage, print_usage, print_version};
use v2f::timefn::TimingSink;

fn main() -> ExitCode {
    let parsed = match parse_args(PROGRAM_NAME_DECOMPRESS) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            print_bad_usage(PROGRAM_NAME_DECOMPRESS);
        }
    };

    if parsed.exit_early {
        if parsed.version_requested {
            print_version(PROGRAM_NAME_DECOMPRESS);
        } else {
            print_usage(PROGRAM_NAME_DECOMPRESS);
        }
        return ExitCode::from(64);
    }

    let [compressed_path, header_path, out_path] = match parsed.positionals.as_slice() {
        [a, b, c] => [a.clone(), b.clone(), c.clone()],
        _ => {
            eprintln!("bad usage: expected <compressed> <header> <out>");
            print_bad_usage(PROGRAM_NAME_DECOMPRESS);
        }
    };

    let mut compressed = match File::open(&compressed_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot open compressed input {compressed_path}: {e}");
            return ExitCode::from(1);
        }
    };
    let mut header = match File::open(&header_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot open header {header_path}: {e}");
            return ExitCode::from(1);
        }
    };
    let out_file = match File::create(&out_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot create output {out_path}: {e}");
            return ExitCode::from(1);
        }
    };
    let mut out = BufWriter::new(out_file);

    let mut timing_file = match parsed.timing_path {
        Some(ref path) => match File::create(path) {
            Ok(f) => Some(f),
            Err(e) => {
                eprintln!("cannot create timing file {path}: {e}");
                return ExitCode::from(1);
            }
        },
        None => None,
    };
    let mut timing_sink = timing_file.as_mut().map(|f| TimingSink::new(f));

    match v2f::decompress(
        &mut compressed,
        &mut header,
        &mut out,
        &parsed.overrides,
        timing_sink.as_mut(),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.code())
        }
    }
}
