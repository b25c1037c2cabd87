//! `v2f-compress` — compress a raw big-endian sample stream using a V2F
//! forest header. Thin dispatch shell around `v2f::cli` and
//! `v2f::envelope::compress`, mirroring the teacher's `src/main.rs`
//! parse-then-dispatch-then-exit-code shape.

use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

use v2f::cli::args::parse_args;
use v2f::cli::constants::PROGRAM_NAME_COMPRESS;
use v2f::cli::help::{print_bad_usage, print_usage_with_shadow, print_version};
use v2f::timefn::TimingSink;

fn main() -> ExitCode {
    let parsed = match parse_args(PROGRAM_NAME_COMPRESS) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            print_bad_usage(PROGRAM_NAME_COMPRESS);
        }
    };

    if parsed.exit_early {
        if parsed.version_requested {
            print_version(PROGRAM_NAME_COMPRESS);
        } else {
            print_usage_with_shadow(PROGRAM_NAME_COMPRESS);
        }
        return ExitCode::from(64);
    }

    let [raw_path, header_path, out_path] = match parsed.positionals.as_slice() {
        [a, b, c] => [a.clone(), b.clone(), c.clone()],
        _ => {
            eprintln!("bad usage: expected <raw> <header> <out>");
            print_bad_usage(PROGRAM_NAME_COMPRESS);
        }
    };

    let mut raw = match File::open(&raw_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot open raw input {raw_path}: {e}");
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

    match v2f::compress(
        &mut raw,
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
