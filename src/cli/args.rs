//! Command-line argument parsing for the three V2F front ends
//! (`v2f-compress`, `v2f-decompress`, `v2f-verify`), per spec.md §6.
//!
//! Structurally this follows the teacher's `parse_args_from` shape (an
//! explicit, test-friendly `&[String]` entry point plus a thin
//! `std::env::args()` wrapper, a single pass over the argument list, short
//! options that may take an inline or next-argv value) but the flag set
//! itself is V2F's own: there is no compression-level/block-size/benchmark
//! surface to port, since spec.md §6 defines a much smaller set of flags.
//!
//! Each flag may appear at most once; a repeat logs a warning via
//! [`crate::displaylevel`] and keeps the new value (spec.md §6: "repetition
//! logs a warning and retains the last").

use anyhow::anyhow;

use crate::cli::arg_utils::{parse_shadow_regions, read_u32_from_str};
use crate::cli::constants::{display_level, set_display_level};
use crate::decorrelator::DecorrelatorMode;
use crate::displaylevel;
use crate::envelope::Overrides;
use crate::quantizer::QuantizerMode;

/// Everything parsed from argv for one V2F invocation.
#[derive(Debug, Default)]
pub struct ParsedArgs {
    pub overrides: Overrides,
    /// `-y`: compress-only, opaque to the core (spec.md §6).
    pub shadow_regions: Vec<(u32, u32)>,
    /// `-t <path>`: per-block timing CSV destination.
    pub timing_path: Option<String>,
    /// `-h` / `-v`: caller exits 64 without performing any I/O.
    pub exit_early: bool,
    /// `true` if the early exit was requested via `-v` (version) rather than `-h` (help).
    pub version_requested: bool,
    /// Positional arguments, in order.
    pub positionals: Vec<String>,
}

/// Parses `std::env::args()` (skipping argv[0]).
pub fn parse_args(program: &str) -> anyhow::Result<ParsedArgs> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    parse_args_from(program, &argv)
}

/// Parses an explicit argument list (argv[1..]); callable from tests.
pub fn parse_args_from(program: &str, argv: &[String]) -> anyhow::Result<ParsedArgs> {
    let mut parsed = ParsedArgs::default();
    let mut quantizer_mode_seen = false;
    let mut step_size_seen = false;
    let mut decorrelator_mode_seen = false;
    let mut samples_per_row_seen = false;
    let mut shadow_seen = false;
    let mut timing_seen = false;

    let mut i = 0usize;
    while i < argv.len() {
        let arg = &argv[i];
        let bytes = arg.as_bytes();

        if bytes.is_empty() || bytes[0] != b'-' || arg == "-" {
            parsed.positionals.push(arg.clone());
            i += 1;
            continue;
        }

        match bytes[1] {
            b'h' => {
                parsed.exit_early = true;
                return Ok(parsed);
            }
            b'v' => {
                parsed.exit_early = true;
                parsed.version_requested = true;
                return Ok(parsed);
            }
            b'q' => {
                let value = take_value(arg, argv, &mut i, program, "-q")?;
                let (raw, rest) = read_u32_from_str(&value)
                    .ok_or_else(|| anyhow!("bad usage: -q: expected a numeric mode"))?;
                if !rest.is_empty() {
                    return Err(anyhow!("bad usage: -q: unexpected characters after mode"));
                }
                let mode = QuantizerMode::from_u8(raw as u8)
                    .map_err(|e| anyhow!("bad usage: -q: {e}"))?;
                warn_if_repeated(&mut quantizer_mode_seen, "-q");
                parsed.overrides.quantizer_mode = Some(mode);
            }
            b's' => {
                let value = take_value(arg, argv, &mut i, program, "-s")?;
                let (raw, rest) = read_u32_from_str(&value)
                    .ok_or_else(|| anyhow!("bad usage: -s: expected a numeric step size"))?;
                if !rest.is_empty() || raw == 0 || raw > 255 {
                    return Err(anyhow!("bad usage: -s: step size must be in 1..=255"));
                }
                warn_if_repeated(&mut step_size_seen, "-s");
                parsed.overrides.step_size = Some(raw as u8);
            }
            b'd' => {
                let value = take_value(arg, argv, &mut i, program, "-d")?;
                let (raw, rest) = read_u32_from_str(&value)
                    .ok_or_else(|| anyhow!("bad usage: -d: expected a numeric mode"))?;
                if !rest.is_empty() {
                    return Err(anyhow!("bad usage: -d: unexpected characters after mode"));
                }
                let mode = DecorrelatorMode::from_u16(raw as u16)
                    .map_err(|e| anyhow!("bad usage: -d: {e}"))?;
                warn_if_repeated(&mut decorrelator_mode_seen, "-d");
                parsed.overrides.decorrelator_mode = Some(mode);
            }
            b'w' => {
                let value = take_value(arg, argv, &mut i, program, "-w")?;
                let (raw, rest) = read_u32_from_str(&value)
                    .ok_or_else(|| anyhow!("bad usage: -w: expected a numeric row width"))?;
                if !rest.is_empty() || raw == 0 {
                    return Err(anyhow!("bad usage: -w: samples per row must be >= 1"));
                }
                warn_if_repeated(&mut samples_per_row_seen, "-w");
                parsed.overrides.samples_per_row = Some(raw);
            }
            b'y' => {
                let value = take_value(arg, argv, &mut i, program, "-y")?;
                let regions = parse_shadow_regions(&value)?;
                warn_if_repeated(&mut shadow_seen, "-y");
                parsed.shadow_regions = regions;
            }
            b't' => {
                let value = take_value(arg, argv, &mut i, program, "-t")?;
                warn_if_repeated(&mut timing_seen, "-t");
                parsed.timing_path = Some(value);
            }
            _ => {
                return Err(anyhow!(
                    "bad usage: unrecognised option: -{}",
                    bytes[1] as char
                ));
            }
        }

        i += 1;
    }

    Ok(parsed)
}

/// Extracts a flag's value, either immediately following the flag character
/// (`-s4`) or as the next argv element (`-s 4`).
fn take_value(
    arg: &str,
    argv: &[String],
    i: &mut usize,
    program: &str,
    flag: &str,
) -> anyhow::Result<String> {
    let inline = &arg[2..];
    if !inline.is_empty() {
        return Ok(inline.to_owned());
    }
    *i += 1;
    argv.get(*i)
        .cloned()
        .ok_or_else(|| anyhow!("bad usage: {}: {} requires an argument", program, flag))
}

fn warn_if_repeated(seen: &mut bool, flag: &str) {
    if *seen {
        displaylevel!(1, "Warning: {} specified more than once, using the last value", flag);
    }
    *seen = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn quantizer_mode_inline() {
        let p = parse_args_from("v2f-compress", &make(&["-q1"])).unwrap();
        assert_eq!(p.overrides.quantizer_mode, Some(QuantizerMode::Uniform));
    }

    #[test]
    fn quantizer_mode_separate() {
        let p = parse_args_from("v2f-compress", &make(&["-q", "0"])).unwrap();
        assert_eq!(p.overrides.quantizer_mode, Some(QuantizerMode::None));
    }

    #[test]
    fn step_size_out_of_range_is_error() {
        assert!(parse_args_from("v2f-compress", &make(&["-s0"])).is_err());
        assert!(parse_args_from("v2f-compress", &make(&["-s256"])).is_err());
    }

    #[test]
    fn decorrelator_mode_parses() {
        let p = parse_args_from("v2f-compress", &make(&["-d3"])).unwrap();
        assert_eq!(p.overrides.decorrelator_mode, Some(DecorrelatorMode::JpegLs));
    }

    #[test]
    fn unknown_decorrelator_mode_is_error() {
        assert!(parse_args_from("v2f-compress", &make(&["-d9"])).is_err());
    }

    #[test]
    fn samples_per_row_parses() {
        let p = parse_args_from("v2f-compress", &make(&["-w", "512"])).unwrap();
        assert_eq!(p.overrides.samples_per_row, Some(512));
    }

    #[test]
    fn shadow_regions_parse() {
        let p = parse_args_from("v2f-compress", &make(&["-y", "0,4,8,12"])).unwrap();
        assert_eq!(p.shadow_regions, vec![(0, 4), (8, 12)]);
    }

    #[test]
    fn timing_path_parses() {
        let p = parse_args_from("v2f-compress", &make(&["-t", "timing.csv"])).unwrap();
        assert_eq!(p.timing_path.as_deref(), Some("timing.csv"));
    }

    #[test]
    fn help_flag_exits_early() {
        let p = parse_args_from("v2f-compress", &make(&["-h"])).unwrap();
        assert!(p.exit_early);
    }

    #[test]
    fn version_flag_exits_early() {
        let p = parse_args_from("v2f-compress", &make(&["-v"])).unwrap();
        assert!(p.exit_early);
        assert!(p.version_requested);
    }

    #[test]
    fn positionals_collected_in_order() {
        let p = parse_args_from("v2f-compress", &make(&["raw.bin", "header.bin", "out.v2f"])).unwrap();
        assert_eq!(p.positionals, vec!["raw.bin", "header.bin", "out.v2f"]);
    }

    /// `parse_args_from` itself never enforces positional arity — flags and
    /// positionals are independent — so a short invocation parses cleanly
    /// with a short `positionals` list. The missing-argument error is the
    /// caller's (each `src/bin/*.rs`) responsibility, matched on a slice
    /// pattern against `positionals`.
    #[test]
    fn missing_positional_args_leaves_short_positionals_list() {
        let p = parse_args_from("v2f-compress", &make(&["-s4", "raw.bin"])).unwrap();
        assert_eq!(p.positionals, vec!["raw.bin"]);
        assert!(!matches!(p.positionals.as_slice(), [_, _, _]));
    }

    #[test]
    fn unknown_flag_is_error() {
        assert!(parse_args_from("v2f-compress", &make(&["-z"])).is_err());
    }

    #[test]
    fn repeated_flag_keeps_last() {
        let p = parse_args_from("v2f-compress", &make(&["-s4", "-s8"])).unwrap();
        assert_eq!(p.overrides.step_size, Some(8));
    }
}
