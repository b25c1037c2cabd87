//! Usage/version banners and the `badusage` exit path shared by the three
//! V2F front ends, ported in spirit from lz4cli.c's `usage` / `usage_advanced`
//! / `badusage` (display-level-gated `eprintln!`, exit-code-carrying helpers).

use crate::cli::constants::display_level;

/// Print brief usage for `program` to stderr. Equivalent to lz4cli.c's `usage`.
pub fn print_usage(program: &str) {
    eprintln!("Usage : ");
    eprintln!("      {} [-q N] [-s N] [-d N] [-w N] [-t path] <raw> <header> <out>", program);
    eprintln!();
    eprintln!("Arguments : ");
    eprintln!(" -q <int>  : quantizer mode override (0=none, 1=uniform)");
    eprintln!(" -s <int>  : step size override (1..255)");
    eprintln!(" -d <int>  : decorrelator mode override (0..4)");
    eprintln!(" -w <int>  : samples per row override (required by modes 3,4)");
    eprintln!(" -t <path> : write a per-block timing CSV to path");
    eprintln!(" -h        : display help and exit (64)");
    eprintln!(" -v        : display version and exit (64)");
}

/// Print brief usage plus the `-y` shadow-region flag, which only applies to
/// the compress front end. Equivalent to lz4cli.c's `usage_advanced`.
pub fn print_usage_with_shadow(program: &str) {
    print_usage(program);
    eprintln!(" -y a,b,c,… : shadow region row-pair list (even length, non-decreasing)");
}

/// Print "Incorrect parameters" plus brief usage to stderr, then exit 1.
/// Equivalent to lz4cli.c's `badusage`.
pub fn print_bad_usage(program: &str) -> ! {
    if display_level() >= 1 {
        eprintln!("Incorrect parameters");
        print_usage(program);
    }
    std::process::exit(1);
}

/// Print the version banner. Equivalent to lz4cli.c's welcome-message path.
pub fn print_version(program: &str) {
    println!("{} v{}", program, env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_usage_does_not_panic() {
        print_usage("v2f-compress");
    }

    #[test]
    fn print_usage_with_shadow_does_not_panic() {
        print_usage_with_shadow("v2f-compress");
    }

    #[test]
    fn print_version_does_not_panic() {
        print_version("v2f-compress");
    }
}
