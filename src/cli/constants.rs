// cli/constants.rs — display-level infrastructure shared by the three V2F
// command-line front ends (v2f-compress, v2f-decompress, v2f-verify).
//
// Migrated in spirit from lz4cli.c's `static unsigned displayLevel` global
// and the DISPLAYLEVEL/DISPLAY macros; the original v2f_compress.c /
// v2f_decompress.c binaries use plain fprintf(stderr, ...) gated by a
// `-v`-derived verbosity, which this module generalizes into the same
// atomic + macro shape the teacher already uses.

use std::sync::atomic::{AtomicU32, Ordering};

pub const PROGRAM_NAME_COMPRESS: &str = "v2f-compress";
pub const PROGRAM_NAME_DECOMPRESS: &str = "v2f-decompress";
pub const PROGRAM_NAME_VERIFY: &str = "v2f-verify";

// 0 = silent; 1 = errors only; 2 = normal (default); 3 = verbose (tree dumps, timing).
pub static DISPLAY_LEVEL: AtomicU32 = AtomicU32::new(2);

/// Returns the current display level.
#[inline]
pub fn display_level() -> u32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

/// Sets the display level.
#[inline]
pub fn set_display_level(level: u32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

/// Conditionally print to stderr at or above `level`.
#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        if $crate::cli::constants::display_level() >= $level {
            eprintln!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_level_round_trips() {
        let prev = display_level();
        set_display_level(3);
        assert_eq!(display_level(), 3);
        set_display_level(prev);
    }
}
