//! Small parsing helpers shared by [`crate::cli::args`].
//!
//! Grounded on lz4cli.c's `readU32FromChar` (`arg_utils.rs` in the teacher
//! repo), trimmed to plain decimal parsing: V2F's `-q`/`-s`/`-d`/`-w` values
//! are small mode/row-count integers, so the teacher's `K`/`M`/`G` byte-size
//! suffixes have no V2F use and are dropped.

use anyhow::anyhow;

/// Parses a `u32` from the start of `s`. Returns `None` if `s` has no
/// leading digit, or `Some((value, remainder))` with the unconsumed suffix.
pub fn read_u32_from_str(s: &str) -> Option<(u32, &str)> {
    let bytes = s.as_bytes();
    if bytes.is_empty() || !bytes[0].is_ascii_digit() {
        return None;
    }
    let mut i = 0usize;
    let mut result: u32 = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        result = result.wrapping_mul(10).wrapping_add((bytes[i] - b'0') as u32);
        i += 1;
    }
    Some((result, &s[i..]))
}

/// Parses a comma-separated shadow-region list (spec.md §6's `-y`
/// argument) into row-pair boundaries. Validates even length and a
/// non-decreasing sequence; any other malformation is rejected.
pub fn parse_shadow_regions(s: &str) -> anyhow::Result<Vec<(u32, u32)>> {
    let mut values = Vec::new();
    for part in s.split(',') {
        let (val, rest) = read_u32_from_str(part)
            .ok_or_else(|| anyhow!("bad usage: -y: expected a comma-separated integer list"))?;
        if !rest.is_empty() {
            return Err(anyhow!("bad usage: -y: unexpected characters after '{}'", part));
        }
        values.push(val);
    }
    if values.is_empty() || values.len() % 2 != 0 {
        return Err(anyhow!("bad usage: -y: expects an even-length list of row-pair boundaries"));
    }
    for window in values.windows(2) {
        if window[1] < window[0] {
            return Err(anyhow!("bad usage: -y: values must be non-decreasing"));
        }
    }
    Ok(values.chunks_exact(2).map(|c| (c[0], c[1])).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integer() {
        assert_eq!(read_u32_from_str("42"), Some((42, "")));
    }

    #[test]
    fn no_digits_is_none() {
        assert_eq!(read_u32_from_str("abc"), None);
    }

    #[test]
    fn trailing_garbage_is_returned_as_remainder() {
        let (val, rest) = read_u32_from_str("12x").unwrap();
        assert_eq!(val, 12);
        assert_eq!(rest, "x");
    }

    #[test]
    fn shadow_regions_well_formed() {
        let regions = parse_shadow_regions("0,10,20,30").unwrap();
        assert_eq!(regions, vec![(0, 10), (20, 30)]);
    }

    #[test]
    fn shadow_regions_odd_length_is_error() {
        assert!(parse_shadow_regions("0,10,20").is_err());
    }

    #[test]
    fn shadow_regions_decreasing_is_error() {
        assert!(parse_shadow_regions("10,0").is_err());
    }

    #[test]
    fn shadow_regions_non_numeric_is_error() {
        assert!(parse_shadow_regions("a,b").is_err());
    }
}
