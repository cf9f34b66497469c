//! Path normalization and mount flag parsing

use super::ids::BufferAddr;

/// Lower-case a path for use as a table key
///
/// ASCII-only folding keeps byte offsets identical between the normalized
/// key and the caller's original string.
pub fn normalize(path: &str) -> String {
    path.to_ascii_lowercase()
}

/// Case-insensitive suffix check for the archive extension
pub fn has_extension(path: &str, extension: &str) -> bool {
    if extension.is_empty() || path.len() < extension.len() {
        return false;
    }
    let start = path.len() - extension.len();
    path.is_char_boundary(start) && path[start..].eq_ignore_ascii_case(extension)
}

/// Join a ramfs mountpoint and its root into the virtual path the engine
/// later hands to imagefs
pub fn join_mount(mountpoint: &str, fsroot: &str, separator: &str) -> String {
    let mut joined = String::with_capacity(mountpoint.len() + separator.len() + fsroot.len());
    joined.push_str(mountpoint);
    joined.push_str(separator);
    joined.push_str(fsroot);
    joined
}

/// Extract the buffer address following `token` in a mount flags string
///
/// The number is read with `strtoull(.., 0)` rules: leading C whitespace is
/// skipped, an optional `+`/`-` sign is accepted (a negated value wraps),
/// `0x` selects hex, a leading `0` selects octal, anything else is decimal,
/// and parsing stops at the first character that is not a digit of the
/// chosen radix. Overflow saturates to `u64::MAX` regardless of sign. A
/// token followed by no digits yields address 0.
///
/// # Examples
///
/// ```
/// use layeredfs_demangler::{parse_base_address, BufferAddr};
///
/// assert_eq!(parse_base_address("base=0x1000,size=64", "base="), Some(BufferAddr(0x1000)));
/// assert_eq!(parse_base_address("mode=ro", "base="), None);
/// ```
pub fn parse_base_address(flags: &str, token: &str) -> Option<BufferAddr> {
    if token.is_empty() {
        return None;
    }
    let start = flags.find(token)? + token.len();
    let rest = flags[start..].trim_start_matches(is_c_space);

    let (negative, rest) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };

    let (digits, radix) = if let Some(hex) = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .filter(|h| h.starts_with(|c: char| c.is_ascii_hexdigit()))
    {
        (hex, 16)
    } else if rest.starts_with('0') {
        (rest, 8)
    } else {
        (rest, 10)
    };

    let mut value: u64 = 0;
    let mut overflowed = false;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(radix) else {
            break;
        };
        match value
            .checked_mul(radix as u64)
            .and_then(|v| v.checked_add(digit as u64))
        {
            Some(next) => value = next,
            None => overflowed = true,
        }
    }

    let value = if overflowed {
        u64::MAX
    } else if negative {
        value.wrapping_neg()
    } else {
        value
    };

    Some(BufferAddr(value))
}

/// Whitespace as classified by C `isspace` in the "C" locale
fn is_c_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_ascii() {
        assert_eq!(normalize("/Data/Sound/ABC.IFS"), "/data/sound/abc.ifs");
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("/data/sound/abc.ifs", ".ifs"));
        assert!(has_extension("/DATA/ABC.IFS", ".ifs"));
        assert!(!has_extension("/data/other.bin", ".ifs"));
        assert!(!has_extension("ifs", ".ifs"));
        assert!(!has_extension("/data/abc.ifs", ""));
    }

    #[test]
    fn test_join_mount() {
        assert_eq!(join_mount("mnt1", "root1", "/"), "mnt1/root1");
    }

    #[test]
    fn test_parse_hex_base() {
        assert_eq!(parse_base_address("base=0x1000", "base="), Some(BufferAddr(0x1000)));
        assert_eq!(
            parse_base_address("size=12,base=0X7FFe0010,mode=ro", "base="),
            Some(BufferAddr(0x7ffe0010))
        );
    }

    #[test]
    fn test_parse_decimal_and_octal_base() {
        assert_eq!(parse_base_address("base=4096", "base="), Some(BufferAddr(4096)));
        assert_eq!(parse_base_address("base=010", "base="), Some(BufferAddr(8)));
        assert_eq!(parse_base_address("base=0", "base="), Some(BufferAddr(0)));
    }

    #[test]
    fn test_parse_stops_at_non_digit() {
        assert_eq!(parse_base_address("base=123,size=4", "base="), Some(BufferAddr(123)));
        assert_eq!(parse_base_address("base=0xzz", "base="), Some(BufferAddr(0)));
        assert_eq!(parse_base_address("base=", "base="), Some(BufferAddr(0)));
    }

    #[test]
    fn test_parse_skips_only_c_whitespace() {
        assert_eq!(parse_base_address("base= \t0x20", "base="), Some(BufferAddr(0x20)));
        assert_eq!(parse_base_address("base=\x0B16", "base="), Some(BufferAddr(16)));
        // U+00A0 is not C whitespace, so no digits follow the token
        assert_eq!(parse_base_address("base=\u{a0}0x20", "base="), Some(BufferAddr(0)));
    }

    #[test]
    fn test_parse_sign() {
        assert_eq!(parse_base_address("base=+0x40", "base="), Some(BufferAddr(0x40)));
        assert_eq!(parse_base_address("base=-1", "base="), Some(BufferAddr(u64::MAX)));
        assert_eq!(parse_base_address("base=-0x10", "base="), Some(BufferAddr(0u64.wrapping_sub(0x10))));
        assert_eq!(parse_base_address("base=+", "base="), Some(BufferAddr(0)));
    }

    #[test]
    fn test_parse_missing_token() {
        assert_eq!(parse_base_address("", "base="), None);
        assert_eq!(parse_base_address("size=4", "base="), None);
    }

    #[test]
    fn test_parse_saturates() {
        assert_eq!(
            parse_base_address("base=0xffffffffffffffffff", "base="),
            Some(BufferAddr(u64::MAX))
        );
    }
}
