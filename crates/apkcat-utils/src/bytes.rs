/// Number of bytes in one mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// Formats a number of bytes into a human-readable string.
///
/// This method converts a byte count into a string with appropriate units (B, KiB, MiB, etc.)
/// and a specified level of precision.
///
/// # Example
///
/// ```
/// use apkcat_utils::bytes::format_bytes;
///
/// let bytes = 1024_u64.pow(2);
/// let formatted = format_bytes(bytes, 2);
///
/// assert_eq!(formatted, "1.00 MiB");
/// ```
pub fn format_bytes(bytes: u64, precision: usize) -> String {
    let unit = 1024.0;
    let sizes = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

    let idx = (bytes as f64).log(unit).floor() as usize;
    let idx = idx.min(sizes.len() - 1);

    format!(
        "{:.*} {}",
        precision,
        bytes as f64 / unit.powi(idx as i32),
        sizes[idx]
    )
}

/// Parses the leading decimal digits of a size field.
///
/// Index size fields are plain decimal strings, but nothing guarantees it. Parsing stops at
/// the first non-digit; a field without leading digits (or an empty one) yields `0`, and a
/// value that does not fit in a `u64` saturates.
///
/// # Example
///
/// ```
/// use apkcat_utils::bytes::parse_size;
///
/// assert_eq!(parse_size("2048"), 2048);
/// assert_eq!(parse_size("12kb"), 12);
/// assert_eq!(parse_size("n/a"), 0);
/// ```
pub fn parse_size(value: &str) -> u64 {
    value
        .trim_start()
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u64, |acc, digit| {
            acc.saturating_mul(10)
                .saturating_add(u64::from(digit - b'0'))
        })
}

/// Floors a byte count to whole mebibytes.
///
/// ```
/// use apkcat_utils::bytes::whole_mib;
///
/// assert_eq!(whole_mib(2048), 0);
/// assert_eq!(whole_mib(3 * 1024 * 1024 + 1), 3);
/// ```
pub fn whole_mib(bytes: u64) -> u64 {
    bytes / 1024 / 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_with_precisions() {
        assert_eq!(format_bytes(1111, 0), "1 KiB");

        assert_eq!(format_bytes(0, 0), "0 B");
        assert_eq!(format_bytes(1023, 0), "1023 B");
        assert_eq!(format_bytes(1023, 2), "1023.00 B");

        assert_eq!(format_bytes(1024, 0), "1 KiB");
        assert_eq!(format_bytes(1536, 2), "1.50 KiB");
        assert_eq!(format_bytes(2048, 4), "2.0000 KiB");

        assert_eq!(format_bytes(MIB, 0), "1 MiB");
        assert_eq!(format_bytes(3 * MIB / 2, 2), "1.50 MiB");

        assert_eq!(format_bytes(1024_u64.pow(3), 2), "1.00 GiB");
        assert_eq!(format_bytes(5 * 1024_u64.pow(3) / 2, 1), "2.5 GiB");
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0"), 0);
        assert_eq!(parse_size("1024"), 1024);
        assert_eq!(parse_size(" 120"), 120);
        assert_eq!(parse_size("120 "), 120);
        assert_eq!(parse_size("42abc"), 42);
        assert_eq!(parse_size("1.5"), 1);
    }

    #[test]
    fn test_parse_size_garbage_is_zero() {
        assert_eq!(parse_size(""), 0);
        assert_eq!(parse_size("   "), 0);
        assert_eq!(parse_size("abc"), 0);
        assert_eq!(parse_size("-5"), 0);
    }

    #[test]
    fn test_parse_size_saturates() {
        assert_eq!(parse_size("99999999999999999999999999"), u64::MAX);
    }

    #[test]
    fn test_whole_mib() {
        assert_eq!(whole_mib(0), 0);
        assert_eq!(whole_mib(MIB - 1), 0);
        assert_eq!(whole_mib(MIB), 1);
        assert_eq!(whole_mib(5 * MIB + MIB / 2), 5);
    }
}
