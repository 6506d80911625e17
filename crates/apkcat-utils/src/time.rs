use std::time::Duration;

/// Parses a compound duration string such as `30s`, `2m` or `1h30m`.
///
/// Each component is a run of digits followed by one of the units `ms`, `s`, `m`, `h` or
/// `d`. Components may be repeated and are summed.
///
/// # Returns
/// The parsed [`Duration`], or `None` if the input is empty, has a component without a
/// unit, uses an unknown unit, or overflows.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use apkcat_utils::time::parse_duration;
///
/// assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
/// assert_eq!(parse_duration("soon"), None);
/// ```
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let mut total_ms: u64 = 0;
    let mut rest = input;

    while !rest.is_empty() {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let number: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest.bytes().take_while(u8::is_ascii_alphabetic).count();
        let multiplier: u64 = match &rest[..unit_len] {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60 * 1_000,
            "h" => 60 * 60 * 1_000,
            "d" => 24 * 60 * 60 * 1_000,
            _ => return None,
        };
        rest = &rest[unit_len..];

        total_ms = total_ms.checked_add(number.checked_mul(multiplier)?)?;
    }

    Some(Duration::from_millis(total_ms))
}
