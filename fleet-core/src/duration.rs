use std::fmt::Write;

use jiff::SignedDuration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Renders a duration the conventional way: `"1.5s"`, `"250ms"`, `"1m30s"`,
/// `"2h0m5.25s"`.
///
/// Sub-second values use the coarsest of `ns`, `µs` and `ms` with a non-zero
/// integer part. From one second up, hours and minutes lead and the seconds
/// carry the fraction. Trailing fractional zeros are dropped.
pub fn format_duration(duration: SignedDuration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_owned();
    }

    let mut out = String::new();
    if nanos < 0 {
        out.push('-');
    }

    let magnitude = nanos.unsigned_abs();

    if magnitude < NANOS_PER_SECOND {
        let (digits, unit) = if magnitude < NANOS_PER_MICRO {
            (0, "ns")
        } else if magnitude < NANOS_PER_MILLI {
            (3, "µs")
        } else {
            (6, "ms")
        };

        let (whole, fraction) = split_fraction(magnitude, digits);
        let _ = write!(out, "{whole}{fraction}{unit}");
        return out;
    }

    let (total_seconds, fraction) = split_fraction(magnitude, 9);
    let seconds = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let minutes = total_minutes % 60;
    let hours = total_minutes / 60;

    if hours > 0 {
        let _ = write!(out, "{hours}h{minutes}m");
    } else if minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }

    let _ = write!(out, "{seconds}{fraction}s");
    out
}

/// Splits `value` into its integer part and a `.xyz` fraction of at most
/// `digits` digits. An all-zero fraction is omitted.
fn split_fraction(value: u128, digits: u32) -> (u128, String) {
    let scale = 10u128.pow(digits);
    let whole = value / scale;
    let remainder = value % scale;

    if remainder == 0 {
        return (whole, String::new());
    }

    let padded = format!("{remainder:0width$}", width = digits as usize);
    (whole, format!(".{}", padded.trim_end_matches('0')))
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;

    use super::format_duration;

    fn nanos(n: i64) -> String {
        format_duration(SignedDuration::from_nanos(n))
    }

    #[test]
    fn zero() {
        assert_eq!(format_duration(SignedDuration::ZERO), "0s");
    }

    #[test]
    fn sub_second_units() {
        assert_eq!(nanos(1), "1ns");
        assert_eq!(nanos(999), "999ns");
        assert_eq!(nanos(1_500), "1.5µs");
        assert_eq!(nanos(250_000_000), "250ms");
        assert_eq!(nanos(1_234_567), "1.234567ms");
    }

    #[test]
    fn seconds_and_above() {
        assert_eq!(nanos(1_500_000_000), "1.5s");
        assert_eq!(format_duration(SignedDuration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(SignedDuration::from_secs(3600)), "1h0m0s");
        assert_eq!(
            format_duration(SignedDuration::from_secs(5 * 60 + 10) + SignedDuration::from_nanos(123_456_789)),
            "5m10.123456789s"
        );
        assert_eq!(
            format_duration(SignedDuration::from_secs(2 * 3600 + 5) + SignedDuration::from_millis(250)),
            "2h0m5.25s"
        );
    }

    #[test]
    fn negative() {
        assert_eq!(nanos(-1_500_000_000), "-1.5s");
        assert_eq!(nanos(-3), "-3ns");
    }
}
