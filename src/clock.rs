//! Transit clock arithmetic.
//!
//! Schedules encode post-midnight trips with hours >= 24 so that chronological
//! ordering and duration arithmetic stay monotonic across a service day
//! without date objects. Internal arithmetic keeps the unbounded hour; only
//! display output folds it back into 0-23.

use crate::error::FormatError;

/// A negative wait larger than this is treated as a same-service-day notation
/// mismatch and corrected by one day. Policy constant, not a domain law: the
/// assumption is that no real transfer waits 16+ hours within one service day.
pub const WRAP_THRESHOLD_MINUTES: i64 = 1000;

const MINUTES_PER_DAY: i64 = 1440;

/// Parse `HH:MM[:SS]` into minutes since the start of the service day.
///
/// Hours are unbounded upward (`25:10` parses to 1510) but never negative;
/// minutes and seconds must fall in 0-59. Seconds are validated but do not
/// contribute to the minute count.
pub fn parse_clock(s: &str) -> Result<i64, FormatError> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 2 {
        return Err(FormatError::TooFewFields { value: s.to_string() });
    }

    // Digits only: a sign would smuggle a negative field past the invariant
    let field = |p: &str| {
        let p = p.trim();
        if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FormatError::NonNumeric { value: s.to_string() });
        }
        p.parse::<i64>().map_err(|_| FormatError::NonNumeric {
            value: s.to_string(),
        })
    };

    let hours = field(parts[0])?;
    let minutes = field(parts[1])?;
    if minutes > 59 {
        return Err(FormatError::OutOfRange { value: s.to_string() });
    }
    for extra in &parts[2..] {
        if field(extra)? > 59 {
            return Err(FormatError::OutOfRange { value: s.to_string() });
        }
    }

    Ok(hours * 60 + minutes)
}

/// Fold an unbounded service-day hour into the 0-23 range for display.
pub fn normalize_display_hour(hours: i64) -> i64 {
    hours.rem_euclid(24)
}

/// Minutes a rider waits between arriving at `arrival` and departing at
/// `departure`.
///
/// When the raw difference is negative beyond [`WRAP_THRESHOLD_MINUTES`], the
/// departure was given in same-day notation for a next-day time and one day
/// is added back. Returns `None` when either side fails to parse; callers
/// display "N/A".
pub fn wait_minutes(arrival: &str, departure: &str) -> Option<i64> {
    let arr = parse_clock(arrival).ok()?;
    let dep = parse_clock(departure).ok()?;

    let mut diff = dep - arr;
    if diff < -WRAP_THRESHOLD_MINUTES {
        diff += MINUTES_PER_DAY;
    }
    Some(diff)
}

/// Render a clock string as `HH:MM` with the hour normalized for display.
/// Unparseable input renders as "N/A".
pub fn format_display(s: &str) -> String {
    let Ok(total) = parse_clock(s) else {
        return "N/A".to_string();
    };
    let hours = normalize_display_hour(total / 60);
    let minutes = total % 60;
    format!("{:02}:{:02}", hours, minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_and_three_field_forms() {
        assert_eq!(parse_clock("08:30").unwrap(), 510);
        assert_eq!(parse_clock("08:30:45").unwrap(), 510);
        assert_eq!(parse_clock("00:00:00").unwrap(), 0);
    }

    #[test]
    fn extended_hours_stay_monotonic() {
        // 25:10 is the next service day's 01:10 and must order after 23:55
        assert_eq!(parse_clock("25:10").unwrap(), 1510);
        assert!(parse_clock("23:55").unwrap() < parse_clock("24:05").unwrap());
        assert!(parse_clock("24:05").unwrap() < parse_clock("25:10").unwrap());
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(matches!(
            parse_clock("8"),
            Err(FormatError::TooFewFields { .. })
        ));
        assert!(matches!(
            parse_clock("eight:30"),
            Err(FormatError::NonNumeric { .. })
        ));
        assert!(matches!(
            parse_clock("08:30:xx"),
            Err(FormatError::NonNumeric { .. })
        ));
    }

    #[test]
    fn rejects_signed_and_out_of_range_fields() {
        // A signed field would break the hours >= 0 invariant and let
        // nonsense like "20:-30" reach the display layer
        assert!(matches!(
            parse_clock("-5:30"),
            Err(FormatError::NonNumeric { .. })
        ));
        assert!(matches!(
            parse_clock("20:-30"),
            Err(FormatError::NonNumeric { .. })
        ));
        assert!(matches!(
            parse_clock("+5:30"),
            Err(FormatError::NonNumeric { .. })
        ));
        assert!(matches!(
            parse_clock("08:60"),
            Err(FormatError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_clock("08:30:61"),
            Err(FormatError::OutOfRange { .. })
        ));
        assert_eq!(format_display("20:-30"), "N/A");
        assert_eq!(wait_minutes("-1:00", "08:00"), None);
    }

    #[test]
    fn display_hour_wraps_at_midnight() {
        assert_eq!(normalize_display_hour(8), 8);
        assert_eq!(normalize_display_hour(24), 0);
        assert_eq!(normalize_display_hour(26), 2);
    }

    #[test]
    fn wait_applies_wrap_only_past_threshold() {
        // Next-day departure written in same-day notation: -1430 raw, +1440
        assert_eq!(wait_minutes("23:55", "00:05"), Some(10));
        // A small negative gap is a rounding artifact and stays negative
        assert_eq!(wait_minutes("08:10", "08:05"), Some(-5));
        assert_eq!(wait_minutes("08:40:00", "08:47:00"), Some(7));
    }

    #[test]
    fn wait_is_unknown_for_unparseable_input() {
        assert_eq!(wait_minutes("bogus", "08:00"), None);
        assert_eq!(wait_minutes("08:00", ""), None);
    }

    #[test]
    fn wrapped_forward_waits_land_in_one_day() {
        for (arr, dep) in [("23:59", "00:01"), ("23:30", "04:00"), ("12:00", "12:00")] {
            let w = wait_minutes(arr, dep).unwrap();
            assert!((0..MINUTES_PER_DAY).contains(&w), "{arr}->{dep} gave {w}");
        }
    }

    #[test]
    fn display_formatting_normalizes_and_degrades() {
        assert_eq!(format_display("08:00:00"), "08:00");
        assert_eq!(format_display("25:10"), "01:10");
        assert_eq!(format_display("not a time"), "N/A");
    }
}
