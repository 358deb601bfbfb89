use thiserror::Error;

/// Error produced when an "HH:MM" time-of-day string cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("malformed time of day {0:?}, expected \"HH:MM\"")]
    Malformed(String),

    #[error("time of day {0:?} is out of range")]
    OutOfRange(String),

    #[error("time of day {0:?} is not on a half-hour boundary")]
    NotHalfHour(String),
}

/// Parses an "HH:MM" string into fractional hours since midnight.
///
/// Shop hours are half-hour granular, so minutes must be 00 or 30
/// (e.g. "08:30" -> 8.5).
pub fn parse_hhmm(value: &str) -> Result<f64, TimeParseError> {
    let (hours, minutes) = value
        .split_once(':')
        .ok_or_else(|| TimeParseError::Malformed(value.to_string()))?;

    let hours: u32 = hours
        .parse()
        .map_err(|_| TimeParseError::Malformed(value.to_string()))?;
    let minutes: u32 = minutes
        .parse()
        .map_err(|_| TimeParseError::Malformed(value.to_string()))?;

    if hours > 23 || minutes > 59 {
        return Err(TimeParseError::OutOfRange(value.to_string()));
    }
    if minutes % 30 != 0 {
        return Err(TimeParseError::NotHalfHour(value.to_string()));
    }

    Ok(f64::from(hours) + f64::from(minutes) / 60.0)
}

/// Formats fractional hours since midnight back into "HH:MM".
pub fn format_hhmm(time: f64) -> String {
    let hours = time as u32;
    let minutes = ((time - f64::from(hours)) * 60.0).round() as u32;
    format!("{hours:02}:{minutes:02}")
}

/// Scales fractional hours by ten into an integer, the unit the
/// optimization model works in.
pub fn to_tenths(hours: f64) -> i64 {
    (hours * 10.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_half_hour_times() {
        assert_eq!(parse_hhmm("08:30"), Ok(8.5));
        assert_eq!(parse_hhmm("21:00"), Ok(21.0));
        assert_eq!(parse_hhmm("00:00"), Ok(0.0));
    }

    #[test]
    fn formatting_round_trips() {
        for half_hours in 0..48 {
            let time = f64::from(half_hours) * 0.5;
            assert_eq!(parse_hhmm(&format_hhmm(time)), Ok(time));
        }
    }

    #[test]
    fn rejects_malformed_strings() {
        assert_eq!(
            parse_hhmm("830"),
            Err(TimeParseError::Malformed("830".to_string()))
        );
        assert_eq!(
            parse_hhmm("ab:cd"),
            Err(TimeParseError::Malformed("ab:cd".to_string()))
        );
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            parse_hhmm("24:00"),
            Err(TimeParseError::OutOfRange("24:00".to_string()))
        );
        assert_eq!(
            parse_hhmm("08:61"),
            Err(TimeParseError::OutOfRange("08:61".to_string()))
        );
    }

    #[test]
    fn rejects_sub_half_hour_granularity() {
        assert_eq!(
            parse_hhmm("08:15"),
            Err(TimeParseError::NotHalfHour("08:15".to_string()))
        );
    }

    #[test]
    fn scales_hours_to_tenths() {
        assert_eq!(to_tenths(9.5), 95);
        assert_eq!(to_tenths(5.5), 55);
        assert_eq!(to_tenths(0.0), 0);
    }
}
