// libs/appointment-cell/src/services/slot_time.rs
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static DISPLAY_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2}):(\d{2})\s*(AM|PM)\s*$")
        .expect("DISPLAY_TIME pattern is valid")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid time format: {input:?}")]
pub struct FormatError {
    pub input: String,
}

impl FormatError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// Athena's zero-padded 24-hour `HH:MM` to the `H:MM AM/PM` shown to patients.
pub fn to_display(wire: &str) -> Result<String, FormatError> {
    let (hour, minute) = parse_wire(wire).ok_or_else(|| FormatError::new(wire))?;

    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };

    Ok(format!("{}:{:02} {}", display_hour, minute, suffix))
}

/// `H:MM AM/PM` (any case, optional space before the suffix) back to `HH:MM`.
pub fn to_wire(display: &str) -> Result<String, FormatError> {
    let caps = DISPLAY_TIME
        .captures(display)
        .ok_or_else(|| FormatError::new(display))?;

    let hour: u8 = caps[1].parse().map_err(|_| FormatError::new(display))?;
    let minute: u8 = caps[2].parse().map_err(|_| FormatError::new(display))?;

    if !(1..=12).contains(&hour) || minute > 59 {
        return Err(FormatError::new(display));
    }

    let is_pm = caps[3].eq_ignore_ascii_case("PM");
    let hour = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };

    Ok(format!("{:02}:{:02}", hour, minute))
}

fn parse_wire(wire: &str) -> Option<(u8, u8)> {
    let (hour, minute) = wire.trim().split_once(':')?;

    let valid_hour = hour.len() == 2 && hour.bytes().all(|b| b.is_ascii_digit());
    let valid_minute = minute.len() == 2 && minute.bytes().all(|b| b.is_ascii_digit());
    if !valid_hour || !valid_minute {
        return None;
    }

    let hour: u8 = hour.parse().ok()?;
    let minute: u8 = minute.parse().ok()?;

    (hour <= 23 && minute <= 59).then_some((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_display() {
        assert_eq!(to_display("00:00").unwrap(), "12:00 AM");
        assert_eq!(to_display("09:05").unwrap(), "9:05 AM");
        assert_eq!(to_display("11:59").unwrap(), "11:59 AM");
        assert_eq!(to_display("12:00").unwrap(), "12:00 PM");
        assert_eq!(to_display("14:30").unwrap(), "2:30 PM");
        assert_eq!(to_display("23:45").unwrap(), "11:45 PM");
    }

    #[test]
    fn test_to_wire() {
        assert_eq!(to_wire("12:00 AM").unwrap(), "00:00");
        assert_eq!(to_wire("9:05 AM").unwrap(), "09:05");
        assert_eq!(to_wire("12:15 PM").unwrap(), "12:15");
        assert_eq!(to_wire("2:30 PM").unwrap(), "14:30");
        assert_eq!(to_wire("2:30pm").unwrap(), "14:30");
        assert_eq!(to_wire("  11:45 Pm ").unwrap(), "23:45");
    }

    #[test]
    fn test_every_minute_of_the_day_round_trips() {
        for hour in 0..24 {
            for minute in 0..60 {
                let wire = format!("{:02}:{:02}", hour, minute);
                let display = to_display(&wire).unwrap();
                assert_eq!(to_wire(&display).unwrap(), wire);
                assert_eq!(to_display(&to_wire(&display).unwrap()).unwrap(), display);
            }
        }
    }

    #[test]
    fn test_to_wire_rejects_malformed_input() {
        for input in ["2:30", "14:30", "2:60 PM", "0:15 AM", "13:00 PM", "2:3 PM", "two PM", ""] {
            assert_eq!(to_wire(input), Err(FormatError::new(input)), "{input}");
        }
    }

    #[test]
    fn test_to_display_rejects_malformed_input() {
        for input in ["24:00", "12:60", "9", "9:5", "9:05", "0:00", "ab:cd", "123:00"] {
            assert!(to_display(input).is_err(), "{input}");
        }
    }
}
