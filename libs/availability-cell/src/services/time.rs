// libs/availability-cell/src/services/time.rs
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::SchedulingError;

pub const MINUTES_PER_DAY: i64 = 1440;

/// Parse a 24-hour `HH:MM` wall-clock string into minutes since midnight.
pub fn parse_time_to_minutes(value: &str) -> Result<u32, SchedulingError> {
    let invalid = || SchedulingError::InvalidTimeFormat {
        value: value.to_string(),
    };

    let (hours_part, minutes_part) = value.split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours_part.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes_part.parse().map_err(|_| invalid())?;

    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(hours * 60 + minutes)
}

/// Format minutes-of-day as zero-padded `HH:MM`. The value is wrapped modulo
/// 24h first, so offsets past midnight come out on the clock face.
pub fn format_minutes_to_time(minutes: i64) -> String {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

/// Add a fractional-hour duration to a wall-clock time, wrapping at 24h.
/// Same-day display arithmetic only; anything that can cross a day boundary
/// belongs to the completion calculator.
pub fn add_hours(time: &str, hours: f64) -> Result<String, SchedulingError> {
    let start = parse_time_to_minutes(time)? as i64;
    let offset = (hours * 60.0).round() as i64;
    Ok(format_minutes_to_time(start + offset))
}

/// Combine a calendar date with an `HH:MM` wall-clock time. All date-times in
/// this engine are naive: a single implicit local zone.
pub fn at_wall_clock(date: NaiveDate, time: &str) -> Result<NaiveDateTime, SchedulingError> {
    let minutes = parse_time_to_minutes(time)?;
    let time_of_day = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).ok_or_else(|| {
        SchedulingError::InvalidTimeFormat {
            value: time.to_string(),
        }
    })?;
    Ok(NaiveDateTime::new(date, time_of_day))
}
