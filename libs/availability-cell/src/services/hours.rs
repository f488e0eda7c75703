// libs/availability-cell/src/services/hours.rs
use chrono::NaiveDate;
use tracing::debug;

use crate::error::SchedulingError;
use crate::models::{
    AvailabilityException, ExceptionKind, ResolvedDayHours, Weekday, WeeklyOperatingHours,
};
use crate::services::time::parse_time_to_minutes;

/// Resolve the effective open window for a single date. A matching exception
/// supersedes the weekly pattern: closed/holiday makes the date fully
/// unavailable, modified hours replace the open window for that date only.
pub fn resolve_day_hours(
    hours: &WeeklyOperatingHours,
    exceptions: &[AvailabilityException],
    date: NaiveDate,
) -> Result<ResolvedDayHours, SchedulingError> {
    if let Some(exception) = exceptions.iter().find(|e| e.date == date) {
        debug!(
            "Availability exception on {}: {:?} ({})",
            date,
            exception.kind,
            exception.reason.as_deref().unwrap_or("no reason given")
        );
        return match exception.kind {
            ExceptionKind::Closed | ExceptionKind::Holiday => Ok(ResolvedDayHours::Closed),
            ExceptionKind::ModifiedHours => {
                let modified = exception
                    .modified_hours
                    .as_ref()
                    .ok_or(SchedulingError::InvalidAvailabilityException { date })?;
                let open_minutes = parse_time_to_minutes(&modified.start)?;
                let close_minutes = parse_time_to_minutes(&modified.end)?;
                if close_minutes < open_minutes {
                    return Err(SchedulingError::InvalidAvailabilityException { date });
                }
                Ok(ResolvedDayHours::Open {
                    open_minutes,
                    close_minutes,
                })
            }
        };
    }

    let pattern = hours.for_weekday(Weekday::from_date(date));
    if pattern.closed {
        return Ok(ResolvedDayHours::Closed);
    }

    Ok(ResolvedDayHours::Open {
        open_minutes: parse_time_to_minutes(&pattern.open)?,
        close_minutes: parse_time_to_minutes(&pattern.close)?,
    })
}
