// libs/availability-cell/src/services/completion.rs
use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::error::SchedulingError;
use crate::models::{
    AvailabilityException, CompletionEstimate, ResolvedDayHours, WeeklyOperatingHours,
};
use crate::services::hours::resolve_day_hours;
use crate::services::time::{format_minutes_to_time, parse_time_to_minutes};

/// Bound on the day-rollover walk. The `NoOperatingCapacity` pre-check rules
/// out a weekly pattern with no open day; the cap keeps an exception-riddled
/// calendar from walking forever.
pub const DEFAULT_MAX_WALK_DAYS: u32 = 3650;

pub struct CompletionCalculator {
    max_walk_days: u32,
}

impl CompletionCalculator {
    pub fn new() -> Self {
        Self {
            max_walk_days: DEFAULT_MAX_WALK_DAYS,
        }
    }

    pub fn with_max_walk_days(max_walk_days: u32) -> Self {
        Self { max_walk_days }
    }

    /// Walk forward day by day, consuming each day's open capacity until the
    /// whole duration fits, skipping closed days without counting them.
    ///
    /// Only the first consumed day honors the requested start clock time;
    /// every later day starts at its opening time. The returned `end_time`
    /// is the finish clock time on `completion_date` — for multi-day work a
    /// different value from the appointment's start-day-relative
    /// `scheduled_end_time`, and the two must not be confused.
    pub fn calculate_completion(
        &self,
        start_date: NaiveDate,
        start_time: &str,
        total_duration_hours: f64,
        hours: &WeeklyOperatingHours,
        exceptions: &[AvailabilityException],
    ) -> Result<CompletionEstimate, SchedulingError> {
        hours.validate()?;
        if total_duration_hours <= 0.0 {
            return Err(SchedulingError::InvalidDuration {
                hours: total_duration_hours,
            });
        }
        if !hours.has_open_day() {
            return Err(SchedulingError::NoOperatingCapacity);
        }

        let requested_start_minutes = parse_time_to_minutes(start_time)?;
        let mut current_date = start_date;
        let mut remaining_hours = total_duration_hours;
        let mut work_days: u32 = 0;
        let mut honor_requested_start = true;

        for _ in 0..self.max_walk_days {
            let (open_minutes, close_minutes) =
                match resolve_day_hours(hours, exceptions, current_date)? {
                    ResolvedDayHours::Closed => {
                        current_date += Duration::days(1);
                        honor_requested_start = false;
                        continue;
                    }
                    ResolvedDayHours::Open {
                        open_minutes,
                        close_minutes,
                    } => (open_minutes, close_minutes),
                };

            let effective_start = if work_days == 0 && honor_requested_start {
                requested_start_minutes
            } else {
                open_minutes
            };

            // A start at or past close consumes nothing; skip the day like a
            // closed one rather than counting an empty work day.
            if effective_start >= close_minutes {
                current_date += Duration::days(1);
                honor_requested_start = false;
                continue;
            }

            let available_hours_today = f64::from(close_minutes - effective_start) / 60.0;

            if remaining_hours <= available_hours_today {
                let end_minutes =
                    i64::from(effective_start) + (remaining_hours * 60.0).round() as i64;
                work_days += 1;
                debug!(
                    "Service completes on {} after {} working day(s)",
                    current_date, work_days
                );
                return Ok(CompletionEstimate {
                    completion_date: current_date,
                    end_time: format_minutes_to_time(end_minutes),
                    work_days,
                    is_multi_day: work_days > 1,
                });
            }

            remaining_hours -= available_hours_today;
            work_days += 1;
            current_date += Duration::days(1);
            honor_requested_start = false;
        }

        warn!(
            "Completion walk from {} exceeded {} days",
            start_date, self.max_walk_days
        );
        Err(SchedulingError::InternalInvariantViolation(format!(
            "completion walk exceeded {} days",
            self.max_walk_days
        )))
    }
}
