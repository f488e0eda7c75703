// libs/availability-cell/src/services/availability.rs
use chrono::NaiveDate;
use tracing::debug;

use crate::error::SchedulingError;
use crate::models::{
    AvailabilityException, BookedAppointment, ResolvedDayHours, TimeSlot, WeeklyOperatingHours,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::hours::resolve_day_hours;
use crate::services::time::format_minutes_to_time;

/// Start-time search granularity once a request no longer fits in one day.
const MULTI_DAY_INCREMENT_MINUTES: u32 = 60;

pub struct AvailabilityService {
    conflict_service: ConflictDetectionService,
}

impl AvailabilityService {
    pub fn new() -> Self {
        Self {
            conflict_service: ConflictDetectionService::new(),
        }
    }

    /// Generate the ordered slot grid for one date.
    ///
    /// A request that fits the day steps by its own duration and each slot
    /// spans that duration (truncated at close). A request exceeding the
    /// day's open capacity turns the grid into an hourly start-time search:
    /// each slot then displays at most a one-hour window whose end time is
    /// NOT the real completion time of the multi-day service. The completion
    /// calculator owns the real finish date and time; the one-hour windows
    /// are a display contract the booking UI depends on.
    ///
    /// Availability is a start-instant check against the booked windows, so
    /// a slot is marked "Booked" only when its start falls inside a committed
    /// interval.
    pub fn generate_slots(
        &self,
        hours: &WeeklyOperatingHours,
        exceptions: &[AvailabilityException],
        date: NaiveDate,
        booked: &[BookedAppointment],
        requested_duration_hours: f64,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        hours.validate()?;

        let requested_minutes = (requested_duration_hours * 60.0).round();
        if requested_duration_hours <= 0.0 || requested_minutes < 1.0 {
            return Err(SchedulingError::InvalidDuration {
                hours: requested_duration_hours,
            });
        }
        let requested_minutes = requested_minutes as u32;

        let (open_minutes, close_minutes) = match resolve_day_hours(hours, exceptions, date)? {
            ResolvedDayHours::Closed => {
                debug!("No slots on {}: workshop closed", date);
                return Ok(vec![]);
            }
            ResolvedDayHours::Open {
                open_minutes,
                close_minutes,
            } => (open_minutes, close_minutes),
        };

        if open_minutes >= close_minutes {
            return Ok(vec![]);
        }

        let daily_capacity_minutes = close_minutes - open_minutes;
        let (increment, display_minutes) = if requested_minutes > daily_capacity_minutes {
            (MULTI_DAY_INCREMENT_MINUTES, MULTI_DAY_INCREMENT_MINUTES)
        } else {
            (requested_minutes, requested_minutes)
        };

        let mut slots = Vec::new();
        let mut start = open_minutes;
        while start < close_minutes {
            let end = (start + display_minutes).min(close_minutes);
            let booked_start = self
                .conflict_service
                .is_start_time_booked(start, date, booked)?;

            slots.push(TimeSlot {
                date,
                start_time: format_minutes_to_time(start as i64),
                end_time: format_minutes_to_time(end as i64),
                is_available: !booked_start,
                reason: booked_start.then(|| "Booked".to_string()),
            });

            start += increment;
        }

        debug!(
            "Generated {} slots on {} ({} available)",
            slots.len(),
            date,
            slots.iter().filter(|s| s.is_available).count()
        );
        Ok(slots)
    }
}
