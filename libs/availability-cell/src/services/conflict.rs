use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::SchedulingError;
use crate::models::BookedAppointment;
use crate::services::time::{format_minutes_to_time, parse_time_to_minutes};

pub struct ConflictDetectionService;

impl ConflictDetectionService {
    pub fn new() -> Self {
        Self
    }

    /// Whether a candidate start instant falls inside any booked window on
    /// the given date, i.e. `start <= candidate < end` for some booking.
    ///
    /// The check is start-instant only: a candidate slot that merely runs
    /// past the start of a later booking is not flagged here. Callers relying
    /// on full-interval semantics must not assume them from this method.
    pub fn is_start_time_booked(
        &self,
        candidate_start_minutes: u32,
        date: NaiveDate,
        existing: &[BookedAppointment],
    ) -> Result<bool, SchedulingError> {
        for appointment in existing.iter().filter(|a| a.scheduled_date == date) {
            let start = parse_time_to_minutes(&appointment.scheduled_start_time)?;
            let end = parse_time_to_minutes(&appointment.scheduled_end_time)?;
            if start <= candidate_start_minutes && candidate_start_minutes < end {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Commit-time guard: re-check a candidate start against the freshest
    /// snapshot of bookings immediately before persisting. A conflict here is
    /// retryable; the calling layer re-fetches availability and re-prompts
    /// instead of failing hard.
    pub fn ensure_start_available(
        &self,
        candidate_start_minutes: u32,
        date: NaiveDate,
        existing: &[BookedAppointment],
    ) -> Result<(), SchedulingError> {
        let start_time = format_minutes_to_time(candidate_start_minutes as i64);
        debug!("Re-checking availability of {} on {}", start_time, date);

        if self.is_start_time_booked(candidate_start_minutes, date, existing)? {
            warn!("Conflict detected for {} on {}", start_time, date);
            return Err(SchedulingError::ConflictDetected { date, start_time });
        }

        Ok(())
    }
}
