// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{Duration, NaiveDateTime};
use tracing::{info, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, StatusHistoryEntry};

/// A scheduled appointment may be started up to one hour before its start;
/// it may be marked no-show only once more than two hours past it. The
/// asymmetry is standing business policy, not an accident.
const START_EARLY_WINDOW_HOURS: i64 = 1;
const NO_SHOW_GRACE_HOURS: i64 = 2;

/// Single-day work this long past its scheduled end is presumed finished.
const AUTO_COMPLETE_GRACE_MINUTES: i64 = 30;

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Whether the state machine permits `current -> target` at `now`.
    pub fn can_transition(
        &self,
        current: AppointmentStatus,
        target: AppointmentStatus,
        now: NaiveDateTime,
        scheduled_start: NaiveDateTime,
    ) -> bool {
        self.validate_transition(current, target, now, scheduled_start)
            .is_ok()
    }

    /// Validate a requested transition, reporting the edge and the unmet
    /// guard when it is rejected.
    pub fn validate_transition(
        &self,
        current: AppointmentStatus,
        target: AppointmentStatus,
        now: NaiveDateTime,
        scheduled_start: NaiveDateTime,
    ) -> Result<(), AppointmentError> {
        use AppointmentStatus::*;

        let rejected = |guard: &str| {
            warn!(
                "Rejected status transition {} -> {}: {}",
                current, target, guard
            );
            Err(AppointmentError::TransitionNotAllowed {
                from: current,
                to: target,
                guard: guard.to_string(),
            })
        };

        match (current, target) {
            (Requested, Confirmed) | (Confirmed, Scheduled) | (InProgress, Completed) => Ok(()),
            (Requested, Cancelled) | (Confirmed, Cancelled) | (Scheduled, Cancelled) => Ok(()),
            (Scheduled, InProgress) => {
                if now >= scheduled_start - Duration::hours(START_EARLY_WINDOW_HOURS) {
                    Ok(())
                } else {
                    rejected("start window opens one hour before the scheduled time")
                }
            }
            (Scheduled, NoShow) => {
                if now > scheduled_start + Duration::hours(NO_SHOW_GRACE_HOURS) {
                    Ok(())
                } else {
                    rejected("no-show requires more than two hours past the scheduled start")
                }
            }
            _ => rejected("no such edge in the appointment lifecycle"),
        }
    }

    /// All targets reachable from `current`, ignoring the time guards.
    pub fn valid_transitions(&self, current: AppointmentStatus) -> Vec<AppointmentStatus> {
        use AppointmentStatus::*;
        match current {
            Requested => vec![Confirmed, Cancelled],
            Confirmed => vec![Scheduled, Cancelled],
            Scheduled => vec![InProgress, NoShow, Cancelled],
            InProgress => vec![Completed],
            // Terminal states
            Completed | Cancelled | NoShow => vec![],
        }
    }

    /// Apply a validated transition, appending exactly one history entry.
    pub fn apply_transition(
        &self,
        appointment: &mut Appointment,
        target: AppointmentStatus,
        now: NaiveDateTime,
        changed_by: &str,
        reason: Option<String>,
    ) -> Result<(), AppointmentError> {
        let scheduled_start = appointment.scheduled_start()?;
        self.validate_transition(appointment.status, target, now, scheduled_start)?;
        self.record_transition(appointment, target, now, changed_by, reason);
        info!("Appointment {} moved to {}", appointment.id, target);
        Ok(())
    }

    /// Administrative cancellation reaches `cancelled` from any non-terminal
    /// state, including `in_progress`, unlike a regular cancellation.
    pub fn apply_administrative_cancel(
        &self,
        appointment: &mut Appointment,
        now: NaiveDateTime,
        changed_by: &str,
        reason: Option<String>,
    ) -> Result<(), AppointmentError> {
        if appointment.status.is_terminal() {
            warn!(
                "Rejected administrative cancellation of appointment {} in {}",
                appointment.id, appointment.status
            );
            return Err(AppointmentError::TransitionNotAllowed {
                from: appointment.status,
                to: AppointmentStatus::Cancelled,
                guard: "administrative cancellation requires a non-terminal state".to_string(),
            });
        }
        self.record_transition(appointment, AppointmentStatus::Cancelled, now, changed_by, reason);
        info!("Appointment {} cancelled administratively", appointment.id);
        Ok(())
    }

    /// Rescheduling never changes the status; it is permitted only before
    /// work begins and with more than the configured notice remaining.
    pub fn validate_reschedule(
        &self,
        current: AppointmentStatus,
        now: NaiveDateTime,
        scheduled_start: NaiveDateTime,
        notice_hours: i64,
    ) -> Result<(), AppointmentError> {
        use AppointmentStatus::*;
        if !matches!(current, Requested | Confirmed | Scheduled) {
            return Err(AppointmentError::RescheduleNotAllowed {
                reason: format!("appointment in status {} cannot be rescheduled", current),
            });
        }
        if scheduled_start - now <= Duration::hours(notice_hours) {
            return Err(AppointmentError::RescheduleNotAllowed {
                reason: format!(
                    "less than {} hours remain before the scheduled start",
                    notice_hours
                ),
            });
        }
        Ok(())
    }

    /// Time-driven transition the surrounding layer should apply, if any:
    /// no-show for a scheduled appointment past its grace window, completion
    /// for single-day work well past its scheduled end.
    pub fn automatic_transition(
        &self,
        appointment: &Appointment,
        now: NaiveDateTime,
    ) -> Result<Option<AppointmentStatus>, AppointmentError> {
        let scheduled_start = appointment.scheduled_start()?;

        match appointment.status {
            AppointmentStatus::Scheduled
                if now > scheduled_start + Duration::hours(NO_SHOW_GRACE_HOURS) =>
            {
                Ok(Some(AppointmentStatus::NoShow))
            }
            AppointmentStatus::InProgress if !appointment.is_multi_day_service => {
                let scheduled_end = appointment.scheduled_end_on_start_day()?;
                if now > scheduled_end + Duration::minutes(AUTO_COMPLETE_GRACE_MINUTES) {
                    Ok(Some(AppointmentStatus::Completed))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }

    fn record_transition(
        &self,
        appointment: &mut Appointment,
        target: AppointmentStatus,
        now: NaiveDateTime,
        changed_by: &str,
        reason: Option<String>,
    ) {
        let reason = reason.unwrap_or_else(|| {
            format!("Status changed from {} to {}", appointment.status, target)
        });
        appointment.status = target;
        appointment.status_history.push(StatusHistoryEntry {
            status: target,
            changed_at: now,
            changed_by: changed_by.to_string(),
            reason,
        });
        appointment.updated_at = now;
    }
}
