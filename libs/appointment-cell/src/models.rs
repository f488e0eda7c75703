// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use availability_cell::error::SchedulingError;
use availability_cell::models::BookedAppointment;
use availability_cell::services::time::at_wall_clock;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Requested,
    Confirmed,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Statuses that still hold their window on the calendar. Anything else
    /// never blocks a candidate booking.
    pub fn blocks_booking(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Requested
                | AppointmentStatus::Confirmed
                | AppointmentStatus::Scheduled
                | AppointmentStatus::InProgress
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Requested => write!(f, "requested"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// One line item of work on an appointment. A missing duration estimate is
/// apportioned from the quote at booking time (best-effort policy, §booking).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentService {
    pub service_type: String,
    pub description: String,
    pub estimated_duration: Option<f64>,
    pub status: ServiceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: AppointmentStatus,
    pub changed_at: NaiveDateTime,
    pub changed_by: String,
    pub reason: String,
}

/// A reschedule is recorded here and in the scheduled fields; it is not a
/// status of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleEntry {
    pub from_date: NaiveDate,
    pub from_start_time: String,
    pub to_date: NaiveDate,
    pub to_start_time: String,
    pub changed_at: NaiveDateTime,
    pub changed_by: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderChannel {
    Email,
    Sms,
    Push,
}

/// Reminder preference on a booking request: which channel, how long before
/// the scheduled start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderSetting {
    pub channel: ReminderChannel,
    pub hours_before: f64,
}

/// A reminder the engine has resolved to a concrete fire time. Delivery is
/// someone else's job; the engine only records when it should happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub channel: ReminderChannel,
    pub hours_before: f64,
    pub fire_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub workshop_id: Uuid,
    pub customer_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub scheduled_start_time: String,
    /// End clock time on the START date only. For a multi-day service this is
    /// a same-day display value truncated at close, not the finish time —
    /// that lives in `estimated_completion_date` plus the calculator's end
    /// time.
    pub scheduled_end_time: String,
    /// Total estimated hours across all services; may exceed one day's
    /// open capacity.
    pub estimated_duration: f64,
    pub is_multi_day_service: bool,
    pub estimated_completion_date: NaiveDate,
    pub estimated_work_days: u32,
    pub services: Vec<AppointmentService>,
    pub status: AppointmentStatus,
    /// Append-only audit log; holds the creation event from the moment the
    /// appointment exists and is never rewritten in place.
    pub status_history: Vec<StatusHistoryEntry>,
    pub reschedule_history: Vec<RescheduleEntry>,
    pub reminders: Vec<ScheduledReminder>,
    pub customer_notes: Option<String>,
    pub service_location: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    /// Scheduled start as a date-time (implicit local zone).
    pub fn scheduled_start(&self) -> Result<NaiveDateTime, SchedulingError> {
        at_wall_clock(self.scheduled_date, &self.scheduled_start_time)
    }

    /// Start-day end as a date-time. Display semantics only for multi-day
    /// services; see `scheduled_end_time`.
    pub fn scheduled_end_on_start_day(&self) -> Result<NaiveDateTime, SchedulingError> {
        at_wall_clock(self.scheduled_date, &self.scheduled_end_time)
    }

    /// The narrow calendar-interval view the availability cell reasons over.
    pub fn to_booked(&self) -> BookedAppointment {
        BookedAppointment {
            scheduled_date: self.scheduled_date,
            scheduled_start_time: self.scheduled_start_time.clone(),
            scheduled_end_time: self.scheduled_end_time.clone(),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub workshop_id: Uuid,
    pub customer_id: Uuid,
    pub preferred_date: NaiveDate,
    pub preferred_start_time: String,
    pub services: Vec<AppointmentService>,
    pub customer_notes: Option<String>,
    pub service_location: Option<String>,
    pub reminders: Vec<ReminderSetting>,
    /// Total labor hours quoted for the job, used to apportion services that
    /// carry no duration estimate of their own.
    pub quote_labor_hours: Option<f64>,
}

// ==============================================================================
// SCHEDULING POLICY
// ==============================================================================

/// Tunable business rules for booking and rescheduling. The defaults mirror
/// the workshop's standing policy; everything here is plain data so callers
/// can override per deployment.
#[derive(Debug, Clone)]
pub struct SchedulingPolicy {
    pub min_advance_booking_hours: i64,
    pub max_advance_booking_days: i64,
    pub reschedule_notice_hours: i64,
    pub max_reschedule_count: usize,
    /// Hours assumed for a service with no estimate when the request carries
    /// no quote figure either.
    pub fallback_service_hours: f64,
    /// Bound on the completion calculator's day walk.
    pub max_walk_days: u32,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            min_advance_booking_hours: 2,
            max_advance_booking_days: 90,
            reschedule_notice_hours: 24,
            max_reschedule_count: 3,
            fallback_service_hours: 1.0,
            max_walk_days: 3650,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Status transition not allowed from {from} to {to}: {guard}")]
    TransitionNotAllowed {
        from: AppointmentStatus,
        to: AppointmentStatus,
        guard: String,
    },

    #[error("Reschedule not allowed: {reason}")]
    RescheduleNotAllowed { reason: String },

    #[error("Booking window violation: {reason}")]
    BookingWindowViolation { reason: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}
