use chrono::NaiveDate;
use thiserror::Error;

use crate::models::Weekday;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    #[error("Invalid time format: {value:?} (expected 24-hour HH:MM)")]
    InvalidTimeFormat { value: String },

    #[error("Invalid operating hours for {day}: close {close} is not after open {open}")]
    InvalidOperatingHours {
        day: Weekday,
        open: String,
        close: String,
    },

    #[error("Invalid availability exception for {date}")]
    InvalidAvailabilityException { date: NaiveDate },

    #[error("Invalid service duration: {hours} hours")]
    InvalidDuration { hours: f64 },

    #[error("Workshop has no operating capacity: every weekday is closed")]
    NoOperatingCapacity,

    #[error("Start time {start_time} on {date} is already booked")]
    ConflictDetected { date: NaiveDate, start_time: String },

    #[error("Internal invariant violation: {0}")]
    InternalInvariantViolation(String),
}
