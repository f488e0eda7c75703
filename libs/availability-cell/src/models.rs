// libs/availability-cell/src/models.rs
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SchedulingError;
use crate::services::time::parse_time_to_minutes;

// ==============================================================================
// OPERATING HOURS MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    /// Locale-independent weekday of a calendar date (Sunday = 0).
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            chrono::Weekday::Sun => Weekday::Sunday,
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weekday::Sunday => write!(f, "sunday"),
            Weekday::Monday => write!(f, "monday"),
            Weekday::Tuesday => write!(f, "tuesday"),
            Weekday::Wednesday => write!(f, "wednesday"),
            Weekday::Thursday => write!(f, "thursday"),
            Weekday::Friday => write!(f, "friday"),
            Weekday::Saturday => write!(f, "saturday"),
        }
    }
}

/// Open/close window of a single weekday. Times are 24-hour `HH:MM` wall
/// clock strings; `closed` wins over the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: String,
    pub close: String,
    pub closed: bool,
}

impl DayHours {
    pub fn open(open: &str, close: &str) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
            closed: false,
        }
    }

    pub fn closed() -> Self {
        Self {
            open: "00:00".to_string(),
            close: "00:00".to_string(),
            closed: true,
        }
    }
}

/// The weekly pattern a workshop nominally operates on. Date-specific
/// deviations are expressed as [`AvailabilityException`]s, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyOperatingHours {
    pub sunday: DayHours,
    pub monday: DayHours,
    pub tuesday: DayHours,
    pub wednesday: DayHours,
    pub thursday: DayHours,
    pub friday: DayHours,
    pub saturday: DayHours,
}

impl WeeklyOperatingHours {
    pub fn for_weekday(&self, day: Weekday) -> &DayHours {
        match day {
            Weekday::Sunday => &self.sunday,
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
            Weekday::Saturday => &self.saturday,
        }
    }

    /// Reject any open day whose close time is at or before its open time.
    pub fn validate(&self) -> Result<(), SchedulingError> {
        for day in Weekday::ALL {
            let hours = self.for_weekday(day);
            if hours.closed {
                continue;
            }
            let open = parse_time_to_minutes(&hours.open)?;
            let close = parse_time_to_minutes(&hours.close)?;
            if close <= open {
                return Err(SchedulingError::InvalidOperatingHours {
                    day,
                    open: hours.open.clone(),
                    close: hours.close.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn has_open_day(&self) -> bool {
        Weekday::ALL.iter().any(|day| !self.for_weekday(*day).closed)
    }
}

// ==============================================================================
// DATE-SPECIFIC EXCEPTIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    Closed,
    ModifiedHours,
    Holiday,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedHours {
    pub start: String,
    pub end: String,
}

/// A single-date override of the weekly pattern. Closed and holiday
/// exceptions make the date fully unavailable; modified hours replace the
/// open window for that date only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityException {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: ExceptionKind,
    pub reason: Option<String>,
    pub modified_hours: Option<ModifiedHours>,
}

/// Effective open window for one date after exceptions are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedDayHours {
    Closed,
    Open {
        open_minutes: u32,
        close_minutes: u32,
    },
}

// ==============================================================================
// SLOT AND COMPLETION MODELS
// ==============================================================================

/// One candidate bookable window on a date. Transient view over bookings and
/// operating hours; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The committed interval an existing appointment holds on the calendar.
/// This cell reasons over these narrow views; the appointment cell converts
/// its full entities into them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookedAppointment {
    pub scheduled_date: NaiveDate,
    pub scheduled_start_time: String,
    pub scheduled_end_time: String,
}

/// Result of the multi-day completion walk. `end_time` is the finish clock
/// time on `completion_date`, which for multi-day work is NOT the same field
/// as an appointment's start-day `scheduled_end_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEstimate {
    pub completion_date: NaiveDate,
    pub end_time: String,
    pub work_days: u32,
    pub is_multi_day: bool,
}
