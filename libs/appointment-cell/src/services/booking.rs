// libs/appointment-cell/src/services/booking.rs
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use availability_cell::error::SchedulingError;
use availability_cell::models::{
    AvailabilityException, BookedAppointment, ResolvedDayHours, TimeSlot, WeeklyOperatingHours,
};
use availability_cell::services::availability::AvailabilityService;
use availability_cell::services::completion::CompletionCalculator;
use availability_cell::services::conflict::ConflictDetectionService;
use availability_cell::services::hours::resolve_day_hours;
use availability_cell::services::time::{at_wall_clock, format_minutes_to_time, parse_time_to_minutes};

use crate::models::{
    Appointment, AppointmentError, AppointmentService, AppointmentStatus, BookingRequest,
    ReminderSetting, RescheduleEntry, ScheduledReminder, SchedulingPolicy, StatusHistoryEntry,
};
use crate::services::lifecycle::AppointmentLifecycleService;

pub struct BookingService {
    availability_service: AvailabilityService,
    completion_calculator: CompletionCalculator,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    policy: SchedulingPolicy,
}

impl BookingService {
    pub fn new() -> Self {
        Self::with_policy(SchedulingPolicy::default())
    }

    pub fn with_policy(policy: SchedulingPolicy) -> Self {
        Self {
            availability_service: AvailabilityService::new(),
            completion_calculator: CompletionCalculator::with_max_walk_days(policy.max_walk_days),
            conflict_service: ConflictDetectionService::new(),
            lifecycle_service: AppointmentLifecycleService::new(),
            policy,
        }
    }

    /// Total service duration in hours. Services without an estimate share
    /// the quote's labor hours evenly; with no quote figure the policy
    /// fallback applies per service. Best-effort heuristic, not an invariant.
    pub fn total_estimated_duration(
        &self,
        services: &[AppointmentService],
        quote_labor_hours: Option<f64>,
    ) -> f64 {
        let known: f64 = services.iter().filter_map(|s| s.estimated_duration).sum();
        let unknown_count = services
            .iter()
            .filter(|s| s.estimated_duration.is_none())
            .count();

        if unknown_count == 0 {
            return known;
        }

        let per_unknown = match quote_labor_hours {
            Some(quote) if quote > 0.0 => quote / unknown_count as f64,
            _ => self.policy.fallback_service_hours,
        };

        known + per_unknown * unknown_count as f64
    }

    /// Advance-notice policy: the start must lie far enough ahead of `now`
    /// and not unreasonably far out.
    pub fn validate_booking_window(
        &self,
        preferred_date: NaiveDate,
        preferred_start_time: &str,
        now: NaiveDateTime,
    ) -> Result<(), AppointmentError> {
        let start = at_wall_clock(preferred_date, preferred_start_time)?;

        if start - now < Duration::hours(self.policy.min_advance_booking_hours) {
            return Err(AppointmentError::BookingWindowViolation {
                reason: format!(
                    "bookings require at least {} hours of notice",
                    self.policy.min_advance_booking_hours
                ),
            });
        }
        if start - now > Duration::days(self.policy.max_advance_booking_days) {
            return Err(AppointmentError::BookingWindowViolation {
                reason: format!(
                    "bookings may be placed at most {} days ahead",
                    self.policy.max_advance_booking_days
                ),
            });
        }
        Ok(())
    }

    /// Build a new appointment from a booking request, deriving the
    /// multi-day completion fields and the creation history entry. The caller
    /// persists the result only after `ensure_start_available` passes on a
    /// fresh snapshot.
    pub fn build_appointment(
        &self,
        request: &BookingRequest,
        hours: &WeeklyOperatingHours,
        exceptions: &[AvailabilityException],
        now: NaiveDateTime,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Building appointment for customer {} at workshop {} on {}",
            request.customer_id, request.workshop_id, request.preferred_date
        );

        if request.services.is_empty() {
            return Err(AppointmentError::ValidationError(
                "a booking needs at least one service".to_string(),
            ));
        }
        self.validate_booking_window(request.preferred_date, &request.preferred_start_time, now)?;
        self.validate_start_within_hours(
            request.preferred_date,
            &request.preferred_start_time,
            hours,
            exceptions,
        )?;

        let total_duration =
            self.total_estimated_duration(&request.services, request.quote_labor_hours);
        let estimate = self.completion_calculator.calculate_completion(
            request.preferred_date,
            &request.preferred_start_time,
            total_duration,
            hours,
            exceptions,
        )?;
        let scheduled_end_time = self.start_day_end_time(
            request.preferred_date,
            &request.preferred_start_time,
            total_duration,
            hours,
            exceptions,
        )?;

        let scheduled_start = at_wall_clock(request.preferred_date, &request.preferred_start_time)?;
        let reminders = resolve_reminders(&request.reminders, scheduled_start);

        let appointment = Appointment {
            id: Uuid::new_v4(),
            workshop_id: request.workshop_id,
            customer_id: request.customer_id,
            scheduled_date: request.preferred_date,
            scheduled_start_time: request.preferred_start_time.clone(),
            scheduled_end_time,
            estimated_duration: total_duration,
            is_multi_day_service: estimate.is_multi_day,
            estimated_completion_date: estimate.completion_date,
            estimated_work_days: estimate.work_days,
            services: request.services.clone(),
            status: AppointmentStatus::Requested,
            status_history: vec![StatusHistoryEntry {
                status: AppointmentStatus::Requested,
                changed_at: now,
                changed_by: request.customer_id.to_string(),
                reason: "Appointment requested".to_string(),
            }],
            reschedule_history: vec![],
            reminders,
            customer_notes: request.customer_notes.clone(),
            service_location: request.service_location.clone(),
            created_at: now,
            updated_at: now,
        };

        info!(
            "Appointment {} spans {} working day(s), completing {}",
            appointment.id, appointment.estimated_work_days, appointment.estimated_completion_date
        );
        Ok(appointment)
    }

    /// Commit-time guard: re-run the start-instant conflict check against the
    /// freshest snapshot immediately before persisting. Only statuses that
    /// still hold a slot are considered. A `ConflictDetected` result is
    /// retryable; the caller refreshes availability and re-prompts.
    pub fn ensure_start_available(
        &self,
        date: NaiveDate,
        start_time: &str,
        existing: &[Appointment],
    ) -> Result<(), AppointmentError> {
        let candidate = parse_time_to_minutes(start_time)?;
        let booked = blocking_windows(existing);
        self.conflict_service
            .ensure_start_available(candidate, date, &booked)?;
        Ok(())
    }

    /// Move an appointment to a new start, keeping its status. Appends one
    /// reschedule entry and re-derives every completion field and reminder.
    #[allow(clippy::too_many_arguments)]
    pub fn reschedule(
        &self,
        appointment: &mut Appointment,
        new_date: NaiveDate,
        new_start_time: &str,
        now: NaiveDateTime,
        changed_by: &str,
        reason: Option<String>,
        hours: &WeeklyOperatingHours,
        exceptions: &[AvailabilityException],
    ) -> Result<(), AppointmentError> {
        debug!(
            "Rescheduling appointment {} to {} {}",
            appointment.id, new_date, new_start_time
        );

        let scheduled_start = appointment.scheduled_start()?;
        self.lifecycle_service.validate_reschedule(
            appointment.status,
            now,
            scheduled_start,
            self.policy.reschedule_notice_hours,
        )?;
        if appointment.reschedule_history.len() >= self.policy.max_reschedule_count {
            return Err(AppointmentError::RescheduleNotAllowed {
                reason: format!(
                    "reschedule limit of {} reached",
                    self.policy.max_reschedule_count
                ),
            });
        }
        self.validate_start_within_hours(new_date, new_start_time, hours, exceptions)?;

        let estimate = self.completion_calculator.calculate_completion(
            new_date,
            new_start_time,
            appointment.estimated_duration,
            hours,
            exceptions,
        )?;
        let scheduled_end_time = self.start_day_end_time(
            new_date,
            new_start_time,
            appointment.estimated_duration,
            hours,
            exceptions,
        )?;

        appointment.reschedule_history.push(RescheduleEntry {
            from_date: appointment.scheduled_date,
            from_start_time: appointment.scheduled_start_time.clone(),
            to_date: new_date,
            to_start_time: new_start_time.to_string(),
            changed_at: now,
            changed_by: changed_by.to_string(),
            reason: reason.unwrap_or_else(|| "Appointment rescheduled".to_string()),
        });
        appointment.scheduled_date = new_date;
        appointment.scheduled_start_time = new_start_time.to_string();
        appointment.scheduled_end_time = scheduled_end_time;
        appointment.is_multi_day_service = estimate.is_multi_day;
        appointment.estimated_completion_date = estimate.completion_date;
        appointment.estimated_work_days = estimate.work_days;

        let new_start = at_wall_clock(new_date, new_start_time)?;
        let settings: Vec<_> = appointment
            .reminders
            .iter()
            .map(|r| ReminderSetting {
                channel: r.channel,
                hours_before: r.hours_before,
            })
            .collect();
        appointment.reminders = resolve_reminders(&settings, new_start);
        appointment.updated_at = now;

        info!(
            "Appointment {} rescheduled to {} {} ({} working day(s))",
            appointment.id, new_date, new_start_time, appointment.estimated_work_days
        );
        Ok(())
    }

    /// First bookable slot on or after `from_date`, searching at most
    /// `max_search_days` calendar days ahead.
    pub fn find_next_available_slot(
        &self,
        hours: &WeeklyOperatingHours,
        exceptions: &[AvailabilityException],
        from_date: NaiveDate,
        requested_duration_hours: f64,
        existing: &[Appointment],
        max_search_days: u32,
    ) -> Result<Option<TimeSlot>, AppointmentError> {
        let booked = blocking_windows(existing);
        let mut date = from_date;

        for _ in 0..max_search_days {
            let slots = self.availability_service.generate_slots(
                hours,
                exceptions,
                date,
                &booked,
                requested_duration_hours,
            )?;
            if let Some(slot) = slots.into_iter().find(|s| s.is_available) {
                return Ok(Some(slot));
            }
            date += Duration::days(1);
        }

        Ok(None)
    }

    /// End clock time shown on the start date: start plus however much of the
    /// total fits into the start day's remaining capacity, truncated at
    /// close. Equals the real end time only for single-day work.
    fn start_day_end_time(
        &self,
        date: NaiveDate,
        start_time: &str,
        total_duration_hours: f64,
        hours: &WeeklyOperatingHours,
        exceptions: &[AvailabilityException],
    ) -> Result<String, SchedulingError> {
        let start_minutes = i64::from(parse_time_to_minutes(start_time)?);
        let end_minutes = start_minutes + (total_duration_hours * 60.0).round() as i64;

        match resolve_day_hours(hours, exceptions, date)? {
            ResolvedDayHours::Open { close_minutes, .. } => {
                Ok(format_minutes_to_time(end_minutes.min(i64::from(close_minutes))))
            }
            ResolvedDayHours::Closed => Ok(format_minutes_to_time(start_minutes)),
        }
    }

    /// Bookings start inside the day's resolved open window; anything else is
    /// a request the slot grid would never have offered.
    fn validate_start_within_hours(
        &self,
        date: NaiveDate,
        start_time: &str,
        hours: &WeeklyOperatingHours,
        exceptions: &[AvailabilityException],
    ) -> Result<(), AppointmentError> {
        hours.validate().map_err(AppointmentError::from)?;
        let start = parse_time_to_minutes(start_time)?;

        match resolve_day_hours(hours, exceptions, date)? {
            ResolvedDayHours::Closed => Err(AppointmentError::ValidationError(format!(
                "workshop is closed on {}",
                date
            ))),
            ResolvedDayHours::Open {
                open_minutes,
                close_minutes,
            } => {
                if start < open_minutes || start >= close_minutes {
                    return Err(AppointmentError::ValidationError(format!(
                        "start time {} is outside operating hours on {}",
                        start_time, date
                    )));
                }
                Ok(())
            }
        }
    }
}

fn blocking_windows(existing: &[Appointment]) -> Vec<BookedAppointment> {
    existing
        .iter()
        .filter(|a| a.status.blocks_booking())
        .map(Appointment::to_booked)
        .collect()
}

fn resolve_reminders(
    settings: &[ReminderSetting],
    scheduled_start: NaiveDateTime,
) -> Vec<ScheduledReminder> {
    settings
        .iter()
        .map(|setting| ScheduledReminder {
            channel: setting.channel,
            hours_before: setting.hours_before,
            fire_at: scheduled_start
                - Duration::minutes((setting.hours_before * 60.0).round() as i64),
        })
        .collect()
}
