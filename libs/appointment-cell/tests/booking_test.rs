// libs/appointment-cell/tests/booking_test.rs
use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use availability_cell::error::SchedulingError;
use availability_cell::models::{DayHours, WeeklyOperatingHours};
use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentService, AppointmentStatus, BookingRequest,
    ReminderChannel, ReminderSetting, ScheduledReminder, SchedulingPolicy, ServiceStatus,
    StatusHistoryEntry,
};
use appointment_cell::services::booking::BookingService;

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

/// Mon-Fri 08:00-17:00 (nine hours a day), weekend closed.
fn weekday_hours() -> WeeklyOperatingHours {
    WeeklyOperatingHours {
        sunday: DayHours::closed(),
        monday: DayHours::open("08:00", "17:00"),
        tuesday: DayHours::open("08:00", "17:00"),
        wednesday: DayHours::open("08:00", "17:00"),
        thursday: DayHours::open("08:00", "17:00"),
        friday: DayHours::open("08:00", "17:00"),
        saturday: DayHours::closed(),
    }
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    date(day).and_hms_opt(hour, minute, 0).unwrap()
}

fn service(name: &str, estimated_duration: Option<f64>) -> AppointmentService {
    AppointmentService {
        service_type: name.to_string(),
        description: format!("{} as quoted", name),
        estimated_duration,
        status: ServiceStatus::Pending,
    }
}

fn request(services: Vec<AppointmentService>) -> BookingRequest {
    BookingRequest {
        workshop_id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        preferred_date: date(2),
        preferred_start_time: "08:00".to_string(),
        services,
        customer_notes: None,
        service_location: None,
        reminders: vec![],
        quote_labor_hours: None,
    }
}

fn booked_appointment(
    day: u32,
    start: &str,
    end: &str,
    status: AppointmentStatus,
) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        workshop_id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        scheduled_date: date(day),
        scheduled_start_time: start.to_string(),
        scheduled_end_time: end.to_string(),
        estimated_duration: 2.0,
        is_multi_day_service: false,
        estimated_completion_date: date(day),
        estimated_work_days: 1,
        services: vec![service("oil_change", Some(2.0))],
        status,
        status_history: vec![StatusHistoryEntry {
            status: AppointmentStatus::Requested,
            changed_at: at(1, 9, 0),
            changed_by: "customer".to_string(),
            reason: "Appointment requested".to_string(),
        }],
        reschedule_history: vec![],
        reminders: vec![],
        customer_notes: None,
        service_location: None,
        created_at: at(1, 9, 0),
        updated_at: at(1, 9, 0),
    }
}

// ==============================================================================
// DURATION AGGREGATION
// ==============================================================================

#[test]
fn test_known_durations_are_summed() {
    let booking = BookingService::new();
    let services = vec![service("brakes", Some(3.0)), service("tyres", Some(1.5))];
    assert_eq!(booking.total_estimated_duration(&services, None), 4.5);
}

#[test]
fn test_unknown_durations_share_the_quote() {
    let booking = BookingService::new();
    let services = vec![
        service("engine", Some(2.0)),
        service("gearbox", None),
        service("clutch", None),
    ];
    // Two unknowns split the 6 quoted hours: 2 + 3 + 3.
    assert_eq!(booking.total_estimated_duration(&services, Some(6.0)), 8.0);
}

#[test]
fn test_unknown_durations_fall_back_to_policy_without_a_quote() {
    let booking = BookingService::new();
    let services = vec![
        service("engine", Some(2.0)),
        service("gearbox", None),
        service("clutch", None),
    ];
    // Default fallback is one hour per unknown service.
    assert_eq!(booking.total_estimated_duration(&services, None), 4.0);
}

// ==============================================================================
// BUILDING APPOINTMENTS
// ==============================================================================

#[test]
fn test_multi_day_booking_derives_completion_fields() {
    let booking = BookingService::new();
    let request = request(vec![service("bodywork", Some(8.0)), service("respray", Some(12.0))]);

    let appointment = booking
        .build_appointment(&request, &weekday_hours(), &[], at(1, 12, 0))
        .unwrap();

    assert_eq!(appointment.estimated_duration, 20.0);
    assert!(appointment.is_multi_day_service);
    assert_eq!(appointment.estimated_work_days, 3);
    assert_eq!(appointment.estimated_completion_date, date(4));
    // Start-day display value is truncated at close, not the real finish.
    assert_eq!(appointment.scheduled_end_time, "17:00");
    assert_eq!(appointment.status, AppointmentStatus::Requested);
    assert_eq!(appointment.status_history.len(), 1);
    assert_eq!(appointment.status_history[0].reason, "Appointment requested");
}

#[test]
fn test_single_day_booking() {
    let booking = BookingService::new();
    let request = request(vec![service("brakes", Some(5.0))]);

    let appointment = booking
        .build_appointment(&request, &weekday_hours(), &[], at(1, 12, 0))
        .unwrap();

    assert!(!appointment.is_multi_day_service);
    assert_eq!(appointment.estimated_work_days, 1);
    assert_eq!(appointment.estimated_completion_date, date(2));
    assert_eq!(appointment.scheduled_end_time, "13:00");
}

#[test]
fn test_reminder_fire_times_are_offsets_from_start() {
    let booking = BookingService::new();
    let mut request = request(vec![service("brakes", Some(2.0))]);
    request.reminders = vec![
        ReminderSetting {
            channel: ReminderChannel::Email,
            hours_before: 24.0,
        },
        ReminderSetting {
            channel: ReminderChannel::Sms,
            hours_before: 1.0,
        },
    ];

    let appointment = booking
        .build_appointment(&request, &weekday_hours(), &[], at(1, 12, 0))
        .unwrap();

    assert_eq!(
        appointment.reminders,
        vec![
            ScheduledReminder {
                channel: ReminderChannel::Email,
                hours_before: 24.0,
                fire_at: at(1, 8, 0),
            },
            ScheduledReminder {
                channel: ReminderChannel::Sms,
                hours_before: 1.0,
                fire_at: at(2, 7, 0),
            },
        ]
    );
}

#[test]
fn test_empty_service_list_is_rejected() {
    let booking = BookingService::new();
    let request = request(vec![]);

    assert_matches!(
        booking.build_appointment(&request, &weekday_hours(), &[], at(1, 12, 0)),
        Err(AppointmentError::ValidationError(_))
    );
}

#[test]
fn test_booking_window_requires_notice() {
    let booking = BookingService::new();
    let request = request(vec![service("brakes", Some(2.0))]);

    // One hour of notice against a two-hour minimum.
    assert_matches!(
        booking.build_appointment(&request, &weekday_hours(), &[], at(2, 7, 0)),
        Err(AppointmentError::BookingWindowViolation { .. })
    );
}

#[test]
fn test_booking_window_caps_how_far_ahead() {
    let booking = BookingService::new();
    let mut request = request(vec![service("brakes", Some(2.0))]);
    // A Monday well past the ninety-day horizon.
    request.preferred_date = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();

    assert_matches!(
        booking.build_appointment(&request, &weekday_hours(), &[], at(1, 12, 0)),
        Err(AppointmentError::BookingWindowViolation { .. })
    );
}

#[test]
fn test_start_outside_operating_hours_is_rejected() {
    let booking = BookingService::new();
    let mut request = request(vec![service("brakes", Some(2.0))]);
    request.preferred_start_time = "07:00".to_string();

    assert_matches!(
        booking.build_appointment(&request, &weekday_hours(), &[], at(1, 12, 0)),
        Err(AppointmentError::ValidationError(_))
    );
}

#[test]
fn test_booking_a_closed_day_is_rejected() {
    let booking = BookingService::new();
    let mut request = request(vec![service("brakes", Some(2.0))]);
    request.preferred_date = date(8); // Sunday

    assert_matches!(
        booking.build_appointment(&request, &weekday_hours(), &[], at(1, 12, 0)),
        Err(AppointmentError::ValidationError(_))
    );
}

// ==============================================================================
// COMMIT-TIME CONFLICT GUARD
// ==============================================================================

#[test]
fn test_commit_guard_rejects_an_occupied_start() {
    let booking = BookingService::new();
    let existing = vec![booked_appointment(2, "10:00", "12:00", AppointmentStatus::Scheduled)];

    assert_matches!(
        booking.ensure_start_available(date(2), "10:30", &existing),
        Err(AppointmentError::Scheduling(SchedulingError::ConflictDetected { .. }))
    );
    assert!(booking.ensure_start_available(date(2), "09:00", &existing).is_ok());
}

#[test]
fn test_cancelled_appointments_do_not_block_slots() {
    let booking = BookingService::new();
    let existing = vec![
        booked_appointment(2, "10:00", "12:00", AppointmentStatus::Cancelled),
        booked_appointment(2, "13:00", "15:00", AppointmentStatus::NoShow),
    ];

    assert!(booking.ensure_start_available(date(2), "10:30", &existing).is_ok());
    assert!(booking.ensure_start_available(date(2), "13:00", &existing).is_ok());
}

// ==============================================================================
// RESCHEDULING
// ==============================================================================

#[test]
fn test_reschedule_updates_derived_fields_and_history() {
    let booking = BookingService::new();
    let mut appointment = booked_appointment(9, "09:00", "11:00", AppointmentStatus::Scheduled);
    appointment.reminders = vec![ScheduledReminder {
        channel: ReminderChannel::Email,
        hours_before: 24.0,
        fire_at: at(8, 9, 0),
    }];

    booking
        .reschedule(
            &mut appointment,
            date(10),
            "10:00",
            at(2, 9, 0),
            "customer",
            Some("Car not back from bodyshop".to_string()),
            &weekday_hours(),
            &[],
        )
        .unwrap();

    assert_eq!(appointment.scheduled_date, date(10));
    assert_eq!(appointment.scheduled_start_time, "10:00");
    assert_eq!(appointment.scheduled_end_time, "12:00");
    assert_eq!(appointment.estimated_completion_date, date(10));
    assert_eq!(appointment.estimated_work_days, 1);
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);

    assert_eq!(appointment.reschedule_history.len(), 1);
    let entry = &appointment.reschedule_history[0];
    assert_eq!(entry.from_date, date(9));
    assert_eq!(entry.from_start_time, "09:00");
    assert_eq!(entry.to_date, date(10));
    assert_eq!(entry.to_start_time, "10:00");
    assert_eq!(entry.reason, "Car not back from bodyshop");

    // Reminder offsets follow the new start.
    assert_eq!(appointment.reminders[0].fire_at, at(9, 10, 0));
}

#[test]
fn test_reschedule_with_short_notice_is_rejected() {
    let booking = BookingService::new();
    let mut appointment = booked_appointment(9, "09:00", "11:00", AppointmentStatus::Scheduled);

    // Twenty-three hours before the start.
    assert_matches!(
        booking.reschedule(
            &mut appointment,
            date(10),
            "10:00",
            at(8, 10, 0),
            "customer",
            None,
            &weekday_hours(),
            &[],
        ),
        Err(AppointmentError::RescheduleNotAllowed { .. })
    );
    assert!(appointment.reschedule_history.is_empty());
}

#[test]
fn test_reschedule_limit_is_enforced() {
    let policy = SchedulingPolicy {
        max_reschedule_count: 0,
        ..SchedulingPolicy::default()
    };
    let booking = BookingService::with_policy(policy);
    let mut appointment = booked_appointment(9, "09:00", "11:00", AppointmentStatus::Scheduled);

    assert_matches!(
        booking.reschedule(
            &mut appointment,
            date(10),
            "10:00",
            at(2, 9, 0),
            "customer",
            None,
            &weekday_hours(),
            &[],
        ),
        Err(AppointmentError::RescheduleNotAllowed { .. })
    );
}

// ==============================================================================
// NEXT AVAILABLE SLOT
// ==============================================================================

#[test]
fn test_next_slot_skips_a_fully_booked_day() {
    let booking = BookingService::new();
    let existing = vec![booked_appointment(2, "08:00", "17:00", AppointmentStatus::Scheduled)];

    let slot = booking
        .find_next_available_slot(&weekday_hours(), &[], date(2), 1.0, &existing, 7)
        .unwrap()
        .unwrap();

    assert_eq!(slot.date, date(3));
    assert_eq!(slot.start_time, "08:00");
    assert!(slot.is_available);
}

#[test]
fn test_next_slot_rolls_over_a_weekend() {
    let booking = BookingService::new();

    let slot = booking
        .find_next_available_slot(&weekday_hours(), &[], date(7), 1.0, &[], 7)
        .unwrap()
        .unwrap();

    assert_eq!(slot.date, date(9));
    assert_eq!(slot.start_time, "08:00");
}

#[test]
fn test_next_slot_search_is_bounded() {
    let booking = BookingService::new();
    // Saturday and Sunday are closed and the search stops after two days.
    let slot = booking
        .find_next_available_slot(&weekday_hours(), &[], date(7), 1.0, &[], 2)
        .unwrap();

    assert!(slot.is_none());
}
