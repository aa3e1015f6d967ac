//! Request validation for appointment endpoints

use chrono::{NaiveDate, NaiveTime};
use common::validation::{FieldError, FieldErrors};
use uuid::Uuid;

use crate::models::{
    CancelAppointmentRequest, CheckAvailabilityRequest, CreateAppointmentRequest,
    RescheduleAppointmentRequest,
    appointment::{DATE_FORMAT, TIME_FORMAT},
};

pub const DOCTOR_ID_FIELD: &str = "doctor_id";
pub const SCHEDULE_ID_FIELD: &str = "doctor_schedule_id";
pub const APPOINTMENT_DATE_FIELD: &str = "appointment_date";
pub const APPOINTMENT_TIME_FIELD: &str = "appointment_time";
pub const REASON_FIELD: &str = "reason";

/// Parse a zero-padded `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_FORMAT).to_string() == value)
        .ok_or_else(|| FieldError::invalid_format(APPOINTMENT_DATE_FIELD, "YYYY-MM-DD"))
}

/// Parse a zero-padded `HH:mm` time of day
pub fn parse_time(value: &str) -> Result<NaiveTime, FieldError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .ok()
        .filter(|time| time.format(TIME_FORMAT).to_string() == value)
        .ok_or_else(|| FieldError::invalid_format(APPOINTMENT_TIME_FIELD, "HH:mm"))
}

fn require_id(errors: &mut FieldErrors, field: &str, id: Uuid) {
    if id.is_nil() {
        errors.push(FieldError::required(field));
    }
}

fn check_date_time(errors: &mut FieldErrors, date: &str, time: &str) {
    if errors.require(APPOINTMENT_DATE_FIELD, date) {
        if let Err(e) = parse_date(date) {
            errors.push(e);
        }
    }
    if errors.require(APPOINTMENT_TIME_FIELD, time) {
        if let Err(e) = parse_time(time) {
            errors.push(e);
        }
    }
}

pub fn validate_create(request: &CreateAppointmentRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = FieldErrors::new();
    require_id(&mut errors, DOCTOR_ID_FIELD, request.doctor_id);
    require_id(&mut errors, SCHEDULE_ID_FIELD, request.doctor_schedule_id);
    check_date_time(&mut errors, &request.appointment_date, &request.appointment_time);
    errors.require(REASON_FIELD, &request.reason);
    errors.into_result()
}

pub fn validate_cancel(request: &CancelAppointmentRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = FieldErrors::new();
    errors.require(REASON_FIELD, &request.reason);
    errors.into_result()
}

pub fn validate_reschedule(request: &RescheduleAppointmentRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = FieldErrors::new();
    require_id(&mut errors, SCHEDULE_ID_FIELD, request.doctor_schedule_id);
    check_date_time(&mut errors, &request.appointment_date, &request.appointment_time);
    errors.require(REASON_FIELD, &request.reason);
    errors.into_result()
}

pub fn validate_availability(request: &CheckAvailabilityRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = FieldErrors::new();
    require_id(&mut errors, DOCTOR_ID_FIELD, request.doctor_id);
    require_id(&mut errors, SCHEDULE_ID_FIELD, request.doctor_schedule_id);
    check_date_time(&mut errors, &request.appointment_date, &request.appointment_time);
    errors.into_result()
}
