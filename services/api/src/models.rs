//! API models for request and response payloads

pub mod appointment;

pub use appointment::{
    Appointment, AppointmentListResponse, AppointmentStatus, AvailabilityResponse,
    CancelAppointmentRequest, CheckAvailabilityRequest, CreateAppointmentRequest, DoctorSummary,
    NewAppointment, RescheduleAppointmentRequest, RescheduleChange, ScheduleSummary, Slot,
    UserSummary,
};
