//! Appointment models for the API service

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::pagination::Pagination;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire format of calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format of times of day
pub const TIME_FORMAT: &str = "%H:%M";

/// `HH:mm` serde adapter for [`NaiveTime`]
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let value = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&value, TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Appointment lifecycle. `Cancelled` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("unknown appointment status '{}'", other)),
        }
    }
}

/// The tuple an appointment occupies exclusively while scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub doctor_id: Uuid,
    pub doctor_schedule_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub service_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day: String,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

/// Appointment entity with optional joined summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_schedule_id: Uuid,
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub reschedule_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleSummary>,
}

impl Appointment {
    pub fn slot(&self) -> Slot {
        Slot {
            doctor_id: self.doctor_id,
            doctor_schedule_id: self.doctor_schedule_id,
            date: self.appointment_date,
            time: self.appointment_time,
        }
    }
}

/// Insert payload for a new booking
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slot: Slot,
    pub reason: String,
    pub notes: Option<String>,
}

/// Slot change applied by a reschedule
#[derive(Debug, Clone)]
pub struct RescheduleChange {
    pub slot: Slot,
    pub notes: Option<String>,
    /// The update only applies while `reschedule_count` is below this bound
    pub max_reschedules: i32,
}

/// Appointment booking request body. Missing ids deserialize to the nil UUID
/// and are reported by validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateAppointmentRequest {
    pub doctor_id: Uuid,
    pub doctor_schedule_id: Uuid,
    pub appointment_date: String,
    pub appointment_time: String,
    pub reason: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CancelAppointmentRequest {
    pub reason: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RescheduleAppointmentRequest {
    pub doctor_schedule_id: Uuid,
    pub appointment_date: String,
    pub appointment_time: String,
    pub reason: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckAvailabilityRequest {
    pub doctor_id: Uuid,
    pub doctor_schedule_id: Uuid,
    pub appointment_date: String,
    pub appointment_time: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AvailabilityResponse {
    pub is_available: bool,
}

/// Response for appointment listings with pagination
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentListResponse {
    pub appointments: Vec<Appointment>,
    pub pagination: Pagination,
}
