//! Repositories for database operations

use async_trait::async_trait;
use common::{
    error::DatabaseResult,
    pagination::{Page, PageRequest},
};
use uuid::Uuid;

use crate::models::{Appointment, NewAppointment, RescheduleChange, Slot};

pub mod appointment;

#[cfg(test)]
pub mod memory;

pub use appointment::PgAppointmentStore;

/// Outcome of a write that claims a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotWrite {
    Applied(Appointment),
    /// Another scheduled appointment holds the slot
    SlotTaken,
    /// The row no longer satisfies the write's precondition
    Stale,
}

/// Appointment rows and their joined read views
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Number of `scheduled` appointments occupying the slot
    async fn count_scheduled_in_slot(&self, slot: &Slot) -> DatabaseResult<i64>;

    /// Insert a scheduled appointment unless the slot is occupied
    async fn insert_in_free_slot(&self, new: &NewAppointment) -> DatabaseResult<SlotWrite>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Appointment>>;

    /// Appointments of a user, latest date/time first
    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> DatabaseResult<Page<Appointment>>;

    /// Appointments with a doctor, latest date/time first
    async fn list_by_doctor(
        &self,
        doctor_id: Uuid,
        page: PageRequest,
    ) -> DatabaseResult<Page<Appointment>>;

    /// Cancel the appointment if it is still scheduled; `None` otherwise
    async fn cancel_scheduled(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> DatabaseResult<Option<Appointment>>;

    /// Move a scheduled appointment into a free slot and bump its counter
    async fn reschedule_into_slot(
        &self,
        id: Uuid,
        change: &RescheduleChange,
    ) -> DatabaseResult<SlotWrite>;
}
