//! In-memory appointment store for tests

use async_trait::async_trait;
use chrono::Utc;
use common::{
    error::DatabaseResult,
    pagination::{Page, PageRequest},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AppointmentStore, SlotWrite};
use crate::models::{Appointment, AppointmentStatus, NewAppointment, RescheduleChange, Slot};

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    rows: Mutex<Vec<Appointment>>,
}

fn occupied(rows: &[Appointment], slot: &Slot) -> usize {
    rows.iter()
        .filter(|a| a.status == AppointmentStatus::Scheduled && a.slot() == *slot)
        .count()
}

fn paginate(mut matching: Vec<Appointment>, page: PageRequest) -> Page<Appointment> {
    matching.sort_by(|a, b| {
        (b.appointment_date, b.appointment_time).cmp(&(a.appointment_date, a.appointment_time))
    });
    let total = matching.len() as i64;
    let items = matching
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Page {
        items,
        total,
        request: page,
    }
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a row's status, as an out-of-band process would
    pub async fn set_status(&self, id: Uuid, status: AppointmentStatus) {
        if let Some(row) = self.rows.lock().await.iter_mut().find(|a| a.id == id) {
            row.status = status;
        }
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn count_scheduled_in_slot(&self, slot: &Slot) -> DatabaseResult<i64> {
        Ok(occupied(&self.rows.lock().await, slot) as i64)
    }

    async fn insert_in_free_slot(&self, new: &NewAppointment) -> DatabaseResult<SlotWrite> {
        let mut rows = self.rows.lock().await;
        if occupied(&rows, &new.slot) > 0 {
            return Ok(SlotWrite::SlotTaken);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: new.id,
            user_id: new.user_id,
            doctor_id: new.slot.doctor_id,
            doctor_schedule_id: new.slot.doctor_schedule_id,
            appointment_date: new.slot.date,
            appointment_time: new.slot.time,
            status: AppointmentStatus::Scheduled,
            reason: new.reason.clone(),
            notes: new.notes.clone(),
            reschedule_count: 0,
            created_at: now,
            updated_at: now,
            user: None,
            doctor: None,
            schedule: None,
        };
        rows.push(appointment.clone());
        Ok(SlotWrite::Applied(appointment))
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Appointment>> {
        Ok(self.rows.lock().await.iter().find(|a| a.id == id).cloned())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> DatabaseResult<Page<Appointment>> {
        let rows = self.rows.lock().await;
        let matching = rows.iter().filter(|a| a.user_id == user_id).cloned().collect();
        Ok(paginate(matching, page))
    }

    async fn list_by_doctor(
        &self,
        doctor_id: Uuid,
        page: PageRequest,
    ) -> DatabaseResult<Page<Appointment>> {
        let rows = self.rows.lock().await;
        let matching = rows
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .cloned()
            .collect();
        Ok(paginate(matching, page))
    }

    async fn cancel_scheduled(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> DatabaseResult<Option<Appointment>> {
        let mut rows = self.rows.lock().await;
        let Some(row) = rows
            .iter_mut()
            .find(|a| a.id == id && a.status == AppointmentStatus::Scheduled)
        else {
            return Ok(None);
        };
        row.status = AppointmentStatus::Cancelled;
        row.notes = notes;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn reschedule_into_slot(
        &self,
        id: Uuid,
        change: &RescheduleChange,
    ) -> DatabaseResult<SlotWrite> {
        let mut rows = self.rows.lock().await;
        if occupied(&rows, &change.slot) > 0 {
            return Ok(SlotWrite::SlotTaken);
        }

        let Some(row) = rows.iter_mut().find(|a| {
            a.id == id
                && a.status == AppointmentStatus::Scheduled
                && a.reschedule_count < change.max_reschedules
        }) else {
            return Ok(SlotWrite::Stale);
        };
        row.doctor_schedule_id = change.slot.doctor_schedule_id;
        row.appointment_date = change.slot.date;
        row.appointment_time = change.slot.time;
        row.notes = change.notes.clone();
        row.reschedule_count += 1;
        row.updated_at = Utc::now();
        Ok(SlotWrite::Applied(row.clone()))
    }
}
