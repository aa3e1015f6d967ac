//! Appointment booking, cancellation and rescheduling

use std::sync::Arc;

use common::{
    error::DatabaseError,
    pagination::{Page, PageRequest},
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    models::{
        Appointment, AppointmentStatus, CancelAppointmentRequest, CheckAvailabilityRequest,
        CreateAppointmentRequest, NewAppointment, RescheduleAppointmentRequest, RescheduleChange,
        Slot,
    },
    repositories::{AppointmentStore, SlotWrite},
    validation::{parse_date, parse_time},
};

/// Upper bound on `reschedule_count`
pub const MAX_RESCHEDULE_COUNT: i32 = 3;

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("{0}")]
    InvalidFormat(String),

    #[error("time slot is not available")]
    SlotNotAvailable,

    #[error("appointment not found")]
    NotFound,

    /// Carries the attempted action, e.g. "cancel"
    #[error("unauthorized: only the appointment owner can {0}")]
    Unauthorized(&'static str),

    /// Carries the attempted action in past tense, e.g. "cancelled"
    #[error("appointment cannot be {0}: invalid status")]
    InvalidState(&'static str),

    #[error("maximum number of reschedules exceeded")]
    MaxReschedulesExceeded,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type AppointmentResult<T> = Result<T, AppointmentError>;

fn parse_slot(
    doctor_id: Uuid,
    doctor_schedule_id: Uuid,
    date: &str,
    time: &str,
) -> AppointmentResult<Slot> {
    let date = parse_date(date).map_err(|e| AppointmentError::InvalidFormat(e.error_message))?;
    let time = parse_time(time).map_err(|e| AppointmentError::InvalidFormat(e.error_message))?;
    Ok(Slot {
        doctor_id,
        doctor_schedule_id,
        date,
        time,
    })
}

fn non_empty(notes: &Option<String>) -> Option<String> {
    notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Appointment service
#[derive(Clone)]
pub struct AppointmentService {
    store: Arc<dyn AppointmentStore>,
}

impl AppointmentService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    async fn is_free(&self, slot: &Slot) -> AppointmentResult<bool> {
        Ok(self.store.count_scheduled_in_slot(slot).await? == 0)
    }

    /// True iff no scheduled appointment occupies the slot
    pub async fn check_availability(
        &self,
        request: &CheckAvailabilityRequest,
    ) -> AppointmentResult<bool> {
        let slot = parse_slot(
            request.doctor_id,
            request.doctor_schedule_id,
            &request.appointment_date,
            &request.appointment_time,
        )?;
        self.is_free(&slot).await
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        request: &CreateAppointmentRequest,
    ) -> AppointmentResult<Appointment> {
        let slot = parse_slot(
            request.doctor_id,
            request.doctor_schedule_id,
            &request.appointment_date,
            &request.appointment_time,
        )?;

        if !self.is_free(&slot).await? {
            warn!("Booking rejected, slot taken: {:?}", slot);
            return Err(AppointmentError::SlotNotAvailable);
        }

        let new = NewAppointment {
            id: Uuid::new_v4(),
            user_id,
            slot,
            reason: request.reason.trim().to_string(),
            notes: non_empty(&request.notes),
        };

        match self.store.insert_in_free_slot(&new).await? {
            SlotWrite::Applied(appointment) => {
                info!("User {} booked appointment {}", user_id, appointment.id);
                Ok(appointment)
            }
            SlotWrite::SlotTaken | SlotWrite::Stale => {
                warn!("Booking lost race for slot: {:?}", slot);
                Err(AppointmentError::SlotNotAvailable)
            }
        }
    }

    /// Load an appointment owned by `user_id` that is still scheduled
    async fn load_for_change(
        &self,
        id: Uuid,
        user_id: Uuid,
        action: &'static str,
        past: &'static str,
    ) -> AppointmentResult<Appointment> {
        let appointment = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.user_id != user_id {
            warn!("User {} tried to {} appointment {}", user_id, action, id);
            return Err(AppointmentError::Unauthorized(action));
        }

        if appointment.status != AppointmentStatus::Scheduled {
            return Err(AppointmentError::InvalidState(past));
        }

        Ok(appointment)
    }

    pub async fn cancel(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: &CancelAppointmentRequest,
    ) -> AppointmentResult<Appointment> {
        self.load_for_change(id, user_id, "cancel", "cancelled")
            .await?;

        let appointment = self
            .store
            .cancel_scheduled(id, non_empty(&request.notes))
            .await?
            .ok_or(AppointmentError::InvalidState("cancelled"))?;

        info!(
            "User {} cancelled appointment {}: {}",
            user_id,
            id,
            request.reason.trim()
        );
        Ok(appointment)
    }

    pub async fn reschedule(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: &RescheduleAppointmentRequest,
    ) -> AppointmentResult<Appointment> {
        let current = self
            .load_for_change(id, user_id, "reschedule", "rescheduled")
            .await?;

        if current.reschedule_count >= MAX_RESCHEDULE_COUNT {
            return Err(AppointmentError::MaxReschedulesExceeded);
        }

        let slot = parse_slot(
            current.doctor_id,
            request.doctor_schedule_id,
            &request.appointment_date,
            &request.appointment_time,
        )?;

        if !self.is_free(&slot).await? {
            warn!("Reschedule rejected, slot taken: {:?}", slot);
            return Err(AppointmentError::SlotNotAvailable);
        }

        let change = RescheduleChange {
            slot,
            notes: non_empty(&request.notes),
            max_reschedules: MAX_RESCHEDULE_COUNT,
        };

        match self.store.reschedule_into_slot(id, &change).await? {
            SlotWrite::Applied(appointment) => {
                info!(
                    "User {} rescheduled appointment {} ({}/{}): {}",
                    user_id,
                    id,
                    appointment.reschedule_count,
                    MAX_RESCHEDULE_COUNT,
                    request.reason.trim()
                );
                Ok(appointment)
            }
            SlotWrite::SlotTaken => Err(AppointmentError::SlotNotAvailable),
            SlotWrite::Stale => Err(AppointmentError::InvalidState("rescheduled")),
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppointmentResult<Appointment> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn get_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppointmentResult<Page<Appointment>> {
        Ok(self.store.list_by_user(user_id, page).await?)
    }

    pub async fn get_by_doctor(
        &self,
        doctor_id: Uuid,
        page: PageRequest,
    ) -> AppointmentResult<Page<Appointment>> {
        Ok(self.store.list_by_doctor(doctor_id, page).await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repositories::memory::InMemoryAppointmentStore;
    use chrono::{NaiveDate, NaiveTime};

    pub(crate) struct Fixture {
        pub service: AppointmentService,
        pub store: Arc<InMemoryAppointmentStore>,
        pub doctor_id: Uuid,
        pub schedule_id: Uuid,
    }

    pub(crate) fn fixture() -> Fixture {
        let store = Arc::new(InMemoryAppointmentStore::new());
        Fixture {
            service: AppointmentService::new(store.clone()),
            store,
            doctor_id: Uuid::new_v4(),
            schedule_id: Uuid::new_v4(),
        }
    }

    impl Fixture {
        pub(crate) fn booking(&self, date: &str, time: &str) -> CreateAppointmentRequest {
            CreateAppointmentRequest {
                doctor_id: self.doctor_id,
                doctor_schedule_id: self.schedule_id,
                appointment_date: date.to_string(),
                appointment_time: time.to_string(),
                reason: "Checkup".to_string(),
                notes: None,
            }
        }

        pub(crate) fn availability_of(&self, date: &str, time: &str) -> CheckAvailabilityRequest {
            CheckAvailabilityRequest {
                doctor_id: self.doctor_id,
                doctor_schedule_id: self.schedule_id,
                appointment_date: date.to_string(),
                appointment_time: time.to_string(),
            }
        }

        pub(crate) fn move_to(&self, date: &str, time: &str) -> RescheduleAppointmentRequest {
            RescheduleAppointmentRequest {
                doctor_schedule_id: self.schedule_id,
                appointment_date: date.to_string(),
                appointment_time: time.to_string(),
                reason: "Conflict at work".to_string(),
                notes: Some("Please call before".to_string()),
            }
        }
    }

    fn cancellation() -> CancelAppointmentRequest {
        CancelAppointmentRequest {
            reason: "Feeling better".to_string(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_round_trips_date_and_time() {
        let f = fixture();
        let user = Uuid::new_v4();
        let created = f
            .service
            .create(user, &f.booking("2025-03-10", "09:30"))
            .await
            .unwrap();

        let fetched = f.service.get_by_id(created.id).await.unwrap();
        assert_eq!(
            fetched.appointment_date,
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert_eq!(
            fetched.appointment_time,
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(fetched.status, AppointmentStatus::Scheduled);
        assert_eq!(fetched.reschedule_count, 0);
        assert_eq!(fetched.user_id, user);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_formats() {
        let f = fixture();
        let result = f
            .service
            .create(Uuid::new_v4(), &f.booking("10-03-2025", "09:30"))
            .await;
        assert!(matches!(result, Err(AppointmentError::InvalidFormat(_))));

        let result = f
            .service
            .create(Uuid::new_v4(), &f.booking("2025-03-10", "9.30am"))
            .await;
        assert!(matches!(result, Err(AppointmentError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_occupied_slot_is_rejected() {
        let f = fixture();
        f.service
            .create(Uuid::new_v4(), &f.booking("2025-04-01", "10:00"))
            .await
            .unwrap();

        let result = f
            .service
            .create(Uuid::new_v4(), &f.booking("2025-04-01", "10:00"))
            .await;
        assert!(matches!(result, Err(AppointmentError::SlotNotAvailable)));
    }

    #[tokio::test]
    async fn test_availability_follows_cancellation() {
        let f = fixture();
        let user = Uuid::new_v4();
        let slot = f.availability_of("2025-04-01", "10:00");

        assert!(f.service.check_availability(&slot).await.unwrap());

        let appointment = f
            .service
            .create(user, &f.booking("2025-04-01", "10:00"))
            .await
            .unwrap();
        assert!(!f.service.check_availability(&slot).await.unwrap());

        let cancelled = f
            .service
            .cancel(appointment.id, user, &cancellation())
            .await
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert!(f.service.check_availability(&slot).await.unwrap());
    }

    #[tokio::test]
    async fn test_only_the_owner_may_change_an_appointment() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let appointment = f
            .service
            .create(owner, &f.booking("2025-04-01", "10:00"))
            .await
            .unwrap();

        let result = f
            .service
            .cancel(appointment.id, stranger, &cancellation())
            .await;
        assert!(matches!(result, Err(AppointmentError::Unauthorized("cancel"))));

        // Ownership is checked before status
        f.store
            .set_status(appointment.id, AppointmentStatus::Completed)
            .await;
        let result = f
            .service
            .reschedule(appointment.id, stranger, &f.move_to("2025-04-02", "10:00"))
            .await;
        assert!(matches!(
            result,
            Err(AppointmentError::Unauthorized("reschedule"))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_appointment_cannot_change() {
        let f = fixture();
        let user = Uuid::new_v4();
        let appointment = f
            .service
            .create(user, &f.booking("2025-04-01", "10:00"))
            .await
            .unwrap();
        f.service
            .cancel(appointment.id, user, &cancellation())
            .await
            .unwrap();

        let result = f.service.cancel(appointment.id, user, &cancellation()).await;
        assert!(matches!(result, Err(AppointmentError::InvalidState(_))));

        let result = f
            .service
            .reschedule(appointment.id, user, &f.move_to("2025-04-02", "10:00"))
            .await;
        assert!(matches!(result, Err(AppointmentError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_missing_appointment() {
        let f = fixture();
        let result = f
            .service
            .cancel(Uuid::new_v4(), Uuid::new_v4(), &cancellation())
            .await;
        assert!(matches!(result, Err(AppointmentError::NotFound)));
    }

    #[tokio::test]
    async fn test_reschedule_is_bounded() {
        let f = fixture();
        let user = Uuid::new_v4();
        let appointment = f
            .service
            .create(user, &f.booking("2025-04-01", "10:00"))
            .await
            .unwrap();

        for (count, time) in [(1, "11:00"), (2, "12:00"), (3, "13:00")] {
            let moved = f
                .service
                .reschedule(appointment.id, user, &f.move_to("2025-04-01", time))
                .await
                .unwrap();
            assert_eq!(moved.reschedule_count, count);
            assert_eq!(moved.appointment_time.format("%H:%M").to_string(), time);
            assert_eq!(moved.notes.as_deref(), Some("Please call before"));
        }

        let result = f
            .service
            .reschedule(appointment.id, user, &f.move_to("2025-04-01", "14:00"))
            .await;
        assert!(matches!(result, Err(AppointmentError::MaxReschedulesExceeded)));

        let stored = f.service.get_by_id(appointment.id).await.unwrap();
        assert_eq!(stored.reschedule_count, MAX_RESCHEDULE_COUNT);
    }

    #[tokio::test]
    async fn test_reschedule_into_occupied_slot() {
        let f = fixture();
        let user = Uuid::new_v4();
        f.service
            .create(Uuid::new_v4(), &f.booking("2025-04-01", "11:00"))
            .await
            .unwrap();
        let mine = f
            .service
            .create(user, &f.booking("2025-04-01", "10:00"))
            .await
            .unwrap();

        let result = f
            .service
            .reschedule(mine.id, user, &f.move_to("2025-04-01", "11:00"))
            .await;
        assert!(matches!(result, Err(AppointmentError::SlotNotAvailable)));

        let result = f
            .service
            .reschedule(mine.id, user, &f.move_to("2025-04-01", "10:00"))
            .await;
        assert!(matches!(result, Err(AppointmentError::SlotNotAvailable)));

        let stored = f.service.get_by_id(mine.id).await.unwrap();
        assert_eq!(stored.reschedule_count, 0);
    }

    #[tokio::test]
    async fn test_concurrent_bookings_for_one_slot() {
        let f = fixture();
        let a = f.booking("2025-04-01", "10:00");
        let b = f.booking("2025-04-01", "10:00");

        let (first, second) = tokio::join!(
            f.service.create(Uuid::new_v4(), &a),
            f.service.create(Uuid::new_v4(), &b)
        );

        let successes = [first.is_ok(), second.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(successes, 1);
        let failure = if first.is_err() { first } else { second };
        assert!(matches!(failure, Err(AppointmentError::SlotNotAvailable)));
    }

    #[tokio::test]
    async fn test_concurrent_bookings_across_tasks() {
        let f = fixture();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = f.service.clone();
            let request = f.booking("2025-04-01", "10:00");
            handles.push(tokio::spawn(async move {
                service.create(Uuid::new_v4(), &request).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert!(
            !f.service
                .check_availability(&f.availability_of("2025-04-01", "10:00"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_listing_is_latest_first_and_paginated() {
        let f = fixture();
        let user = Uuid::new_v4();
        for (date, time) in [
            ("2025-04-01", "10:00"),
            ("2025-04-03", "09:00"),
            ("2025-04-03", "15:00"),
        ] {
            f.service.create(user, &f.booking(date, time)).await.unwrap();
        }
        f.service
            .create(Uuid::new_v4(), &f.booking("2025-05-01", "10:00"))
            .await
            .unwrap();

        let page = f
            .service
            .get_by_user(user, PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(
            page.items[0].appointment_time,
            NaiveTime::from_hms_opt(15, 0, 0).unwrap()
        );
        assert_eq!(page.pagination().total_pages, 2);

        let doctor_page = f
            .service
            .get_by_doctor(f.doctor_id, PageRequest::new(0, 0))
            .await
            .unwrap();
        assert_eq!(doctor_page.total, 4);
        assert_eq!(doctor_page.request.limit(), 10);
    }
}
