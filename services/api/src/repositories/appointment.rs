//! Appointment repository for database operations

use async_trait::async_trait;
use common::{
    error::{DatabaseError, DatabaseResult},
    pagination::{Page, PageRequest},
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::{AppointmentStore, SlotWrite};
use crate::models::{
    Appointment, AppointmentStatus, DoctorSummary, NewAppointment, RescheduleChange,
    ScheduleSummary, Slot, UserSummary,
};

const SELECT_VIEW: &str = r#"
    SELECT a.id, a.user_id, a.doctor_id, a.doctor_schedule_id, a.appointment_date,
           a.appointment_time, a.status, a.reason, a.notes, a.reschedule_count,
           a.created_at, a.updated_at,
           u.name AS user_name, u.email AS user_email,
           d.name AS doctor_name, d.specialization AS doctor_specialization,
           d.service_id AS doctor_service_id,
           s.day AS schedule_day, s.start_time AS schedule_start_time,
           s.end_time AS schedule_end_time
    FROM appointments a
    LEFT JOIN users u ON u.id = a.user_id
    LEFT JOIN doctors d ON d.id = a.doctor_id
    LEFT JOIN doctor_schedules s ON s.id = a.doctor_schedule_id
"#;

const COUNT_IN_SLOT: &str = r#"
    SELECT COUNT(*)
    FROM appointments
    WHERE doctor_id = $1
      AND doctor_schedule_id = $2
      AND appointment_date = $3
      AND appointment_time = $4
      AND status = 'scheduled'
"#;

/// PostgreSQL appointment store
#[derive(Clone)]
pub struct PgAppointmentStore {
    pool: PgPool,
}

impl PgAppointmentStore {
    /// Create a new appointment store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        slot: &Slot,
    ) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar(COUNT_IN_SLOT)
            .bind(slot.doctor_id)
            .bind(slot.doctor_schedule_id)
            .bind(slot.date)
            .bind(slot.time)
            .fetch_one(&mut **tx)
            .await?;
        Ok(count)
    }

    async fn reload(&self, id: Uuid) -> DatabaseResult<Appointment> {
        self.find_by_id(id)
            .await?
            .ok_or(DatabaseError::Query(sqlx::Error::RowNotFound))
    }

    async fn list_where(
        &self,
        column: &str,
        id: Uuid,
        page: PageRequest,
    ) -> DatabaseResult<Page<Appointment>> {
        let sql = format!(
            "{} WHERE a.{} = $1 ORDER BY a.appointment_date DESC, a.appointment_time DESC LIMIT $2 OFFSET $3",
            SELECT_VIEW, column
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .bind(page.limit() as i64)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM appointments WHERE {} = $1", column);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(appointment_from_row)
            .collect::<DatabaseResult<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            request: page,
        })
    }
}

fn appointment_from_row(row: &PgRow) -> DatabaseResult<Appointment> {
    let status: String = row.get("status");
    let status = status
        .parse::<AppointmentStatus>()
        .map_err(|e| DatabaseError::Query(sqlx::Error::Decode(e.into())))?;

    let user_id: Uuid = row.get("user_id");
    let doctor_id: Uuid = row.get("doctor_id");
    let doctor_schedule_id: Uuid = row.get("doctor_schedule_id");

    let user = row
        .get::<Option<String>, _>("user_name")
        .map(|name| UserSummary {
            id: user_id,
            name,
            email: row.get("user_email"),
        });

    let doctor = row
        .get::<Option<String>, _>("doctor_name")
        .map(|name| DoctorSummary {
            id: doctor_id,
            name,
            specialization: row.get("doctor_specialization"),
            service_id: row.get("doctor_service_id"),
        });

    let schedule = row
        .get::<Option<String>, _>("schedule_day")
        .map(|day| ScheduleSummary {
            id: doctor_schedule_id,
            doctor_id,
            day,
            start_time: row.get("schedule_start_time"),
            end_time: row.get("schedule_end_time"),
        });

    Ok(Appointment {
        id: row.get("id"),
        user_id,
        doctor_id,
        doctor_schedule_id,
        appointment_date: row.get("appointment_date"),
        appointment_time: row.get("appointment_time"),
        status,
        reason: row.get("reason"),
        notes: row.get("notes"),
        reschedule_count: row.get("reschedule_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        user,
        doctor,
        schedule,
    })
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn count_scheduled_in_slot(&self, slot: &Slot) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar(COUNT_IN_SLOT)
            .bind(slot.doctor_id)
            .bind(slot.doctor_schedule_id)
            .bind(slot.date)
            .bind(slot.time)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_in_free_slot(&self, new: &NewAppointment) -> DatabaseResult<SlotWrite> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Connection)?;

        if Self::count_in_tx(&mut tx, &new.slot).await? > 0 {
            tx.rollback().await?;
            return Ok(SlotWrite::SlotTaken);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO appointments
                (id, user_id, doctor_id, doctor_schedule_id, appointment_date,
                 appointment_time, status, reason, notes, reschedule_count)
            VALUES ($1, $2, $3, $4, $5, $6, 'scheduled', $7, $8, 0)
            "#,
        )
        .bind(new.id)
        .bind(new.user_id)
        .bind(new.slot.doctor_id)
        .bind(new.slot.doctor_schedule_id)
        .bind(new.slot.date)
        .bind(new.slot.time)
        .bind(&new.reason)
        .bind(&new.notes)
        .execute(&mut *tx)
        .await;

        // Dropping the transaction rolls it back
        match inserted.map_err(DatabaseError::from_query) {
            Err(e) if e.is_unique_violation() => return Ok(SlotWrite::SlotTaken),
            Err(e) => return Err(e),
            Ok(_) => {}
        }

        tx.commit().await?;
        info!("Inserted appointment {}", new.id);

        Ok(SlotWrite::Applied(self.reload(new.id).await?))
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Appointment>> {
        let sql = format!("{} WHERE a.id = $1", SELECT_VIEW);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(appointment_from_row).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> DatabaseResult<Page<Appointment>> {
        self.list_where("user_id", user_id, page).await
    }

    async fn list_by_doctor(
        &self,
        doctor_id: Uuid,
        page: PageRequest,
    ) -> DatabaseResult<Page<Appointment>> {
        self.list_where("doctor_id", doctor_id, page).await
    }

    async fn cancel_scheduled(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> DatabaseResult<Option<Appointment>> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET status = 'cancelled', notes = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled'
            "#,
        )
        .bind(id)
        .bind(&notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(self.reload(id).await?))
    }

    async fn reschedule_into_slot(
        &self,
        id: Uuid,
        change: &RescheduleChange,
    ) -> DatabaseResult<SlotWrite> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Connection)?;

        if Self::count_in_tx(&mut tx, &change.slot).await? > 0 {
            tx.rollback().await?;
            return Ok(SlotWrite::SlotTaken);
        }

        let updated = sqlx::query(
            r#"
            UPDATE appointments
            SET doctor_schedule_id = $2,
                appointment_date = $3,
                appointment_time = $4,
                notes = $5,
                reschedule_count = reschedule_count + 1,
                updated_at = NOW()
            WHERE id = $1
              AND status = 'scheduled'
              AND reschedule_count < $6
            "#,
        )
        .bind(id)
        .bind(change.slot.doctor_schedule_id)
        .bind(change.slot.date)
        .bind(change.slot.time)
        .bind(&change.notes)
        .bind(change.max_reschedules)
        .execute(&mut *tx)
        .await;

        let rows = match updated.map_err(DatabaseError::from_query) {
            Err(e) if e.is_unique_violation() => return Ok(SlotWrite::SlotTaken),
            Err(e) => return Err(e),
            Ok(result) => result.rows_affected(),
        };

        if rows == 0 {
            tx.rollback().await?;
            return Ok(SlotWrite::Stale);
        }

        tx.commit().await?;
        info!("Rescheduled appointment {}", id);

        Ok(SlotWrite::Applied(self.reload(id).await?))
    }
}
