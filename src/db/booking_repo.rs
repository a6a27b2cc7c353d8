// src/db/booking_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::booking::{Booking, BookingDraft, BookingHistory, BookingStatus, NewHistoryEntry},
};

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Reserva
    // ---

    pub async fn create<'e, E>(&self, executor: E, draft: &BookingDraft) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                business_id, service_id, slot_id, customer_id,
                customer_name, customer_email, customer_phone,
                service_name, slot_time, status, deposit_paid, total_price, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'PENDING', $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(draft.business_id)
        .bind(draft.service_id)
        .bind(draft.slot_id)
        .bind(draft.customer_id)
        .bind(&draft.customer_name)
        .bind(&draft.customer_email)
        .bind(&draft.customer_phone)
        .bind(&draft.service_name)
        .bind(draft.slot_time)
        .bind(draft.deposit_paid)
        .bind(draft.total_price)
        .bind(&draft.notes)
        .fetch_one(executor)
        .await?;
        Ok(booking)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(booking)
    }

    /// Trava a reserva: duas mudanças de status na mesma reserva viram fila.
    pub async fn find_by_id_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(booking)
    }

    // Mais recentes primeiro
    pub async fn list_by_business(
        &self,
        business_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Booking>, i64), AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE business_id = $1
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(business_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE business_id = $1")
            .bind(business_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((bookings, total))
    }

    /// Troca o status. Sair de CANCELLED limpa os dados do cancelamento.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings SET
                status = $2,
                cancelled_at = NULL,
                cancel_reason = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(booking)
    }

    pub async fn mark_cancelled<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        reason: Option<&str>,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings SET
                status = 'CANCELLED',
                cancelled_at = NOW(),
                cancel_reason = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_one(executor)
        .await?;
        Ok(booking)
    }

    // ---
    // Histórico (só INSERT, nunca UPDATE/DELETE)
    // ---

    pub async fn append_history<'e, E>(
        &self,
        executor: E,
        entry: &NewHistoryEntry<'_>,
    ) -> Result<BookingHistory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let history = sqlx::query_as::<_, BookingHistory>(
            r#"
            INSERT INTO booking_history (booking_id, action, previous_status, new_status, performed_by, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(entry.booking_id)
        .bind(entry.action)
        .bind(entry.previous_status)
        .bind(entry.new_status)
        .bind(entry.performed_by)
        .bind(entry.notes)
        .fetch_one(executor)
        .await?;
        Ok(history)
    }

    pub async fn list_history(&self, booking_id: Uuid) -> Result<Vec<BookingHistory>, AppError> {
        let history = sqlx::query_as::<_, BookingHistory>(
            "SELECT * FROM booking_history WHERE booking_id = $1 ORDER BY created_at ASC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(history)
    }
}
