// src/db/slot_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::scheduling::{NewSlot, Slot},
};

// Filtro da listagem de horários livres
#[derive(Debug, Default, Clone, Copy)]
pub struct SlotFilter {
    pub service_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct SlotRepository {
    pool: PgPool,
}

impl SlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura"
    // ---

    /// Horário vivo (nem ele nem o estabelecimento apagados).
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Slot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, Slot>(
            r#"
            SELECT s.* FROM slots s
            JOIN businesses b ON b.id = s.business_id
            WHERE s.id = $1 AND s.deleted_at IS NULL AND b.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(slot)
    }

    /// Igual ao `find_by_id`, mas trava a linha até o fim da transação.
    /// Só faz sentido dentro de uma transação (`&mut *tx`).
    pub async fn find_by_id_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Slot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, Slot>(
            r#"
            SELECT s.* FROM slots s
            JOIN businesses b ON b.id = s.business_id
            WHERE s.id = $1 AND s.deleted_at IS NULL AND b.deleted_at IS NULL
            FOR UPDATE OF s
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(slot)
    }

    // Inclui apagados (detalhe de reserva)
    pub async fn find_by_id_any<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Slot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(slot)
    }

    pub async fn find_in_business<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Slot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, Slot>(
            "SELECT * FROM slots WHERE id = $1 AND business_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(executor)
        .await?;
        Ok(slot)
    }

    /// Horários com vaga, em ordem cronológica.
    /// Com `service_id`, traz os do serviço E os genéricos (sem serviço).
    pub async fn list_available(
        &self,
        business_id: Uuid,
        filter: SlotFilter,
    ) -> Result<Vec<Slot>, AppError> {
        let slots = sqlx::query_as::<_, Slot>(
            r#"
            SELECT s.* FROM slots s
            JOIN businesses b ON b.id = s.business_id
            WHERE s.business_id = $1
              AND s.deleted_at IS NULL
              AND b.deleted_at IS NULL
              AND s.booked_count < s.capacity
              AND ($2::uuid IS NULL OR s.service_id = $2 OR s.service_id IS NULL)
              AND ($3::timestamptz IS NULL OR s.start_time >= $3)
              AND ($4::timestamptz IS NULL OR s.start_time < $4)
            ORDER BY s.start_time ASC
            "#,
        )
        .bind(business_id)
        .bind(filter.service_id)
        .bind(filter.from)
        .bind(filter.until)
        .fetch_all(&self.pool)
        .await?;
        Ok(slots)
    }

    // ---
    // Funções de "Escrita"
    // ---

    /// Insere vários horários num único INSERT (UNNEST). Tudo ou nada.
    /// Devolve em ordem de início.
    pub async fn create_many<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        slots: &[NewSlot],
    ) -> Result<Vec<Slot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if slots.is_empty() {
            return Ok(Vec::new());
        }

        let service_ids: Vec<Option<Uuid>> = slots.iter().map(|s| s.service_id).collect();
        let starts: Vec<DateTime<Utc>> = slots.iter().map(|s| s.start_time).collect();
        let ends: Vec<DateTime<Utc>> = slots.iter().map(|s| s.end_time).collect();
        let capacities: Vec<i32> = slots.iter().map(|s| s.capacity).collect();

        let mut created = sqlx::query_as::<_, Slot>(
            r#"
            INSERT INTO slots (business_id, service_id, start_time, end_time, capacity)
            SELECT $1, t.service_id, t.start_time, t.end_time, t.capacity
            FROM UNNEST($2::uuid[], $3::timestamptz[], $4::timestamptz[], $5::int4[])
                AS t(service_id, start_time, end_time, capacity)
            RETURNING *
            "#,
        )
        .bind(business_id)
        .bind(service_ids)
        .bind(starts)
        .bind(ends)
        .bind(capacities)
        .fetch_all(executor)
        .await?;

        created.sort_by_key(|s| s.start_time);
        Ok(created)
    }

    /// O passo que garante a capacidade. Um único UPDATE condicional:
    /// só incrementa se ainda houver vaga, e já recalcula `is_booked`.
    /// `None` = nenhuma linha afetada (lotado, apagado ou inexistente).
    pub async fn try_increment_occupancy<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Slot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, Slot>(
            r#"
            UPDATE slots SET
                booked_count = booked_count + 1,
                is_booked = booked_count + 1 >= capacity,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL AND booked_count < capacity
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(slot)
    }

    /// Devolve uma vaga (piso 0). Vale também para horário já apagado.
    pub async fn release_occupancy<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Slot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, Slot>(
            r#"
            UPDATE slots SET
                booked_count = GREATEST(booked_count - 1, 0),
                is_booked = GREATEST(booked_count - 1, 0) >= capacity,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(slot)
    }

    /// Soft-delete. Devolve o horário apagado (para o chamador avisar se tinha reservas).
    pub async fn soft_delete<'e, E>(&self, executor: E, business_id: Uuid, id: Uuid) -> Result<Option<Slot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slot = sqlx::query_as::<_, Slot>(
            r#"
            UPDATE slots SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND business_id = $2 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(executor)
        .await?;
        Ok(slot)
    }
}
