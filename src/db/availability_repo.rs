// src/db/availability_repo.rs

use chrono::{NaiveDate, NaiveTime};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::scheduling::{BusinessAvailability, RecurringSchedule},
};

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub name: String,
    pub days_of_week: Vec<i32>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub exclude_dates: Vec<NaiveDate>,
}

#[derive(Clone)]
pub struct AvailabilityRepository {
    pool: PgPool,
}

impl AvailabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Expediente semanal
    // ---

    pub async fn list_weekly<'e, E>(&self, executor: E, business_id: Uuid) -> Result<Vec<BusinessAvailability>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let days = sqlx::query_as::<_, BusinessAvailability>(
            "SELECT * FROM business_availability WHERE business_id = $1 ORDER BY day_of_week ASC",
        )
        .bind(business_id)
        .fetch_all(executor)
        .await?;
        Ok(days)
    }

    // Um registro por dia da semana: grava por cima se já existir
    pub async fn upsert_day<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        day_of_week: i16,
        start_time: NaiveTime,
        end_time: NaiveTime,
        is_closed: bool,
    ) -> Result<BusinessAvailability, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let day = sqlx::query_as::<_, BusinessAvailability>(
            r#"
            INSERT INTO business_availability (business_id, day_of_week, start_time, end_time, is_closed)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (business_id, day_of_week) DO UPDATE SET
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                is_closed = EXCLUDED.is_closed,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(business_id)
        .bind(day_of_week)
        .bind(start_time)
        .bind(end_time)
        .bind(is_closed)
        .fetch_one(executor)
        .await?;
        Ok(day)
    }

    // ---
    // Agendas recorrentes
    // ---

    pub async fn create_schedule<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        new: &NewSchedule,
    ) -> Result<RecurringSchedule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let schedule = sqlx::query_as::<_, RecurringSchedule>(
            r#"
            INSERT INTO recurring_schedules
                (business_id, name, days_of_week, start_time, end_time, start_date, end_date, exclude_dates)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(business_id)
        .bind(&new.name)
        .bind(&new.days_of_week)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.exclude_dates)
        .fetch_one(executor)
        .await?;
        Ok(schedule)
    }

    pub async fn list_schedules(&self, business_id: Uuid) -> Result<Vec<RecurringSchedule>, AppError> {
        let schedules = sqlx::query_as::<_, RecurringSchedule>(
            r#"
            SELECT * FROM recurring_schedules
            WHERE business_id = $1 AND deleted_at IS NULL
            ORDER BY start_date ASC, name ASC
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(schedules)
    }

    pub async fn find_schedule<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        id: Uuid,
    ) -> Result<Option<RecurringSchedule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let schedule = sqlx::query_as::<_, RecurringSchedule>(
            r#"
            SELECT * FROM recurring_schedules
            WHERE id = $1 AND business_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(executor)
        .await?;
        Ok(schedule)
    }

    pub async fn soft_delete_schedule<'e, E>(&self, executor: E, business_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE recurring_schedules SET deleted_at = NOW(), is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND business_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(business_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
