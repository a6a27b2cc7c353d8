// src/db/service_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::catalog::Service};

#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    pub duration_min: i32,
    pub total_price: Decimal,
    pub deposit_amount: Decimal,
    pub capacity: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Default, Clone)]
pub struct ServiceChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_min: Option<i32>,
    pub total_price: Option<Decimal>,
    pub deposit_amount: Option<Decimal>,
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct ServiceRepository {
    pool: PgPool,
}

impl ServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        new: &NewService,
    ) -> Result<Service, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services
                (business_id, name, description, duration_min, total_price, deposit_amount, capacity, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(business_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.duration_min)
        .bind(new.total_price)
        .bind(new.deposit_amount)
        .bind(new.capacity)
        .bind(new.is_active)
        .fetch_one(executor)
        .await?;
        Ok(service)
    }

    /// Busca sem filtro de estabelecimento: quem chama decide o que fazer com um
    /// serviço de outro tenant (o alocador devolve BadRequest, não NotFound).
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(service)
    }

    pub async fn find_by_id_any<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(service)
    }

    pub async fn find_in_business<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE id = $1 AND business_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(executor)
        .await?;
        Ok(service)
    }

    // Listagem paginada (leitura simples, usa a pool)
    pub async fn list_by_business(
        &self,
        business_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Service>, i64), AppError> {
        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT * FROM services
            WHERE business_id = $1 AND deleted_at IS NULL
            ORDER BY name ASC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(business_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM services WHERE business_id = $1 AND deleted_at IS NULL",
        )
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((services, total))
    }

    pub async fn list_active(&self, business_id: Uuid) -> Result<Vec<Service>, AppError> {
        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT * FROM services
            WHERE business_id = $1 AND is_active AND deleted_at IS NULL
            ORDER BY name ASC
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        id: Uuid,
        changes: &ServiceChanges,
    ) -> Result<Option<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(
            r#"
            UPDATE services SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                duration_min = COALESCE($5, duration_min),
                total_price = COALESCE($6, total_price),
                deposit_amount = COALESCE($7, deposit_amount),
                capacity = COALESCE($8, capacity),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1 AND business_id = $2 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(business_id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.duration_min)
        .bind(changes.total_price)
        .bind(changes.deposit_amount)
        .bind(changes.capacity)
        .bind(changes.is_active)
        .fetch_optional(executor)
        .await?;
        Ok(service)
    }

    pub async fn soft_delete<'e, E>(&self, executor: E, business_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE services SET deleted_at = NOW(), updated_at = NOW()
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
