// src/db/business_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::business::Business};

// Campos opcionais do PUT: None = "não mexer" (COALESCE no SQL)
#[derive(Debug, Default, Clone)]
pub struct BusinessChanges {
    pub name: Option<String>,
    pub vertical: Option<String>,
    pub description: Option<String>,
    pub theme_color: Option<String>,
    pub slot_duration_min: Option<i32>,
    pub max_bookings: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewBusiness {
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub vertical: String,
    pub description: Option<String>,
    pub theme_color: Option<String>,
    pub slot_duration_min: Option<i32>,
    pub max_bookings: Option<i32>,
}

#[derive(Clone)]
pub struct BusinessRepository {
    pool: PgPool,
}

impl BusinessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, new: &NewBusiness) -> Result<Business, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses
                (owner_id, name, slug, vertical, description, theme_color, slot_duration_min, max_bookings)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'blue'), COALESCE($7, 30), COALESCE($8, 1))
            RETURNING *
            "#,
        )
        .bind(new.owner_id)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.vertical)
        .bind(&new.description)
        .bind(&new.theme_color)
        .bind(new.slot_duration_min)
        .bind(new.max_bookings)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().unwrap_or_default();
                    if constraint.contains("slug") {
                        return AppError::Conflict("slug_taken");
                    }
                    if constraint.contains("owner") {
                        return AppError::Conflict("owner_has_business");
                    }
                }
            }
            e.into()
        })
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Business>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let business = sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(business)
    }

    /// Inclui os apagados: usado para montar o detalhe de reservas antigas.
    pub async fn find_by_id_any<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Business>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let business = sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(business)
    }

    pub async fn find_by_slug<'e, E>(&self, executor: E, slug: &str) -> Result<Option<Business>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let business = sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses WHERE slug = $1 AND deleted_at IS NULL",
        )
        .bind(slug)
        .fetch_optional(executor)
        .await?;
        Ok(business)
    }

    /// Estabelecimentos que o ator administra: os dele como dono e o do escopo do token.
    pub async fn list_for_actor(
        &self,
        owner_id: Uuid,
        scoped_business_id: Option<Uuid>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Business>, i64), AppError> {
        let businesses = sqlx::query_as::<_, Business>(
            r#"
            SELECT * FROM businesses
            WHERE deleted_at IS NULL AND (owner_id = $1 OR id = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(owner_id)
        .bind(scoped_business_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM businesses WHERE deleted_at IS NULL AND (owner_id = $1 OR id = $2)",
        )
        .bind(owner_id)
        .bind(scoped_business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((businesses, total))
    }

    // O slug não entra aqui: depois de criado ele é imutável
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: &BusinessChanges,
    ) -> Result<Option<Business>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let business = sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses SET
                name = COALESCE($2, name),
                vertical = COALESCE($3, vertical),
                description = COALESCE($4, description),
                theme_color = COALESCE($5, theme_color),
                slot_duration_min = COALESCE($6, slot_duration_min),
                max_bookings = COALESCE($7, max_bookings),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.vertical)
        .bind(&changes.description)
        .bind(&changes.theme_color)
        .bind(changes.slot_duration_min)
        .bind(changes.max_bookings)
        .fetch_optional(executor)
        .await?;
        Ok(business)
    }

    pub async fn soft_delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE businesses SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
