// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::customer::{Customer, CustomerDetails},
};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Acha ou cria o cliente por (business_id, e-mail normalizado) num único comando.
    /// Duas reservas simultâneas com o mesmo e-mail caem na mesma linha.
    /// O primeiro cadastro vence: nome e telefone existentes não são sobrescritos.
    pub async fn find_or_create<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        details: &CustomerDetails,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O DO UPDATE "vazio" existe só para o RETURNING devolver a linha já existente
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (business_id, name, email, phone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (business_id, email) DO UPDATE SET email = EXCLUDED.email
            RETURNING *
            "#,
        )
        .bind(business_id)
        .bind(details.name.trim())
        .bind(details.normalized_email())
        .bind(details.phone.trim())
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    // Leitura fora de transação (montagem do detalhe da reserva)
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }
}
