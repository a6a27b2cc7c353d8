// src/common/db_utils.rs

use std::future::Future;
use std::time::Duration;

use sqlx::{PgPool, Postgres, Transaction};

use crate::common::error::AppError;

// ---
// Helper de transação com tempo limite
// ---
/// Abre uma transação e define o `statement_timeout` LOCAL (vale só até o commit/rollback).
/// Assim uma consulta presa num lock não segura a conexão para sempre.
pub(crate) async fn begin_with_statement_timeout(
    pool: &PgPool,
    budget: Duration,
) -> Result<Transaction<'static, Postgres>, AppError> {
    // O '?' converte sqlx::Error -> AppError::DatabaseError
    let mut tx = pool.begin().await?;

    // is_local = true: igual ao SET LOCAL, some no fim da transação
    sqlx::query("SELECT set_config('statement_timeout', $1, true)")
        .bind(budget.as_millis().to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}

/// Limita a operação inteira a `budget`.
/// Se estourar, o future é descartado junto com a transação aberta (rollback) e
/// devolvemos `AppError::Timeout`. Cancelamento do Postgres por statement_timeout
/// (SQLSTATE 57014) também vira `Timeout`.
pub(crate) async fn with_timeout<T, F>(budget: Duration, operation: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(budget, operation).await {
        Ok(Err(AppError::DatabaseError(e))) if is_query_canceled(&e) => Err(AppError::Timeout),
        Ok(result) => result,
        Err(_elapsed) => Err(AppError::Timeout),
    }
}

fn is_query_canceled(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("57014"),
        _ => false,
    }
}
