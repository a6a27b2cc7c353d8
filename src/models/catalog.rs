// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Um serviço oferecido pelo estabelecimento (Corte, Barba, Consulta...)
// É só um "molde" para reservas futuras: a reserva copia nome e preços.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub business_id: Uuid,
    #[schema(example = "Corte Masculino")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 45)]
    pub duration_min: i32,
    #[schema(value_type = f64, example = 80.0)]
    pub total_price: Decimal,
    #[schema(value_type = f64, example = 20.0)]
    pub deposit_amount: Decimal,

    // Sobrescreve o max_bookings do estabelecimento nos horários deste serviço
    #[schema(example = 2)]
    pub capacity: Option<i32>,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing, default)]
    #[schema(ignore)]
    pub deleted_at: Option<DateTime<Utc>>,
}
