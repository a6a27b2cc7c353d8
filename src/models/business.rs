// src/models/business.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// Business (o "Estabelecimento")
// ---
// Raiz do tenant. Tudo (serviços, horários, reservas) pendura aqui.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    // Quem é o dono vem do token, não precisa sair na resposta
    #[serde(skip_serializing, default)]
    #[schema(ignore)]
    pub owner_id: Uuid,

    #[schema(example = "Barbearia do Zé")]
    pub name: String,
    #[schema(example = "barbearia-do-ze")]
    pub slug: String,
    #[schema(example = "barbershop")]
    pub vertical: String,
    pub description: Option<String>,
    #[schema(example = "blue")]
    pub theme_color: String,

    /// Duração padrão (minutos) usada pelo gerador de horários.
    #[schema(example = 30)]
    pub slot_duration_min: i32,

    /// Capacidade padrão de cada horário (reservas simultâneas).
    #[schema(example = 1)]
    pub max_bookings: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing, default)]
    #[schema(ignore)]
    pub deleted_at: Option<DateTime<Utc>>,
}
