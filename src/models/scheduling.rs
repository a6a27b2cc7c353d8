// src/models/scheduling.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// 1. Slot (o "Horário")
// ---
// Janela concreta que aceita reservas até a capacidade.
// Invariante: 0 <= booked_count <= capacity (também garantido por CHECK no banco).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: Uuid,
    pub business_id: Uuid,
    pub service_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[schema(example = 2)]
    pub capacity: i32,
    #[schema(example = 1)]
    pub booked_count: i32,
    /// `true` quando booked_count chegou na capacidade.
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing, default)]
    #[schema(ignore)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Slot {
    /// Leitura "de dica": o valor pode estar velho, quem decide é o UPDATE condicional.
    pub fn has_room(&self) -> bool {
        self.booked_count < self.capacity
    }
}

// Dados de um horário ainda não gravado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    pub service_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: i32,
}

// ---
// 2. BusinessAvailability (o "Expediente" semanal)
// ---
// 0 = segunda-feira ... 6 = domingo
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessAvailability {
    pub id: Uuid,
    pub business_id: Uuid,
    #[schema(example = 0)]
    pub day_of_week: i16,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "17:00:00")]
    pub end_time: NaiveTime,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 3. RecurringSchedule (a "Agenda recorrente")
// ---
// Só serve de entrada para o gerador; depois de gerar os horários não tem efeito.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecurringSchedule {
    pub id: Uuid,
    pub business_id: Uuid,
    #[schema(example = "Plantão de sábado")]
    pub name: String,
    pub days_of_week: Vec<i32>,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "12:00:00")]
    pub end_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub exclude_dates: Vec<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing, default)]
    #[schema(ignore)]
    pub deleted_at: Option<DateTime<Utc>>,
}
