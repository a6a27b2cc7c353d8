// src/models/booking.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    business::Business, catalog::Service, customer::Customer, scheduling::Slot,
};

// --- Enums ---
// Mapeia o CREATE TYPE booking_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    /// Toda reserva não cancelada ocupa uma vaga no horário (inclusive NO_SHOW).
    pub fn holds_slot(self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

// --- Reserva ---
// Nome do serviço, preços e horário são "fotografados" na criação:
// editar o serviço depois não altera reservas antigas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub slot_id: Uuid,
    pub customer_id: Option<Uuid>,

    #[schema(example = "Maria da Silva")]
    pub customer_name: String,
    #[schema(example = "maria@email.com")]
    pub customer_email: String,
    pub customer_phone: String,

    #[schema(example = "Corte Masculino")]
    pub service_name: String,
    pub slot_time: DateTime<Utc>,

    pub status: BookingStatus,
    #[schema(value_type = f64, example = 20.0)]
    pub deposit_paid: Decimal,
    #[schema(value_type = f64, example = 80.0)]
    pub total_price: Decimal,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
}

// Dados usados no INSERT da reserva (passo 6 da alocação)
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub slot_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub service_name: String,
    pub slot_time: DateTime<Utc>,
    pub deposit_paid: Decimal,
    pub total_price: Decimal,
    pub notes: Option<String>,
}

// --- Histórico (append-only) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingHistory {
    pub id: Uuid,
    pub booking_id: Uuid,
    #[schema(example = "cancelled")]
    pub action: String,
    pub previous_status: Option<BookingStatus>,
    pub new_status: BookingStatus,
    pub performed_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry<'a> {
    pub booking_id: Uuid,
    pub action: &'a str,
    pub previous_status: Option<BookingStatus>,
    pub new_status: BookingStatus,
    pub performed_by: Option<Uuid>,
    pub notes: Option<&'a str>,
}

// Resposta "completa" do GET /bookings/{id}: reserva + entidades relacionadas.
// Os relacionados vêm mesmo se estiverem com soft-delete (histórico).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub business: Option<Business>,
    pub service: Option<Service>,
    pub slot: Option<Slot>,
    pub customer: Option<Customer>,
}
