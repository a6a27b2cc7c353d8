// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Cliente final de um estabelecimento.
// Único por (business_id, email): o mesmo e-mail nunca vira duas linhas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub business_id: Uuid,
    #[schema(example = "Maria da Silva")]
    pub name: String,
    #[schema(example = "maria@email.com")]
    pub email: String,
    #[schema(example = "+5511999999999")]
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados de contato que chegam junto com o pedido de reserva
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerDetails {
    /// E-mail no formato usado como chave (sem espaços, minúsculo).
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_email_trims_and_lowercases() {
        let details = CustomerDetails {
            name: "Maria".into(),
            email: "  Maria.Silva@Email.COM ".into(),
            phone: "123".into(),
        };
        assert_eq!(details.normalized_email(), "maria.silva@email.com");
    }
}
