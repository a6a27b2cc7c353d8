// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// As variantes com `&'static str` carregam uma CHAVE de mensagem, não o texto:
// o texto final depende do idioma da requisição (ver `translate`).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Entidade: "slot", "service", "booking", "business", "schedule"
    #[error("{0} não encontrado")]
    NotFound(&'static str),

    // Requisição inválida (referência de outro tenant, data malformada...)
    #[error("Requisição inválida: {0}")]
    BadRequest(&'static str),

    // Resultado esperado, não é bug: o cliente deve escolher outro horário.
    #[error("Horário sem vagas")]
    SlotFull,

    #[error("Conflito: {0}")]
    Conflict(&'static str),

    #[error("Token inválido ou ausente")]
    Unauthorized,

    #[error("Acesso negado a este estabelecimento")]
    Forbidden,

    // A transação estourou o tempo e foi desfeita (nada foi gravado)
    #[error("Tempo limite da transação excedido")]
    Timeout,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

// Erro "pronto para a resposta HTTP", já traduzido
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SlotFull | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Converte para a resposta HTTP no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status_code();

        let (error, details) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => translate(m, lang).to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (translate("invalid_fields", lang).to_string(), Some(json!(details)))
            }
            AppError::NotFound(entity) => {
                (translate(&format!("{entity}_not_found"), lang).to_string(), None)
            }
            AppError::BadRequest(key) | AppError::Conflict(key) => {
                (translate(key, lang).to_string(), None)
            }
            AppError::SlotFull => (translate("slot_full", lang).to_string(), None),
            AppError::Unauthorized => (translate("unauthorized", lang).to_string(), None),
            AppError::Forbidden => (translate("forbidden", lang).to_string(), None),
            AppError::Timeout => (translate("timeout", lang).to_string(), None),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada; o cliente recebe uma genérica.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (translate("internal", lang).to_string(), None)
            }
        };

        ApiError { status, error, details }
    }
}

// Usado onde não temos o Locale (middlewares): cai no idioma padrão.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.to_api_error(&Locale::default())
    }
}

// ---
// Catálogo de mensagens (pt / en)
// ---
// Chave desconhecida volta como a própria chave.
pub fn translate<'a>(key: &'a str, lang: &str) -> &'a str {
    let pt = lang == "pt";
    let message = match key {
        "invalid_fields" => if pt { "Um ou mais campos são inválidos." } else { "One or more fields are invalid." },
        "slot_full" => if pt { "Este horário não tem mais vagas. Por favor, escolha outro horário." } else { "This slot is fully booked. Please pick another slot." },
        "unauthorized" => if pt { "Token de autenticação inválido ou ausente." } else { "Missing or invalid authentication token." },
        "forbidden" => if pt { "Você não tem acesso a este estabelecimento." } else { "You do not have access to this business." },
        "timeout" => if pt { "A operação demorou demais e foi desfeita. Tente novamente." } else { "The operation timed out and was rolled back. Please retry." },
        "internal" => if pt { "Ocorreu um erro inesperado." } else { "An unexpected error occurred." },

        "slot_not_found" => if pt { "Horário não encontrado." } else { "Slot not found." },
        "service_not_found" => if pt { "Serviço não encontrado." } else { "Service not found." },
        "booking_not_found" => if pt { "Reserva não encontrada." } else { "Booking not found." },
        "business_not_found" => if pt { "Estabelecimento não encontrado." } else { "Business not found." },
        "schedule_not_found" => if pt { "Agenda recorrente não encontrada." } else { "Recurring schedule not found." },

        "slot_business_mismatch" => if pt { "O horário não pertence a este estabelecimento." } else { "The slot does not belong to this business." },
        "service_business_mismatch" => if pt { "O serviço não pertence a este estabelecimento." } else { "The service does not belong to this business." },
        "slot_service_mismatch" => if pt { "Este horário é reservado para outro serviço." } else { "This slot is reserved for a different service." },
        "service_inactive" => if pt { "Este serviço não está disponível para reservas." } else { "This service is not available for booking." },
        "invalid_date" => if pt { "Data inválida, use o formato AAAA-MM-DD." } else { "Invalid date, expected YYYY-MM-DD." },
        "invalid_date_range" => if pt { "A data final deve ser igual ou posterior à data inicial." } else { "The end date must not be before the start date." },
        "date_range_too_long" => if pt { "Intervalo de datas longo demais." } else { "Date range is too long." },
        "invalid_duration" => if pt { "A duração deve ser maior que zero." } else { "Duration must be greater than zero." },
        "invalid_time_window" => if pt { "O horário final deve ser depois do inicial." } else { "End time must be after start time." },
        "invalid_day_of_week" => if pt { "Dia da semana deve estar entre 0 (segunda) e 6 (domingo)." } else { "Day of week must be between 0 (Monday) and 6 (Sunday)." },
        "invalid_capacity" => if pt { "A capacidade deve ser maior que zero." } else { "Capacity must be greater than zero." },
        "negative_price" => if pt { "Preços não podem ser negativos." } else { "Prices must not be negative." },
        "empty_slot_batch" => if pt { "Informe ao menos um horário." } else { "At least one slot is required." },
        "invalid_time" => if pt { "Horário inválido, use HH:MM." } else { "Invalid time, expected HH:MM." },
        "schedule_inactive" => if pt { "Esta agenda recorrente está inativa." } else { "This recurring schedule is inactive." },

        "slug_taken" => if pt { "Este endereço (slug) já está em uso." } else { "This slug is already taken." },
        "owner_has_business" => if pt { "Este usuário já possui um estabelecimento." } else { "This owner already has a business." },
        "invalid_slug" => if pt { "Slug inválido: use letras minúsculas, números e hífens (3 a 50 caracteres)." } else { "Invalid slug: use lowercase letters, digits and hyphens (3 to 50 characters)." },
        "invalid_email" => if pt { "O e-mail fornecido é inválido." } else { "The e-mail address is invalid." },
        "required" => if pt { "Campo obrigatório." } else { "This field is required." },
        _ => return key,
    };
    message
}
