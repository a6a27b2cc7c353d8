// src/handlers/slots.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedActor, i18n::Locale},
    models::scheduling::Slot,
    services::slot_service::SlotRequest,
};

// ---
// Payloads
// ---
// Serialize: o `nested` do validator exige nos itens da lista
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotPayload {
    pub service_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Se omitido: capacidade do serviço, senão max_bookings do estabelecimento
    #[validate(range(min = 1, message = "invalid_capacity"))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotsPayload {
    #[validate(length(min = 1, message = "empty_slot_batch"), nested)]
    pub slots: Vec<SlotPayload>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AvailableSlotsQuery {
    /// Filtra pelo serviço (os horários genéricos também aparecem)
    pub service_id: Option<Uuid>,
    /// YYYY-MM-DD (inclusivo)
    pub start_date: Option<String>,
    /// YYYY-MM-DD (inclusivo)
    pub end_date: Option<String>,
}

// ---
// Handlers
// ---
#[utoipa::path(
    post,
    path = "/api/businesses/{business_id}/slots",
    tag = "Slots",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento")),
    request_body = CreateSlotsPayload,
    responses(
        (status = 201, description = "Horários criados", body = Vec<Slot>),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_slots(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateSlotsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let requests: Vec<SlotRequest> = payload
        .slots
        .into_iter()
        .map(|s| SlotRequest {
            service_id: s.service_id,
            start_time: s.start_time,
            end_time: s.end_time,
            capacity: s.capacity,
        })
        .collect();

    let slots = app_state
        .slot_service
        .create_slots(business_id, &requests)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(slots)))
}

#[utoipa::path(
    get,
    path = "/api/businesses/{business_id}/slots/{slot_id}",
    tag = "Slots",
    params(
        ("business_id" = Uuid, Path, description = "ID do estabelecimento"),
        ("slot_id" = Uuid, Path, description = "ID do horário")
    ),
    responses((status = 200, body = Slot), (status = 404, description = "Não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_slot(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path((business_id, slot_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let slot = app_state
        .slot_service
        .get_slot(business_id, slot_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(slot)))
}

#[utoipa::path(
    delete,
    path = "/api/businesses/{business_id}/slots/{slot_id}",
    tag = "Slots",
    params(
        ("business_id" = Uuid, Path, description = "ID do estabelecimento"),
        ("slot_id" = Uuid, Path, description = "ID do horário")
    ),
    responses((status = 204, description = "Removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_slot(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path((business_id, slot_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    app_state
        .slot_service
        .delete_slot(business_id, slot_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// Pública: o cliente final escolhe o horário por aqui
#[utoipa::path(
    get,
    path = "/api/businesses/{business_id}/slots/available",
    tag = "Slots",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento"), AvailableSlotsQuery),
    responses(
        (status = 200, description = "Horários com vaga, em ordem de início", body = Vec<Slot>),
        (status = 404, description = "Estabelecimento não encontrado")
    )
)]
pub async fn list_available_slots(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(business_id): Path<Uuid>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let slots = app_state
        .slot_service
        .list_available(
            business_id,
            query.service_id,
            query.start_date.as_deref(),
            query.end_date.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(slots)))
}
