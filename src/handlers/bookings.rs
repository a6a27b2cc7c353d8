// src/handlers/bookings.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedActor, i18n::Locale},
    models::{
        booking::{Booking, BookingDetail, BookingHistory, BookingStatus},
        customer::CustomerDetails,
        pagination::{BookingPage, PageMeta, PageQuery},
    },
    services::booking_service::CreateBookingRequest,
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingPayload {
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub slot_id: Uuid,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Maria da Silva")]
    pub customer_name: String,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "maria@email.com")]
    pub customer_email: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "+5511999999999")]
    pub customer_phone: String,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: BookingStatus,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingPayload {
    pub reason: Option<String>,
}

// ---
// Rotas públicas
// ---
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    request_body = CreateBookingPayload,
    responses(
        (status = 201, description = "Reserva criada (PENDING)", body = Booking),
        (status = 400, description = "Dados inválidos ou referência de outro estabelecimento"),
        (status = 404, description = "Horário ou serviço não encontrado"),
        (status = 409, description = "Horário sem vagas"),
        (status = 503, description = "Tempo limite excedido, nada foi gravado")
    )
)]
pub async fn create_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let request = CreateBookingRequest {
        business_id: payload.business_id,
        service_id: payload.service_id,
        slot_id: payload.slot_id,
        customer: CustomerDetails {
            name: payload.customer_name,
            email: payload.customer_email,
            phone: payload.customer_phone,
        },
        notes: payload.notes,
    };

    let booking = app_state
        .booking_service
        .create_booking(&request)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(booking)))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    params(("id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, body = BookingDetail),
        (status = 404, description = "Reserva não encontrada")
    )
)]
pub async fn get_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .booking_service
        .get_booking(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(detail)))
}

// ---
// Rotas do dono
// ---

// Carrega a reserva e confere se o ator administra o estabelecimento dela
async fn authorize_booking(app_state: &AppState, actor: &AuthenticatedActor, id: Uuid) -> Result<Booking, AppError> {
    let booking = app_state.booking_service.find_booking(id).await?;
    app_state.business_service.authorize(actor, booking.business_id).await?;
    Ok(booking)
}

#[utoipa::path(
    get,
    path = "/api/businesses/{business_id}/bookings",
    tag = "Bookings",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento"), PageQuery),
    responses((status = 200, description = "Mais recentes primeiro", body = BookingPage)),
    security(("api_jwt" = []))
)]
pub async fn list_bookings(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(business_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let (page, limit, offset) = query.resolve();
    let (data, total) = app_state
        .booking_service
        .list_bookings(business_id, offset, limit)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::OK,
        Json(BookingPage {
            data,
            meta: PageMeta::new(page, limit, total),
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/status",
    tag = "Bookings",
    params(("id" = Uuid, Path, description = "ID da reserva")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, body = Booking),
        (status = 409, description = "Reativação sem vaga no horário")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_booking_status(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_booking(&app_state, &actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let booking = app_state
        .booking_service
        .update_booking_status(id, payload.status, Some(actor.id))
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(booking)))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/cancel",
    tag = "Bookings",
    params(("id" = Uuid, Path, description = "ID da reserva")),
    request_body = CancelBookingPayload,
    responses((status = 200, description = "Reserva cancelada, vaga devolvida", body = Booking)),
    security(("api_jwt" = []))
)]
pub async fn cancel_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(id): Path<Uuid>,
    payload: Option<Json<CancelBookingPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_booking(&app_state, &actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    // Corpo opcional: POST sem body também cancela
    let reason = payload.and_then(|Json(p)| p.reason);

    let booking = app_state
        .booking_service
        .cancel_booking(id, reason.as_deref(), Some(actor.id))
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(booking)))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}/history",
    tag = "Bookings",
    params(("id" = Uuid, Path, description = "ID da reserva")),
    responses((status = 200, description = "Mais antigos primeiro", body = Vec<BookingHistory>)),
    security(("api_jwt" = []))
)]
pub async fn get_booking_history(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_booking(&app_state, &actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let history = app_state
        .booking_service
        .list_history(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(history)))
}
