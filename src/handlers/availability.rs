// src/handlers/availability.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedActor, i18n::Locale},
    models::scheduling::{BusinessAvailability, RecurringSchedule, Slot},
    services::availability_service::{DayTemplate, ScheduleInput},
};

// ---
// Payloads
// ---
// Serialize: o `nested` do validator exige nos itens da lista
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayPayload {
    /// 0 = segunda-feira ... 6 = domingo
    #[validate(range(min = 0, max = 6, message = "invalid_day_of_week"))]
    pub day_of_week: i16,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "17:00")]
    pub end_time: String,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAvailabilityPayload {
    #[validate(length(min = 1, max = 7, message = "invalid_day_of_week"), nested)]
    pub days: Vec<DayPayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSlotsPayload {
    #[schema(example = "2025-03-10")]
    pub start_date: String,
    #[schema(example = "2025-03-16")]
    pub end_date: String,
    /// Padrão: slot_duration_min do estabelecimento
    #[validate(range(min = 1, message = "invalid_duration"))]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchedulePayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(length(min = 1, max = 7, message = "invalid_day_of_week"))]
    pub days_of_week: Vec<i32>,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "12:00")]
    pub end_time: String,
    #[schema(example = "2025-03-01")]
    pub start_date: String,
    #[schema(example = "2025-06-30")]
    pub end_date: String,
    #[serde(default)]
    pub exclude_dates: Vec<String>,
}

// ---
// Expediente semanal
// ---
#[utoipa::path(
    get,
    path = "/api/businesses/{business_id}/availability",
    tag = "Availability",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento")),
    responses((status = 200, body = Vec<BusinessAvailability>)),
    security(("api_jwt" = []))
)]
pub async fn get_availability(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(business_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let week = app_state
        .availability_service
        .get_weekly(business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(week)))
}

#[utoipa::path(
    put,
    path = "/api/businesses/{business_id}/availability",
    tag = "Availability",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento")),
    request_body = WeeklyAvailabilityPayload,
    responses((status = 200, description = "Semana completa após a gravação", body = Vec<BusinessAvailability>)),
    security(("api_jwt" = []))
)]
pub async fn set_availability(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<WeeklyAvailabilityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let days: Vec<DayTemplate> = payload
        .days
        .into_iter()
        .map(|d| DayTemplate {
            day_of_week: d.day_of_week,
            start_time: d.start_time,
            end_time: d.end_time,
            is_closed: d.is_closed,
        })
        .collect();

    let week = app_state
        .availability_service
        .set_weekly(business_id, &days)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(week)))
}

#[utoipa::path(
    post,
    path = "/api/businesses/{business_id}/slots/generate",
    tag = "Availability",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento")),
    request_body = GenerateSlotsPayload,
    responses(
        (status = 201, description = "Horários gerados, em ordem de início", body = Vec<Slot>),
        (status = 400, description = "Datas ou duração inválidas")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_slots(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<GenerateSlotsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let slots = app_state
        .availability_service
        .generate_slots(
            business_id,
            &payload.start_date,
            &payload.end_date,
            payload.duration_minutes,
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(slots)))
}

// ---
// Agendas recorrentes
// ---
#[utoipa::path(
    get,
    path = "/api/businesses/{business_id}/schedules",
    tag = "Availability",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento")),
    responses((status = 200, body = Vec<RecurringSchedule>)),
    security(("api_jwt" = []))
)]
pub async fn list_schedules(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(business_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let schedules = app_state
        .availability_service
        .list_schedules(business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(schedules)))
}

#[utoipa::path(
    post,
    path = "/api/businesses/{business_id}/schedules",
    tag = "Availability",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento")),
    request_body = CreateSchedulePayload,
    responses((status = 201, body = RecurringSchedule), (status = 400, description = "Dados inválidos")),
    security(("api_jwt" = []))
)]
pub async fn create_schedule(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateSchedulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let input = ScheduleInput {
        name: payload.name,
        days_of_week: payload.days_of_week,
        start_time: payload.start_time,
        end_time: payload.end_time,
        start_date: payload.start_date,
        end_date: payload.end_date,
        exclude_dates: payload.exclude_dates,
    };
    let schedule = app_state
        .availability_service
        .create_schedule(business_id, &input)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(schedule)))
}

#[utoipa::path(
    delete,
    path = "/api/businesses/{business_id}/schedules/{schedule_id}",
    tag = "Availability",
    params(
        ("business_id" = Uuid, Path, description = "ID do estabelecimento"),
        ("schedule_id" = Uuid, Path, description = "ID da agenda")
    ),
    responses((status = 204, description = "Removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_schedule(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path((business_id, schedule_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    app_state
        .availability_service
        .delete_schedule(business_id, schedule_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/businesses/{business_id}/schedules/{schedule_id}/generate",
    tag = "Availability",
    params(
        ("business_id" = Uuid, Path, description = "ID do estabelecimento"),
        ("schedule_id" = Uuid, Path, description = "ID da agenda")
    ),
    request_body = GenerateSlotsPayload,
    responses((status = 201, body = Vec<Slot>)),
    security(("api_jwt" = []))
)]
pub async fn generate_from_schedule(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path((business_id, schedule_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<GenerateSlotsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let slots = app_state
        .availability_service
        .generate_from_schedule(
            business_id,
            schedule_id,
            &payload.start_date,
            &payload.end_date,
            payload.duration_minutes,
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(slots)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(day_of_week: i16) -> DayPayload {
        DayPayload {
            day_of_week,
            start_time: "09:00".into(),
            end_time: "17:00".into(),
            is_closed: false,
        }
    }

    #[test]
    fn weekly_payload_validates_each_day() {
        let ok = WeeklyAvailabilityPayload { days: vec![day(0), day(6)] };
        assert!(ok.validate().is_ok());

        let bad = WeeklyAvailabilityPayload { days: vec![day(0), day(7)] };
        let errors = bad.validate().unwrap_err();
        assert!(errors.errors().contains_key("days"));

        let empty = WeeklyAvailabilityPayload { days: vec![] };
        assert!(empty.validate().is_err());
    }
}
