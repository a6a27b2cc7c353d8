// src/handlers/public.rs

// Vitrine pública do estabelecimento (endereçada pelo slug), sem token.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    handlers::slots::AvailableSlotsQuery,
    middleware::i18n::Locale,
    models::{business::Business, catalog::Service, scheduling::Slot},
};

#[utoipa::path(
    get,
    path = "/api/public/businesses/{slug}",
    tag = "Public",
    params(("slug" = String, Path, description = "Slug do estabelecimento")),
    responses((status = 200, body = Business), (status = 404, description = "Não encontrado"))
)]
pub async fn get_business_by_slug(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let business = app_state
        .business_service
        .get_by_slug(&slug)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(business)))
}

#[utoipa::path(
    get,
    path = "/api/public/businesses/{slug}/services",
    tag = "Public",
    params(("slug" = String, Path, description = "Slug do estabelecimento")),
    responses((status = 200, description = "Serviços ativos", body = Vec<Service>))
)]
pub async fn list_public_services(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let business = app_state
        .business_service
        .get_by_slug(&slug)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let services = app_state
        .catalog_service
        .list_active_services(business.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(services)))
}

#[utoipa::path(
    get,
    path = "/api/public/businesses/{slug}/slots",
    tag = "Public",
    params(("slug" = String, Path, description = "Slug do estabelecimento"), AvailableSlotsQuery),
    responses((status = 200, description = "Horários com vaga", body = Vec<Slot>))
)]
pub async fn list_public_slots(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let business = app_state
        .business_service
        .get_by_slug(&slug)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let slots = app_state
        .slot_service
        .list_available(
            business.id,
            query.service_id,
            query.start_date.as_deref(),
            query.end_date.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(slots)))
}
