// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    db::service_repo::{NewService, ServiceChanges},
    middleware::{auth::AuthenticatedActor, i18n::Locale},
    models::{
        catalog::Service,
        pagination::{PageMeta, PageQuery, ServicePage},
    },
};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("negative_price".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServicePayload {
    #[validate(length(min = 3, message = "required"))]
    #[schema(example = "Corte Masculino")]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 5, max = 480, message = "invalid_duration"))]
    #[schema(example = 45)]
    pub duration_min: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 80.0)]
    pub total_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(value_type = f64, example = 20.0)]
    pub deposit_amount: Decimal,

    #[validate(range(min = 1, message = "invalid_capacity"))]
    pub capacity: Option<i32>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServicePayload {
    #[validate(length(min = 3, message = "required"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 5, max = 480, message = "invalid_duration"))]
    pub duration_min: Option<i32>,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub total_price: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub deposit_amount: Option<Decimal>,
    #[validate(range(min = 1, message = "invalid_capacity"))]
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

// ---
// Handlers
// ---
#[utoipa::path(
    post,
    path = "/api/businesses/{business_id}/services",
    tag = "Services",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento")),
    request_body = CreateServicePayload,
    responses(
        (status = 201, description = "Serviço criado", body = Service),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_service(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let new = NewService {
        name: payload.name.trim().to_string(),
        description: payload.description,
        duration_min: payload.duration_min,
        total_price: payload.total_price,
        deposit_amount: payload.deposit_amount,
        capacity: payload.capacity,
        is_active: payload.is_active.unwrap_or(true),
    };
    let service = app_state
        .catalog_service
        .create_service(business_id, &new)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(service)))
}

#[utoipa::path(
    get,
    path = "/api/businesses/{business_id}/services",
    tag = "Services",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento"), PageQuery),
    responses((status = 200, body = ServicePage)),
    security(("api_jwt" = []))
)]
pub async fn list_services(
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
        .catalog_service
        .list_services(business_id, offset, limit)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::OK,
        Json(ServicePage {
            data,
            meta: PageMeta::new(page, limit, total),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/businesses/{business_id}/services/{service_id}",
    tag = "Services",
    params(
        ("business_id" = Uuid, Path, description = "ID do estabelecimento"),
        ("service_id" = Uuid, Path, description = "ID do serviço")
    ),
    responses((status = 200, body = Service), (status = 404, description = "Não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_service(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path((business_id, service_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let service = app_state
        .catalog_service
        .get_service(business_id, service_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(service)))
}

#[utoipa::path(
    put,
    path = "/api/businesses/{business_id}/services/{service_id}",
    tag = "Services",
    params(
        ("business_id" = Uuid, Path, description = "ID do estabelecimento"),
        ("service_id" = Uuid, Path, description = "ID do serviço")
    ),
    request_body = UpdateServicePayload,
    responses((status = 200, body = Service)),
    security(("api_jwt" = []))
)]
pub async fn update_service(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path((business_id, service_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let changes = ServiceChanges {
        name: payload.name,
        description: payload.description,
        duration_min: payload.duration_min,
        total_price: payload.total_price,
        deposit_amount: payload.deposit_amount,
        capacity: payload.capacity,
        is_active: payload.is_active,
    };
    let service = app_state
        .catalog_service
        .update_service(business_id, service_id, &changes)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(service)))
}

#[utoipa::path(
    delete,
    path = "/api/businesses/{business_id}/services/{service_id}",
    tag = "Services",
    params(
        ("business_id" = Uuid, Path, description = "ID do estabelecimento"),
        ("service_id" = Uuid, Path, description = "ID do serviço")
    ),
    responses((status = 204, description = "Removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_service(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path((business_id, service_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    app_state
        .catalog_service
        .delete_service(business_id, service_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
