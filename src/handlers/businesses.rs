// src/handlers/businesses.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    db::business_repo::{BusinessChanges, NewBusiness},
    middleware::{auth::AuthenticatedActor, i18n::Locale},
    models::{
        business::Business,
        pagination::{BusinessPage, PageMeta, PageQuery},
    },
    services::business_service::is_valid_slug,
};

// ---
// Validação Customizada
// ---
fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if !is_valid_slug(slug) {
        let mut err = ValidationError::new("slug");
        err.message = Some("invalid_slug".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Barbearia do Zé")]
    pub name: String,

    #[validate(custom(function = "validate_slug"))]
    #[schema(example = "barbearia-do-ze")]
    pub slug: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "barbershop")]
    pub vertical: String,

    pub description: Option<String>,
    pub theme_color: Option<String>,

    #[validate(range(min = 5, max = 480, message = "invalid_duration"))]
    pub slot_duration_min: Option<i32>,

    #[validate(range(min = 1, message = "invalid_capacity"))]
    pub max_bookings: Option<i32>,
}

// Sem slug: depois de criado ele não muda
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBusinessPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub vertical: Option<String>,
    pub description: Option<String>,
    pub theme_color: Option<String>,
    #[validate(range(min = 5, max = 480, message = "invalid_duration"))]
    pub slot_duration_min: Option<i32>,
    #[validate(range(min = 1, message = "invalid_capacity"))]
    pub max_bookings: Option<i32>,
}

// ---
// Handlers
// ---
#[utoipa::path(
    post,
    path = "/api/businesses",
    tag = "Businesses",
    request_body = CreateBusinessPayload,
    responses(
        (status = 201, description = "Estabelecimento criado", body = Business),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Slug em uso ou dono já tem estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_business(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Json(payload): Json<CreateBusinessPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let new = NewBusiness {
        owner_id: actor.id,
        name: payload.name.trim().to_string(),
        slug: payload.slug,
        vertical: payload.vertical,
        description: payload.description,
        theme_color: payload.theme_color,
        slot_duration_min: payload.slot_duration_min,
        max_bookings: payload.max_bookings,
    };

    let business = app_state
        .business_service
        .create_business(new)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(business)))
}

#[utoipa::path(
    get,
    path = "/api/businesses",
    tag = "Businesses",
    params(PageQuery),
    responses((status = 200, description = "Estabelecimentos do ator, mais recentes primeiro", body = BusinessPage)),
    security(("api_jwt" = []))
)]
pub async fn list_businesses(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit, offset) = query.resolve();
    let (data, total) = app_state
        .business_service
        .list_for_actor(&actor, offset, limit)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::OK,
        Json(BusinessPage {
            data,
            meta: PageMeta::new(page, limit, total),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/businesses/{business_id}",
    tag = "Businesses",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento")),
    responses(
        (status = 200, body = Business),
        (status = 403, description = "Sem acesso"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_business(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(business_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let business = app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(business)))
}

#[utoipa::path(
    put,
    path = "/api/businesses/{business_id}",
    tag = "Businesses",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento")),
    request_body = UpdateBusinessPayload,
    responses((status = 200, body = Business)),
    security(("api_jwt" = []))
)]
pub async fn update_business(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: AuthenticatedActor,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<UpdateBusinessPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .business_service
        .authorize(&actor, business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let changes = BusinessChanges {
        name: payload.name,
        vertical: payload.vertical,
        description: payload.description,
        theme_color: payload.theme_color,
        slot_duration_min: payload.slot_duration_min,
        max_bookings: payload.max_bookings,
    };
    let business = app_state
        .business_service
        .update_business(business_id, &changes)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(business)))
}

#[utoipa::path(
    delete,
    path = "/api/businesses/{business_id}",
    tag = "Businesses",
    params(("business_id" = Uuid, Path, description = "ID do estabelecimento")),
    responses((status = 204, description = "Removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_business(
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

    app_state
        .business_service
        .delete_business(business_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
