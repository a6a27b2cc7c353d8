//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

#[cfg(test)]
mod test_utils;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível (padrão: info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .context("Falha ao inicializar o estado da aplicação.")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    tracing::info!(
        strategy = ?app_state.config.lock_strategy,
        timeout_ms = app_state.config.booking_timeout.as_millis() as u64,
        "Alocador de reservas configurado"
    );

    let addr = app_state.config.server_addr;
    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(addr)
        .await
        .context("Falha ao iniciar o listener TCP")?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await.context("Erro no servidor Axum")?;

    Ok(())
}

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas (cliente final)
    let public_routes = Router::new()
        .route("/businesses/{slug}", get(handlers::public::get_business_by_slug))
        .route("/businesses/{slug}/services", get(handlers::public::list_public_services))
        .route("/businesses/{slug}/slots", get(handlers::public::list_public_slots));

    let public_booking_routes = Router::new()
        .route("/", post(handlers::bookings::create_booking))
        .route("/{id}", get(handlers::bookings::get_booking));

    // Rotas do dono (protegidas pelo middleware)
    let owner_booking_routes = Router::new()
        .route("/{id}/status", patch(handlers::bookings::update_booking_status))
        .route("/{id}/cancel", post(handlers::bookings::cancel_booking))
        .route("/{id}/history", get(handlers::bookings::get_booking_history))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let business_routes = Router::new()
        .route(
            "/",
            post(handlers::businesses::create_business).get(handlers::businesses::list_businesses),
        )
        .route(
            "/{business_id}",
            get(handlers::businesses::get_business)
                .put(handlers::businesses::update_business)
                .delete(handlers::businesses::delete_business),
        )
        // Catálogo
        .route(
            "/{business_id}/services",
            post(handlers::catalog::create_service).get(handlers::catalog::list_services),
        )
        .route(
            "/{business_id}/services/{service_id}",
            get(handlers::catalog::get_service)
                .put(handlers::catalog::update_service)
                .delete(handlers::catalog::delete_service),
        )
        // Horários
        .route("/{business_id}/slots", post(handlers::slots::create_slots))
        .route(
            "/{business_id}/slots/{slot_id}",
            get(handlers::slots::get_slot).delete(handlers::slots::delete_slot),
        )
        .route("/{business_id}/slots/generate", post(handlers::availability::generate_slots))
        // Expediente e agendas
        .route(
            "/{business_id}/availability",
            get(handlers::availability::get_availability).put(handlers::availability::set_availability),
        )
        .route(
            "/{business_id}/schedules",
            get(handlers::availability::list_schedules).post(handlers::availability::create_schedule),
        )
        .route(
            "/{business_id}/schedules/{schedule_id}",
            axum::routing::delete(handlers::availability::delete_schedule),
        )
        .route(
            "/{business_id}/schedules/{schedule_id}/generate",
            post(handlers::availability::generate_from_schedule),
        )
        // Reservas
        .route("/{business_id}/bookings", get(handlers::bookings::list_bookings))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ))
        // Pública, fora do route_layer acima
        .route(
            "/{business_id}/slots/available",
            get(handlers::slots::list_available_slots),
        );

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/public", public_routes)
        .nest("/api/businesses", business_routes)
        .nest("/api/bookings", public_booking_routes.merge(owner_booking_routes))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state)
}
