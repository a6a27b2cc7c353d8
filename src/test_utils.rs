// src/test_utils.rs
//
// Fixtures compartilhadas pelos testes que usam banco (#[sqlx::test]).

use std::{sync::Arc, time::Duration};

use axum_test::TestServer;
use chrono::{TimeDelta, Timelike, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    build_router,
    config::{AppState, Config},
    db::{
        business_repo::NewBusiness, service_repo::NewService, BookingRepository,
        BusinessRepository, CustomerRepository, ServiceRepository, SlotRepository,
    },
    middleware::auth::Claims,
    models::{
        business::Business,
        catalog::Service,
        customer::CustomerDetails,
        scheduling::{NewSlot, Slot},
    },
    services::{
        booking_service::{BookingService, CreateBookingRequest, LockStrategy},
        notification::{testing::RecordingNotifier, BookingNotifier},
    },
};

pub const TEST_JWT_SECRET: &str = "segredo-de-teste";

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        server_addr: ([127, 0, 0, 1], 0).into(),
        db_max_connections: 5,
        db_acquire_timeout: Duration::from_secs(3),
        booking_timeout: Duration::from_secs(5),
        lock_strategy: LockStrategy::Pessimistic,
        max_generation_days: 366,
    }
}

pub fn create_test_app(pool: PgPool) -> TestServer {
    let state = AppState::from_parts(test_config(), pool, Arc::new(RecordingNotifier::default()));
    TestServer::new(build_router(state)).expect("Falha ao criar o servidor de teste")
}

/// Token assinado com o segredo de teste, válido por uma hora.
pub fn owner_token(owner_id: Uuid, business_id: Option<Uuid>) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: owner_id,
        business_id,
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Falha ao assinar o token de teste")
}

pub fn booking_service(
    pool: &PgPool,
    strategy: LockStrategy,
    notifier: Arc<dyn BookingNotifier>,
) -> BookingService {
    booking_service_with_timeout(pool, strategy, notifier, Duration::from_secs(5))
}

pub fn booking_service_with_timeout(
    pool: &PgPool,
    strategy: LockStrategy,
    notifier: Arc<dyn BookingNotifier>,
    timeout: Duration,
) -> BookingService {
    BookingService::new(
        pool.clone(),
        SlotRepository::new(pool.clone()),
        ServiceRepository::new(pool.clone()),
        BookingRepository::new(pool.clone()),
        CustomerRepository::new(pool.clone()),
        BusinessRepository::new(pool.clone()),
        notifier,
        strategy,
        timeout,
    )
}

// ---
// Dados semeados
// ---

pub struct CatalogFixture {
    pub business: Business,
    pub service: Service,
    pub slot: Slot,
}

impl CatalogFixture {
    pub fn request(&self, email: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            business_id: self.business.id,
            service_id: self.service.id,
            slot_id: self.slot.id,
            customer: CustomerDetails {
                name: "Cliente Teste".to_string(),
                email: email.to_string(),
                phone: "+5511999990000".to_string(),
            },
            notes: None,
        }
    }
}

/// Estabelecimento novo (dono e slug únicos) com um serviço e um horário
/// genérico de amanhã com a capacidade pedida.
pub async fn seed_catalog(pool: &PgPool, capacity: i32) -> CatalogFixture {
    let business = seed_business(pool).await;
    let service = seed_service(pool, business.id, None).await;
    let slot = seed_slot(pool, business.id, None, capacity).await;
    CatalogFixture { business, service, slot }
}

pub async fn seed_business(pool: &PgPool) -> Business {
    let suffix = Uuid::new_v4().simple().to_string();
    let new = NewBusiness {
        owner_id: Uuid::new_v4(),
        name: "Barbearia Teste".to_string(),
        slug: format!("barbearia-{}", &suffix[..12]),
        vertical: "barbershop".to_string(),
        description: None,
        theme_color: None,
        slot_duration_min: None,
        max_bookings: None,
    };
    BusinessRepository::new(pool.clone())
        .create(pool, &new)
        .await
        .expect("Falha ao semear o estabelecimento")
}

pub async fn seed_service(pool: &PgPool, business_id: Uuid, capacity: Option<i32>) -> Service {
    let new = NewService {
        name: "Corte de Cabelo".to_string(),
        description: None,
        duration_min: 60,
        total_price: Decimal::new(8000, 2),
        deposit_amount: Decimal::new(2000, 2),
        capacity,
        is_active: true,
    };
    ServiceRepository::new(pool.clone())
        .create(pool, business_id, &new)
        .await
        .expect("Falha ao semear o serviço")
}

pub async fn seed_slot(
    pool: &PgPool,
    business_id: Uuid,
    service_id: Option<Uuid>,
    capacity: i32,
) -> Slot {
    let start = (Utc::now() + TimeDelta::days(1))
        .with_nanosecond(0)
        .unwrap_or_else(Utc::now);
    let new = NewSlot {
        service_id,
        start_time: start,
        end_time: start + TimeDelta::hours(1),
        capacity,
    };
    SlotRepository::new(pool.clone())
        .create_many(pool, business_id, &[new])
        .await
        .expect("Falha ao semear o horário")
        .remove(0)
}
