// src/config.rs

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        AvailabilityRepository, BookingRepository, BusinessRepository, CustomerRepository,
        ServiceRepository, SlotRepository,
    },
    services::{
        availability_service::AvailabilityService,
        booking_service::{BookingService, LockStrategy},
        business_service::BusinessService,
        catalog_service::CatalogService,
        notification::{BookingNotifier, LogNotifier},
        slot_service::SlotService,
    },
};

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: SocketAddr,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    /// Tempo máximo de cada transação do alocador
    pub booking_timeout: Duration,
    pub lock_strategy: LockStrategy,
    pub max_generation_days: i64,
}

// Variável opcional: ausente usa o padrão, presente mas inválida derruba o start
fn optional_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{name} inválida ('{raw}'): {e}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let server_addr = optional_var("SERVER_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        let db_max_connections = optional_var("DB_MAX_CONNECTIONS", 10u32)?;
        let db_acquire_timeout = Duration::from_secs(optional_var("DB_ACQUIRE_TIMEOUT_SECS", 3u64)?);
        let booking_timeout = Duration::from_millis(optional_var("BOOKING_TIMEOUT_MS", 5000u64)?);
        let lock_strategy = optional_var("BOOKING_LOCK_STRATEGY", LockStrategy::Pessimistic)?;
        let max_generation_days = optional_var("MAX_GENERATION_DAYS", 366i64)?;

        anyhow::ensure!(booking_timeout > Duration::ZERO, "BOOKING_TIMEOUT_MS deve ser maior que zero");
        anyhow::ensure!(max_generation_days > 0, "MAX_GENERATION_DAYS deve ser maior que zero");

        Ok(Self {
            database_url,
            jwt_secret,
            server_addr,
            db_max_connections,
            db_acquire_timeout,
            booking_timeout,
            lock_strategy,
            max_generation_days,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub business_service: BusinessService,
    pub catalog_service: CatalogService,
    pub slot_service: SlotService,
    pub availability_service: AvailabilityService,
    pub booking_service: BookingService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_parts(config, db_pool, Arc::new(LogNotifier)))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_parts(config: Config, db_pool: PgPool, notifier: Arc<dyn BookingNotifier>) -> Self {
        let business_repo = BusinessRepository::new(db_pool.clone());
        let service_repo = ServiceRepository::new(db_pool.clone());
        let slot_repo = SlotRepository::new(db_pool.clone());
        let booking_repo = BookingRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let availability_repo = AvailabilityRepository::new(db_pool.clone());

        let business_service = BusinessService::new(db_pool.clone(), business_repo.clone());
        let catalog_service = CatalogService::new(db_pool.clone(), service_repo.clone());
        let slot_service = SlotService::new(
            db_pool.clone(),
            slot_repo.clone(),
            service_repo.clone(),
            business_repo.clone(),
        );
        let availability_service = AvailabilityService::new(
            db_pool.clone(),
            availability_repo,
            business_repo.clone(),
            slot_repo.clone(),
            config.max_generation_days,
        );
        let booking_service = BookingService::new(
            db_pool.clone(),
            slot_repo,
            service_repo,
            booking_repo,
            customer_repo,
            business_repo,
            notifier,
            config.lock_strategy,
            config.booking_timeout,
        );

        Self {
            db_pool,
            config: Arc::new(config),
            business_service,
            catalog_service,
            slot_service,
            availability_service,
            booking_service,
        }
    }
}
