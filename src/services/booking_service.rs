// src/services/booking_service.rs

use std::{str::FromStr, sync::Arc, time::Duration};

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{begin_with_statement_timeout, with_timeout},
        error::AppError,
    },
    db::{
        BookingRepository, BusinessRepository, CustomerRepository, ServiceRepository,
        SlotRepository,
    },
    models::{
        booking::{
            Booking, BookingDetail, BookingDraft, BookingHistory, BookingStatus, NewHistoryEntry,
        },
        customer::CustomerDetails,
    },
    services::notification::{self, BookingNotifier, NotificationKind},
};

// Como o passo 1 lê o horário.
// Nos dois modos quem decide a vaga é o UPDATE condicional (try_increment_occupancy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockStrategy {
    /// SELECT ... FOR UPDATE: concorrentes no mesmo horário fazem fila.
    #[default]
    Pessimistic,
    /// SELECT simples: ninguém espera na leitura, o UPDATE condicional desempata.
    Optimistic,
}

impl FromStr for LockStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pessimistic" => Ok(Self::Pessimistic),
            "optimistic" => Ok(Self::Optimistic),
            other => anyhow::bail!("estratégia de lock desconhecida: '{other}' (use pessimistic ou optimistic)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub slot_id: Uuid,
    pub customer: CustomerDetails,
    pub notes: Option<String>,
}

// Nomes gravados na coluna `action` do histórico
const ACTION_CREATED: &str = "created";
const ACTION_STATUS_CHANGED: &str = "status_changed";
const ACTION_CANCELLED: &str = "cancelled";

#[derive(Clone)]
pub struct BookingService {
    pool: PgPool,
    slot_repo: SlotRepository,
    service_repo: ServiceRepository,
    booking_repo: BookingRepository,
    customer_repo: CustomerRepository,
    business_repo: BusinessRepository,
    notifier: Arc<dyn BookingNotifier>,
    lock_strategy: LockStrategy,
    timeout: Duration,
}

impl BookingService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        slot_repo: SlotRepository,
        service_repo: ServiceRepository,
        booking_repo: BookingRepository,
        customer_repo: CustomerRepository,
        business_repo: BusinessRepository,
        notifier: Arc<dyn BookingNotifier>,
        lock_strategy: LockStrategy,
        timeout: Duration,
    ) -> Self {
        Self {
            pool,
            slot_repo,
            service_repo,
            booking_repo,
            customer_repo,
            business_repo,
            notifier,
            lock_strategy,
            timeout,
        }
    }

    // ---
    // Alocação (o coração do sistema)
    // ---

    /// Reserva uma vaga no horário. Tudo numa transação: ou a reserva, o cliente,
    /// o contador e o histórico são gravados juntos, ou nada é gravado.
    #[tracing::instrument(
        skip(self, request),
        fields(
            business_id = %request.business_id,
            slot_id = %request.slot_id,
            strategy = ?self.lock_strategy
        )
    )]
    pub async fn create_booking(&self, request: &CreateBookingRequest) -> Result<Booking, AppError> {
        let result = with_timeout(self.timeout, self.allocate(request)).await;

        match &result {
            Ok(booking) => tracing::info!(booking_id = %booking.id, "Reserva criada"),
            Err(AppError::SlotFull) => tracing::info!("Horário sem vagas"),
            Err(AppError::Timeout) => tracing::warn!("Reserva desfeita por tempo limite"),
            Err(_) => {}
        }
        let booking = result?;

        // Só depois do commit. O resultado não depende do aviso.
        notification::dispatch(
            self.notifier.clone(),
            NotificationKind::Confirmed,
            (&booking).into(),
        );
        Ok(booking)
    }

    async fn allocate(&self, request: &CreateBookingRequest) -> Result<Booking, AppError> {
        let mut tx = begin_with_statement_timeout(&self.pool, self.timeout).await?;

        // 1. Lê (ou trava) o horário
        let slot = match self.lock_strategy {
            LockStrategy::Pessimistic => {
                self.slot_repo.find_by_id_for_update(&mut *tx, request.slot_id).await?
            }
            LockStrategy::Optimistic => self.slot_repo.find_by_id(&mut *tx, request.slot_id).await?,
        }
        .ok_or(AppError::NotFound("slot"))?;

        // 2. Horário de outro estabelecimento
        if slot.business_id != request.business_id {
            return Err(AppError::BadRequest("slot_business_mismatch"));
        }

        // 3. Checagem rápida (no modo otimista o valor pode estar velho)
        if !slot.has_room() {
            return Err(AppError::SlotFull);
        }

        // 4. Serviço
        let service = self
            .service_repo
            .find_by_id(&mut *tx, request.service_id)
            .await?
            .ok_or(AppError::NotFound("service"))?;
        if service.business_id != request.business_id {
            return Err(AppError::BadRequest("service_business_mismatch"));
        }
        if !service.is_active {
            return Err(AppError::BadRequest("service_inactive"));
        }
        if slot.service_id.is_some_and(|bound| bound != service.id) {
            return Err(AppError::BadRequest("slot_service_mismatch"));
        }

        // 5. Cliente (idempotente por e-mail)
        let customer = self
            .customer_repo
            .find_or_create(&mut *tx, request.business_id, &request.customer)
            .await?;

        // 6. Reserva, com a "foto" do serviço e do horário
        let draft = BookingDraft {
            business_id: request.business_id,
            service_id: service.id,
            slot_id: slot.id,
            customer_id: customer.id,
            customer_name: request.customer.name.trim().to_string(),
            customer_email: request.customer.normalized_email(),
            customer_phone: request.customer.phone.trim().to_string(),
            service_name: service.name.clone(),
            slot_time: slot.start_time,
            deposit_paid: service.deposit_amount,
            total_price: service.total_price,
            notes: request.notes.clone(),
        };
        let booking = self.booking_repo.create(&mut *tx, &draft).await?;

        // 7 + 8. O UPDATE condicional é a palavra final sobre a vaga.
        // Zero linhas: alguém levou a última vaga. Retornar aqui descarta `tx` (rollback).
        if self
            .slot_repo
            .try_increment_occupancy(&mut *tx, slot.id)
            .await?
            .is_none()
        {
            return Err(AppError::SlotFull);
        }

        // 9. Histórico
        self.booking_repo
            .append_history(
                &mut *tx,
                &NewHistoryEntry {
                    booking_id: booking.id,
                    action: ACTION_CREATED,
                    previous_status: None,
                    new_status: booking.status,
                    performed_by: None,
                    notes: None,
                },
            )
            .await?;

        // 10. Commit
        tx.commit().await?;
        Ok(booking)
    }

    // ---
    // Mudanças de status
    // ---

    /// Qualquer status pode ir para qualquer outro. A vaga só muda quando a reserva
    /// cruza a fronteira ativa/cancelada. Ir para CANCELLED usa o fluxo de cancelamento.
    #[tracing::instrument(skip(self))]
    pub async fn update_booking_status(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        actor: Option<Uuid>,
    ) -> Result<Booking, AppError> {
        if status == BookingStatus::Cancelled {
            return self.cancel_booking(booking_id, None, actor).await;
        }

        let result = with_timeout(self.timeout, self.transition(booking_id, status, actor)).await;
        if let Err(AppError::SlotFull) = &result {
            tracing::info!("Reativação recusada: horário sem vagas");
        }
        result
    }

    async fn transition(
        &self,
        booking_id: Uuid,
        status: BookingStatus,
        actor: Option<Uuid>,
    ) -> Result<Booking, AppError> {
        let mut tx = begin_with_statement_timeout(&self.pool, self.timeout).await?;

        let current = self
            .booking_repo
            .find_by_id_for_update(&mut *tx, booking_id)
            .await?
            .ok_or(AppError::NotFound("booking"))?;
        let previous = current.status;

        // Saindo de CANCELLED: precisa reservar a vaga de novo
        if !previous.holds_slot() && status.holds_slot() {
            let reserved = self
                .slot_repo
                .try_increment_occupancy(&mut *tx, current.slot_id)
                .await?;
            if reserved.is_none() {
                return Err(AppError::SlotFull);
            }
        }

        let updated = self.booking_repo.update_status(&mut *tx, booking_id, status).await?;

        self.booking_repo
            .append_history(
                &mut *tx,
                &NewHistoryEntry {
                    booking_id,
                    action: ACTION_STATUS_CHANGED,
                    previous_status: Some(previous),
                    new_status: status,
                    performed_by: actor,
                    notes: None,
                },
            )
            .await?;

        tx.commit().await?;
        tracing::info!(from = ?previous, to = ?status, "Status da reserva alterado");
        Ok(updated)
    }

    /// Cancela e devolve a vaga. Cancelar de novo só registra no histórico.
    #[tracing::instrument(skip(self, reason))]
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        reason: Option<&str>,
        actor: Option<Uuid>,
    ) -> Result<Booking, AppError> {
        let (booking, released) =
            with_timeout(self.timeout, self.cancel(booking_id, reason, actor)).await?;

        if released {
            notification::dispatch(
                self.notifier.clone(),
                NotificationKind::Cancelled,
                (&booking).into(),
            );
        }
        Ok(booking)
    }

    async fn cancel(
        &self,
        booking_id: Uuid,
        reason: Option<&str>,
        actor: Option<Uuid>,
    ) -> Result<(Booking, bool), AppError> {
        let mut tx = begin_with_statement_timeout(&self.pool, self.timeout).await?;

        let current = self
            .booking_repo
            .find_by_id_for_update(&mut *tx, booking_id)
            .await?
            .ok_or(AppError::NotFound("booking"))?;
        let previous = current.status;
        let release = previous.holds_slot();

        let booking = if release {
            self.slot_repo.release_occupancy(&mut *tx, current.slot_id).await?;
            self.booking_repo.mark_cancelled(&mut *tx, booking_id, reason).await?
        } else {
            current
        };

        self.booking_repo
            .append_history(
                &mut *tx,
                &NewHistoryEntry {
                    booking_id,
                    action: ACTION_CANCELLED,
                    previous_status: Some(previous),
                    new_status: BookingStatus::Cancelled,
                    performed_by: actor,
                    notes: reason,
                },
            )
            .await?;

        tx.commit().await?;
        if release {
            tracing::info!(from = ?previous, "Reserva cancelada, vaga devolvida");
        }
        Ok((booking, release))
    }

    // ---
    // Leituras
    // ---

    pub async fn find_booking(&self, booking_id: Uuid) -> Result<Booking, AppError> {
        self.booking_repo
            .find_by_id(&self.pool, booking_id)
            .await?
            .ok_or(AppError::NotFound("booking"))
    }

    /// Reserva com as entidades relacionadas (mesmo as já apagadas).
    pub async fn get_booking(&self, booking_id: Uuid) -> Result<BookingDetail, AppError> {
        let booking = self.find_booking(booking_id).await?;

        let business = self.business_repo.find_by_id_any(&self.pool, booking.business_id).await?;
        let service = self.service_repo.find_by_id_any(&self.pool, booking.service_id).await?;
        let slot = self.slot_repo.find_by_id_any(&self.pool, booking.slot_id).await?;
        let customer = match booking.customer_id {
            Some(id) => self.customer_repo.find_by_id(id).await?,
            None => None,
        };

        Ok(BookingDetail {
            booking,
            business,
            service,
            slot,
            customer,
        })
    }

    pub async fn list_bookings(
        &self,
        business_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Booking>, i64), AppError> {
        self.booking_repo.list_by_business(business_id, offset, limit).await
    }

    pub async fn list_history(&self, booking_id: Uuid) -> Result<Vec<BookingHistory>, AppError> {
        self.find_booking(booking_id).await?;
        self.booking_repo.list_history(booking_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::notification::testing::{FailingNotifier, RecordingNotifier},
        test_utils::*,
    };
    use sqlx::PgPool;

    #[test]
    fn lock_strategy_parses_from_config() {
        assert_eq!("pessimistic".parse::<LockStrategy>().unwrap(), LockStrategy::Pessimistic);
        assert_eq!(" Optimistic ".parse::<LockStrategy>().unwrap(), LockStrategy::Optimistic);
        assert!("advisory".parse::<LockStrategy>().is_err());
        assert_eq!(LockStrategy::default(), LockStrategy::Pessimistic);
    }

    async fn slot_counts(pool: &PgPool, slot_id: Uuid) -> (i32, bool) {
        sqlx::query_as::<_, (i32, bool)>("SELECT booked_count, is_booked FROM slots WHERE id = $1")
            .bind(slot_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn count_rows(pool: &PgPool, sql: &str, id: Uuid) -> i64 {
        sqlx::query_scalar(sql).bind(id).fetch_one(pool).await.unwrap()
    }

    // ---
    // Capacidade sob concorrência
    // ---

    async fn race_for_last_seat(pool: PgPool, strategy: LockStrategy) {
        let fixture = seed_catalog(&pool, 5).await;
        let service = booking_service(&pool, strategy, Arc::new(RecordingNotifier::default()));

        // Deixa o horário com capacity - 1 reservas
        for i in 0..4 {
            service
                .create_booking(&fixture.request(&format!("pre{i}@example.com")))
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            let request = fixture.request(&format!("racer{i}@example.com"));
            handles.push(tokio::spawn(async move { service.create_booking(&request).await }));
        }

        let mut won = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(AppError::SlotFull) => full += 1,
                Err(e) => panic!("erro inesperado: {e:?}"),
            }
        }

        assert_eq!(won, 1);
        assert_eq!(full, 7);
        assert_eq!(slot_counts(&pool, fixture.slot.id).await, (5, true));

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE slot_id = $1 AND status <> 'CANCELLED'",
        )
        .bind(fixture.slot.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(active, 5);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn only_one_racer_gets_the_last_seat_pessimistic(pool: PgPool) {
        race_for_last_seat(pool, LockStrategy::Pessimistic).await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn only_one_racer_gets_the_last_seat_optimistic(pool: PgPool) {
        race_for_last_seat(pool, LockStrategy::Optimistic).await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn full_slot_leaves_no_partial_writes(pool: PgPool) {
        let fixture = seed_catalog(&pool, 1).await;
        let service = booking_service(&pool, LockStrategy::Optimistic, Arc::new(RecordingNotifier::default()));

        service.create_booking(&fixture.request("first@example.com")).await.unwrap();
        let err = service
            .create_booking(&fixture.request("second@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SlotFull));

        let bookings = count_rows(&pool, "SELECT COUNT(*) FROM bookings WHERE slot_id = $1", fixture.slot.id).await;
        assert_eq!(bookings, 1);
        // O cliente do pedido recusado também não ficou gravado
        let customers = count_rows(&pool, "SELECT COUNT(*) FROM customers WHERE business_id = $1", fixture.business.id).await;
        assert_eq!(customers, 1);
    }

    // ---
    // Reversibilidade
    // ---

    #[sqlx::test]
    #[test_log::test]
    async fn cancel_restores_occupancy(pool: PgPool) {
        for strategy in [LockStrategy::Pessimistic, LockStrategy::Optimistic] {
            let fixture = seed_catalog(&pool, 2).await;
            let service = booking_service(&pool, strategy, Arc::new(RecordingNotifier::default()));

            let before = slot_counts(&pool, fixture.slot.id).await;
            let booking = service.create_booking(&fixture.request("ana@example.com")).await.unwrap();
            assert_eq!(slot_counts(&pool, fixture.slot.id).await, (1, false));

            let cancelled = service
                .cancel_booking(booking.id, Some("imprevisto"), None)
                .await
                .unwrap();
            assert_eq!(cancelled.status, BookingStatus::Cancelled);
            assert_eq!(cancelled.cancel_reason.as_deref(), Some("imprevisto"));
            assert!(cancelled.cancelled_at.is_some());
            assert_eq!(slot_counts(&pool, fixture.slot.id).await, before);
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn cancelling_twice_releases_once(pool: PgPool) {
        let fixture = seed_catalog(&pool, 2).await;
        let service = booking_service(&pool, LockStrategy::Pessimistic, Arc::new(RecordingNotifier::default()));

        let a = service.create_booking(&fixture.request("a@example.com")).await.unwrap();
        service.create_booking(&fixture.request("b@example.com")).await.unwrap();
        assert_eq!(slot_counts(&pool, fixture.slot.id).await, (2, true));

        service.cancel_booking(a.id, None, None).await.unwrap();
        service.cancel_booking(a.id, None, None).await.unwrap();
        assert_eq!(slot_counts(&pool, fixture.slot.id).await, (1, false));

        let history = service.list_history(a.id).await.unwrap();
        let actions: Vec<&str> = history.iter().map(|h| h.action.as_str()).collect();
        assert_eq!(actions, vec!["created", "cancelled", "cancelled"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn reactivating_needs_a_free_seat(pool: PgPool) {
        let fixture = seed_catalog(&pool, 1).await;
        let service = booking_service(&pool, LockStrategy::Pessimistic, Arc::new(RecordingNotifier::default()));

        let first = service.create_booking(&fixture.request("a@example.com")).await.unwrap();
        service.cancel_booking(first.id, None, None).await.unwrap();
        let second = service.create_booking(&fixture.request("b@example.com")).await.unwrap();

        // A vaga agora é da segunda reserva
        let err = service
            .update_booking_status(first.id, BookingStatus::Confirmed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SlotFull));
        assert_eq!(service.find_booking(first.id).await.unwrap().status, BookingStatus::Cancelled);

        // Liberou: reativar funciona e limpa os dados do cancelamento
        service.cancel_booking(second.id, None, None).await.unwrap();
        let revived = service
            .update_booking_status(first.id, BookingStatus::Confirmed, None)
            .await
            .unwrap();
        assert_eq!(revived.status, BookingStatus::Confirmed);
        assert!(revived.cancelled_at.is_none());
        assert_eq!(slot_counts(&pool, fixture.slot.id).await, (1, true));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn status_changes_between_active_states_keep_occupancy(pool: PgPool) {
        let fixture = seed_catalog(&pool, 3).await;
        let service = booking_service(&pool, LockStrategy::Pessimistic, Arc::new(RecordingNotifier::default()));
        let booking = service.create_booking(&fixture.request("a@example.com")).await.unwrap();

        for status in [BookingStatus::Confirmed, BookingStatus::NoShow, BookingStatus::Completed] {
            service.update_booking_status(booking.id, status, None).await.unwrap();
            assert_eq!(slot_counts(&pool, fixture.slot.id).await, (1, false));
        }

        // CANCELLED pelo endpoint de status também devolve a vaga
        let cancelled = service
            .update_booking_status(booking.id, BookingStatus::Cancelled, None)
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(slot_counts(&pool, fixture.slot.id).await, (0, false));
    }

    // ---
    // Cliente idempotente
    // ---

    #[sqlx::test]
    #[test_log::test]
    async fn same_email_resolves_to_one_customer(pool: PgPool) {
        let fixture = seed_catalog(&pool, 3).await;
        let service = booking_service(&pool, LockStrategy::Optimistic, Arc::new(RecordingNotifier::default()));

        let a = service.create_booking(&fixture.request("Ana@Example.com")).await.unwrap();
        let mut again = fixture.request("  ana@example.COM ");
        again.customer.name = "Outro Nome".into();
        let b = service.create_booking(&again).await.unwrap();

        assert_eq!(a.customer_id, b.customer_id);
        assert_eq!(b.customer_email, "ana@example.com");

        let customer_id = a.customer_id.unwrap();
        let name: String = sqlx::query_scalar("SELECT name FROM customers WHERE id = $1")
            .bind(customer_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        // O primeiro cadastro vence
        assert_eq!(name, "Cliente Teste");
        assert_eq!(
            count_rows(&pool, "SELECT COUNT(*) FROM customers WHERE business_id = $1", fixture.business.id).await,
            1
        );
    }

    // ---
    // Isolamento entre estabelecimentos
    // ---

    #[sqlx::test]
    #[test_log::test]
    async fn cross_tenant_references_are_rejected_without_side_effects(pool: PgPool) {
        let ours = seed_catalog(&pool, 2).await;
        let theirs = seed_catalog(&pool, 2).await;
        let service = booking_service(&pool, LockStrategy::Pessimistic, Arc::new(RecordingNotifier::default()));

        // Horário de outro estabelecimento
        let mut request = ours.request("a@example.com");
        request.slot_id = theirs.slot.id;
        let err = service.create_booking(&request).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest("slot_business_mismatch")));

        // Serviço de outro estabelecimento
        let mut request = ours.request("a@example.com");
        request.service_id = theirs.service.id;
        let err = service.create_booking(&request).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest("service_business_mismatch")));

        assert_eq!(slot_counts(&pool, ours.slot.id).await, (0, false));
        assert_eq!(slot_counts(&pool, theirs.slot.id).await, (0, false));
        let bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings").fetch_one(&pool).await.unwrap();
        assert_eq!(bookings, 0);
        let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers").fetch_one(&pool).await.unwrap();
        assert_eq!(customers, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn service_and_slot_preconditions(pool: PgPool) {
        let fixture = seed_catalog(&pool, 2).await;
        let service = booking_service(&pool, LockStrategy::Pessimistic, Arc::new(RecordingNotifier::default()));

        let mut request = fixture.request("a@example.com");
        request.slot_id = Uuid::new_v4();
        assert!(matches!(service.create_booking(&request).await, Err(AppError::NotFound("slot"))));

        let mut request = fixture.request("a@example.com");
        request.service_id = Uuid::new_v4();
        assert!(matches!(service.create_booking(&request).await, Err(AppError::NotFound("service"))));

        sqlx::query("UPDATE services SET is_active = FALSE WHERE id = $1")
            .bind(fixture.service.id)
            .execute(&pool)
            .await
            .unwrap();
        assert!(matches!(
            service.create_booking(&fixture.request("a@example.com")).await,
            Err(AppError::BadRequest("service_inactive"))
        ));

        // Horário preso a outro serviço do mesmo estabelecimento
        let other = seed_service(&pool, fixture.business.id, None).await;
        let bound = seed_slot(&pool, fixture.business.id, Some(other.id), 2).await;
        let mut request = fixture.request("a@example.com");
        request.service_id = seed_service(&pool, fixture.business.id, None).await.id;
        request.slot_id = bound.id;
        assert!(matches!(
            service.create_booking(&request).await,
            Err(AppError::BadRequest("slot_service_mismatch"))
        ));

        // Horário apagado não aceita reserva
        sqlx::query("UPDATE slots SET deleted_at = NOW() WHERE id = $1")
            .bind(bound.id)
            .execute(&pool)
            .await
            .unwrap();
        let mut request = fixture.request("a@example.com");
        request.service_id = other.id;
        request.slot_id = bound.id;
        assert!(matches!(service.create_booking(&request).await, Err(AppError::NotFound("slot"))));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn removed_business_or_service_is_never_booked(pool: PgPool) {
        for strategy in [LockStrategy::Pessimistic, LockStrategy::Optimistic] {
            let service = booking_service(&pool, strategy, Arc::new(RecordingNotifier::default()));

            // Serviço removido
            let fixture = seed_catalog(&pool, 2).await;
            assert!(
                ServiceRepository::new(pool.clone())
                    .soft_delete(&pool, fixture.business.id, fixture.service.id)
                    .await
                    .unwrap()
            );
            assert!(matches!(
                service.create_booking(&fixture.request("a@example.com")).await,
                Err(AppError::NotFound("service"))
            ));

            // Estabelecimento removido: seus horários deixam de existir para o alocador
            let fixture = seed_catalog(&pool, 2).await;
            assert!(
                BusinessRepository::new(pool.clone())
                    .soft_delete(&pool, fixture.business.id)
                    .await
                    .unwrap()
            );
            assert!(matches!(
                service.create_booking(&fixture.request("a@example.com")).await,
                Err(AppError::NotFound("slot"))
            ));

            assert_eq!(slot_counts(&pool, fixture.slot.id).await, (0, false));
            let bookings = count_rows(&pool, "SELECT COUNT(*) FROM bookings WHERE business_id = $1", fixture.business.id).await;
            assert_eq!(bookings, 0);
        }
    }

    // ---
    // Histórico
    // ---

    #[sqlx::test]
    #[test_log::test]
    async fn every_transition_is_recorded_in_order(pool: PgPool) {
        let fixture = seed_catalog(&pool, 2).await;
        let service = booking_service(&pool, LockStrategy::Pessimistic, Arc::new(RecordingNotifier::default()));
        let actor = Uuid::new_v4();

        let booking = service.create_booking(&fixture.request("a@example.com")).await.unwrap();
        service
            .update_booking_status(booking.id, BookingStatus::Confirmed, Some(actor))
            .await
            .unwrap();
        service
            .cancel_booking(booking.id, Some("cliente desistiu"), Some(actor))
            .await
            .unwrap();

        let history = service.list_history(booking.id).await.unwrap();
        assert_eq!(history.len(), 3);

        assert_eq!(history[0].action, "created");
        assert_eq!(history[0].previous_status, None);
        assert_eq!(history[0].new_status, BookingStatus::Pending);

        assert_eq!(history[1].action, "status_changed");
        assert_eq!(history[1].previous_status, Some(BookingStatus::Pending));
        assert_eq!(history[1].new_status, BookingStatus::Confirmed);
        assert_eq!(history[1].performed_by, Some(actor));

        assert_eq!(history[2].action, "cancelled");
        assert_eq!(history[2].previous_status, Some(BookingStatus::Confirmed));
        assert_eq!(history[2].new_status, BookingStatus::Cancelled);
        assert_eq!(history[2].notes.as_deref(), Some("cliente desistiu"));

        assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    // ---
    // Cenário completo
    // ---

    #[sqlx::test]
    #[test_log::test]
    async fn two_seat_slot_end_to_end(pool: PgPool) {
        let fixture = seed_catalog(&pool, 2).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let service = booking_service(&pool, LockStrategy::Pessimistic, notifier.clone());

        let b1 = service.create_booking(&fixture.request("c1@example.com")).await.unwrap();
        assert_eq!(slot_counts(&pool, fixture.slot.id).await, (1, false));

        let b2 = service.create_booking(&fixture.request("c2@example.com")).await.unwrap();
        assert_eq!(slot_counts(&pool, fixture.slot.id).await, (2, true));

        let err = service.create_booking(&fixture.request("c3@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::SlotFull));

        service.cancel_booking(b1.id, None, None).await.unwrap();
        assert_eq!(slot_counts(&pool, fixture.slot.id).await, (1, false));

        let b3 = service.create_booking(&fixture.request("c3@example.com")).await.unwrap();
        assert_eq!(slot_counts(&pool, fixture.slot.id).await, (2, true));

        // Snapshot do serviço
        assert_eq!(b3.service_name, fixture.service.name);
        assert_eq!(b3.total_price, fixture.service.total_price);
        assert_eq!(b3.deposit_paid, fixture.service.deposit_amount);
        assert_eq!(b3.slot_time, fixture.slot.start_time);
        assert_eq!(b2.status, BookingStatus::Pending);

        let detail = service.get_booking(b3.id).await.unwrap();
        assert_eq!(detail.slot.map(|s| s.id), Some(fixture.slot.id));
        assert_eq!(detail.business.map(|b| b.id), Some(fixture.business.id));
        assert!(detail.customer.is_some());

        // Avisos saem em tasks separadas: espera um pouco
        tokio::time::sleep(Duration::from_millis(100)).await;
        let kinds = notifier.kinds();
        assert_eq!(kinds.iter().filter(|k| **k == NotificationKind::Confirmed).count(), 3);
        assert_eq!(kinds.iter().filter(|k| **k == NotificationKind::Cancelled).count(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn notifier_failure_does_not_affect_the_booking(pool: PgPool) {
        let fixture = seed_catalog(&pool, 1).await;
        let service = booking_service(&pool, LockStrategy::Pessimistic, Arc::new(FailingNotifier));

        let booking = service.create_booking(&fixture.request("a@example.com")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.find_booking(booking.id).await.unwrap().status, BookingStatus::Pending);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn slow_transaction_is_rolled_back(pool: PgPool) {
        let fixture = seed_catalog(&pool, 1).await;
        let service = booking_service_with_timeout(
            &pool,
            LockStrategy::Pessimistic,
            Arc::new(RecordingNotifier::default()),
            Duration::from_millis(200),
        );

        // Outra transação segura o lock do horário
        let mut blocker = pool.begin().await.unwrap();
        sqlx::query("SELECT id FROM slots WHERE id = $1 FOR UPDATE")
            .bind(fixture.slot.id)
            .execute(&mut *blocker)
            .await
            .unwrap();

        let err = service.create_booking(&fixture.request("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout));
        blocker.rollback().await.unwrap();

        assert_eq!(slot_counts(&pool, fixture.slot.id).await, (0, false));
        let bookings = count_rows(&pool, "SELECT COUNT(*) FROM bookings WHERE slot_id = $1", fixture.slot.id).await;
        assert_eq!(bookings, 0);
    }
}
