// src/services/slot_service.rs

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{slot_repo::SlotFilter, BusinessRepository, ServiceRepository, SlotRepository},
    models::scheduling::{NewSlot, Slot},
    services::availability_service::parse_date,
};

// Horário explícito pedido pelo dono
#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub service_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: Option<i32>,
}

#[derive(Clone)]
pub struct SlotService {
    pool: PgPool,
    slot_repo: SlotRepository,
    service_repo: ServiceRepository,
    business_repo: BusinessRepository,
}

/// Converte "YYYY-MM-DD" opcionais em [início do primeiro dia, início do dia seguinte ao último).
pub fn day_bounds(
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
    let from = start_date
        .map(parse_date)
        .transpose()?
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc());
    let until = end_date
        .map(parse_date)
        .transpose()?
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc() + TimeDelta::days(1));

    if let (Some(from), Some(until)) = (from, until) {
        if until <= from {
            return Err(AppError::BadRequest("invalid_date_range"));
        }
    }
    Ok((from, until))
}

impl SlotService {
    pub fn new(
        pool: PgPool,
        slot_repo: SlotRepository,
        service_repo: ServiceRepository,
        business_repo: BusinessRepository,
    ) -> Self {
        Self {
            pool,
            slot_repo,
            service_repo,
            business_repo,
        }
    }

    /// Cria horários explícitos. A capacidade fica fixa na criação:
    /// valor informado, senão a do serviço, senão o max_bookings do estabelecimento.
    pub async fn create_slots(&self, business_id: Uuid, requests: &[SlotRequest]) -> Result<Vec<Slot>, AppError> {
        if requests.is_empty() {
            return Err(AppError::BadRequest("empty_slot_batch"));
        }

        let business = self
            .business_repo
            .find_by_id(&self.pool, business_id)
            .await?
            .ok_or(AppError::NotFound("business"))?;

        let mut tx = self.pool.begin().await?;
        let mut new_slots = Vec::with_capacity(requests.len());

        for request in requests {
            if request.end_time <= request.start_time {
                return Err(AppError::BadRequest("invalid_time_window"));
            }

            let service_capacity = match request.service_id {
                Some(service_id) => {
                    let service = self
                        .service_repo
                        .find_by_id(&mut *tx, service_id)
                        .await?
                        .ok_or(AppError::NotFound("service"))?;
                    if service.business_id != business_id {
                        return Err(AppError::BadRequest("service_business_mismatch"));
                    }
                    service.capacity
                }
                None => None,
            };

            let capacity = request
                .capacity
                .or(service_capacity)
                .unwrap_or(business.max_bookings);
            if capacity < 1 {
                return Err(AppError::BadRequest("invalid_capacity"));
            }

            new_slots.push(NewSlot {
                service_id: request.service_id,
                start_time: request.start_time,
                end_time: request.end_time,
                capacity,
            });
        }

        let created = self.slot_repo.create_many(&mut *tx, business_id, &new_slots).await?;
        tx.commit().await?;

        tracing::info!(business_id = %business_id, count = created.len(), "Horários criados");
        Ok(created)
    }

    pub async fn get_slot(&self, business_id: Uuid, slot_id: Uuid) -> Result<Slot, AppError> {
        self.slot_repo
            .find_in_business(&self.pool, business_id, slot_id)
            .await?
            .ok_or(AppError::NotFound("slot"))
    }

    /// Soft-delete. Reservas existentes continuam válidas; só avisamos no log.
    pub async fn delete_slot(&self, business_id: Uuid, slot_id: Uuid) -> Result<(), AppError> {
        let slot = self
            .slot_repo
            .soft_delete(&self.pool, business_id, slot_id)
            .await?
            .ok_or(AppError::NotFound("slot"))?;

        if slot.booked_count > 0 {
            tracing::warn!(
                slot_id = %slot.id,
                booked_count = slot.booked_count,
                "Horário removido com reservas ativas"
            );
        }
        Ok(())
    }

    /// Horários com vaga do estabelecimento, em ordem de início.
    pub async fn list_available(
        &self,
        business_id: Uuid,
        service_id: Option<Uuid>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<Slot>, AppError> {
        let (from, until) = day_bounds(start_date, end_date)?;

        // Estabelecimento inexistente vira 404, não lista vazia
        self.business_repo
            .find_by_id(&self.pool, business_id)
            .await?
            .ok_or(AppError::NotFound("business"))?;

        self.slot_repo
            .list_available(
                business_id,
                SlotFilter {
                    service_id,
                    from,
                    until,
                },
            )
            .await
    }
}
