// src/services/catalog_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        service_repo::{NewService, ServiceChanges},
        ServiceRepository,
    },
    models::catalog::Service,
};

#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
    service_repo: ServiceRepository,
}

// Preço negativo nunca entra (o CHECK do banco também barra, mas com erro 500)
fn ensure_not_negative(values: &[Option<Decimal>]) -> Result<(), AppError> {
    if values.iter().flatten().any(|v| v.is_sign_negative() && !v.is_zero()) {
        return Err(AppError::BadRequest("negative_price"));
    }
    Ok(())
}

impl CatalogService {
    pub fn new(pool: PgPool, service_repo: ServiceRepository) -> Self {
        Self { pool, service_repo }
    }

    pub async fn create_service(&self, business_id: Uuid, new: &NewService) -> Result<Service, AppError> {
        ensure_not_negative(&[Some(new.total_price), Some(new.deposit_amount)])?;
        if matches!(new.capacity, Some(c) if c < 1) {
            return Err(AppError::BadRequest("invalid_capacity"));
        }
        self.service_repo.create(&self.pool, business_id, new).await
    }

    pub async fn get_service(&self, business_id: Uuid, id: Uuid) -> Result<Service, AppError> {
        self.service_repo
            .find_in_business(&self.pool, business_id, id)
            .await?
            .ok_or(AppError::NotFound("service"))
    }

    pub async fn list_services(
        &self,
        business_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Service>, i64), AppError> {
        self.service_repo.list_by_business(business_id, offset, limit).await
    }

    // Vitrine pública: só os ativos
    pub async fn list_active_services(&self, business_id: Uuid) -> Result<Vec<Service>, AppError> {
        self.service_repo.list_active(business_id).await
    }

    pub async fn update_service(
        &self,
        business_id: Uuid,
        id: Uuid,
        changes: &ServiceChanges,
    ) -> Result<Service, AppError> {
        ensure_not_negative(&[changes.total_price, changes.deposit_amount])?;
        if matches!(changes.capacity, Some(c) if c < 1) {
            return Err(AppError::BadRequest("invalid_capacity"));
        }
        self.service_repo
            .update(&self.pool, business_id, id, changes)
            .await?
            .ok_or(AppError::NotFound("service"))
    }

    pub async fn delete_service(&self, business_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.service_repo.soft_delete(&self.pool, business_id, id).await? {
            return Err(AppError::NotFound("service"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_prices_are_rejected() {
        assert!(ensure_not_negative(&[Some(Decimal::new(-1, 2))]).is_err());
        assert!(ensure_not_negative(&[Some(Decimal::ZERO), None, Some(Decimal::new(8000, 2))]).is_ok());
    }

    fn haircut(name: &str) -> NewService {
        NewService {
            name: name.into(),
            description: None,
            duration_min: 45,
            total_price: Decimal::new(5000, 2),
            deposit_amount: Decimal::new(1000, 2),
            capacity: None,
            is_active: true,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn catalog_crud_hides_removed_services(pool: PgPool) {
        let catalog = CatalogService::new(pool.clone(), ServiceRepository::new(pool.clone()));
        let business = crate::test_utils::seed_business(&pool).await;

        let beard = catalog.create_service(business.id, &haircut("Barba")).await.unwrap();
        let cut = catalog.create_service(business.id, &haircut("Corte")).await.unwrap();

        let (items, total) = catalog.list_services(business.id, 0, 20).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items.iter().map(|s| s.id).collect::<Vec<_>>(), vec![beard.id, cut.id]);

        let changes = ServiceChanges {
            total_price: Some(Decimal::new(6000, 2)),
            is_active: Some(false),
            ..Default::default()
        };
        let updated = catalog.update_service(business.id, cut.id, &changes).await.unwrap();
        assert_eq!(updated.total_price, Decimal::new(6000, 2));
        assert_eq!(updated.name, "Corte");
        let active = catalog.list_active_services(business.id).await.unwrap();
        assert_eq!(active.iter().map(|s| s.id).collect::<Vec<_>>(), vec![beard.id]);

        // Regras de negócio antes do banco
        let negative = ServiceChanges { deposit_amount: Some(Decimal::new(-100, 2)), ..Default::default() };
        assert!(matches!(
            catalog.update_service(business.id, cut.id, &negative).await,
            Err(AppError::BadRequest("negative_price"))
        ));
        let mut zero_seats = haircut("Grupo");
        zero_seats.capacity = Some(0);
        assert!(matches!(
            catalog.create_service(business.id, &zero_seats).await,
            Err(AppError::BadRequest("invalid_capacity"))
        ));

        // Outro estabelecimento não enxerga nem remove
        let other = crate::test_utils::seed_business(&pool).await;
        assert!(matches!(catalog.get_service(other.id, beard.id).await, Err(AppError::NotFound("service"))));
        assert!(matches!(catalog.delete_service(other.id, beard.id).await, Err(AppError::NotFound("service"))));

        // Soft delete: some do get e da lista, e não apaga duas vezes
        catalog.delete_service(business.id, beard.id).await.unwrap();
        assert!(matches!(catalog.get_service(business.id, beard.id).await, Err(AppError::NotFound("service"))));
        let (items, total) = catalog.list_services(business.id, 0, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, cut.id);
        assert!(matches!(catalog.delete_service(business.id, beard.id).await, Err(AppError::NotFound("service"))));
    }
}
