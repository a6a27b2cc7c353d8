// src/services/business_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        business_repo::{BusinessChanges, NewBusiness},
        BusinessRepository,
    },
    middleware::auth::AuthenticatedActor,
    models::business::Business,
};

/// Slug: minúsculas, dígitos e hífens simples entre partes; 3 a 50 caracteres.
/// Ex.: "barbearia-do-ze" ok, "-ze", "ze--x", "Zé" não.
pub fn is_valid_slug(slug: &str) -> bool {
    if !(3..=50).contains(&slug.len()) {
        return false;
    }
    slug.split('-')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()))
}

#[derive(Clone)]
pub struct BusinessService {
    pool: PgPool,
    business_repo: BusinessRepository,
}

impl BusinessService {
    pub fn new(pool: PgPool, business_repo: BusinessRepository) -> Self {
        Self { pool, business_repo }
    }

    pub async fn create_business(&self, new: NewBusiness) -> Result<Business, AppError> {
        if !is_valid_slug(&new.slug) {
            return Err(AppError::BadRequest("invalid_slug"));
        }
        let business = self.business_repo.create(&self.pool, &new).await?;
        tracing::info!(business_id = %business.id, slug = %business.slug, "Estabelecimento criado");
        Ok(business)
    }

    pub async fn get_business(&self, id: Uuid) -> Result<Business, AppError> {
        self.business_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("business"))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Business, AppError> {
        self.business_repo
            .find_by_slug(&self.pool, slug)
            .await?
            .ok_or(AppError::NotFound("business"))
    }

    pub async fn list_for_actor(
        &self,
        actor: &AuthenticatedActor,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Business>, i64), AppError> {
        self.business_repo
            .list_for_actor(actor.id, actor.business_id, offset, limit)
            .await
    }

    pub async fn update_business(&self, id: Uuid, changes: &BusinessChanges) -> Result<Business, AppError> {
        self.business_repo
            .update(&self.pool, id, changes)
            .await?
            .ok_or(AppError::NotFound("business"))
    }

    pub async fn delete_business(&self, id: Uuid) -> Result<(), AppError> {
        if !self.business_repo.soft_delete(&self.pool, id).await? {
            return Err(AppError::NotFound("business"));
        }
        tracing::info!(business_id = %id, "Estabelecimento removido (soft delete)");
        Ok(())
    }

    /// Garante que o ator pode administrar o estabelecimento.
    /// Vale o dono (sub == owner_id) ou um token com escopo nesse business_id.
    pub async fn authorize(&self, actor: &AuthenticatedActor, business_id: Uuid) -> Result<Business, AppError> {
        let business = self.get_business(business_id).await?;
        if actor.can_manage(&business) {
            Ok(business)
        } else {
            tracing::warn!(actor = %actor.id, business_id = %business_id, "Acesso negado ao estabelecimento");
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_rules() {
        assert!(is_valid_slug("abc"));
        assert!(is_valid_slug("barbearia-do-ze"));
        assert!(is_valid_slug("studio-42"));

        assert!(!is_valid_slug("ab"));
        assert!(!is_valid_slug(&"a".repeat(51)));
        assert!(!is_valid_slug("-abc"));
        assert!(!is_valid_slug("abc-"));
        assert!(!is_valid_slug("ab--cd"));
        assert!(!is_valid_slug("Barbearia"));
        assert!(!is_valid_slug("barbe aria"));
        assert!(!is_valid_slug("café"));
    }
}
