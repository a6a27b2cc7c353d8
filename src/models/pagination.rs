// src/models/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{booking::Booking, business::Business, catalog::Service};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

// ?page=1&limit=20
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Página, começando em 1
    pub page: Option<i64>,
    /// Itens por página (1 a 100)
    pub limit: Option<i64>,
}

impl PageQuery {
    /// (página, limite, offset) já normalizados
    pub fn resolve(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        // Página absurda vira offset no teto, nunca overflow
        (page, limit, (page - 1).saturating_mul(limit))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self { page, limit, total, total_pages }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingPage {
    pub data: Vec<Booking>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BusinessPage {
    pub data: Vec<Business>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServicePage {
    pub data: Vec<Service>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults_and_clamps() {
        assert_eq!(PageQuery::default().resolve(), (1, 20, 0));
        assert_eq!(PageQuery { page: Some(3), limit: Some(10) }.resolve(), (3, 10, 20));
        assert_eq!(PageQuery { page: Some(0), limit: Some(1000) }.resolve(), (1, 100, 0));
        assert_eq!(PageQuery { page: Some(-2), limit: Some(0) }.resolve(), (1, 1, 0));
        assert_eq!(
            PageQuery { page: Some(i64::MAX), limit: Some(100) }.resolve(),
            (i64::MAX, 100, i64::MAX)
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PageMeta::new(1, 20, 0).total_pages, 0);
        assert_eq!(PageMeta::new(1, 20, 20).total_pages, 1);
        assert_eq!(PageMeta::new(1, 20, 21).total_pages, 2);
    }
}
