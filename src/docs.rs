// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Public ---
        handlers::public::get_business_by_slug,
        handlers::public::list_public_services,
        handlers::public::list_public_slots,
        handlers::slots::list_available_slots,

        // --- Businesses ---
        handlers::businesses::create_business,
        handlers::businesses::list_businesses,
        handlers::businesses::get_business,
        handlers::businesses::update_business,
        handlers::businesses::delete_business,

        // --- Services ---
        handlers::catalog::create_service,
        handlers::catalog::list_services,
        handlers::catalog::get_service,
        handlers::catalog::update_service,
        handlers::catalog::delete_service,

        // --- Slots ---
        handlers::slots::create_slots,
        handlers::slots::get_slot,
        handlers::slots::delete_slot,

        // --- Availability ---
        handlers::availability::get_availability,
        handlers::availability::set_availability,
        handlers::availability::generate_slots,
        handlers::availability::list_schedules,
        handlers::availability::create_schedule,
        handlers::availability::delete_schedule,
        handlers::availability::generate_from_schedule,

        // --- Bookings ---
        handlers::bookings::create_booking,
        handlers::bookings::get_booking,
        handlers::bookings::list_bookings,
        handlers::bookings::update_booking_status,
        handlers::bookings::cancel_booking,
        handlers::bookings::get_booking_history,
    ),
    components(
        schemas(
            // --- MODELS ---
            models::business::Business,
            models::catalog::Service,
            models::customer::Customer,
            models::scheduling::Slot,
            models::scheduling::BusinessAvailability,
            models::scheduling::RecurringSchedule,
            models::booking::BookingStatus,
            models::booking::Booking,
            models::booking::BookingHistory,
            models::booking::BookingDetail,
            models::pagination::PageMeta,
            models::pagination::BookingPage,
            models::pagination::BusinessPage,
            models::pagination::ServicePage,

            // --- PAYLOADS ---
            handlers::businesses::CreateBusinessPayload,
            handlers::businesses::UpdateBusinessPayload,
            handlers::catalog::CreateServicePayload,
            handlers::catalog::UpdateServicePayload,
            handlers::slots::SlotPayload,
            handlers::slots::CreateSlotsPayload,
            handlers::availability::DayPayload,
            handlers::availability::WeeklyAvailabilityPayload,
            handlers::availability::GenerateSlotsPayload,
            handlers::availability::CreateSchedulePayload,
            handlers::bookings::CreateBookingPayload,
            handlers::bookings::UpdateStatusPayload,
            handlers::bookings::CancelBookingPayload,
        )
    ),
    tags(
        (name = "Public", description = "Vitrine pública (sem token)"),
        (name = "Businesses", description = "Cadastro do Estabelecimento"),
        (name = "Services", description = "Catálogo de Serviços"),
        (name = "Slots", description = "Horários Reserváveis"),
        (name = "Availability", description = "Expediente Semanal, Agendas e Geração de Horários"),
        (name = "Bookings", description = "Reservas, Cancelamentos e Histórico")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_booking_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/bookings"));
        assert!(doc.paths.paths.contains_key("/api/businesses"));
        assert!(doc.paths.paths.contains_key("/api/bookings/{id}/cancel"));
        assert!(doc.paths.paths.contains_key("/api/businesses/{business_id}/slots/generate"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
