pub mod availability_repo;
pub use availability_repo::AvailabilityRepository;
pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod business_repo;
pub use business_repo::BusinessRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod service_repo;
pub use service_repo::ServiceRepository;
pub mod slot_repo;
pub use slot_repo::SlotRepository;
