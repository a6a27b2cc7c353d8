pub mod availability_service;
pub mod booking_service;
pub mod business_service;
pub mod catalog_service;
pub mod notification;
pub mod slot_service;
