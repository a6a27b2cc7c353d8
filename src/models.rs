pub mod booking;
pub mod business;
pub mod catalog;
pub mod customer;
pub mod pagination;
pub mod scheduling;
