pub mod availability;
pub mod catalog;
pub mod deposit;
pub mod query;
pub mod reservation;
