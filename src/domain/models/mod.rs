pub mod blackout;
pub mod booking;
pub mod branch;
pub mod group;
pub mod payment;
pub mod professional;
pub mod reservation;
pub mod schedule;
pub mod service;
pub mod tenant;
