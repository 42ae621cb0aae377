/// Availability windows.
pub mod availability;
/// Fixtures, candidates and scheduling.
pub mod fixture;
/// Health check payload.
pub mod health;
/// Login and participant lookup.
pub mod participant;
pub mod validation;
