/// Availability windows repository.
pub mod availability;
/// Dataset snapshot cache shared by the repositories.
pub mod cache;
/// Normalization between store records and domain types.
pub mod conversion;
/// Fixture repository and lifecycle persistence.
pub mod fixtures;
/// Storage backends behind the `LeagueStore` trait.
pub mod league_store;
/// Database model definitions.
pub mod models;
/// Participants and group assignments repository.
pub mod participants;
/// Store handle applying the retry policy.
pub mod resilient;
/// Retry policy for transient storage failures.
pub mod retry;
/// Storage abstraction layer for database operations.
pub mod storage;
