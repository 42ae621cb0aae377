/// Availability reads and submissions.
pub mod availability_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Fixture reads, candidates and lifecycle actions.
pub mod fixture_service;
/// Health check service.
pub mod health_service;
/// Fixture titles and pairing strings.
pub mod identity;
/// Overlap matching engine.
pub mod matching;
/// Participant lookups and login.
pub mod participant_service;
/// Background connection and health supervision of the league store.
pub mod storage_supervisor;
