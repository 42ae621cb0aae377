//! Library crate for padel-league-back, exposing modules for binaries and integration tests.

pub mod config;
/// Store records, backends, caching and repositories.
pub mod dao;
/// Request and response bodies of the HTTP API.
pub mod dto;
/// Service errors and their HTTP mapping.
pub mod error;
/// Axum routers.
pub mod routes;
/// Operations behind the routes.
pub mod services;
/// Domain types and shared application state.
pub mod state;
