//! Library crate for tournament-bot, exposing modules for binaries and integration tests.

/// Conversation engine: events, processes, state and reconciliation.
pub mod bot;
/// Runtime configuration.
pub mod config;
/// Identity and team storage.
pub mod dao;
/// HTTP request and response bodies.
pub mod dto;
/// Error types of the engine and the HTTP layer.
pub mod error;
/// Localized phrases.
pub mod locale;
/// HTTP routes.
pub mod routes;
/// Services behind the routes and background tasks.
pub mod services;
/// Shared application state.
pub mod state;
