//! Conversation engine: state store, processes, routing and reconciliation.

/// Random team draws and first-round pairings.
pub mod assignment;
/// Conversation state and message mutation types.
pub mod conversation;
/// Inbound events and button values.
pub mod events;
/// Conversation flows.
pub mod processes;
/// Reconciliation sweep over pending message mutations.
pub mod reconcile;
/// Dispatch from keys to processes.
pub mod registry;
/// Inbound event entry points.
pub mod router;
/// Per-chat conversation state storage.
pub mod state_store;
/// Turn outcomes produced by processes.
pub mod step;
/// Outbound messaging abstraction.
pub mod transport;
