use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Conversation snapshots for inspection.
pub mod conversation;
/// Inbound event bodies and the turn outcome.
pub mod events;
/// Health check body.
pub mod health;
/// Server-sent event payloads.
pub mod sse;
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
