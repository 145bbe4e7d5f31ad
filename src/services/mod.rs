/// Conversation inspection.
pub mod chat_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Inbound event handling.
pub mod events_service;
/// Health check service.
pub mod health_service;
/// Idle conversation expiry.
pub mod janitor;
/// Transport publishing outbound actions over SSE.
pub mod outbox;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor with reconnect backoff.
pub mod storage_supervisor;
