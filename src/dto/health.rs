use serde::Serialize;
use utoipa::ToSchema;

/// Body of `GET /healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `degraded` while no storage backend is installed.
    pub status: String,
    /// Conversations currently in flight.
    pub conversations: usize,
}

impl HealthResponse {
    /// Response for the given degraded flag.
    pub fn new(degraded: bool, conversations: usize) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_owned(),
            conversations,
        }
    }
}
