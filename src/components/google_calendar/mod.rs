mod client;
pub mod models;

pub use client::GoogleCalendarClient;
pub use models::EventsQuery;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Calendar API failures.
///
/// Display strings are safe to hand to API callers: they carry the
/// provider's message, never its raw payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to reach Google Calendar: {0}")]
    Transport(String),

    #[error("Unexpected response from Google Calendar: {0}")]
    Decode(String),
}

/// Read-only access to a user's calendar
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// List events for `query`, authenticated with `access_token`
    async fn list_events(
        &self,
        access_token: &str,
        query: &EventsQuery,
    ) -> Result<Vec<Value>, CalendarError>;
}
