use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Parameters of an events.list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsQuery {
    pub calendar_id: String,
    /// Lower bound on event start
    pub time_min: DateTime<Utc>,
    /// Expand recurring events into single occurrences
    pub single_events: bool,
    pub order_by: String,
}

impl EventsQuery {
    /// Upcoming single events on the primary calendar, ordered by start time
    pub fn upcoming(now: DateTime<Utc>) -> Self {
        Self {
            calendar_id: "primary".to_string(),
            time_min: now,
            single_events: true,
            order_by: "startTime".to_string(),
        }
    }

    /// Query string pairs as the Calendar API expects them
    pub fn query_pairs(&self) -> [(&'static str, String); 3] {
        [
            (
                "timeMin",
                self.time_min.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            ("singleEvents", self.single_events.to_string()),
            ("orderBy", self.order_by.clone()),
        ]
    }
}

/// events.list response; items are passed through untouched
#[derive(Debug, Clone, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub items: Vec<Value>,
}

/// Standard Google API error envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorResponse {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorBody {
    pub code: Option<u16>,
    pub message: String,
    pub status: Option<String>,
}
