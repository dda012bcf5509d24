use super::models::{EventsQuery, EventsResponse, GoogleErrorResponse};
use super::{CalendarApi, CalendarError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Calendar API v3 client, authenticated per call with a bearer token
#[derive(Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    base_url: Url,
}

impl GoogleCalendarClient {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn events_url(&self, query: &EventsQuery) -> Result<Url, CalendarError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CalendarError::Transport("Calendar API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["calendars", query.calendar_id.as_str(), "events"]);

        for (key, value) in query.query_pairs() {
            url.query_pairs_mut().append_pair(key, &value);
        }

        Ok(url)
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn list_events(
        &self,
        access_token: &str,
        query: &EventsQuery,
    ) -> Result<Vec<Value>, CalendarError> {
        let url = self.events_url(query)?;

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| CalendarError::Transport(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            // Only the provider's message is kept
            let message = serde_json::from_str::<GoogleErrorResponse>(&error_body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(CalendarError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let events: EventsResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Decode(e.without_url().to_string()))?;

        debug!(count = events.items.len(), "Fetched calendar events");
        Ok(events.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_events_url() {
        let base = Url::parse("https://www.googleapis.com/calendar/v3").unwrap();
        let client = GoogleCalendarClient::new(Client::new(), base);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let url = client.events_url(&EventsQuery::upcoming(now)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/primary/events\
             ?timeMin=2024-01-02T03%3A04%3A05.000Z&singleEvents=true&orderBy=startTime"
        );
    }

    #[test]
    fn test_events_url_with_trailing_slash() {
        let base = Url::parse("http://127.0.0.1:8080/").unwrap();
        let client = GoogleCalendarClient::new(Client::new(), base);

        let url = client.events_url(&EventsQuery::upcoming(Utc::now())).unwrap();
        assert_eq!(url.path(), "/calendars/primary/events");
    }
}
