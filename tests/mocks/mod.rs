//! Stub Google integrations shared by the router tests.

#![allow(dead_code)]

use async_trait::async_trait;
use booking_bridge::components::google_calendar::EventsQuery;
use booking_bridge::components::google_oauth::{Profile, TokenGrant};
use booking_bridge::components::{CalendarApi, CalendarError, OAuthError, OAuthProvider};
use booking_bridge::config::Config;
use booking_bridge::web::{self, AppState};
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use url::Url;

pub const SESSION_SECRET: &str = "test-session-secret-0123456789abcdef";

/// OAuth provider returning a canned exchange result and recording codes
pub struct StubOAuth {
    result: Result<TokenGrant, OAuthError>,
    pub codes: Mutex<Vec<String>>,
}

impl StubOAuth {
    pub fn granting(token: Option<&str>) -> Self {
        Self {
            result: Ok(TokenGrant {
                access_token: token.map(str::to_string),
                profile: Profile {
                    id: "109876543210".to_string(),
                    display_name: Some("Test User".to_string()),
                    ..Default::default()
                },
            }),
            codes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: OAuthError) -> Self {
        Self {
            result: Err(error),
            codes: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.codes.lock().unwrap().clone()
    }
}

#[async_trait]
impl OAuthProvider for StubOAuth {
    fn authorize_url(&self) -> Url {
        Url::parse("https://accounts.example.com/auth?client_id=test").unwrap()
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, OAuthError> {
        self.codes.lock().unwrap().push(code.to_string());
        self.result.clone()
    }
}

/// Calendar API returning a canned list and recording every call
pub struct StubCalendar {
    result: Result<Vec<Value>, CalendarError>,
    calls: Mutex<Vec<(String, EventsQuery)>>,
}

impl StubCalendar {
    pub fn with_items(items: Vec<Value>) -> Self {
        Self {
            result: Ok(items),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(status: u16, message: &str) -> Self {
        Self {
            result: Err(CalendarError::Upstream {
                status,
                message: message.to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, EventsQuery)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarApi for StubCalendar {
    async fn list_events(
        &self,
        access_token: &str,
        query: &EventsQuery,
    ) -> Result<Vec<Value>, CalendarError> {
        self.calls
            .lock()
            .unwrap()
            .push((access_token.to_string(), query.clone()));
        self.result.clone()
    }
}

/// Two upcoming events in the shape Google returns them
pub fn sample_events() -> Vec<Value> {
    vec![
        json!({
            "kind": "calendar#event",
            "id": "event1",
            "summary": "Haircut",
            "start": { "dateTime": "2030-01-01T10:00:00+02:00" },
            "end": { "dateTime": "2030-01-01T11:00:00+02:00" }
        }),
        json!({
            "kind": "calendar#event",
            "id": "event2",
            "summary": "Dentist",
            "start": { "date": "2030-01-02" },
            "end": { "date": "2030-01-03" }
        }),
    ]
}

/// Config built from `extra` on top of the required variables
pub fn test_config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("GOOGLE_CLIENT_ID", "test-client-id"),
        ("GOOGLE_CLIENT_SECRET", "test-client-secret"),
        ("GOOGLE_CALLBACK_URL", "https://backend.example.com/auth/google/callback"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }

    Config::from_lookup(|k| vars.get(k).cloned()).unwrap()
}

pub fn test_state(config: Config, oauth: Arc<StubOAuth>, calendar: Arc<StubCalendar>) -> AppState {
    AppState::new(config, oauth, calendar)
}

pub fn test_app(state: AppState) -> Router {
    web::app(state).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }

    pub fn location(&self) -> &str {
        self.headers
            .get("location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// Run one request through `app`
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}
