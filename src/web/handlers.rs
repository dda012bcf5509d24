use super::auth::{bearer_token, removal_cookie, session_cookie, session_principal, SESSION_COOKIE};
use super::error::ApiError;
use super::AppState;
use crate::components::google_calendar::EventsQuery;
use crate::components::google_oauth::{complete_auth, AuthOutcome};
use crate::components::SessionId;
use crate::config::HandoffMode;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

/// Query parameters Google appends to the callback
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    /// Set when the user denied consent
    pub error: Option<String>,
}

/// `?token=` carried by the hand-off page and the calendar endpoint
#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub token: Option<String>,
}

impl TokenParams {
    fn token(self) -> Option<String> {
        self.token.filter(|t| !t.is_empty())
    }
}

/// 302 Found to `location`
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Hand-off page location for `access_token`
fn handoff_location(access_token: &str) -> String {
    format!("/booking?token={}", urlencoding::encode(access_token))
}

/// Minimal document sending the user agent to `target`.
///
/// `target` is inserted without HTML escaping so the native app receives the
/// token byte for byte. A crafted token can therefore add markup to the page.
/// The response headers keep that markup inert: no script runs, nothing is
/// cached and no referrer is sent to an injected link.
fn handoff_page(target: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta http-equiv=\"refresh\" content=\"0; url={target}\">\n\
         <title>Returning to the app</title>\n\
         </head>\n\
         <body>\n\
         <a href=\"{target}\">Open the booking app</a>\n\
         </body>\n\
         </html>\n"
    )
}

// Handler for uptime monitors
pub async fn ping_handler() -> &'static str {
    "OK"
}

/// HEAD probe of the auth path, answered without starting a handshake
pub async fn auth_probe_handler() -> StatusCode {
    StatusCode::OK
}

/// Redirect to the Google consent screen
pub async fn begin_auth_handler(State(state): State<AppState>) -> Response {
    found(state.oauth.authorize_url().as_str())
}

/// OAuth callback: exchange the code and hand the token off
pub async fn auth_callback_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let failure_redirect = state.config.failure_redirect.as_str();

    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            warn!("Malformed OAuth callback query: {}", rejection.body_text());
            return Ok(found(failure_redirect));
        }
    };

    if let Some(error) = params.error {
        warn!("Google sign-in was not completed: {}", error);
        return Ok(found(failure_redirect));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        warn!("OAuth callback without authorization code");
        return Ok(found(failure_redirect));
    };

    let principal = match complete_auth(state.oauth.as_ref(), &code).await {
        AuthOutcome::Authenticated(principal) => principal,
        AuthOutcome::Failed(e) => {
            warn!("OAuth exchange failed: {}", e);
            return Ok(found(failure_redirect));
        }
        AuthOutcome::MissingAccessToken => return Err(ApiError::MissingAccessToken),
    };

    let location = handoff_location(&principal.access_token);

    match state.config.handoff_mode {
        HandoffMode::Query => Ok(found(&location)),
        HandoffMode::Session => {
            let profile_id = principal.profile_id.clone();
            let id = state.sessions.create(principal).await;
            info!(%profile_id, "Session started");
            let jar = jar.add(session_cookie(&state, id));
            Ok((jar, found(&location)).into_response())
        }
    }
}

/// Failure destination of the OAuth callback
pub async fn login_handler() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, "Google sign-in failed. Please try again.")
}

/// Drop the caller's session, if any
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, StatusCode) {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| c.value().parse::<SessionId>().ok())
    {
        if state.sessions.remove(&id).await.is_some() {
            info!(session_id = %id, "Session ended");
        }
    }

    (jar.remove(removal_cookie()), StatusCode::NO_CONTENT)
}

/// Token hand-off page for the native client
pub async fn booking_handler(
    State(state): State<AppState>,
    Query(params): Query<TokenParams>,
) -> Result<Response, ApiError> {
    let token = params.token().ok_or(ApiError::MissingHandoffToken)?;

    // Passed on exactly as received
    let target = format!("{}://booking?token={}", state.config.app_scheme, token);

    Ok((
        [
            (header::CONTENT_SECURITY_POLICY, "default-src 'none'"),
            (header::CACHE_CONTROL, "no-store"),
            (header::REFERRER_POLICY, "no-referrer"),
        ],
        Html(handoff_page(&target)),
    )
        .into_response())
}

/// Upcoming events from the caller's primary calendar
pub async fn calendar_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    headers: HeaderMap,
    params: Result<Query<TokenParams>, QueryRejection>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let Query(params) = params.map_err(|r| ApiError::InvalidQuery(r.body_text()))?;

    let token = match params.token().or_else(|| bearer_token(&headers)) {
        Some(token) => token,
        None => session_principal(&state, &jar)
            .await
            .map(|p| p.access_token)
            .ok_or(ApiError::MissingCalendarToken)?,
    };

    let query = EventsQuery::upcoming(Utc::now());
    let events = state.calendar.list_events(&token, &query).await?;

    info!(count = events.len(), "Returning upcoming calendar events");
    Ok(Json(events))
}
