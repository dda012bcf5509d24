use super::AppState;
use crate::components::{Principal, SessionId};
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};

/// Name of the signed cookie carrying the session id
pub const SESSION_COOKIE: &str = "booking_session";

/// Bearer token from the Authorization header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();

    (!token.is_empty()).then(|| token.to_string())
}

/// Principal of the session referenced by the request's cookie
pub async fn session_principal(state: &AppState, jar: &SignedCookieJar) -> Option<Principal> {
    let id = jar.get(SESSION_COOKIE)?.value().parse::<SessionId>().ok()?;
    state.sessions.get(&id).await
}

/// Cookie binding the user agent to session `id`
pub fn session_cookie(state: &AppState, id: SessionId) -> Cookie<'static> {
    let ttl = state.sessions.ttl();

    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.callback_url.scheme() == "https")
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// Cookie that clears the session cookie
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
