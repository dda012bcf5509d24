use crate::error::{config_error, env_error, AppResult};
use axum::http::HeaderValue;
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use url::Url;

/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;
/// Default custom URI scheme of the native client
pub const DEFAULT_APP_SCHEME: &str = "mybookingapp";
/// Default destination after a failed OAuth exchange
pub const DEFAULT_FAILURE_REDIRECT: &str = "/login";
/// Default session lifetime (24 hours)
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60 * 24;
/// Upper bound on the session lifetime (one year)
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;
/// Minimum length of the session secret, required to derive a signing key
pub const MIN_SESSION_SECRET_LEN: usize = 32;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
pub const GOOGLE_CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";

/// How the principal travels from the OAuth callback to the hand-off page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffMode {
    /// Token embedded in the redirect URL, nothing kept server-side
    Query,
    /// Principal stored in an in-memory session keyed by a signed cookie
    Session,
}

impl FromStr for HandoffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "query" => Ok(HandoffMode::Query),
            "session" => Ok(HandoffMode::Session),
            other => Err(format!("Unknown HANDOFF_MODE '{}', expected 'query' or 'session'", other)),
        }
    }
}

/// Google endpoints, overridable so tests can point at a mock server
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: Url,
    pub token_url: Url,
    pub userinfo_url: Url,
    pub calendar_api_url: Url,
}

/// Main configuration structure, built once at startup
#[derive(Clone)]
pub struct Config {
    /// OAuth client ID
    pub google_client_id: String,
    /// OAuth client secret
    pub google_client_secret: String,
    /// Callback URL registered with Google
    pub callback_url: Url,
    /// Address the HTTP server binds to
    pub bind_address: IpAddr,
    /// Port the HTTP server listens on
    pub port: u16,
    /// Secret used to sign the session cookie
    pub session_secret: Option<String>,
    /// Single origin allowed for browser clients
    pub cors_origin: Option<String>,
    /// Custom scheme of the native app
    pub app_scheme: String,
    /// Where failed logins are redirected
    pub failure_redirect: String,
    pub handoff_mode: HandoffMode,
    /// Session lifetime in minutes
    pub session_ttl_minutes: i64,
    pub endpoints: GoogleEndpoints,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("google_client_id", &self.google_client_id)
            .field("google_client_secret", &"<redacted>")
            .field("callback_url", &self.callback_url.as_str())
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("session_secret", &self.session_secret.as_ref().map(|_| "<redacted>"))
            .field("cors_origin", &self.cors_origin)
            .field("app_scheme", &self.app_scheme)
            .field("failure_redirect", &self.failure_redirect)
            .field("handoff_mode", &self.handoff_mode)
            .field("session_ttl_minutes", &self.session_ttl_minutes)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl Config {
    /// Load configuration from the environment (and a `.env` file if present)
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as missing
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).ok_or_else(|| env_error(key));

        let google_client_id = require("GOOGLE_CLIENT_ID")?;
        let google_client_secret = require("GOOGLE_CLIENT_SECRET")?;
        let callback_url = parse_url("GOOGLE_CALLBACK_URL", &require("GOOGLE_CALLBACK_URL")?)?;

        let port = match get("PORT") {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .map_err(|_| config_error(&format!("Invalid PORT value: {}", p)))?,
            None => DEFAULT_PORT,
        };

        let bind_address = match get("BIND_ADDRESS") {
            Some(a) => a
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| config_error(&format!("Invalid BIND_ADDRESS value: {}", a)))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let handoff_mode = match get("HANDOFF_MODE") {
            Some(m) => m.parse::<HandoffMode>().map_err(|e| config_error(&e))?,
            None => HandoffMode::Query,
        };

        let session_secret = get("SESSION_SECRET");
        match &session_secret {
            None if handoff_mode == HandoffMode::Session => {
                return Err(env_error("SESSION_SECRET"));
            }
            Some(secret) if secret.len() < MIN_SESSION_SECRET_LEN => {
                return Err(config_error(&format!(
                    "SESSION_SECRET must be at least {} bytes long",
                    MIN_SESSION_SECRET_LEN
                )));
            }
            _ => {}
        }

        let cors_origin = match get("CORS_ORIGIN") {
            Some(origin) => Some(parse_origin(&origin)?),
            None => None,
        };

        let session_ttl_minutes = match get("SESSION_TTL_MINUTES") {
            Some(t) => t
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|t| (1..=MAX_SESSION_TTL_MINUTES).contains(t))
                .ok_or_else(|| config_error(&format!("Invalid SESSION_TTL_MINUTES value: {}", t)))?,
            None => DEFAULT_SESSION_TTL_MINUTES,
        };

        let app_scheme = get("APP_SCHEME").unwrap_or_else(|| DEFAULT_APP_SCHEME.to_string());
        if !is_valid_scheme(&app_scheme) {
            return Err(config_error(&format!("Invalid APP_SCHEME value: {}", app_scheme)));
        }

        let failure_redirect =
            get("FAILURE_REDIRECT").unwrap_or_else(|| DEFAULT_FAILURE_REDIRECT.to_string());
        // Sent verbatim as a Location header
        if HeaderValue::from_str(&failure_redirect).is_err() {
            return Err(config_error(&format!(
                "Invalid FAILURE_REDIRECT value: {:?}",
                failure_redirect
            )));
        }

        let endpoint = |var: &str, default: &str| {
            parse_url(var, &get(var).unwrap_or_else(|| default.to_string()))
        };
        let endpoints = GoogleEndpoints {
            auth_url: endpoint("GOOGLE_AUTH_URL", GOOGLE_AUTH_URL)?,
            token_url: endpoint("GOOGLE_TOKEN_URL", GOOGLE_TOKEN_URL)?,
            userinfo_url: endpoint("GOOGLE_USERINFO_URL", GOOGLE_USERINFO_URL)?,
            calendar_api_url: endpoint("GOOGLE_CALENDAR_API_URL", GOOGLE_CALENDAR_API_URL)?,
        };

        Ok(Config {
            google_client_id,
            google_client_secret,
            callback_url,
            bind_address,
            port,
            session_secret,
            cors_origin,
            app_scheme,
            failure_redirect,
            handoff_mode,
            session_ttl_minutes,
            endpoints,
        })
    }

    /// Socket address to listen on
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

fn parse_url(var: &str, value: &str) -> AppResult<Url> {
    Url::parse(value.trim()).map_err(|e| config_error(&format!("Invalid {} value: {}", var, e)))
}

// Browser origins carry no path, so "https://app.example.com/" is normalized
fn parse_origin(value: &str) -> AppResult<String> {
    let origin = value.trim().trim_end_matches('/');
    let url = parse_url("CORS_ORIGIN", origin)?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() || url.path() != "/" {
        return Err(config_error(&format!("Invalid CORS_ORIGIN value: {}", value)));
    }
    Ok(origin.to_string())
}

// RFC 3986 scheme: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
