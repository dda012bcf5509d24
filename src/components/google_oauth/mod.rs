mod client;
pub mod models;

pub use client::{GoogleOAuthClient, SCOPES};
pub use models::{Profile, TokenGrant};

use crate::components::session::Principal;
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use url::Url;

/// Failures while talking to the OAuth provider
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OAuthError {
    #[error("Failed to reach OAuth provider: {0}")]
    Transport(String),

    #[error("OAuth provider rejected the request (HTTP {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Unexpected response from OAuth provider: {0}")]
    Decode(String),
}

/// Authorization-code flow against an OAuth2 provider
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Consent screen URL the user agent is redirected to
    fn authorize_url(&self) -> Url;

    /// Exchange an authorization code for an access token and profile
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, OAuthError>;
}

/// Outcome of the callback stage
#[derive(Debug)]
pub enum AuthOutcome {
    Authenticated(Principal),
    /// Exchange or profile lookup failed
    Failed(OAuthError),
    /// Provider answered successfully but handed out no access token
    MissingAccessToken,
}

/// Complete the handshake for a callback carrying `code`.
///
/// The only suspension point is the exchange itself.
pub async fn complete_auth(provider: &dyn OAuthProvider, code: &str) -> AuthOutcome {
    match provider.exchange_code(code).await {
        Ok(grant) => match Principal::from_grant(grant, Utc::now()) {
            Some(principal) => AuthOutcome::Authenticated(principal),
            None => AuthOutcome::MissingAccessToken,
        },
        Err(e) => AuthOutcome::Failed(e),
    }
}
