use super::models::{Profile, TokenErrorResponse, TokenGrant, TokenResponse};
use super::{OAuthError, OAuthProvider};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// Scopes requested on the consent screen: basic profile and read-only calendar
pub const SCOPES: [&str; 2] = [
    "profile",
    "https://www.googleapis.com/auth/calendar.readonly",
];

/// Google implementation of the authorization-code flow
#[derive(Clone)]
pub struct GoogleOAuthClient {
    client: Client,
    client_id: String,
    client_secret: String,
    callback_url: Url,
    auth_url: Url,
    token_url: Url,
    userinfo_url: Url,
}

impl GoogleOAuthClient {
    /// Create a client from the loaded configuration
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            callback_url: config.callback_url.clone(),
            auth_url: config.endpoints.auth_url.clone(),
            token_url: config.endpoints.token_url.clone(),
            userinfo_url: config.endpoints.userinfo_url.clone(),
        }
    }

    /// Fetch the basic profile belonging to `access_token`
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, OAuthError> {
        let response = self
            .client
            .get(self.userinfo_url.clone())
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| OAuthError::Transport(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(OAuthError::Provider {
                status: status.as_u16(),
                message: format!("Failed to fetch profile: HTTP {}", status),
            });
        }

        response
            .json::<Profile>()
            .await
            .map_err(|e| OAuthError::Decode(format!("Failed to parse profile: {}", e)))
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthClient {
    fn authorize_url(&self) -> Url {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", self.callback_url.as_str())
            .append_pair("scope", &SCOPES.join(" "))
            .append_pair("client_id", &self.client_id);
        url
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.callback_url.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::Transport(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&error_body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("HTTP {}", status),
            };
            return Err(OAuthError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::Decode(format!("Failed to parse token response: {}", e)))?;

        debug!(
            expires_in = ?token.expires_in,
            scope = ?token.scope,
            token_type = ?token.token_type,
            "Authorization code exchanged"
        );

        let access_token = token.access_token.filter(|t| !t.is_empty());
        let Some(access_token) = access_token else {
            // Nothing to look the profile up with
            return Ok(TokenGrant::default());
        };

        let profile = self.fetch_profile(&access_token).await?;
        info!(profile_id = %profile.id, "Google sign-in completed");

        Ok(TokenGrant {
            access_token: Some(access_token),
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> Config {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("GOOGLE_CLIENT_ID", "client-123.apps.googleusercontent.com"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("GOOGLE_CALLBACK_URL", "https://backend.example.com/auth/google/callback"),
        ]);
        Config::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap()
    }

    #[test]
    fn test_authorize_url() {
        let oauth = GoogleOAuthClient::new(Client::new(), &config());
        let url = oauth.authorize_url();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(url.path(), "/o/oauth2/v2/auth");

        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["client_id"], "client-123.apps.googleusercontent.com");
        assert_eq!(
            pairs["redirect_uri"],
            "https://backend.example.com/auth/google/callback"
        );
        assert_eq!(
            pairs["scope"],
            "profile https://www.googleapis.com/auth/calendar.readonly"
        );
        // No offline access: refresh tokens are never requested
        assert!(!pairs.contains_key("access_type"));
    }
}
