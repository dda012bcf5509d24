use serde::Deserialize;

/// Successful response from the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
}

/// Error body returned by the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

/// Basic profile from the userinfo endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Profile {
    /// Stable Google account identifier
    #[serde(rename = "sub")]
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

/// Result of a successful code exchange.
///
/// `access_token` stays optional: the provider can answer 200 without one,
/// and that case must be surfaced instead of producing an empty token.
#[derive(Clone, Default)]
pub struct TokenGrant {
    pub access_token: Option<String>,
    pub profile: Profile,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("profile", &self.profile)
            .finish()
    }
}
