use crate::components::google_oauth::TokenGrant;
use chrono::{DateTime, Utc};
use std::fmt;

/// Authenticated identity plus the credential it was issued
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    /// Google account identifier
    pub profile_id: String,
    pub display_name: Option<String>,
    /// Bearer token for Google APIs, never refreshed
    pub access_token: String,
    pub issued_at: DateTime<Utc>,
}

impl Principal {
    /// Build a principal from an exchange result.
    ///
    /// Returns `None` when the grant carries no usable access token.
    pub fn from_grant(grant: TokenGrant, issued_at: DateTime<Utc>) -> Option<Self> {
        let access_token = grant.access_token.filter(|t| !t.is_empty())?;

        Some(Self {
            profile_id: grant.profile.id,
            display_name: grant.profile.display_name,
            access_token,
            issued_at,
        })
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("profile_id", &self.profile_id)
            .field("display_name", &self.display_name)
            .field("access_token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::google_oauth::Profile;

    #[test]
    fn test_from_grant() {
        let now = Utc::now();
        let grant = TokenGrant {
            access_token: Some("ya29.secret".to_string()),
            profile: Profile {
                id: "42".to_string(),
                display_name: Some("Ada".to_string()),
                ..Default::default()
            },
        };

        let principal = Principal::from_grant(grant, now).unwrap();
        assert_eq!(principal.profile_id, "42");
        assert_eq!(principal.display_name.as_deref(), Some("Ada"));
        assert_eq!(principal.issued_at, now);

        // Token never shows up in logs
        assert!(!format!("{:?}", principal).contains("ya29.secret"));
    }

    #[test]
    fn test_from_grant_requires_token() {
        assert!(Principal::from_grant(TokenGrant::default(), Utc::now()).is_none());
    }
}
