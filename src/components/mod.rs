//! Integrations the HTTP layer is built on: the Google OAuth handshake,
//! the Calendar API passthrough and the in-memory session carrier.

pub mod google_calendar;
pub mod google_oauth;
pub mod session;

// Re-export the seams handlers depend on
pub use google_calendar::{CalendarApi, CalendarError, GoogleCalendarClient};
pub use google_oauth::{AuthOutcome, GoogleOAuthClient, OAuthError, OAuthProvider};
pub use session::{Principal, SessionId, SessionStore};
