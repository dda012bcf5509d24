use super::Principal;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Opaque session identifier carried in the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone)]
struct Session {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

/// In-memory session store. Contents vanish when the process exits.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create an empty store whose sessions live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Session lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a principal under a fresh session id
    pub async fn create(&self, principal: Principal) -> SessionId {
        self.create_at(principal, Utc::now()).await
    }

    /// Principal for `id`, if the session exists and has not expired
    pub async fn get(&self, id: &SessionId) -> Option<Principal> {
        self.get_at(id, Utc::now()).await
    }

    /// Drop a session, returning its principal
    pub async fn remove(&self, id: &SessionId) -> Option<Principal> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id).map(|s| s.principal)
    }

    /// Remove every expired session, returning how many were dropped
    pub async fn prune_expired(&self) -> usize {
        self.prune_expired_at(Utc::now()).await
    }

    /// Number of stored sessions, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn create_at(&self, principal: Principal, now: DateTime<Utc>) -> SessionId {
        let id = SessionId::new();
        let session = Session {
            principal,
            expires_at: now + self.ttl,
        };

        self.sessions.write().await.insert(id, session);
        debug!(session_id = %id, "Session created");
        id
    }

    async fn get_at(&self, id: &SessionId, now: DateTime<Utc>) -> Option<Principal> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(session) if session.expires_at > now => {
                    return Some(session.principal.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it so the token does not linger
        let mut sessions = self.sessions.write().await;
        if sessions.get(id).is_some_and(|s| s.expires_at <= now) {
            sessions.remove(id);
            debug!(session_id = %id, "Expired session removed");
        }
        None
    }

    async fn prune_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(id: &str) -> Principal {
        Principal {
            profile_id: id.to_string(),
            display_name: None,
            access_token: format!("token-{}", id),
            issued_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SessionStore::new(Duration::minutes(30));
        let id = store.create(principal("alice")).await;

        let found = store.get(&id).await.unwrap();
        assert_eq!(found.profile_id, "alice");
        assert_eq!(found.access_token, "token-alice");

        // Unknown ids resolve to nothing
        assert!(store.get(&SessionId::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(Duration::minutes(30));
        let alice = store.create(principal("alice")).await;
        let bob = store.create(principal("bob")).await;

        assert_ne!(alice, bob);
        assert_eq!(store.get(&alice).await.unwrap().profile_id, "alice");
        assert_eq!(store.get(&bob).await.unwrap().profile_id, "bob");
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped_on_read() {
        let store = SessionStore::new(Duration::minutes(30));
        let now = Utc::now();
        let id = store.create_at(principal("alice"), now).await;

        assert!(store.get_at(&id, now + Duration::minutes(29)).await.is_some());
        assert!(store.get_at(&id, now + Duration::minutes(30)).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_prune_expired() {
        let store = SessionStore::new(Duration::minutes(10));
        let now = Utc::now();
        store.create_at(principal("old"), now - Duration::minutes(20)).await;
        let fresh = store.create_at(principal("fresh"), now).await;

        assert_eq!(store.prune_expired_at(now).await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get_at(&fresh, now).await.is_some());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SessionStore::new(Duration::minutes(10));
        let id = store.create(principal("alice")).await;

        assert_eq!(store.remove(&id).await.unwrap().profile_id, "alice");
        assert!(store.remove(&id).await.is_none());
    }

    #[test]
    fn test_session_id_round_trips_through_cookie_value() {
        let id = SessionId::new();
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
        assert!("not-a-session".parse::<SessionId>().is_err());
    }
}
