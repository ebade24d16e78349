//! In-memory session and single-use key storage.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;

use idgate_auth::AuthResult;
use idgate_auth::error::AuthError;
use idgate_auth::oauth::{Session, SessionKey, SessionState};
use idgate_auth::storage::{SessionKeyStorage, SessionStorage};

/// Sessions keyed by ID.
///
/// Conditional updates hold the entry's shard lock for the whole
/// compare-and-set, so concurrent transitions of one session serialize.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    sessions: DashMap<String, Session>,
}

impl MemorySessionStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        match self.sessions.entry(session.id.clone()) {
            Entry::Occupied(_) => Err(AuthError::storage(format!(
                "Session {} already exists",
                session.id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> AuthResult<Option<Session>> {
        Ok(self.sessions.get(id).map(|s| s.value().clone()))
    }

    async fn update(&self, session: &Session, expected: SessionState) -> AuthResult<bool> {
        let Some(mut stored) = self.sessions.get_mut(&session.id) else {
            return Ok(false);
        };
        if stored.state != expected || stored.consumed_at.is_some() {
            return Ok(false);
        }
        *stored = session.clone();
        Ok(true)
    }

    async fn mark_consumed(&self, id: &str, at: OffsetDateTime) -> AuthResult<bool> {
        let Some(mut stored) = self.sessions.get_mut(id) else {
            return Ok(false);
        };
        if stored.consumed_at.is_some() {
            return Ok(false);
        }
        stored.consumed_at = Some(at);
        Ok(true)
    }

    async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at >= now);
        Ok(before.saturating_sub(self.sessions.len()) as u64)
    }
}

/// Single-use keys keyed by key value.
///
/// Redemption is `DashMap::remove`: of any number of concurrent callers,
/// exactly one receives the key.
#[derive(Debug, Default)]
pub struct MemorySessionKeyStorage {
    keys: DashMap<String, SessionKey>,
}

impl MemorySessionKeyStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unredeemed keys, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl SessionKeyStorage for MemorySessionKeyStorage {
    async fn create(&self, key: &SessionKey) -> AuthResult<()> {
        match self.keys.entry(key.key.clone()) {
            Entry::Occupied(_) => Err(AuthError::storage("Session key collision")),
            Entry::Vacant(entry) => {
                entry.insert(key.clone());
                Ok(())
            }
        }
    }

    async fn redeem(&self, key: &str) -> AuthResult<Option<SessionKey>> {
        Ok(self.keys.remove(key).map(|(_, key)| key))
    }

    async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let before = self.keys.len();
        self.keys.retain(|_, key| key.expires_at >= now);
        Ok(before.saturating_sub(self.keys.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn create_test_session(id: &str) -> Session {
        let now = OffsetDateTime::now_utc();
        Session {
            id: id.to_string(),
            state: SessionState::Created,
            connector_id: "test_connector_id".to_string(),
            client_id: "XXX".to_string(),
            client_state: "bogus".to_string(),
            nonce: None,
            redirect_url: "http://client.example.com/callback".to_string(),
            scope: vec!["openid".to_string()],
            identity: None,
            user_id: None,
            code: None,
            created_at: now,
            expires_at: now + Duration::from_secs(600),
            consumed_at: None,
        }
    }

    fn create_test_key(key: &str, expires_at: OffsetDateTime) -> SessionKey {
        SessionKey {
            key: key.to_string(),
            session_id: "session-1".to_string(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_session_create_and_find() {
        let storage = MemorySessionStorage::new();
        storage.create(&create_test_session("s1")).await.unwrap();

        let found = storage.find_by_id("s1").await.unwrap().unwrap();
        assert_eq!(found.client_id, "XXX");
        assert!(storage.find_by_id("s2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_duplicate_create_fails() {
        let storage = MemorySessionStorage::new();
        storage.create(&create_test_session("s1")).await.unwrap();
        let result = storage.create(&create_test_session("s1")).await;
        assert!(matches!(result, Err(AuthError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_session_update_is_conditional() {
        let storage = MemorySessionStorage::new();
        let mut session = create_test_session("s1");
        storage.create(&session).await.unwrap();

        session.state = SessionState::IdentityAttached;
        assert!(storage.update(&session, SessionState::Created).await.unwrap());
        // Stored state moved on; the same precondition no longer holds.
        assert!(!storage.update(&session, SessionState::Created).await.unwrap());

        let missing = create_test_session("missing");
        assert!(!storage.update(&missing, SessionState::Created).await.unwrap());
    }

    #[tokio::test]
    async fn test_session_mark_consumed_once() {
        let storage = MemorySessionStorage::new();
        let session = create_test_session("s1");
        storage.create(&session).await.unwrap();

        let now = OffsetDateTime::now_utc();
        assert!(storage.mark_consumed("s1", now).await.unwrap());
        assert!(!storage.mark_consumed("s1", now).await.unwrap());
        assert!(!storage.update(&session, SessionState::Created).await.unwrap());
    }

    #[tokio::test]
    async fn test_session_cleanup() {
        let storage = MemorySessionStorage::new();
        storage.create(&create_test_session("s1")).await.unwrap();

        let later = OffsetDateTime::now_utc() + Duration::from_secs(3600);
        assert_eq!(storage.cleanup_expired(later).await.unwrap(), 1);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_key_redeem_once() {
        let storage = MemorySessionKeyStorage::new();
        let expires = OffsetDateTime::now_utc() + Duration::from_secs(300);
        storage.create(&create_test_key("k1", expires)).await.unwrap();

        let redeemed = storage.redeem("k1").await.unwrap().unwrap();
        assert_eq!(redeemed.session_id, "session-1");
        assert!(storage.redeem("k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_key_collision_rejected() {
        let storage = MemorySessionKeyStorage::new();
        let expires = OffsetDateTime::now_utc();
        storage.create(&create_test_key("k1", expires)).await.unwrap();
        assert!(storage.create(&create_test_key("k1", expires)).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_redeem_single_winner() {
        let storage = Arc::new(MemorySessionKeyStorage::new());
        let expires = OffsetDateTime::now_utc() + Duration::from_secs(300);
        storage.create(&create_test_key("k1", expires)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let storage = Arc::clone(&storage);
            handles.push(tokio::spawn(async move { storage.redeem("k1").await }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
