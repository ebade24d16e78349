//! Session state machine.
//!
//! [`SessionManager`] owns every mutation of a [`Session`]: creation,
//! identity and user attachment, code minting and consumption. It also mints
//! and redeems the single-use keys that reference sessions.
//!
//! Unknown, expired and already-redeemed keys all surface as
//! [`AuthError::NotFound`]; the authorization server turns those into
//! `invalid_grant`.

use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::AuthError;
use crate::oauth::session::{
    Session, SessionKey, SessionRequest, SessionState, checked_deadline, generate_code,
};
use crate::storage::{SessionKeyStorage, SessionStorage};
use crate::types::Identity;
use crate::AuthResult;

/// Produces key and code values.
pub type CodeGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Produces the current time.
pub type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// Session lifecycle manager.
pub struct SessionManager {
    sessions: Arc<dyn SessionStorage>,
    keys: Arc<dyn SessionKeyStorage>,
    config: SessionConfig,
    generate_code: CodeGenerator,
    now: Clock,
}

impl SessionManager {
    /// Creates a manager using random codes and the system clock.
    pub fn new(
        sessions: Arc<dyn SessionStorage>,
        keys: Arc<dyn SessionKeyStorage>,
        config: SessionConfig,
    ) -> Self {
        Self {
            sessions,
            keys,
            config,
            generate_code: Arc::new(generate_code),
            now: Arc::new(OffsetDateTime::now_utc),
        }
    }

    /// Replaces the key/code generator.
    #[must_use]
    pub fn with_code_generator(mut self, generate_code: CodeGenerator) -> Self {
        self.generate_code = generate_code;
        self
    }

    /// Replaces the clock used for expiry.
    #[must_use]
    pub fn with_clock(mut self, now: Clock) -> Self {
        self.now = now;
        self
    }

    /// Returns the current time according to the manager's clock.
    #[must_use]
    pub fn now(&self) -> OffsetDateTime {
        (self.now)()
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Creates a session in the `Created` state and returns a pre-login key
    /// bound to it.
    ///
    /// # Errors
    ///
    /// Returns an error only if storage fails.
    pub async fn new_session(&self, request: SessionRequest) -> AuthResult<String> {
        let now = (self.now)();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            state: SessionState::Created,
            connector_id: request.connector_id,
            client_id: request.client_id,
            client_state: request.state,
            nonce: request.nonce,
            redirect_url: request.redirect_url,
            scope: request.scope,
            identity: None,
            user_id: None,
            code: None,
            created_at: now,
            expires_at: deadline(now, self.config.session_lifetime)?,
            consumed_at: None,
        };

        self.sessions.create(&session).await?;

        tracing::debug!(
            session_id = %session.id,
            client_id = %session.client_id,
            connector_id = %session.connector_id,
            "Session created"
        );

        self.create_key(&session.id, now).await
    }

    /// Mints a fresh single-use key for an existing session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session is unknown, expired or consumed.
    pub async fn new_session_key(&self, session_id: &str) -> AuthResult<String> {
        let session = self.session(session_id).await?;
        if session.is_consumed() {
            return Err(AuthError::not_found("Session"));
        }
        self.create_key(&session.id, (self.now)()).await
    }

    /// Redeems a single-use key, returning its session ID.
    ///
    /// The key is gone after this call whether or not it had expired.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key is unknown, already redeemed or expired.
    pub async fn exchange_key(&self, key: &str) -> AuthResult<String> {
        let redeemed = self
            .keys
            .redeem(key)
            .await?
            .ok_or_else(|| AuthError::not_found("Session key"))?;

        if redeemed.is_expired_at((self.now)(), self.config.clock_skew) {
            return Err(AuthError::not_found("Session key"));
        }

        Ok(redeemed.session_id)
    }

    /// Loads a live session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session is unknown or expired.
    pub async fn session(&self, session_id: &str) -> AuthResult<Session> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AuthError::not_found("Session"))?;

        if session.is_expired_at((self.now)(), self.config.clock_skew) {
            return Err(AuthError::not_found("Session"));
        }

        Ok(session)
    }

    /// Attaches the connector's identity (`Created` → `IdentityAttached`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown/expired sessions and
    /// `InvalidSessionState` if the session is not in `Created`.
    pub async fn attach_remote_identity(
        &self,
        session_id: &str,
        identity: Identity,
    ) -> AuthResult<Session> {
        self.transition(session_id, SessionState::Created, |session| {
            session.identity = Some(identity);
            session.state = SessionState::IdentityAttached;
        })
        .await
    }

    /// Attaches the resolved user (`IdentityAttached` → `UserAttached`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown/expired sessions and
    /// `InvalidSessionState` if no identity is attached yet.
    pub async fn attach_user(&self, session_id: &str, user_id: &str) -> AuthResult<Session> {
        self.transition(session_id, SessionState::IdentityAttached, |session| {
            session.user_id = Some(user_id.to_string());
            session.state = SessionState::UserAttached;
        })
        .await
    }

    /// Mints the authorization code (`UserAttached` → `CodeMinted`).
    ///
    /// The code is itself a single-use key resolving to this session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown/expired sessions and
    /// `InvalidSessionState` if no user is attached or a code already exists.
    pub async fn mint_code(&self, session_id: &str) -> AuthResult<String> {
        let expires_at = deadline((self.now)(), self.config.key_lifetime)?;
        let code = (self.generate_code)();
        let minted = code.clone();

        let session = self
            .transition(session_id, SessionState::UserAttached, |session| {
                session.code = Some(minted);
                session.state = SessionState::CodeMinted;
            })
            .await?;

        let key = SessionKey {
            key: code.clone(),
            session_id: session.id,
            expires_at,
        };
        self.keys.create(&key).await?;

        Ok(code)
    }

    /// Marks a session consumed after its code has been redeemed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session is gone and `InvalidSessionState` if
    /// it was already consumed.
    pub async fn consume(&self, session_id: &str) -> AuthResult<()> {
        if !self
            .sessions
            .mark_consumed(session_id, (self.now)())
            .await?
        {
            return match self.sessions.find_by_id(session_id).await? {
                Some(_) => Err(AuthError::invalid_session_state(
                    "Session was already consumed",
                )),
                None => Err(AuthError::not_found("Session")),
            };
        }

        tracing::debug!(session_id = %session_id, "Session consumed");
        Ok(())
    }

    /// Removes expired sessions and keys. Returns (sessions, keys) removed.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cleanup fails.
    pub async fn cleanup_expired(&self) -> AuthResult<(u64, u64)> {
        let Some(cutoff) = time::Duration::try_from(self.config.clock_skew)
            .ok()
            .and_then(|skew| (self.now)().checked_sub(skew))
        else {
            return Ok((0, 0));
        };
        let sessions = self.sessions.cleanup_expired(cutoff).await?;
        let keys = self.keys.cleanup_expired(cutoff).await?;

        if sessions > 0 || keys > 0 {
            tracing::info!(sessions, keys, "Removed expired sessions and keys");
        }
        Ok((sessions, keys))
    }

    async fn create_key(&self, session_id: &str, now: OffsetDateTime) -> AuthResult<String> {
        let key = SessionKey {
            key: (self.generate_code)(),
            session_id: session_id.to_string(),
            expires_at: deadline(now, self.config.key_lifetime)?,
        };
        self.keys.create(&key).await?;
        Ok(key.key)
    }

    async fn transition<F>(
        &self,
        session_id: &str,
        expected: SessionState,
        apply: F,
    ) -> AuthResult<Session>
    where
        F: FnOnce(&mut Session) + Send,
    {
        let mut session = self.session(session_id).await?;

        if session.is_consumed() {
            return Err(AuthError::invalid_session_state(
                "Session was already consumed",
            ));
        }
        if session.state != expected {
            return Err(AuthError::invalid_session_state(format!(
                "Session is in state {}, expected {}",
                session.state, expected
            )));
        }

        apply(&mut session);

        if !self.sessions.update(&session, expected).await? {
            return Err(AuthError::invalid_session_state(
                "Session was modified concurrently",
            ));
        }

        tracing::debug!(
            session_id = %session.id,
            from = %expected,
            to = %session.state,
            "Session advanced"
        );
        Ok(session)
    }
}

fn deadline(now: OffsetDateTime, lifetime: std::time::Duration) -> AuthResult<OffsetDateTime> {
    checked_deadline(now, lifetime).ok_or_else(|| {
        AuthError::configuration(format!("lifetime of {lifetime:?} is out of range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Mutex, RwLock};
    use std::time::Duration;

    use async_trait::async_trait;

    // =========================================================================
    // Mock Storage
    // =========================================================================

    #[derive(Default)]
    struct MockSessionStorage {
        sessions: RwLock<HashMap<String, Session>>,
    }

    #[async_trait]
    impl SessionStorage for MockSessionStorage {
        async fn create(&self, session: &Session) -> AuthResult<()> {
            self.sessions
                .write()
                .unwrap()
                .insert(session.id.clone(), session.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &str) -> AuthResult<Option<Session>> {
            Ok(self.sessions.read().unwrap().get(id).cloned())
        }

        async fn update(&self, session: &Session, expected: SessionState) -> AuthResult<bool> {
            let mut sessions = self.sessions.write().unwrap();
            match sessions.get_mut(&session.id) {
                Some(stored) if stored.state == expected && stored.consumed_at.is_none() => {
                    *stored = session.clone();
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn mark_consumed(&self, id: &str, at: OffsetDateTime) -> AuthResult<bool> {
            let mut sessions = self.sessions.write().unwrap();
            match sessions.get_mut(id) {
                Some(stored) if stored.consumed_at.is_none() => {
                    stored.consumed_at = Some(at);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
            let mut sessions = self.sessions.write().unwrap();
            let before = sessions.len();
            sessions.retain(|_, s| s.expires_at >= now);
            Ok((before - sessions.len()) as u64)
        }
    }

    #[derive(Default)]
    struct MockKeyStorage {
        keys: Mutex<HashMap<String, SessionKey>>,
    }

    #[async_trait]
    impl SessionKeyStorage for MockKeyStorage {
        async fn create(&self, key: &SessionKey) -> AuthResult<()> {
            self.keys
                .lock()
                .unwrap()
                .insert(key.key.clone(), key.clone());
            Ok(())
        }

        async fn redeem(&self, key: &str) -> AuthResult<Option<SessionKey>> {
            Ok(self.keys.lock().unwrap().remove(key))
        }

        async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
            let mut keys = self.keys.lock().unwrap();
            let before = keys.len();
            keys.retain(|_, k| k.expires_at >= now);
            Ok((before - keys.len()) as u64)
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn sequential_codes() -> CodeGenerator {
        let counter = Arc::new(AtomicU64::new(0));
        Arc::new(move || format!("key-{}", counter.fetch_add(1, Ordering::SeqCst)))
    }

    fn create_test_manager() -> SessionManager {
        SessionManager::new(
            Arc::new(MockSessionStorage::default()),
            Arc::new(MockKeyStorage::default()),
            SessionConfig::default(),
        )
        .with_code_generator(sequential_codes())
    }

    fn create_manager_with_clock(clock: Arc<Mutex<OffsetDateTime>>, skew: Duration) -> SessionManager {
        let config = SessionConfig {
            clock_skew: skew,
            ..SessionConfig::default()
        };
        SessionManager::new(
            Arc::new(MockSessionStorage::default()),
            Arc::new(MockKeyStorage::default()),
            config,
        )
        .with_code_generator(sequential_codes())
        .with_clock(Arc::new(move || *clock.lock().unwrap()))
    }

    fn test_request() -> SessionRequest {
        SessionRequest::new("test_connector_id", "XXX", "http://client.example.com/callback")
            .state("bogus")
            .scope(["openid"])
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[tokio::test]
    async fn test_new_session_and_exchange() {
        let manager = create_test_manager();
        let key = manager.new_session(test_request()).await.unwrap();
        assert_eq!(key, "key-0");

        let session_id = manager.exchange_key(&key).await.unwrap();
        let session = manager.session(&session_id).await.unwrap();

        assert_eq!(session.state, SessionState::Created);
        assert_eq!(session.client_id, "XXX");
        assert_eq!(session.client_state, "bogus");
        assert_eq!(session.redirect_url, "http://client.example.com/callback");
    }

    #[tokio::test]
    async fn test_exchange_key_is_single_use() {
        let manager = create_test_manager();
        let key = manager.new_session(test_request()).await.unwrap();

        assert!(manager.exchange_key(&key).await.is_ok());
        let second = manager.exchange_key(&key).await;
        assert!(matches!(second, Err(AuthError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_exchange_unknown_key() {
        let manager = create_test_manager();
        let result = manager.exchange_key("foo").await;
        assert!(matches!(result, Err(AuthError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_new_session_key_for_existing_session() {
        let manager = create_test_manager();
        let key = manager.new_session(test_request()).await.unwrap();
        let session_id = manager.exchange_key(&key).await.unwrap();

        let fresh = manager.new_session_key(&session_id).await.unwrap();
        assert_ne!(fresh, key);
        assert_eq!(manager.exchange_key(&fresh).await.unwrap(), session_id);
    }

    #[tokio::test]
    async fn test_new_session_key_unknown_session() {
        let manager = create_test_manager();
        let result = manager.new_session_key("missing").await;
        assert!(matches!(result, Err(AuthError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_full_state_machine() {
        let manager = create_test_manager();
        let key = manager.new_session(test_request()).await.unwrap();
        let session_id = manager.exchange_key(&key).await.unwrap();

        let session = manager
            .attach_remote_identity(&session_id, Identity::new("YYY"))
            .await
            .unwrap();
        assert_eq!(session.state, SessionState::IdentityAttached);

        let session = manager.attach_user(&session_id, "testid-1").await.unwrap();
        assert_eq!(session.state, SessionState::UserAttached);
        assert_eq!(session.user_id.as_deref(), Some("testid-1"));

        let code = manager.mint_code(&session_id).await.unwrap();
        let session = manager.session(&session_id).await.unwrap();
        assert_eq!(session.state, SessionState::CodeMinted);
        assert_eq!(session.code.as_deref(), Some(code.as_str()));

        // The code redeems to the same session, once.
        assert_eq!(manager.exchange_key(&code).await.unwrap(), session_id);
        assert!(manager.exchange_key(&code).await.is_err());
    }

    #[tokio::test]
    async fn test_out_of_order_transitions_rejected() {
        let manager = create_test_manager();
        let key = manager.new_session(test_request()).await.unwrap();
        let session_id = manager.exchange_key(&key).await.unwrap();

        let result = manager.attach_user(&session_id, "testid-1").await;
        assert!(matches!(result, Err(AuthError::InvalidSessionState { .. })));

        let result = manager.mint_code(&session_id).await;
        assert!(matches!(result, Err(AuthError::InvalidSessionState { .. })));

        manager
            .attach_remote_identity(&session_id, Identity::new("YYY"))
            .await
            .unwrap();
        let result = manager
            .attach_remote_identity(&session_id, Identity::new("ZZZ"))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidSessionState { .. })));
    }

    #[tokio::test]
    async fn test_code_cannot_be_minted_twice() {
        let manager = create_test_manager();
        let key = manager.new_session(test_request()).await.unwrap();
        let session_id = manager.exchange_key(&key).await.unwrap();
        manager
            .attach_remote_identity(&session_id, Identity::new("YYY"))
            .await
            .unwrap();
        manager.attach_user(&session_id, "testid-1").await.unwrap();
        manager.mint_code(&session_id).await.unwrap();

        let result = manager.mint_code(&session_id).await;
        assert!(matches!(result, Err(AuthError::InvalidSessionState { .. })));
    }

    #[tokio::test]
    async fn test_consumed_session_mints_no_keys() {
        let manager = create_test_manager();
        let key = manager.new_session(test_request()).await.unwrap();
        let session_id = manager.exchange_key(&key).await.unwrap();

        manager.consume(&session_id).await.unwrap();

        let result = manager.new_session_key(&session_id).await;
        assert!(matches!(result, Err(AuthError::NotFound { .. })));

        let result = manager.consume(&session_id).await;
        assert!(matches!(result, Err(AuthError::InvalidSessionState { .. })));
    }

    #[tokio::test]
    async fn test_expired_key_rejected() {
        let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let clock = Arc::new(Mutex::new(start));
        let manager = create_manager_with_clock(Arc::clone(&clock), Duration::ZERO);

        let key = manager.new_session(test_request()).await.unwrap();
        *clock.lock().unwrap() = start + Duration::from_secs(301);

        let result = manager.exchange_key(&key).await;
        assert!(matches!(result, Err(AuthError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_clock_skew_extends_expiry() {
        let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let clock = Arc::new(Mutex::new(start));
        let manager = create_manager_with_clock(Arc::clone(&clock), Duration::from_secs(30));

        let key = manager.new_session(test_request()).await.unwrap();
        *clock.lock().unwrap() = start + Duration::from_secs(320);

        assert!(manager.exchange_key(&key).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let clock = Arc::new(Mutex::new(start));
        let manager = create_manager_with_clock(Arc::clone(&clock), Duration::ZERO);

        let key = manager.new_session(test_request()).await.unwrap();
        let session_id = manager.exchange_key(&key).await.unwrap();
        *clock.lock().unwrap() = start + Duration::from_secs(601);

        let result = manager.session(&session_id).await;
        assert!(matches!(result, Err(AuthError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let clock = Arc::new(Mutex::new(start));
        let manager = create_manager_with_clock(Arc::clone(&clock), Duration::ZERO);

        manager.new_session(test_request()).await.unwrap();
        *clock.lock().unwrap() = start + Duration::from_secs(700);

        let (sessions, keys) = manager.cleanup_expired().await.unwrap();
        assert_eq!(sessions, 1);
        assert_eq!(keys, 1);
    }

    #[tokio::test]
    async fn test_unrepresentable_lifetime_is_configuration_error() {
        let config = SessionConfig {
            session_lifetime: Duration::from_secs(400_000 * 365 * 86_400),
            ..SessionConfig::default()
        };
        let manager = SessionManager::new(
            Arc::new(MockSessionStorage::default()),
            Arc::new(MockKeyStorage::default()),
            config,
        );

        let result = manager.new_session(test_request()).await;
        assert!(matches!(result, Err(AuthError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_unrepresentable_skew_does_not_panic() {
        let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let clock = Arc::new(Mutex::new(start));
        let manager = create_manager_with_clock(
            Arc::clone(&clock),
            Duration::from_secs(400_000 * 365 * 86_400),
        );

        let key = manager.new_session(test_request()).await.unwrap();
        *clock.lock().unwrap() = start + Duration::from_secs(3600);

        assert!(manager.exchange_key(&key).await.is_ok());
        assert_eq!(manager.cleanup_expired().await.unwrap(), (0, 0));
    }

    #[test]
    fn test_now_uses_injected_clock() {
        let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let manager = create_manager_with_clock(Arc::new(Mutex::new(start)), Duration::ZERO);
        assert_eq!(manager.now(), start);
    }
}
