//! In-memory storage backend for idgate.
//!
//! Implements every storage trait of `idgate-auth` on top of `DashMap`.
//! Suitable for tests, demos and single-process deployments; nothing
//! survives a restart.
//!
//! Expired sessions and keys are rejected on use but stay in memory until
//! [`SessionManager::cleanup_expired`] runs. Long-lived processes should call
//! it periodically, e.g. through `server.session_manager()`.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use idgate_auth::{AuthConfig, SigningAlgorithm, SigningKeyPair};
//! use idgate_auth::token::StaticKeyProvider;
//! use idgate_auth_memory::MemoryBackend;
//!
//! let backend = MemoryBackend::new();
//! backend.clients.register(client, "secret")?;
//! let keys = StaticKeyProvider::from_key_pair(SigningKeyPair::generate_rsa(SigningAlgorithm::RS256)?);
//! let server = backend.authorization_server(&AuthConfig::default(), Arc::new(keys));
//! ```

pub mod client;
pub mod refresh_token;
pub mod session;
pub mod user;

use std::sync::Arc;

use idgate_auth::config::{AuthConfig, SessionConfig};
use idgate_auth::oauth::{AuthorizationServer, SessionManager};
use idgate_auth::token::KeyProvider;

pub use client::MemoryClientStorage;
pub use refresh_token::{MemoryRefreshTokenStorage, PayloadGenerator};
pub use session::{MemorySessionKeyStorage, MemorySessionStorage};
pub use user::MemoryUserStorage;

/// One instance of every in-memory store, shareable between the
/// authorization server and code that seeds or inspects the data.
#[derive(Clone)]
pub struct MemoryBackend {
    /// Authentication sessions.
    pub sessions: Arc<MemorySessionStorage>,
    /// Single-use session keys and authorization codes.
    pub keys: Arc<MemorySessionKeyStorage>,
    /// Registered clients.
    pub clients: Arc<MemoryClientStorage>,
    /// Users and remote identity links.
    pub users: Arc<MemoryUserStorage>,
    /// Refresh token ledger.
    pub refresh_tokens: Arc<MemoryRefreshTokenStorage>,
}

impl MemoryBackend {
    /// Creates empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(MemorySessionStorage::new()),
            keys: Arc::new(MemorySessionKeyStorage::new()),
            clients: Arc::new(MemoryClientStorage::new()),
            users: Arc::new(MemoryUserStorage::new()),
            refresh_tokens: Arc::new(MemoryRefreshTokenStorage::new()),
        }
    }

    /// Replaces the refresh token ledger.
    #[must_use]
    pub fn with_refresh_tokens(mut self, ledger: MemoryRefreshTokenStorage) -> Self {
        self.refresh_tokens = Arc::new(ledger);
        self
    }

    /// Builds a session manager over these stores.
    #[must_use]
    pub fn session_manager(&self, config: &SessionConfig) -> SessionManager {
        SessionManager::new(self.sessions.clone(), self.keys.clone(), config.clone())
    }

    /// Builds an authorization server over these stores with a default
    /// session manager.
    #[must_use]
    pub fn authorization_server(
        &self,
        config: &AuthConfig,
        keys: Arc<dyn KeyProvider>,
    ) -> AuthorizationServer {
        self.authorization_server_with(config, self.session_manager(&config.session), keys)
    }

    /// Builds an authorization server over these stores with a caller
    /// supplied session manager (e.g. one with a fixed code generator).
    #[must_use]
    pub fn authorization_server_with(
        &self,
        config: &AuthConfig,
        sessions: SessionManager,
        keys: Arc<dyn KeyProvider>,
    ) -> AuthorizationServer {
        AuthorizationServer::new(
            config,
            sessions,
            self.clients.clone(),
            self.users.clone(),
            keys,
            self.refresh_tokens.clone(),
        )
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}
