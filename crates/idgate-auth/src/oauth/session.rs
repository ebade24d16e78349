//! Authentication session types.
//!
//! A session carries one authentication attempt from the moment the browser
//! is redirected to the provider until an authorization code has been
//! redeemed.
//!
//! # Lifecycle
//!
//! 1. `Created`: the authorization request has been accepted
//! 2. `IdentityAttached`: a connector has asserted a remote identity
//! 3. `UserAttached`: the identity resolved to an enabled internal user
//! 4. `CodeMinted`: an authorization code was issued
//!
//! Transitions are strictly forward. A session whose code has been redeemed
//! is marked consumed and can mint no further keys.
//!
//! # Security
//!
//! - Keys and codes are 256 bits of OS randomness, base64url encoded
//! - Keys are single-use; redemption removes them atomically from storage

use std::fmt;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::Identity;

/// Position of a session in the login state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created; waiting for the connector to authenticate the user.
    Created,
    /// The connector's identity has been attached.
    IdentityAttached,
    /// The identity has been resolved to an internal user.
    UserAttached,
    /// An authorization code has been minted.
    CodeMinted,
}

impl SessionState {
    /// Returns the state name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::IdentityAttached => "identity_attached",
            Self::UserAttached => "user_attached",
            Self::CodeMinted => "code_minted",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored authentication session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Unique session identifier (UUID v4).
    pub id: String,

    /// Current state machine position.
    pub state: SessionState,

    /// Connector the user is authenticating with.
    pub connector_id: String,

    /// Client that initiated the request. Immutable after creation.
    pub client_id: String,

    /// Opaque `state` value from the client, echoed on redirect.
    pub client_state: String,

    /// OIDC nonce, copied into ID tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Redirect URL the code is delivered to. Immutable after creation.
    pub redirect_url: String,

    /// Requested scopes.
    pub scope: Vec<String>,

    /// Identity asserted by the connector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,

    /// Resolved internal user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// The minted authorization code. Never logged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// When the session was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the session stops being usable.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When the authorization code was redeemed.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub consumed_at: Option<OffsetDateTime>,
}

impl Session {
    /// Returns `true` if the session has expired at `now`, allowing `skew`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime, skew: Duration) -> bool {
        checked_deadline(self.expires_at, skew).is_some_and(|deadline| now > deadline)
    }

    /// Returns `true` if the authorization code has been redeemed.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Returns `true` if the given scope was requested.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|s| s == scope)
    }
}

/// A single-use key bound to one session.
///
/// Both the pre-login key handed to the login UI and the authorization code
/// handed to the client are `SessionKey`s.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionKey {
    /// The opaque key value.
    pub key: String,

    /// The session this key resolves to.
    pub session_id: String,

    /// When the key stops being redeemable.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl SessionKey {
    /// Returns `true` if the key has expired at `now`, allowing `skew`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime, skew: Duration) -> bool {
        checked_deadline(self.expires_at, skew).is_some_and(|deadline| now > deadline)
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("key", &"[REDACTED]")
            .field("session_id", &self.session_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Parameters of a new authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Connector the user will authenticate with.
    pub connector_id: String,
    /// Requesting client.
    pub client_id: String,
    /// Client `state` parameter.
    pub state: String,
    /// Redirect URL for the code.
    pub redirect_url: String,
    /// OIDC nonce.
    pub nonce: Option<String>,
    /// Requested scopes.
    pub scope: Vec<String>,
}

impl SessionRequest {
    /// Creates a request with empty state, no nonce and no scopes.
    #[must_use]
    pub fn new(
        connector_id: impl Into<String>,
        client_id: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            connector_id: connector_id.into(),
            client_id: client_id.into(),
            state: String::new(),
            redirect_url: redirect_url.into(),
            nonce: None,
            scope: Vec::new(),
        }
    }

    /// Sets the client `state` parameter.
    #[must_use]
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Sets the nonce.
    #[must_use]
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Sets the requested scopes.
    #[must_use]
    pub fn scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }
}

/// Returns `at + lifetime`, or `None` past the representable date range.
pub(crate) fn checked_deadline(at: OffsetDateTime, lifetime: Duration) -> Option<OffsetDateTime> {
    time::Duration::try_from(lifetime)
        .ok()
        .and_then(|lifetime| at.checked_add(lifetime))
}

/// Generates a new key or authorization code.
///
/// 256 bits from the thread-local CSPRNG, base64url encoded without padding
/// (43 characters).
#[must_use]
pub fn generate_code() -> String {
    let mut bytes = [0u8; 32];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
