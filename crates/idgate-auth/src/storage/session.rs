//! Session and single-use key storage traits.
//!
//! # Implementation Notes
//!
//! Implementations must make these operations atomic per session:
//!
//! - `SessionKeyStorage::redeem` must remove and return the key in one step,
//!   so two concurrent redemptions of the same key cannot both succeed
//! - `SessionStorage::update` is a compare-and-set on the session state
//!
//! Keys and codes are credentials. Never log them.

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::oauth::session::{Session, SessionKey, SessionState};

/// Storage for authentication sessions.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Stores a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if a session with the same ID exists or the storage
    /// is unavailable.
    async fn create(&self, session: &Session) -> AuthResult<()>;

    /// Finds a session by ID, regardless of expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<Session>>;

    /// Replaces a stored session if its current state equals `expected` and
    /// it has not been consumed.
    ///
    /// Returns `false` when the precondition does not hold (including when
    /// the session no longer exists).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn update(&self, session: &Session, expected: SessionState) -> AuthResult<bool>;

    /// Marks a session consumed. Returns `false` if it was missing or
    /// already consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn mark_consumed(&self, id: &str, at: OffsetDateTime) -> AuthResult<bool>;

    /// Deletes sessions that expired before `now`, returning how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;
}

/// Storage for single-use session keys.
#[async_trait]
pub trait SessionKeyStorage: Send + Sync {
    /// Stores a new key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key already exists or the storage is
    /// unavailable.
    async fn create(&self, key: &SessionKey) -> AuthResult<()>;

    /// Atomically removes and returns a key.
    ///
    /// Returns `None` if the key is unknown or was already redeemed. Expired
    /// keys are still returned; callers check expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn redeem(&self, key: &str) -> AuthResult<Option<SessionKey>>;

    /// Deletes keys that expired before `now`, returning how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;
}
