//! Refresh token ledger trait.
//!
//! # Security Considerations
//!
//! - Payloads are secrets; store a digest, never the raw bytes
//! - Comparison of presented payloads must be exact
//! - Record identifiers are assigned monotonically and never reused

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{RefreshTokenBinding, RefreshTokenGrant};

/// Persistence for refresh token records.
#[async_trait]
pub trait RefreshTokenStorage: Send + Sync {
    /// Creates a record bound to (user, client) and returns its identifier
    /// with the freshly generated payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored.
    async fn create(&self, user_id: &str, client_id: &str) -> AuthResult<RefreshTokenGrant>;

    /// Returns the record's binding if `record_id` exists and `payload`
    /// matches it exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn verify(
        &self,
        record_id: u64,
        payload: &[u8],
    ) -> AuthResult<Option<RefreshTokenBinding>>;

    /// Deletes a record. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke(&self, record_id: u64) -> AuthResult<bool>;
}
