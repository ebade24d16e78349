//! Refresh token ledger records.

use serde::{Deserialize, Serialize};

/// A freshly created ledger record: its identifier and the secret payload
/// that must be handed to the client exactly once.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshTokenGrant {
    /// Ledger-assigned record identifier. Monotonic, never reused.
    pub record_id: u64,

    /// Opaque secret payload.
    pub payload: Vec<u8>,
}

impl std::fmt::Debug for RefreshTokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenGrant")
            .field("record_id", &self.record_id)
            .field("payload", &"[REDACTED]")
            .finish()
    }
}

/// The (user, client) pair a ledger record is bound to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshTokenBinding {
    /// Internal user ID.
    pub user_id: String,

    /// Client ID.
    pub client_id: String,
}
