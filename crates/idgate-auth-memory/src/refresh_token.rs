//! In-memory refresh token ledger.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use rand::RngCore;
use sha2::{Digest, Sha256};

use idgate_auth::AuthResult;
use idgate_auth::storage::RefreshTokenStorage;
use idgate_auth::types::{RefreshTokenBinding, RefreshTokenGrant};

/// Produces the secret payload for a new record, given its identifier.
pub type PayloadGenerator = Arc<dyn Fn(u64) -> Vec<u8> + Send + Sync>;

#[derive(Debug, Clone)]
struct LedgerRecord {
    payload_digest: [u8; 32],
    binding: RefreshTokenBinding,
}

/// Refresh token records keyed by a monotonically assigned identifier.
///
/// Only the SHA-256 digest of each payload is kept.
pub struct MemoryRefreshTokenStorage {
    next_id: AtomicU64,
    records: DashMap<u64, LedgerRecord>,
    generate_payload: PayloadGenerator,
}

impl MemoryRefreshTokenStorage {
    /// Creates an empty ledger generating 32-byte random payloads.
    /// The first record gets identifier 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            records: DashMap::new(),
            generate_payload: Arc::new(|_| {
                let mut bytes = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                bytes
            }),
        }
    }

    /// Replaces the payload generator.
    #[must_use]
    pub fn with_payload_generator(mut self, generate_payload: PayloadGenerator) -> Self {
        self.generate_payload = generate_payload;
        self
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the ledger holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryRefreshTokenStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn digest(payload: &[u8]) -> [u8; 32] {
    Sha256::digest(payload).into()
}

#[async_trait]
impl RefreshTokenStorage for MemoryRefreshTokenStorage {
    async fn create(&self, user_id: &str, client_id: &str) -> AuthResult<RefreshTokenGrant> {
        let record_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let payload = (self.generate_payload)(record_id);

        self.records.insert(
            record_id,
            LedgerRecord {
                payload_digest: digest(&payload),
                binding: RefreshTokenBinding {
                    user_id: user_id.to_string(),
                    client_id: client_id.to_string(),
                },
            },
        );

        Ok(RefreshTokenGrant { record_id, payload })
    }

    async fn verify(
        &self,
        record_id: u64,
        payload: &[u8],
    ) -> AuthResult<Option<RefreshTokenBinding>> {
        let presented = digest(payload);
        Ok(self
            .records
            .get(&record_id)
            .filter(|record| record.payload_digest == presented)
            .map(|record| record.binding.clone()))
    }

    async fn revoke(&self, record_id: u64) -> AuthResult<bool> {
        let removed = self.records.remove(&record_id).is_some();
        if removed {
            tracing::debug!(record_id, "Refresh token record revoked");
        }
        Ok(removed)
    }
}
