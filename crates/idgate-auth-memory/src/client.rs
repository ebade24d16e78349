//! In-memory client directory.

use async_trait::async_trait;
use dashmap::DashMap;

use idgate_auth::AuthResult;
use idgate_auth::client_secret::{hash_client_secret, verify_client_secret};
use idgate_auth::error::AuthError;
use idgate_auth::storage::ClientStorage;
use idgate_auth::types::Client;

#[derive(Debug, Clone)]
struct ClientRecord {
    client: Client,
    secret_hash: String,
}

/// Registered clients with Argon2id-hashed secrets.
#[derive(Debug, Default)]
pub struct MemoryClientStorage {
    clients: DashMap<String, ClientRecord>,
}

impl MemoryClientStorage {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a client with its plaintext secret.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the client fails validation and `Storage`
    /// if the secret cannot be hashed.
    pub fn register(&self, client: Client, secret: &str) -> AuthResult<()> {
        client
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;
        if secret.is_empty() {
            return Err(AuthError::configuration("Client secret cannot be empty"));
        }

        let secret_hash =
            hash_client_secret(secret).map_err(|e| AuthError::storage(e.to_string()))?;

        tracing::debug!(client_id = %client.client_id, "Client registered");
        self.clients.insert(
            client.client_id.clone(),
            ClientRecord {
                client,
                secret_hash,
            },
        );
        Ok(())
    }

    /// Removes a client. Returns `false` if it was not registered.
    pub fn remove(&self, client_id: &str) -> bool {
        self.clients.remove(client_id).is_some()
    }
}

#[async_trait]
impl ClientStorage for MemoryClientStorage {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self.clients.get(client_id).map(|r| r.client.clone()))
    }

    async fn verify_secret(&self, client_id: &str, secret: &str) -> AuthResult<bool> {
        let Some(secret_hash) = self.clients.get(client_id).map(|r| r.secret_hash.clone()) else {
            return Ok(false);
        };
        verify_client_secret(secret, &secret_hash).map_err(|e| AuthError::storage(e.to_string()))
    }
}
