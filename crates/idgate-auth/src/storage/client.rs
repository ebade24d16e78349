//! Client directory trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Client;

/// Read access to registered clients.
///
/// # Example
///
/// ```ignore
/// use idgate_auth::storage::ClientStorage;
///
/// async fn example(storage: &impl ClientStorage) {
///     let client = storage.find_by_client_id("XXX").await;
/// }
/// ```
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Finds a client by its client ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>>;

    /// Verifies a presented secret for the client.
    ///
    /// Returns `Ok(false)` for unknown clients and mismatched secrets alike.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails or the stored hash is
    /// unreadable.
    async fn verify_secret(&self, client_id: &str, secret: &str) -> AuthResult<bool>;
}
