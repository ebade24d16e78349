//! User directory trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::User;

/// Read access to user accounts and their federated identity links.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user by internal ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<User>>;

    /// Resolves the user linked to an account at a connector.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_remote_identity(
        &self,
        connector_id: &str,
        remote_id: &str,
    ) -> AuthResult<Option<User>>;
}
