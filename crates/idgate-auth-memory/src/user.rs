//! In-memory user directory.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use idgate_auth::AuthResult;
use idgate_auth::error::AuthError;
use idgate_auth::storage::UserStorage;
use idgate_auth::types::{RemoteIdentity, User};

/// Users and their links to connector accounts.
#[derive(Debug, Default)]
pub struct MemoryUserStorage {
    users: DashMap<String, User>,
    links: DashMap<RemoteIdentity, String>,
}

impl MemoryUserStorage {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if a user with the same ID exists.
    pub fn create(&self, user: User) -> AuthResult<()> {
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(AuthError::storage(format!(
                "User {} already exists",
                user.id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(user);
                Ok(())
            }
        }
    }

    /// Links a connector account to an existing user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub fn link_remote_identity(&self, user_id: &str, remote: RemoteIdentity) -> AuthResult<()> {
        if !self.users.contains_key(user_id) {
            return Err(AuthError::not_found("User"));
        }
        self.links.insert(remote, user_id.to_string());
        Ok(())
    }

    /// Enables or disables a user. Returns `false` if the user does not exist.
    pub fn set_disabled(&self, user_id: &str, disabled: bool) -> bool {
        match self.users.get_mut(user_id) {
            Some(mut user) => {
                user.disabled = disabled;
                true
            }
            None => false,
        }
    }

    /// Deletes a user. Links are left in place and resolve to nothing.
    pub fn delete(&self, user_id: &str) -> bool {
        self.users.remove(user_id).is_some()
    }
}

#[async_trait]
impl UserStorage for MemoryUserStorage {
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<User>> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn find_by_remote_identity(
        &self,
        connector_id: &str,
        remote_id: &str,
    ) -> AuthResult<Option<User>> {
        let key = RemoteIdentity::new(connector_id, remote_id);
        let Some(user_id) = self.links.get(&key).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        self.find_by_id(&user_id).await
    }
}
