//! Relying party (client) types.

use serde::{Deserialize, Serialize};

/// A registered relying party.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    /// Unique client identifier used in OAuth flows.
    pub client_id: String,

    /// Human-readable display name.
    pub name: String,

    /// Exact redirect URIs this client may use.
    pub redirect_uris: Vec<String>,

    /// Inactive clients fail authentication.
    pub active: bool,
}

impl Client {
    /// Creates an active client with the given redirect URIs.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        name: impl Into<String>,
        redirect_uris: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            name: name.into(),
            redirect_uris,
            active: true,
        }
    }

    /// Validates the client registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client configuration is invalid.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.client_id.is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if self.client_id.contains(':') {
            return Err(ClientValidationError::InvalidClientId(self.client_id.clone()));
        }

        if self.redirect_uris.is_empty() {
            return Err(ClientValidationError::NoRedirectUris);
        }

        for uri in &self.redirect_uris {
            let parsed = url::Url::parse(uri)
                .map_err(|_| ClientValidationError::InvalidRedirectUri(uri.clone()))?;
            if parsed.fragment().is_some() {
                return Err(ClientValidationError::InvalidRedirectUri(uri.clone()));
            }
        }

        Ok(())
    }

    /// Checks if the given redirect URI is registered for this client.
    ///
    /// Comparison is exact string equality.
    #[must_use]
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }
}

/// Client registration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientValidationError {
    /// Client ID is empty.
    #[error("Client ID cannot be empty")]
    EmptyClientId,

    /// Client ID contains a reserved character.
    #[error("Invalid client ID: {0}")]
    InvalidClientId(String),

    /// No redirect URIs are registered.
    #[error("At least one redirect URI is required")]
    NoRedirectUris,

    /// A redirect URI is not an absolute URL or carries a fragment.
    #[error("Invalid redirect URI: {0}")]
    InvalidRedirectUri(String),
}

/// Credentials presented by a client at the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// Client identifier.
    pub id: String,

    /// Client secret (plaintext, as presented).
    pub secret: String,
}

impl ClientCredentials {
    /// Creates credentials from an id and secret.
    #[must_use]
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("id", &self.id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
