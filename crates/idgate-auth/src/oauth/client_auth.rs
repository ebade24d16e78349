//! Client authentication.
//!
//! Clients authenticate at the token endpoint with an id and secret. Every
//! failure (missing id, missing secret, unknown client, inactive client,
//! wrong secret) is reported as `invalid_client` with no further detail
//! leaked to the caller.

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::ClientStorage;
use crate::types::{Client, ClientCredentials};

/// Authenticates client credentials against the client directory.
///
/// # Errors
///
/// Returns `AuthError::InvalidClient` if:
/// - The id or secret is empty
/// - The client is not found or inactive
/// - The secret does not verify
pub async fn authenticate_client(
    credentials: &ClientCredentials,
    client_storage: &dyn ClientStorage,
) -> AuthResult<Client> {
    if credentials.id.is_empty() {
        return Err(AuthError::invalid_client("Missing client id"));
    }
    if credentials.secret.is_empty() {
        return Err(AuthError::invalid_client("Missing client secret"));
    }

    let client = client_storage
        .find_by_client_id(&credentials.id)
        .await?
        .ok_or_else(|| AuthError::invalid_client("Unknown client"))?;

    if !client.active {
        return Err(AuthError::invalid_client("Client is inactive"));
    }

    if !client_storage
        .verify_secret(&credentials.id, &credentials.secret)
        .await?
    {
        return Err(AuthError::invalid_client("Invalid client secret"));
    }

    Ok(client)
}
