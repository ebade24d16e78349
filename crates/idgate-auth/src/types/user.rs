//! End-user and federated identity types.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// An internal user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Internal user ID, used as the `sub` claim.
    pub id: String,

    /// Email address.
    pub email: String,

    /// Whether the email address has been verified.
    pub email_verified: bool,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Disabled accounts cannot log in or refresh tokens.
    pub disabled: bool,

    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// Creates an enabled user.
    #[must_use]
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            email_verified: false,
            display_name: None,
            disabled: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Link between a user and an account at an upstream connector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RemoteIdentity {
    /// The connector that authenticated the account.
    pub connector_id: String,

    /// The account ID at that connector.
    pub id: String,
}

impl RemoteIdentity {
    /// Creates a remote identity link.
    #[must_use]
    pub fn new(connector_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            connector_id: connector_id.into(),
            id: id.into(),
        }
    }
}

/// The identity a connector asserts after authenticating the end-user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Account ID at the connector.
    pub id: String,

    /// Name asserted by the connector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Email asserted by the connector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Upstream session expiry, if the connector reports one.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

impl Identity {
    /// Creates an identity carrying only the connector account ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            expires_at: None,
        }
    }
}
