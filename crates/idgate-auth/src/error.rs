//! Authorization error types.
//!
//! Every failure surfaced by the login, code exchange and refresh flows is an
//! [`AuthError`]. Each variant maps to a stable OAuth 2.0 error code through
//! [`AuthError::oauth_error_code`], so callers can render protocol responses
//! without inspecting messages.

use std::fmt;

use crate::token::JwtError;

/// Errors that can occur during authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request is structurally malformed (e.g. an unparseable refresh token).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The session key or authorization code is unknown, expired or already used.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// Client authentication failed or the client is not bound to the grant.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
    },

    /// The server could not complete the request (signing failure,
    /// dangling user reference).
    #[error("Server error: {message}")]
    ServerError {
        /// Description of the failure.
        message: String,
    },

    /// The remote identity presented at login is not linked to any user.
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Description of why access was denied.
        message: String,
    },

    /// The resolved user account is disabled.
    #[error("Account disabled: {user_id}")]
    AccountDisabled {
        /// The disabled user's identifier.
        user_id: String,
    },

    /// A session or single-use key does not exist, has expired, or was
    /// already redeemed.
    #[error("{resource} not found")]
    NotFound {
        /// The kind of resource that was looked up.
        resource: String,
    },

    /// A session transition was attempted out of order.
    #[error("Invalid session state: {message}")]
    InvalidSessionState {
        /// Description of the rejected transition.
        message: String,
    },

    /// An error occurred while storing or retrieving data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `ServerError` error.
    #[must_use]
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::ServerError {
            message: message.into(),
        }
    }

    /// Creates a new `AccessDenied` error.
    #[must_use]
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Creates a new `AccountDisabled` error.
    #[must_use]
    pub fn account_disabled(user_id: impl Into<String>) -> Self {
        Self::AccountDisabled {
            user_id: user_id.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a new `InvalidSessionState` error.
    #[must_use]
    pub fn invalid_session_state(message: impl Into<String>) -> Self {
        Self::InvalidSessionState {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Re-classifies session-level failures as `InvalidGrant`.
    ///
    /// The session manager reports unknown keys as `NotFound`; at the protocol
    /// boundary those are grant errors. Other variants pass through unchanged.
    #[must_use]
    pub fn into_grant_error(self) -> Self {
        match self {
            Self::NotFound { resource } => {
                Self::invalid_grant(format!("{resource} is unknown, expired or already used"))
            }
            Self::InvalidSessionState { message } => Self::invalid_grant(message),
            other => other,
        }
    }

    /// Returns `true` if this is a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. }
                | Self::InvalidGrant { .. }
                | Self::InvalidClient { .. }
                | Self::AccessDenied { .. }
                | Self::AccountDisabled { .. }
                | Self::NotFound { .. }
                | Self::InvalidSessionState { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::ServerError { .. } | Self::Storage { .. } | Self::Configuration { .. }
        )
    }

    /// Returns `true` if this failure ends a login attempt without a code
    /// being minted, as opposed to a token-endpoint protocol error.
    #[must_use]
    pub fn is_login_failure(&self) -> bool {
        matches!(self, Self::AccessDenied { .. } | Self::AccountDisabled { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::InvalidGrant { .. } => ErrorCategory::Authentication,
            Self::InvalidClient { .. } => ErrorCategory::Authentication,
            Self::ServerError { .. } => ErrorCategory::Internal,
            Self::AccessDenied { .. } => ErrorCategory::Authorization,
            Self::AccountDisabled { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::Session,
            Self::InvalidSessionState { .. } => ErrorCategory::Session,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    ///
    /// `AccessDenied` and `AccountDisabled` are login failures rather than
    /// token endpoint errors; they report `access_denied`, which is what an
    /// authorization endpoint would redirect with.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::InvalidClient { .. } => "invalid_client",
            Self::ServerError { .. } => "server_error",
            Self::AccessDenied { .. } => "access_denied",
            Self::AccountDisabled { .. } => "access_denied",
            Self::NotFound { .. } => "invalid_grant",
            Self::InvalidSessionState { .. } => "invalid_grant",
            Self::Storage { .. } => "server_error",
            Self::Configuration { .. } => "server_error",
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        Self::server_error(err.to_string())
    }
}

/// Categories of authorization errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Client or grant authentication failures.
    Authentication,
    /// Login refused for the resolved user.
    Authorization,
    /// Malformed input.
    Validation,
    /// Session and single-use key lifecycle failures.
    Session,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Validation => write!(f, "validation"),
            Self::Session => write!(f, "session"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
