//! # idgate-auth
//!
//! Authorization core of the idgate OpenID Connect provider.
//!
//! This crate provides:
//! - The session state machine that carries a login from redirect to code
//! - Authorization code and refresh token exchange for signed ID tokens
//! - The refresh token wire format
//! - Storage traits for sessions, clients, users and the refresh ledger
//! - ID token signing and key publication
//!
//! ## Modules
//!
//! - [`config`] - Server configuration and loading
//! - [`oauth`] - Session manager and authorization server flows
//! - [`token`] - ID tokens, signers and key providers
//! - [`storage`] - Storage traits for every collaborator
//! - [`types`] - Clients, users and refresh token records
//! - [`client_secret`] - Argon2 client secret hashing

pub mod client_secret;
pub mod config;
pub mod error;
pub mod oauth;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{AuthConfig, ConfigError, load_config};
pub use error::{AuthError, ErrorCategory};
pub use oauth::{
    AuthorizationServer, EncodedRefreshToken, SessionManager, SessionRequest, TokenResponse,
};
pub use storage::{
    ClientStorage, RefreshTokenStorage, SessionKeyStorage, SessionStorage, UserStorage,
};
pub use token::{IdToken, Jwks, KeyProvider, Signer, SigningAlgorithm, SigningKeyPair};
pub use types::{Client, ClientCredentials, Identity, RemoteIdentity, User};

/// Type alias for authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use idgate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::oauth::{
        AuthorizationServer, EncodedRefreshToken, Session, SessionKey, SessionManager,
        SessionRequest, SessionState, TokenResponse,
    };
    pub use crate::storage::{
        ClientStorage, RefreshTokenStorage, SessionKeyStorage, SessionStorage, UserStorage,
    };
    pub use crate::token::{
        IdToken, IdTokenClaims, Jwks, KeyProvider, Signer, SigningAlgorithm, SigningKeyPair,
        StaticKeyProvider,
    };
    pub use crate::types::{
        Client, ClientCredentials, Identity, RefreshTokenBinding, RefreshTokenGrant,
        RemoteIdentity, User,
    };
}
