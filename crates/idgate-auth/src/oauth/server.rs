//! Authorization server.
//!
//! Composes the session manager, client directory, user directory, key
//! provider and refresh token ledger into the three protocol flows:
//!
//! - [`AuthorizationServer::login`]: a connector has authenticated the
//!   end-user; mint a code and build the client redirect
//! - [`AuthorizationServer::code_token`]: exchange a code for an ID token
//!   and, with offline access, a refresh token
//! - [`AuthorizationServer::refresh_token`]: exchange a refresh token for a
//!   new ID token
//!
//! # Usage
//!
//! ```ignore
//! use idgate_auth::oauth::{AuthorizationServer, SessionRequest};
//!
//! let key = server
//!     .new_session(SessionRequest::new("github", "XXX", "http://client.example.com/callback").state("bogus"))
//!     .await?;
//! let redirect = server.login(identity, &key).await?;
//! // client redeems ?code=... from `redirect`
//! let tokens = server.code_token(&credentials, &code).await?;
//! ```
//!
//! Failed calls are never retried and never roll back: a key or code
//! redeemed by a call that later fails stays consumed.

use std::sync::Arc;

use url::Url;

use crate::AuthResult;
use crate::config::{AuthConfig, TokenConfig};
use crate::error::AuthError;
use crate::oauth::client_auth::authenticate_client;
use crate::oauth::refresh_token::EncodedRefreshToken;
use crate::oauth::session::{SessionRequest, SessionState};
use crate::oauth::session_manager::SessionManager;
use crate::storage::{ClientStorage, RefreshTokenStorage, UserStorage};
use crate::token::{IdToken, IdTokenClaims, Jwks, KeyProvider};
use crate::types::{ClientCredentials, Identity, User};

/// Result of a successful code exchange.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    /// The signed ID token.
    pub id_token: IdToken,

    /// Encoded refresh token, present only when offline access was requested.
    pub refresh_token: Option<String>,
}

/// OpenID Connect authorization server.
pub struct AuthorizationServer {
    issuer: String,
    tokens: TokenConfig,
    sessions: SessionManager,
    clients: Arc<dyn ClientStorage>,
    users: Arc<dyn UserStorage>,
    keys: Arc<dyn KeyProvider>,
    refresh_tokens: Arc<dyn RefreshTokenStorage>,
}

impl AuthorizationServer {
    /// Creates a new authorization server.
    ///
    /// The session manager carries its own session configuration; only the
    /// issuer and token settings are taken from `config`.
    pub fn new(
        config: &AuthConfig,
        sessions: SessionManager,
        clients: Arc<dyn ClientStorage>,
        users: Arc<dyn UserStorage>,
        keys: Arc<dyn KeyProvider>,
        refresh_tokens: Arc<dyn RefreshTokenStorage>,
    ) -> Self {
        Self {
            issuer: config.issuer.clone(),
            tokens: config.tokens.clone(),
            sessions,
            clients,
            users,
            keys,
            refresh_tokens,
        }
    }

    /// Returns the session manager.
    #[must_use]
    pub fn session_manager(&self) -> &SessionManager {
        &self.sessions
    }

    /// Starts an authentication attempt for a registered client and returns
    /// the pre-login key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` if the client is unknown or inactive, or the
    /// redirect URL is not registered for it.
    pub async fn new_session(&self, request: SessionRequest) -> AuthResult<String> {
        let client = self
            .clients
            .find_by_client_id(&request.client_id)
            .await?
            .ok_or_else(|| AuthError::invalid_client("Unknown client"))?;

        if !client.active {
            return Err(AuthError::invalid_client("Client is inactive"));
        }

        if !client.is_redirect_uri_allowed(&request.redirect_url) {
            return Err(AuthError::invalid_client(
                "Redirect URL is not registered for this client",
            ));
        }

        self.sessions.new_session(request).await
    }

    /// Completes a login: binds the connector's identity to the session
    /// behind `session_key`, mints an authorization code and returns the
    /// client redirect URL carrying `code` and `state`.
    ///
    /// # Errors
    ///
    /// - `InvalidGrant` if the key is unknown, used or expired
    /// - `AccessDenied` if the identity is not linked to a user
    /// - `AccountDisabled` if the linked user is disabled
    pub async fn login(&self, identity: Identity, session_key: &str) -> AuthResult<Url> {
        let session_id = self
            .sessions
            .exchange_key(session_key)
            .await
            .map_err(AuthError::into_grant_error)?;
        let session = self
            .sessions
            .session(&session_id)
            .await
            .map_err(AuthError::into_grant_error)?;

        let user = self
            .users
            .find_by_remote_identity(&session.connector_id, &identity.id)
            .await?
            .ok_or_else(|| {
                AuthError::access_denied("Remote identity is not linked to any user")
            })?;

        if user.disabled {
            return Err(AuthError::account_disabled(&user.id));
        }

        self.sessions
            .attach_remote_identity(&session_id, identity)
            .await
            .map_err(AuthError::into_grant_error)?;
        self.sessions
            .attach_user(&session_id, &user.id)
            .await
            .map_err(AuthError::into_grant_error)?;
        let code = self
            .sessions
            .mint_code(&session_id)
            .await
            .map_err(AuthError::into_grant_error)?;

        let mut redirect = Url::parse(&session.redirect_url).map_err(|e| {
            AuthError::server_error(format!("Stored redirect URL is invalid: {e}"))
        })?;
        redirect
            .query_pairs_mut()
            .append_pair("code", &code)
            .append_pair("state", &session.client_state);

        tracing::info!(
            session_id = %session_id,
            client_id = %session.client_id,
            user_id = %user.id,
            "Login completed, authorization code issued"
        );

        Ok(redirect)
    }

    /// Exchanges an authorization code for an ID token.
    ///
    /// A refresh token is issued only when the session requested the
    /// offline access scope, and only after signing succeeded.
    ///
    /// # Errors
    ///
    /// - `InvalidClient` if authentication fails or the code was issued to
    ///   another client
    /// - `InvalidGrant` if the code is unknown, used, expired or not a code
    /// - `ServerError` if the user vanished or signing failed
    pub async fn code_token(
        &self,
        credentials: &ClientCredentials,
        code: &str,
    ) -> AuthResult<TokenResponse> {
        let client = authenticate_client(credentials, self.clients.as_ref()).await?;

        let session_id = self
            .sessions
            .exchange_key(code)
            .await
            .map_err(AuthError::into_grant_error)?;
        let session = self
            .sessions
            .session(&session_id)
            .await
            .map_err(AuthError::into_grant_error)?;

        if session.state != SessionState::CodeMinted || session.is_consumed() {
            return Err(AuthError::invalid_grant(
                "Key does not refer to an issued authorization code",
            ));
        }

        if session.client_id != client.client_id {
            return Err(AuthError::invalid_client(
                "Authorization code was issued to another client",
            ));
        }

        self.sessions
            .consume(&session_id)
            .await
            .map_err(AuthError::into_grant_error)?;

        let user_id = session
            .user_id
            .as_deref()
            .ok_or_else(|| AuthError::invalid_grant("Session has no user"))?;
        let user = self.resolve_user(user_id).await?;

        let id_token = self
            .sign_id_token(&user, &client.client_id, session.nonce.clone())
            .await?;

        let refresh_token = if session.has_scope(&self.tokens.offline_access_scope) {
            let grant = self
                .refresh_tokens
                .create(&user.id, &client.client_id)
                .await?;
            tracing::debug!(
                record_id = grant.record_id,
                user_id = %user.id,
                client_id = %client.client_id,
                "Refresh token record created"
            );
            Some(EncodedRefreshToken::new(grant.record_id, grant.payload).encode())
        } else {
            None
        };

        tracing::info!(
            session_id = %session_id,
            client_id = %client.client_id,
            user_id = %user.id,
            offline = refresh_token.is_some(),
            "Authorization code exchanged"
        );

        Ok(TokenResponse {
            id_token,
            refresh_token,
        })
    }

    /// Exchanges a refresh token for a new ID token.
    ///
    /// The refresh token is not rotated and stays valid.
    ///
    /// # Errors
    ///
    /// - `InvalidClient` if authentication fails or the token belongs to
    ///   another client
    /// - `InvalidRequest` if the token is malformed, unknown or its payload
    ///   does not match
    /// - `InvalidGrant` if the bound user is disabled
    /// - `ServerError` if the bound user vanished or signing failed
    pub async fn refresh_token(
        &self,
        credentials: &ClientCredentials,
        token: &str,
    ) -> AuthResult<IdToken> {
        let client = authenticate_client(credentials, self.clients.as_ref()).await?;

        let parsed = EncodedRefreshToken::parse(token)
            .map_err(|e| AuthError::invalid_request(e.to_string()))?;

        let binding = self
            .refresh_tokens
            .verify(parsed.record_id, &parsed.payload)
            .await?
            .ok_or_else(|| AuthError::invalid_request("Refresh token is invalid"))?;

        if binding.client_id != client.client_id {
            return Err(AuthError::invalid_client(
                "Refresh token was issued to another client",
            ));
        }

        let user = self.resolve_user(&binding.user_id).await?;
        if user.disabled {
            return Err(AuthError::invalid_grant("User account is disabled"));
        }

        let id_token = self.sign_id_token(&user, &client.client_id, None).await?;

        tracing::info!(
            record_id = parsed.record_id,
            client_id = %client.client_id,
            user_id = %user.id,
            "Refresh token exchanged"
        );

        Ok(id_token)
    }

    /// Returns the keys relying parties use to verify ID tokens.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the key provider fails.
    pub async fn public_keys(&self) -> AuthResult<Jwks> {
        Ok(self.keys.public_keys().await?)
    }

    async fn resolve_user(&self, user_id: &str) -> AuthResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::server_error(format!("User {user_id} no longer exists")))
    }

    async fn sign_id_token(
        &self,
        user: &User,
        client_id: &str,
        nonce: Option<String>,
    ) -> AuthResult<IdToken> {
        let claims = IdTokenClaims::builder(&self.issuer, &user.id, client_id)
            .issued_at(self.sessions.now())
            .lifetime(self.tokens.id_token_lifetime)
            .nonce(nonce)
            .email(&user.email, user.email_verified)
            .name(user.display_name.clone())
            .build();

        let signer = self.keys.signer().await?;
        Ok(IdToken::sign(claims, signer.as_ref())?)
    }
}
