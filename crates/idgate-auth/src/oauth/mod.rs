//! OpenID Connect authorization flows.
//!
//! This module provides:
//!
//! - The session state machine and its single-use keys
//! - Client authentication
//! - The refresh token wire format
//! - The authorization server (login, code exchange, refresh)

pub mod client_auth;
pub mod refresh_token;
pub mod server;
pub mod session;
pub mod session_manager;

pub use client_auth::authenticate_client;
pub use refresh_token::{EncodedRefreshToken, RefreshTokenFormatError};
pub use server::{AuthorizationServer, TokenResponse};
pub use session::{Session, SessionKey, SessionRequest, SessionState, generate_code};
pub use session_manager::{Clock, CodeGenerator, SessionManager};
