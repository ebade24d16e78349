//! Storage traits for every collaborator of the authorization core.
//!
//! This module defines storage interfaces for:
//!
//! - Authentication sessions and single-use keys
//! - Registered clients
//! - Users and their federated identity links
//! - Refresh token records
//!
//! # Implementations
//!
//! - `idgate-auth-memory` - in-process backend

pub mod client;
pub mod refresh_token;
pub mod session;
pub mod user;

pub use client::ClientStorage;
pub use refresh_token::RefreshTokenStorage;
pub use session::{SessionKeyStorage, SessionStorage};
pub use user::UserStorage;
