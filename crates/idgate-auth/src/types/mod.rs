//! Domain types shared by the flows and storage traits.

pub mod client;
pub mod refresh_token;
pub mod user;

pub use client::{Client, ClientCredentials, ClientValidationError};
pub use refresh_token::{RefreshTokenBinding, RefreshTokenGrant};
pub use user::{Identity, RemoteIdentity, User};
