//! ID token signing and key publication.
//!
//! This module provides:
//!
//! - ID token claims and the signed token value
//! - The `Signer` capability and its RSA implementation
//! - The `KeyProvider` capability and a static implementation
//! - JWKS types and token verification

pub mod jwt;
pub mod key_provider;

pub use jwt::{
    IdToken, IdTokenClaims, IdTokenClaimsBuilder, Jwk, Jwks, JwsHeader, JwtError, Signer,
    SigningAlgorithm, SigningKeyPair, verify_id_token,
};
pub use key_provider::{KeyProvider, StaticKeyProvider};
