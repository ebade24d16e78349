//! Client secret generation and verification.
//!
//! Client directories never store plaintext secrets. Secrets are hashed with
//! Argon2id into PHC strings and presented secrets are verified against them.
//!
//! # Example
//!
//! ```
//! use idgate_auth::client_secret::{generate_client_secret, hash_client_secret, verify_client_secret};
//!
//! let secret = generate_client_secret();
//! let hash = hash_client_secret(&secret).unwrap();
//! assert!(verify_client_secret(&secret, &hash).unwrap());
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;

/// Generates a new client secret: 32 random bytes, hex encoded.
///
/// ```
/// use idgate_auth::client_secret::generate_client_secret;
///
/// assert_eq!(generate_client_secret().len(), 64);
/// ```
#[must_use]
pub fn generate_client_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

/// Hashes a client secret with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails.
pub fn hash_client_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verifies a client secret against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only if `hash` is malformed.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if the stored hash cannot be parsed.
pub fn verify_client_secret(secret: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok())
}
