//! Key provider capability.
//!
//! The authorization server asks a [`KeyProvider`] for the current signer on
//! every token issuance and for the public key set when publishing keys.
//! Rotation, HSM integration and persistence live behind this trait.

use std::sync::Arc;

use async_trait::async_trait;

use super::jwt::{Jwks, JwtError, Signer, SigningKeyPair};

/// Source of the current signer and the active public keys.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Returns the signer to use for the next token.
    ///
    /// # Errors
    /// Returns an error if no signing key is currently available.
    async fn signer(&self) -> Result<Arc<dyn Signer>, JwtError>;

    /// Returns every public key a relying party may need to verify tokens
    /// issued by this provider.
    ///
    /// # Errors
    /// Returns an error if the key set cannot be produced.
    async fn public_keys(&self) -> Result<Jwks, JwtError>;
}

/// A key provider serving one fixed signer and key set.
pub struct StaticKeyProvider {
    signer: Arc<dyn Signer>,
    jwks: Jwks,
}

impl StaticKeyProvider {
    /// Creates a provider from an arbitrary signer and the keys to publish.
    #[must_use]
    pub fn new(signer: Arc<dyn Signer>, jwks: Jwks) -> Self {
        Self { signer, jwks }
    }

    /// Creates a provider from an RSA key pair, publishing its public half.
    #[must_use]
    pub fn from_key_pair(key_pair: SigningKeyPair) -> Self {
        let mut jwks = Jwks::new();
        jwks.add_key(key_pair.to_jwk());
        Self {
            signer: Arc::new(key_pair),
            jwks,
        }
    }
}

#[async_trait]
impl KeyProvider for StaticKeyProvider {
    async fn signer(&self) -> Result<Arc<dyn Signer>, JwtError> {
        Ok(Arc::clone(&self.signer))
    }

    async fn public_keys(&self) -> Result<Jwks, JwtError> {
        Ok(self.jwks.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::jwt::SigningAlgorithm;
    use tokio_test::block_on;

    #[test]
    fn test_from_key_pair_publishes_signing_key() {
        let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap();
        let kid = key_pair.kid.clone();
        let provider = StaticKeyProvider::from_key_pair(key_pair);

        block_on(async {
            let signer = provider.signer().await.unwrap();
            assert_eq!(signer.key_id(), kid);

            let jwks = provider.public_keys().await.unwrap();
            assert_eq!(jwks.keys.len(), 1);
            assert!(jwks.find(&kid).is_some());
        });
    }

    #[test]
    fn test_static_provider_serves_given_keys() {
        let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS384).unwrap();
        let mut jwks = Jwks::new();
        jwks.add_key(key_pair.to_jwk());
        let provider = StaticKeyProvider::new(Arc::new(key_pair), jwks.clone());

        block_on(async {
            let signer = provider.signer().await.unwrap();
            assert_eq!(signer.algorithm(), SigningAlgorithm::RS384);
            assert_eq!(provider.public_keys().await.unwrap(), jwks);
        });
    }
}
