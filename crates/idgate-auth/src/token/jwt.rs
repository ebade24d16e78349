//! ID token signing and verification.
//!
//! ID tokens are produced as JWS compact serializations. The signing step is
//! abstracted behind [`Signer`] so the orchestrator never touches key
//! material; [`SigningKeyPair`] is the RSA implementation used in production.
//!
//! ## Supported Algorithms
//!
//! - **RS256**: RSA PKCS#1 v1.5 with SHA-256
//! - **RS384**: RSA PKCS#1 v1.5 with SHA-384
//!
//! ## Example
//!
//! ```ignore
//! use idgate_auth::token::{IdToken, IdTokenClaims, SigningAlgorithm, SigningKeyPair};
//!
//! let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256)?;
//! let claims = IdTokenClaims::builder("https://id.example.com", "user-1", "client-1").build();
//! let token = IdToken::sign(claims, &key_pair)?;
//!
//! let mut jwks = Jwks::new();
//! jwks.add_key(key_pair.to_jwk());
//! let verified = verify_id_token(token.as_str(), &jwks, "https://id.example.com", "client-1")?;
//! ```

use std::fmt;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer as _};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384};
use time::OffsetDateTime;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to serialize a header or claim set.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to parse or verify a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The signer could not produce a signature.
    #[error("Signing failed: {message}")]
    SigningError {
        /// Description of the signing failure.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },

    /// The specified key was not found.
    #[error("Key not found: {kid}")]
    KeyNotFound {
        /// The key ID that was not found.
        kid: String,
    },

    /// Failed to generate a cryptographic key.
    #[error("Key generation error: {message}")]
    KeyGenerationError {
        /// Description of the key generation error.
        message: String,
    },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `SigningError`.
    #[must_use]
    pub fn signing_error(message: impl Into<String>) -> Self {
        Self::SigningError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Creates a new `KeyNotFound` error.
    #[must_use]
    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyNotFound { kid: kid.into() }
    }

    /// Creates a new `KeyGenerationError`.
    #[must_use]
    pub fn key_generation_error(message: impl Into<String>) -> Self {
        Self::KeyGenerationError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::invalid_key(err.to_string())
            }
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms for ID tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// RSA with SHA-256.
    RS256,
    /// RSA with SHA-384.
    RS384,
}

impl SigningAlgorithm {
    /// Parses an algorithm name as it appears in configuration and JWS headers.
    ///
    /// # Errors
    /// Returns `JwtError::InvalidKey` for unsupported names.
    pub fn from_name(name: &str) -> Result<Self, JwtError> {
        match name {
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            other => Err(JwtError::invalid_key(format!(
                "Unsupported signing algorithm: {other}"
            ))),
        }
    }

    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
        }
    }

    /// Returns the algorithm name as used in JWK/JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Token Claims
// ============================================================================

/// ID token claims for OpenID Connect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdTokenClaims {
    /// Issuer (provider external URL).
    pub iss: String,

    /// Subject (internal user ID).
    pub sub: String,

    /// Audience (client ID).
    pub aud: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Nonce from the authorization request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// User's email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Whether the email address has been verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    /// User's display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl IdTokenClaims {
    /// Creates a builder for ID token claims.
    #[must_use]
    pub fn builder(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<String>,
    ) -> IdTokenClaimsBuilder {
        IdTokenClaimsBuilder::new(issuer, subject, audience)
    }
}

/// Builder for ID token claims.
#[derive(Debug)]
pub struct IdTokenClaimsBuilder {
    iss: String,
    sub: String,
    aud: String,
    issued_at: OffsetDateTime,
    lifetime: Duration,
    nonce: Option<String>,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

impl IdTokenClaimsBuilder {
    fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            aud: audience.into(),
            issued_at: OffsetDateTime::now_utc(),
            lifetime: Duration::from_secs(3600),
            nonce: None,
            email: None,
            email_verified: None,
            name: None,
        }
    }

    /// Overrides the issue time (defaults to now).
    #[must_use]
    pub fn issued_at(mut self, issued_at: OffsetDateTime) -> Self {
        self.issued_at = issued_at;
        self
    }

    /// Sets the validity window (default: 1 hour).
    #[must_use]
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Sets the nonce.
    #[must_use]
    pub fn nonce(mut self, nonce: Option<String>) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets the email claims.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>, verified: bool) -> Self {
        self.email = Some(email.into());
        self.email_verified = Some(verified);
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Builds the claims.
    #[must_use]
    pub fn build(self) -> IdTokenClaims {
        let iat = self.issued_at.unix_timestamp();
        let lifetime = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX);

        IdTokenClaims {
            iss: self.iss,
            sub: self.sub,
            aud: self.aud,
            exp: iat.saturating_add(lifetime),
            iat,
            nonce: self.nonce,
            email: self.email,
            email_verified: self.email_verified,
            name: self.name,
        }
    }
}

// ============================================================================
// Signer
// ============================================================================

/// A signing capability.
///
/// Implementations sign the JWS signing input (`header.claims`, both
/// base64url-encoded) and return the raw signature bytes.
pub trait Signer: Send + Sync {
    /// Key ID published in the JWS header.
    fn key_id(&self) -> &str;

    /// Algorithm published in the JWS header.
    fn algorithm(&self) -> SigningAlgorithm;

    /// Signs the given input.
    ///
    /// # Errors
    /// Returns `JwtError::SigningError` if no signature can be produced.
    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, JwtError>;
}

/// JWS protected header of an ID token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwsHeader {
    /// Signing algorithm.
    pub alg: String,

    /// Key ID.
    pub kid: String,

    /// Token type.
    pub typ: String,
}

/// A signed ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct IdToken {
    header: JwsHeader,
    claims: IdTokenClaims,
    signature: Vec<u8>,
    encoded: String,
}

impl IdToken {
    /// Signs `claims` with `signer`, producing the compact serialization.
    ///
    /// # Errors
    /// Returns an error if serialization fails or the signer fails.
    pub fn sign(claims: IdTokenClaims, signer: &dyn Signer) -> Result<Self, JwtError> {
        let header = JwsHeader {
            alg: signer.algorithm().as_str().to_string(),
            kid: signer.key_id().to_string(),
            typ: "JWT".to_string(),
        };

        let header_json =
            serde_json::to_vec(&header).map_err(|e| JwtError::encoding_error(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(&claims).map_err(|e| JwtError::encoding_error(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = signer.sign(signing_input.as_bytes())?;
        let encoded = format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(&signature));

        Ok(Self {
            header,
            claims,
            signature,
            encoded,
        })
    }

    /// Returns the JWS compact serialization.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// Returns the protected header.
    #[must_use]
    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    /// Returns the signed claims.
    #[must_use]
    pub fn claims(&self) -> &IdTokenClaims {
        &self.claims
    }

    /// Returns the raw signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

impl fmt::Display for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

// ============================================================================
// JWKS Types
// ============================================================================

/// JSON Web Key Set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwks {
    /// The keys in this set.
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Creates a new empty JWKS.
    #[must_use]
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Adds a key to the set.
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// Finds a key by ID.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

impl Default for Jwks {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON Web Key (RSA public key).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwk {
    /// Key type (always "RSA").
    pub kty: String,

    /// Key ID.
    pub kid: String,

    /// Key use ("sig" for signing).
    #[serde(rename = "use")]
    pub use_: String,

    /// Algorithm.
    pub alg: String,

    /// RSA modulus (base64url encoded).
    pub n: String,

    /// RSA exponent (base64url encoded).
    pub e: String,
}

// ============================================================================
// Signing Key Pair
// ============================================================================

/// An RSA signing key pair.
pub struct SigningKeyPair {
    /// Key ID.
    pub kid: String,

    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    private_key: RsaPrivateKey,

    /// When the key was created or loaded.
    pub created_at: OffsetDateTime,
}

impl SigningKeyPair {
    /// Generates a new 2048-bit RSA key pair with a random key ID.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate_rsa(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Ok(Self {
            kid: uuid::Uuid::new_v4().to_string(),
            algorithm,
            private_key,
            created_at: OffsetDateTime::now_utc(),
        })
    }

    /// Loads a key pair from a PEM-encoded private key (PKCS#8 or PKCS#1).
    ///
    /// # Errors
    /// Returns an error if the PEM data is invalid.
    pub fn from_pem(
        kid: impl Into<String>,
        algorithm: SigningAlgorithm,
        private_pem: &str,
    ) -> Result<Self, JwtError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_pem))
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        Ok(Self {
            kid: kid.into(),
            algorithm,
            private_key,
            created_at: OffsetDateTime::now_utc(),
        })
    }

    /// Exports the public key as a JWK.
    #[must_use]
    pub fn to_jwk(&self) -> Jwk {
        let public_key = self.private_key.to_public_key();

        Jwk {
            kty: "RSA".to_string(),
            kid: self.kid.clone(),
            use_: "sig".to_string(),
            alg: self.algorithm.as_str().to_string(),
            n: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }
    }
}

impl Signer for SigningKeyPair {
    fn key_id(&self) -> &str {
        &self.kid
    }

    fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, JwtError> {
        let signature = match self.algorithm {
            SigningAlgorithm::RS256 => {
                pkcs1v15::SigningKey::<Sha256>::new(self.private_key.clone())
                    .try_sign(signing_input)
                    .map_err(|e| JwtError::signing_error(e.to_string()))?
                    .to_vec()
            }
            SigningAlgorithm::RS384 => {
                pkcs1v15::SigningKey::<Sha384>::new(self.private_key.clone())
                    .try_sign(signing_input)
                    .map_err(|e| JwtError::signing_error(e.to_string()))?
                    .to_vec()
            }
        };
        Ok(signature)
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Verification
// ============================================================================

/// Verifies an ID token against a key set, checking signature, issuer,
/// audience and expiry.
///
/// # Errors
/// Returns `JwtError::KeyNotFound` if the token's `kid` is not in `jwks`,
/// or a validation error if any check fails.
pub fn verify_id_token(
    token: &str,
    jwks: &Jwks,
    issuer: &str,
    audience: &str,
) -> Result<IdTokenClaims, JwtError> {
    let header = decode_header(token)?;
    let kid = header
        .kid
        .ok_or_else(|| JwtError::decoding_error("Token header has no kid"))?;
    let jwk = jwks.find(&kid).ok_or_else(|| JwtError::key_not_found(&kid))?;
    let algorithm = SigningAlgorithm::from_name(&jwk.alg)?;

    let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?;

    let mut validation = Validation::new(algorithm.to_jwt_algorithm());
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);

    let data = decode::<IdTokenClaims>(token, &decoding_key, &validation)?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSigner;

    impl Signer for FixedSigner {
        fn key_id(&self) -> &str {
            "fixed"
        }

        fn algorithm(&self) -> SigningAlgorithm {
            SigningAlgorithm::RS256
        }

        fn sign(&self, _signing_input: &[u8]) -> Result<Vec<u8>, JwtError> {
            Ok(b"beer".to_vec())
        }
    }

    struct FailingSigner;

    impl Signer for FailingSigner {
        fn key_id(&self) -> &str {
            "broken"
        }

        fn algorithm(&self) -> SigningAlgorithm {
            SigningAlgorithm::RS256
        }

        fn sign(&self, _signing_input: &[u8]) -> Result<Vec<u8>, JwtError> {
            Err(JwtError::signing_error("fail"))
        }
    }

    fn test_claims() -> IdTokenClaims {
        IdTokenClaims::builder("https://id.example.com", "user-1", "client-1")
            .nonce(Some("n-0S6_WzA2Mj".to_string()))
            .email("user@example.com", true)
            .build()
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(SigningAlgorithm::RS256.as_str(), "RS256");
        assert_eq!(SigningAlgorithm::RS384.to_string(), "RS384");
        assert_eq!(
            SigningAlgorithm::from_name("RS384").unwrap(),
            SigningAlgorithm::RS384
        );
        assert!(SigningAlgorithm::from_name("ES384").is_err());
    }

    #[test]
    fn test_claims_builder_window() {
        let issued_at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let claims = IdTokenClaims::builder("iss", "sub", "aud")
            .issued_at(issued_at)
            .lifetime(Duration::from_secs(600))
            .build();

        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_000_600);
        assert!(claims.nonce.is_none());
    }

    #[test]
    fn test_claims_omit_absent_optionals() {
        let claims = IdTokenClaims::builder("iss", "sub", "aud").build();
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("nonce").is_none());
        assert!(json.get("email").is_none());
        assert_eq!(json["aud"], "aud");
    }

    #[test]
    fn test_sign_with_fixed_signer() {
        let token = IdToken::sign(test_claims(), &FixedSigner).unwrap();

        assert_eq!(token.signature(), b"beer");
        assert_eq!(token.header().kid, "fixed");
        assert_eq!(token.header().alg, "RS256");
        assert_eq!(token.claims().sub, "user-1");

        let parts: Vec<&str> = token.as_str().split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2], URL_SAFE_NO_PAD.encode(b"beer"));

        let claims_json = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        let decoded: IdTokenClaims = serde_json::from_slice(&claims_json).unwrap();
        assert_eq!(&decoded, token.claims());
    }

    #[test]
    fn test_sign_propagates_signer_failure() {
        let result = IdToken::sign(test_claims(), &FailingSigner);
        assert!(matches!(result, Err(JwtError::SigningError { .. })));
    }

    #[test]
    fn test_rsa_token_verifies_against_jwk() {
        let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap();
        let token = IdToken::sign(test_claims(), &key_pair).unwrap();

        let mut jwks = Jwks::new();
        jwks.add_key(key_pair.to_jwk());

        let claims =
            verify_id_token(token.as_str(), &jwks, "https://id.example.com", "client-1").unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn test_rs384_token_verifies() {
        let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS384).unwrap();
        let token = IdToken::sign(test_claims(), &key_pair).unwrap();
        assert_eq!(token.header().alg, "RS384");

        let jwks = Jwks {
            keys: vec![key_pair.to_jwk()],
        };
        assert!(verify_id_token(token.as_str(), &jwks, "https://id.example.com", "client-1").is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_audience() {
        let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap();
        let token = IdToken::sign(test_claims(), &key_pair).unwrap();
        let jwks = Jwks {
            keys: vec![key_pair.to_jwk()],
        };

        let result = verify_id_token(token.as_str(), &jwks, "https://id.example.com", "other");
        assert!(matches!(result, Err(JwtError::InvalidClaims { .. })));
    }

    #[test]
    fn test_verify_rejects_unknown_kid() {
        let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap();
        let token = IdToken::sign(test_claims(), &key_pair).unwrap();

        let result = verify_id_token(token.as_str(), &Jwks::new(), "https://id.example.com", "client-1");
        assert!(matches!(result, Err(JwtError::KeyNotFound { .. })));
    }

    #[test]
    fn test_verify_rejects_tampered_signature() {
        let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap();
        let other = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap();
        let token = IdToken::sign(test_claims(), &key_pair).unwrap();

        // Same kid, different modulus.
        let mut jwk = other.to_jwk();
        jwk.kid = key_pair.kid.clone();
        let jwks = Jwks { keys: vec![jwk] };

        let result = verify_id_token(token.as_str(), &jwks, "https://id.example.com", "client-1");
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_jwk_serialization() {
        let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap();
        let json = serde_json::to_value(key_pair.to_jwk()).unwrap();

        assert_eq!(json["kty"], "RSA");
        assert_eq!(json["use"], "sig");
        assert_eq!(json["alg"], "RS256");
        assert_eq!(json["e"], "AQAB");
    }

    #[test]
    fn test_from_pem_rejects_garbage() {
        let result = SigningKeyPair::from_pem("k1", SigningAlgorithm::RS256, "not a pem");
        assert!(matches!(result, Err(JwtError::InvalidKey { .. })));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap();
        let debug = format!("{key_pair:?}");
        assert!(debug.contains(&key_pair.kid));
        assert!(!debug.contains("private_key"));
    }
}
