//! Refresh token wire format.
//!
//! A refresh token handed to a client is `"<record-id>/<payload>"` where
//! `record-id` is the ledger's decimal identifier and `payload` is the
//! record's secret, URL-safe base64 encoded with padding. Parsing accepts
//! the payload with or without padding.

use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::engine::DecodePaddingMode;
use base64::Engine;

const PAYLOAD_DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Structural problems with a presented refresh token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshTokenFormatError {
    /// No `/` between the identifier and the payload.
    #[error("refresh token has no separator")]
    MissingSeparator,

    /// The identifier is not a canonical decimal `u64`.
    #[error("refresh token id is not a decimal number")]
    InvalidId,

    /// The payload is empty or not URL-safe base64.
    #[error("refresh token payload is not valid base64url")]
    InvalidPayload,
}

/// A decoded refresh token.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedRefreshToken {
    /// Ledger record identifier.
    pub record_id: u64,

    /// Secret payload.
    pub payload: Vec<u8>,
}

impl EncodedRefreshToken {
    /// Creates a token from its parts.
    #[must_use]
    pub fn new(record_id: u64, payload: Vec<u8>) -> Self {
        Self { record_id, payload }
    }

    /// Returns the wire form.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}/{}", self.record_id, URL_SAFE.encode(&self.payload))
    }

    /// Parses the wire form.
    ///
    /// # Errors
    ///
    /// Returns a `RefreshTokenFormatError` describing the first structural
    /// violation found.
    pub fn parse(token: &str) -> Result<Self, RefreshTokenFormatError> {
        let (id, payload) = token
            .split_once('/')
            .ok_or(RefreshTokenFormatError::MissingSeparator)?;

        if id.is_empty()
            || !id.bytes().all(|b| b.is_ascii_digit())
            || (id.len() > 1 && id.starts_with('0'))
        {
            return Err(RefreshTokenFormatError::InvalidId);
        }
        let record_id = id
            .parse::<u64>()
            .map_err(|_| RefreshTokenFormatError::InvalidId)?;

        if payload.is_empty() {
            return Err(RefreshTokenFormatError::InvalidPayload);
        }
        let payload = PAYLOAD_DECODER
            .decode(payload)
            .map_err(|_| RefreshTokenFormatError::InvalidPayload)?;

        Ok(Self { record_id, payload })
    }
}

impl fmt::Display for EncodedRefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for EncodedRefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedRefreshToken")
            .field("record_id", &self.record_id)
            .field("payload", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_matches_wire_format() {
        let token = EncodedRefreshToken::new(1, b"refresh-1".to_vec());
        assert_eq!(token.encode(), format!("1/{}", URL_SAFE.encode(b"refresh-1")));
        assert_eq!(token.encode(), "1/cmVmcmVzaC0x");
    }

    #[test]
    fn test_padded_payload_round_trip() {
        let token = EncodedRefreshToken::new(42, b"refresh-42".to_vec());
        let encoded = token.encode();
        assert!(encoded.ends_with("=="));
        assert_eq!(EncodedRefreshToken::parse(&encoded).unwrap(), token);
    }

    #[test]
    fn test_parse_accepts_unpadded_payload() {
        let parsed = EncodedRefreshToken::parse("42/cmVmcmVzaC00Mg").unwrap();
        assert_eq!(parsed.record_id, 42);
        assert_eq!(parsed.payload, b"refresh-42");
    }

    #[test]
    fn test_parse_accepts_url_safe_alphabet() {
        let payload = vec![0xfb, 0xff, 0xfe];
        let encoded = EncodedRefreshToken::new(7, payload.clone()).encode();
        assert_eq!(encoded, "7/-__-");
        assert_eq!(EncodedRefreshToken::parse(&encoded).unwrap().payload, payload);
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert_eq!(
            EncodedRefreshToken::parse("invalid-token"),
            Err(RefreshTokenFormatError::MissingSeparator)
        );
    }

    #[test]
    fn test_parse_rejects_bad_ids() {
        for token in ["/cmVmcmVzaC0x", "a/cmVmcmVzaC0x", "-1/cmVmcmVzaC0x", "+1/cmVmcmVzaC0x", "01/cmVmcmVzaC0x", "1 /cmVmcmVzaC0x", "99999999999999999999/cmVmcmVzaC0x"] {
            assert_eq!(
                EncodedRefreshToken::parse(token),
                Err(RefreshTokenFormatError::InvalidId),
                "{token}"
            );
        }
    }

    #[test]
    fn test_parse_zero_id_is_structurally_valid() {
        let parsed = EncodedRefreshToken::parse("0/cmVmcmVzaC0x").unwrap();
        assert_eq!(parsed.record_id, 0);
    }

    #[test]
    fn test_parse_rejects_bad_payloads() {
        for token in ["1/", "1/cmVm*mVzaC0x", "1/cmVm+mVzaC0x", "1/cmVm/mVzaC0x", "1/c"] {
            assert_eq!(
                EncodedRefreshToken::parse(token),
                Err(RefreshTokenFormatError::InvalidPayload),
                "{token}"
            );
        }
    }

    #[test]
    fn test_debug_redacts_payload() {
        let token = EncodedRefreshToken::new(1, b"refresh-1".to_vec());
        assert!(!format!("{token:?}").contains("refresh-1"));
    }
}
