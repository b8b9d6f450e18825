//! Cryptographic utilities for webhook signature validation.
//!
//! Senders sign the exact request body bytes with HMAC-SHA256 under the
//! shared secret and send the lowercase hex digest in `X-Signature`. A
//! GitHub-style `sha256=` prefix is tolerated. Verification never looks at
//! a parsed or re-serialized form of the body.

use std::{fmt, sync::Arc};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Signature validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Missing signature header.
    #[error("signature header missing")]
    MissingSignature,

    /// Header value is not a hex digest.
    #[error("invalid signature format: {0}")]
    InvalidFormat(String),

    /// Signature does not match the body.
    #[error("signature verification failed")]
    VerificationFailed,

    /// Secret is empty or unusable as an HMAC key.
    #[error("invalid secret key")]
    InvalidSecret,
}

/// The shared webhook secret.
///
/// Cheap to clone; `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(Arc<[u8]>);

impl WebhookSecret {
    /// Wraps a secret.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidSecret` for an empty secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SignatureError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SignatureError::InvalidSecret);
        }
        Ok(Self(Arc::from(secret)))
    }

    /// Returns whether a usable secret is held.
    pub fn is_configured(&self) -> bool {
        !self.0.is_empty()
    }

    fn mac(&self) -> Result<HmacSha256, SignatureError> {
        HmacSha256::new_from_slice(&self.0).map_err(|_| SignatureError::InvalidSecret)
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(***)")
    }
}

/// Verifies a webhook signature header against the raw body.
///
/// # Example
///
/// ```
/// use hookbox_api::crypto::{sign_payload, verify_signature, WebhookSecret};
///
/// let secret = WebhookSecret::new("testsecret").unwrap();
/// let body = br#"{"message_id":"m1"}"#;
/// let signature = sign_payload(body, &secret).unwrap();
///
/// assert!(verify_signature(body, Some(&signature), &secret).is_ok());
/// assert!(verify_signature(body, None, &secret).is_err());
/// ```
///
/// # Errors
///
/// Returns `MissingSignature` when no header was sent, `InvalidFormat` when
/// it is not hex, and `VerificationFailed` when the digest differs.
pub fn verify_signature(
    payload: &[u8],
    signature: Option<&str>,
    secret: &WebhookSecret,
) -> Result<(), SignatureError> {
    let signature = signature.map(str::trim).filter(|s| !s.is_empty());
    let Some(signature) = signature else { return Err(SignatureError::MissingSignature) };

    let expected = parse_signature_format(signature)?;

    let mut mac = secret.mac()?;
    mac.update(payload);
    // verify_slice compares in constant time
    mac.verify_slice(&expected).map_err(|_| SignatureError::VerificationFailed)
}

/// Computes the hex HMAC-SHA256 signature of a payload.
///
/// # Errors
///
/// Returns `SignatureError::InvalidSecret` if the key is rejected.
pub fn sign_payload(payload: &[u8], secret: &WebhookSecret) -> Result<String, SignatureError> {
    let mut mac = secret.mac()?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Decodes `<hex>` or `sha256=<hex>` into digest bytes.
fn parse_signature_format(signature: &str) -> Result<Vec<u8>, SignatureError> {
    let hex_part = signature.strip_prefix("sha256=").unwrap_or(signature);

    hex::decode(hex_part).map_err(|e| SignatureError::InvalidFormat(e.to_string()))
}
