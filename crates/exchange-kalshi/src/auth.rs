//! RSA-PSS authentication for the Kalshi API.
//!
//! Kalshi authenticates requests with RSA-PSS (SHA-256) signatures over
//! `timestamp + method + path + body`. The timestamp is Unix
//! milliseconds.
//!
//! # Security
//!
//! - Private keys are loaded from a PEM file on disk
//! - Private keys are NEVER logged
//! - The API key id is zeroized on drop

use crate::error::{KalshiError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::pkcs8::DecodePrivateKey;
use rsa::pss::BlindedSigningKey;
use rsa::sha2::Sha256;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;
use secrecy::{ExposeSecret, SecretString};
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroize;

// =============================================================================
// Signed Headers
// =============================================================================

/// Headers required for authenticated Kalshi API requests.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    /// KALSHI-ACCESS-KEY header.
    pub access_key: String,

    /// KALSHI-ACCESS-SIGNATURE header (base64 encoded).
    pub signature: String,

    /// KALSHI-ACCESS-TIMESTAMP header (Unix timestamp in milliseconds).
    pub timestamp: String,
}

impl SignedHeaders {
    /// Returns headers as tuples for reqwest.
    #[must_use]
    pub fn as_tuples(&self) -> [(&'static str, &str); 3] {
        [
            ("KALSHI-ACCESS-KEY", &self.access_key),
            ("KALSHI-ACCESS-SIGNATURE", &self.signature),
            ("KALSHI-ACCESS-TIMESTAMP", &self.timestamp),
        ]
    }
}

// =============================================================================
// KalshiAuth
// =============================================================================

/// RSA-PSS request signer for the Kalshi API.
pub struct KalshiAuth {
    /// API key ID.
    api_key: String,

    /// RSA private key for signing.
    private_key: RsaPrivateKey,
}

impl std::fmt::Debug for KalshiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KalshiAuth")
            .field("api_key", &self.api_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl Drop for KalshiAuth {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

impl KalshiAuth {
    /// Creates a signer from an API key id and a PEM-encoded private key.
    ///
    /// # Errors
    /// Returns error if the private key cannot be parsed.
    pub fn new(api_key: impl Into<String>, private_key_pem: &str) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .map_err(|e| KalshiError::Signing(format!("failed to parse private key: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            private_key,
        })
    }

    /// Creates a signer by reading the private key from a PEM file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or the key cannot be
    /// parsed.
    pub fn from_key_file(api_key: impl Into<String>, path: &str) -> Result<Self> {
        let pem = std::fs::read_to_string(path).map_err(|e| {
            KalshiError::Configuration(format!("cannot read private key file {path}: {e}"))
        })?;
        Self::new(api_key, &pem)
    }

    /// Creates a signer with a SecretString private key.
    ///
    /// # Errors
    /// Returns error if the private key cannot be parsed.
    pub fn with_secret_key(
        api_key: impl Into<String>,
        private_key_pem: SecretString,
    ) -> Result<Self> {
        Self::new(api_key, private_key_pem.expose_secret())
    }

    /// Returns the API key ID.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Signs a request and returns the required headers.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, DELETE)
    /// * `path` - API path (e.g., "/trade-api/v2/portfolio/orders")
    /// * `body` - Request body (empty string for GET requests)
    ///
    /// # Errors
    /// Returns error if signing fails.
    pub fn sign_request(&self, method: &str, path: &str, body: &str) -> Result<SignedHeaders> {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| KalshiError::Signing(format!("failed to get timestamp: {e}")))?
            .as_millis();

        self.sign_request_with_timestamp(method, path, body, timestamp_ms as u64)
    }

    /// Signs a request with a specific timestamp (useful for testing).
    ///
    /// # Errors
    /// Returns error if signing fails.
    pub fn sign_request_with_timestamp(
        &self,
        method: &str,
        path: &str,
        body: &str,
        timestamp_ms: u64,
    ) -> Result<SignedHeaders> {
        let timestamp_str = timestamp_ms.to_string();
        let message = format!("{timestamp_str}{method}{path}{body}");

        let signing_key = BlindedSigningKey::<Sha256>::new(self.private_key.clone());
        let mut rng = rand::thread_rng();
        let signature = signing_key.sign_with_rng(&mut rng, message.as_bytes());

        let signature_b64 = BASE64.encode(signature.to_bytes());

        Ok(SignedHeaders {
            access_key: self.api_key.clone(),
            signature: signature_b64,
            timestamp: timestamp_str,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== SignedHeaders Tests ====================

    #[test]
    fn test_signed_headers_as_tuples() {
        let headers = SignedHeaders {
            access_key: "test-key".to_string(),
            signature: "dGVzdC1zaWduYXR1cmU=".to_string(),
            timestamp: "1234567890000".to_string(),
        };

        let tuples = headers.as_tuples();
        assert_eq!(tuples.len(), 3);
        assert_eq!(tuples[0], ("KALSHI-ACCESS-KEY", "test-key"));
        assert_eq!(
            tuples[1],
            ("KALSHI-ACCESS-SIGNATURE", "dGVzdC1zaWduYXR1cmU=")
        );
        assert_eq!(tuples[2], ("KALSHI-ACCESS-TIMESTAMP", "1234567890000"));
    }

    // ==================== KalshiAuth Tests ====================

    #[test]
    fn test_auth_invalid_private_key() {
        let result = KalshiAuth::new("test-api-key", "invalid-pem-data");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("parse private key"));
    }

    #[test]
    fn test_auth_missing_key_file() {
        let result = KalshiAuth::from_key_file("test-api-key", "/nonexistent/key.pem");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot read private key file"));
    }

    // ==================== Signature Format Tests ====================

    #[test]
    fn test_signature_message_format() {
        let timestamp = "1706817600000";
        let method = "POST";
        let path = "/trade-api/v2/portfolio/orders";
        let body = r#"{"ticker":"KXBTCD-TEST"}"#;

        let message = format!("{timestamp}{method}{path}{body}");
        assert_eq!(
            message,
            "1706817600000POST/trade-api/v2/portfolio/orders{\"ticker\":\"KXBTCD-TEST\"}"
        );
    }

    #[test]
    fn test_sign_request_empty_body() {
        let timestamp = "1706817600000";
        let method = "GET";
        let path = "/trade-api/v2/markets";

        let message = format!("{timestamp}{method}{path}");
        assert_eq!(message, "1706817600000GET/trade-api/v2/markets");
    }

    #[test]
    fn test_timestamp_is_milliseconds() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis();

        let timestamp_str = now.to_string();
        assert!(timestamp_str.len() >= 13);
    }

    // ==================== Secret Handling Tests ====================

    #[test]
    fn test_secret_string_not_leaked() {
        let secret = SecretString::from("super-secret-key");
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("super-secret-key"));
    }
}
