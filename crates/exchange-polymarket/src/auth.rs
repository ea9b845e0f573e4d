//! CLOB L2 authentication.
//!
//! Order endpoints require HMAC-SHA256 request signatures built from an
//! API key, a base64 secret, and a passphrase.

use crate::error::{PolymarketError, Result};
use base64::{
    engine::general_purpose::{STANDARD as BASE64_STANDARD, URL_SAFE as BASE64_URL_SAFE},
    Engine,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// API credentials for L2 authentication.
#[derive(Clone)]
pub struct ApiCredentials {
    /// The API key identifier.
    pub api_key: String,
    /// Base64-encoded HMAC secret.
    pub secret: SecretString,
    /// Passphrase for the API key.
    pub passphrase: String,
    /// Funder address sent in the POLY_ADDRESS header.
    pub address: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Headers for an L2-authenticated request.
#[derive(Debug, Clone)]
pub struct L2Headers {
    /// POLY_ADDRESS header.
    pub address: String,
    /// POLY_SIGNATURE header.
    pub signature: String,
    /// POLY_TIMESTAMP header.
    pub timestamp: String,
    /// POLY_API_KEY header.
    pub api_key: String,
    /// POLY_PASSPHRASE header.
    pub passphrase: String,
}

impl L2Headers {
    /// Returns headers as (name, value) pairs for attaching to a request.
    #[must_use]
    pub fn as_tuples(&self) -> [(&'static str, &str); 5] {
        [
            ("POLY_ADDRESS", &self.address),
            ("POLY_SIGNATURE", &self.signature),
            ("POLY_TIMESTAMP", &self.timestamp),
            ("POLY_API_KEY", &self.api_key),
            ("POLY_PASSPHRASE", &self.passphrase),
        ]
    }
}

/// L2 request signer.
#[derive(Clone)]
pub struct L2Auth {
    creds: ApiCredentials,
}

impl std::fmt::Debug for L2Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("L2Auth")
            .field("api_key", &self.creds.api_key)
            .finish_non_exhaustive()
    }
}

impl L2Auth {
    /// Creates a signer from API credentials.
    #[must_use]
    pub fn new(creds: ApiCredentials) -> Self {
        Self { creds }
    }

    /// Generates headers for an HTTP request.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, DELETE)
    /// * `path` - Request path (e.g., "/order")
    /// * `body` - Request body (empty string for GET/DELETE)
    ///
    /// # Errors
    /// Returns error if the secret is not valid base64.
    pub fn headers(&self, method: &str, path: &str, body: &str) -> Result<L2Headers> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.compute_hmac(&timestamp, method, path, body)?;

        Ok(L2Headers {
            address: self.creds.address.clone(),
            signature,
            timestamp,
            api_key: self.creds.api_key.clone(),
            passphrase: self.creds.passphrase.clone(),
        })
    }

    /// Computes the HMAC-SHA256 signature.
    ///
    /// Message format: `{timestamp}{method}{path}{body}`, key is the
    /// base64-decoded secret, output is URL-safe base64 to match the
    /// venue's reference clients.
    fn compute_hmac(&self, timestamp: &str, method: &str, path: &str, body: &str) -> Result<String> {
        let secret = self.creds.secret.expose_secret();
        let secret_bytes = BASE64_URL_SAFE
            .decode(secret)
            .or_else(|_| BASE64_STANDARD.decode(secret))
            .map_err(|e| PolymarketError::Authentication(format!("invalid secret: {e}")))?;

        let mut message = format!("{timestamp}{method}{path}");
        if !body.is_empty() {
            message.push_str(body);
        }

        let mut mac = HmacSha256::new_from_slice(&secret_bytes)
            .map_err(|e| PolymarketError::Authentication(format!("invalid key length: {e}")))?;
        mac.update(message.as_bytes());
        let result = mac.finalize();

        Ok(BASE64_URL_SAFE.encode(result.into_bytes()))
    }
}
