//! Webhook signature verification (Svix scheme)
//!
//! The provider signs `{id}.{timestamp}.{body}` with HMAC-SHA256 and sends
//! the base64 digest in the signature header as `v1,<digest>`. Several
//! space-separated entries may be present during secret rotation; any match
//! passes. Secrets are distributed as `whsec_<base64 key>`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Default allowed clock skew between provider and receiver
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Webhook secret is not configured")]
    MissingSecret,

    #[error("Webhook secret is not valid base64: {0}")]
    InvalidSecret(String),

    #[error("Missing {0} header")]
    MissingHeader(&'static str),

    #[error("Invalid timestamp header")]
    InvalidTimestamp,

    #[error("Timestamp outside tolerance")]
    TimestampOutOfTolerance,

    #[error("No matching signature")]
    NoMatchingSignature,
}

/// Envelope headers as received
///
/// Both the `svix-*` names and the generic `webhook-*` names are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub signature: Option<String>,
}

impl WebhookHeaders {
    /// Builds the header set from a case-insensitive lookup function
    pub fn from_lookup<'a, F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let pick = |primary: &str, alias: &str| {
            lookup(primary)
                .or_else(|| lookup(alias))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Self {
            id: pick("svix-id", "webhook-id"),
            timestamp: pick("svix-timestamp", "webhook-timestamp"),
            signature: pick("svix-signature", "webhook-signature"),
        }
    }
}

#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    /// Decodes a `whsec_`-prefixed (or bare) base64 secret
    pub fn new(secret: &str) -> Result<Self, SignatureError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        if encoded.is_empty() {
            return Err(SignatureError::MissingSecret);
        }

        let key = STANDARD
            .decode(encoded)
            .map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;

        Ok(Self {
            key,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        })
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        mac
    }

    /// Produces a `v1,<base64>` signature entry
    pub fn sign(&self, id: &str, timestamp: i64, body: &[u8]) -> String {
        let digest = self
            .mac(id, &timestamp.to_string(), body)
            .finalize()
            .into_bytes();
        format!("{},{}", SIGNATURE_VERSION, STANDARD.encode(digest))
    }

    pub fn verify(&self, headers: &WebhookHeaders, body: &[u8]) -> Result<(), SignatureError> {
        self.verify_at(headers, body, Utc::now().timestamp())
    }

    fn verify_at(
        &self,
        headers: &WebhookHeaders,
        body: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        let id = headers
            .id
            .as_deref()
            .ok_or(SignatureError::MissingHeader("svix-id"))?;
        let timestamp = headers
            .timestamp
            .as_deref()
            .ok_or(SignatureError::MissingHeader("svix-timestamp"))?;
        let signatures = headers
            .signature
            .as_deref()
            .ok_or(SignatureError::MissingHeader("svix-signature"))?;

        let sent_at: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        let tolerance = u64::try_from(self.tolerance_secs).unwrap_or(0);
        if now.abs_diff(sent_at) > tolerance {
            return Err(SignatureError::TimestampOutOfTolerance);
        }

        let mac = self.mac(id, timestamp, body);
        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, encoded)| STANDARD.decode(encoded).ok())
            .any(|candidate| mac.clone().verify_slice(&candidate).is_ok());

        if matched {
            Ok(())
        } else {
            Err(SignatureError::NoMatchingSignature)
        }
    }
}
