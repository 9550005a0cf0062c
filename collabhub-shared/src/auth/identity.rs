//! Caller identity from identity-provider session tokens
//!
//! The identity provider authenticates end users and hands the client a
//! signed JWT. This module only verifies that token and extracts the stable
//! user id (`sub`) and the active organization (`org_id`); it never issues
//! credentials for real users.
//!
//! # Claims
//!
//! - `sub`: provider user id (required, non-empty)
//! - `org_id`: provider organization id of the active organization (optional)
//! - `exp`: expiry, always validated
//! - `iss`: validated when an issuer is configured
//!
//! # Example
//!
//! ```
//! use collabhub_shared::auth::identity::{issue_hs256, IdentityClaims, IdentityVerifier};
//! use chrono::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let claims = IdentityClaims::new("user_2abc", Some("org_42"), Duration::minutes(5));
//! let token = issue_hs256(&claims, "dev-secret")?;
//!
//! let verifier = IdentityVerifier::hs256("dev-secret", None);
//! let caller = verifier.verify_bearer(Some(&format!("Bearer {}", token)))?;
//! assert_eq!(caller.user_id, "user_2abc");
//! assert_eq!(caller.org_id.as_deref(), Some("org_42"));
//! # Ok(())
//! # }
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Missing bearer token")]
    Missing,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Invalid verification key: {0}")]
    Key(String),
}

impl From<IdentityError> for ServiceError {
    fn from(err: IdentityError) -> Self {
        ServiceError::Authentication(err.to_string())
    }
}

/// Verified caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Provider user id
    pub user_id: String,

    /// Provider id of the caller's active organization
    pub org_id: Option<String>,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<String>, org_id: Option<&str>) -> Self {
        Self {
            user_id: user_id.into(),
            org_id: org_id.map(str::to_string),
        }
    }

    /// Active organization id, or an authentication failure when the caller
    /// has no organization selected
    pub fn require_org(&self) -> Result<&str, ServiceError> {
        self.org_id
            .as_deref()
            .ok_or_else(|| ServiceError::Authentication("No active organization".to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,

    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl IdentityClaims {
    pub fn new(sub: &str, org_id: Option<&str>, expires_in: Duration) -> Self {
        Self {
            sub: sub.to_string(),
            org_id: org_id.map(str::to_string),
            exp: (Utc::now() + expires_in).timestamp(),
            iss: None,
        }
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_string());
        self
    }
}

/// Signs claims with a shared HS256 secret (development and tests)
pub fn issue_hs256(claims: &IdentityClaims, secret: &str) -> Result<String, IdentityError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| IdentityError::Invalid(format!("Token encoding failed: {}", e)))
}

#[derive(Clone)]
pub struct IdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    /// Verifier for tokens signed with a shared secret
    pub fn hs256(secret: &str, issuer: Option<&str>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: validation(Algorithm::HS256, issuer),
        }
    }

    /// Verifier for tokens signed with the provider's RSA key
    pub fn rs256(public_key_pem: &str, issuer: Option<&str>) -> Result<Self, IdentityError> {
        let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| IdentityError::Key(e.to_string()))?;

        Ok(Self {
            key,
            validation: validation(Algorithm::RS256, issuer),
        })
    }

    pub fn verify(&self, token: &str) -> Result<CallerIdentity, IdentityError> {
        let data = decode::<IdentityClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => IdentityError::InvalidIssuer,
                _ => IdentityError::Invalid(e.to_string()),
            }
        })?;

        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(IdentityError::Invalid("Empty subject".to_string()));
        }

        Ok(CallerIdentity {
            user_id: claims.sub,
            org_id: claims.org_id.filter(|org| !org.is_empty()),
        })
    }

    /// Verifies the value of an `Authorization: Bearer <token>` header
    pub fn verify_bearer(&self, header: Option<&str>) -> Result<CallerIdentity, IdentityError> {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(IdentityError::Missing)?;

        self.verify(token)
    }
}

fn validation(algorithm: Algorithm, issuer: Option<&str>) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation.validate_exp = true;
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }
    validation
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-at-least-32-bytes-long!!";

    #[test]
    fn test_verify_round_trip() {
        let claims = IdentityClaims::new("user_1", Some("org_1"), Duration::hours(1));
        let token = issue_hs256(&claims, SECRET).unwrap();

        let caller = IdentityVerifier::hs256(SECRET, None).verify(&token).unwrap();
        assert_eq!(caller, CallerIdentity::new("user_1", Some("org_1")));
    }

    #[test]
    fn test_expired_token() {
        let claims = IdentityClaims::new("user_1", None, Duration::hours(-2));
        let token = issue_hs256(&claims, SECRET).unwrap();

        let err = IdentityVerifier::hs256(SECRET, None).verify(&token).unwrap_err();
        assert!(matches!(err, IdentityError::Expired));
    }

    #[test]
    fn test_wrong_secret() {
        let claims = IdentityClaims::new("user_1", None, Duration::hours(1));
        let token = issue_hs256(&claims, SECRET).unwrap();

        let err = IdentityVerifier::hs256("another-secret", None)
            .verify(&token)
            .unwrap_err();
        assert!(matches!(err, IdentityError::Invalid(_)));
    }

    #[test]
    fn test_issuer_is_checked_when_configured() {
        let claims =
            IdentityClaims::new("user_1", None, Duration::hours(1)).with_issuer("https://other");
        let token = issue_hs256(&claims, SECRET).unwrap();

        let verifier = IdentityVerifier::hs256(SECRET, Some("https://clerk.example.com"));
        assert!(matches!(
            verifier.verify(&token).unwrap_err(),
            IdentityError::InvalidIssuer
        ));
    }

    #[test]
    fn test_bearer_header_parsing() {
        let verifier = IdentityVerifier::hs256(SECRET, None);
        assert!(matches!(
            verifier.verify_bearer(None).unwrap_err(),
            IdentityError::Missing
        ));
        assert!(matches!(
            verifier.verify_bearer(Some("Basic abc")).unwrap_err(),
            IdentityError::Missing
        ));
    }

    #[test]
    fn test_require_org() {
        assert!(CallerIdentity::new("u", None).require_org().is_err());
        assert_eq!(
            CallerIdentity::new("u", Some("org_1")).require_org().unwrap(),
            "org_1"
        );
    }

    #[test]
    fn test_empty_org_claim_is_none() {
        let claims = IdentityClaims::new("user_1", Some(""), Duration::hours(1));
        let token = issue_hs256(&claims, SECRET).unwrap();

        let caller = IdentityVerifier::hs256(SECRET, None).verify(&token).unwrap();
        assert!(caller.org_id.is_none());
    }
}
