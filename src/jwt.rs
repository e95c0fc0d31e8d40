//! JWT-backed token verification using static keys.
//!
//! [`JwtVerifier`] decodes the request's bearer token as a JWT and maps its
//! claims onto the [`AccessToken`] record. Supports HMAC, RSA, and EC
//! algorithms via the `jsonwebtoken` crate.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::Error;
use crate::token::AccessToken;
use crate::verifier::{bearer_token, TokenVerifier, VerifyError};

/// Claims this verifier reads out of a decoded JWT.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    exp: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

/// Token verifier that validates bearer JWTs with a pre-configured key.
///
/// Expiry and signature checks are delegated to `jsonwebtoken`; the granted
/// `scope` claim is compared against the requested scope alternative the
/// same way [`MemoryVerifier`](crate::MemoryVerifier) compares stored
/// tokens.
///
/// # Example
///
/// ```rust
/// use tower_oauth2_guard::JwtVerifier;
///
/// let verifier = JwtVerifier::from_secret(b"shared-secret")
///     .expected_issuer("https://auth.example.com");
/// ```
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtVerifier {
    /// Create a default `Validation` with audience validation disabled.
    ///
    /// `jsonwebtoken` requires audience claims and `exp` by default; OAuth
    /// access tokens may omit both, so callers opt in via
    /// [`expected_audience`](Self::expected_audience).
    fn default_validation(algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation
    }

    /// Create a verifier from an HMAC secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new(Self::default_validation(Algorithm::HS256)),
        }
    }

    /// Create a verifier from an RSA PEM-encoded public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`](crate::Error::InvalidKey) if the PEM
    /// data is invalid.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            decoding_key: Arc::new(DecodingKey::from_rsa_pem(pem)?),
            validation: Arc::new(Self::default_validation(Algorithm::RS256)),
        })
    }

    /// Create a verifier from an EC PEM-encoded public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`](crate::Error::InvalidKey) if the PEM
    /// data is invalid.
    pub fn from_ec_pem(pem: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            decoding_key: Arc::new(DecodingKey::from_ec_pem(pem)?),
            validation: Arc::new(Self::default_validation(Algorithm::ES256)),
        })
    }

    /// Require a matching `aud` claim.
    pub fn expected_audience(mut self, audience: &str) -> Self {
        let mut validation = (*self.validation).clone();
        validation.set_audience(&[audience]);
        self.validation = Arc::new(validation);
        self
    }

    /// Require a matching `iss` claim.
    pub fn expected_issuer(mut self, issuer: &str) -> Self {
        let mut validation = (*self.validation).clone();
        validation.set_issuer(&[issuer]);
        self.validation = Arc::new(validation);
        self
    }

    /// Disable expiration validation.
    ///
    /// Use with caution -- tokens without expiration checks may be reused
    /// indefinitely.
    pub fn disable_exp_validation(mut self) -> Self {
        let mut validation = (*self.validation).clone();
        validation.validate_exp = false;
        self.validation = Arc::new(validation);
        self
    }

    /// Set the allowed signing algorithms.
    pub fn algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        let mut validation = (*self.validation).clone();
        validation.algorithms = algorithms;
        self.validation = Arc::new(validation);
        self
    }
}

impl TokenVerifier for JwtVerifier {
    async fn verify(
        &self,
        request: &Request<Body>,
        scope: Option<&str>,
    ) -> Result<AccessToken, VerifyError> {
        let bearer = bearer_token(request)?;

        let data = jsonwebtoken::decode::<Claims>(bearer, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => VerifyError::expired_token(),
                jsonwebtoken::errors::ErrorKind::InvalidAudience => VerifyError::invalid_token(
                    "The token audience does not match this resource",
                ),
                _ => VerifyError::invalid_token(e.to_string()),
            })?;

        let claims = data.claims;
        let token = AccessToken {
            access_token: bearer.to_string(),
            client_id: claims
                .client_id
                .or_else(|| claims.sub.clone())
                .unwrap_or_default(),
            user_id: claims.sub,
            expires: claims.exp,
            scope: claims.scope,
            extra: claims.extra,
        };

        if let Some(required) = scope {
            if !token.has_all_scopes(required) {
                return Err(VerifyError::insufficient_scope());
            }
        }

        Ok(token)
    }
}
