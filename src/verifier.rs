//! Token verification for the authorization middleware.
//!
//! [`TokenVerifier`] is the sole dependency boundary to the OAuth2 protocol
//! logic: given the inbound request and an optional required-scope string, a
//! verifier either produces the verified [`AccessToken`] or a [`VerifyError`]
//! describing the denial response. The middleware never classifies failures
//! itself -- it surfaces whatever the verifier produced.
//!
//! [`MemoryVerifier`] is a bundled verifier backed by an in-memory token
//! store, useful for tests and for services whose tokens are provisioned out
//! of band.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::token::AccessToken;

/// Realm reported in `WWW-Authenticate` challenges.
const WWW_REALM: &str = "Service";

/// Trait for verifying OAuth2 bearer tokens against an inbound request.
///
/// Implement this trait to delegate verification to an OAuth2 server library,
/// a token-introspection endpoint, or any other token authority. The
/// middleware calls [`verify`](TokenVerifier::verify) once per scope
/// alternative; `scope` is a space-delimited string of scope names that must
/// ALL be granted, or `None` for "any valid token, scope not checked".
///
/// Verification must be idempotent and side-effect free per attempt: the
/// middleware may call it several times for one request while trying
/// alternatives.
///
/// # Example
///
/// ```rust
/// use axum::body::Body;
/// use axum::http::Request;
/// use tower_oauth2_guard::{AccessToken, TokenVerifier, VerifyError};
///
/// #[derive(Clone)]
/// struct AlwaysDeny;
///
/// impl TokenVerifier for AlwaysDeny {
///     async fn verify(
///         &self,
///         _request: &Request<Body>,
///         _scope: Option<&str>,
///     ) -> Result<AccessToken, VerifyError> {
///         Err(VerifyError::invalid_token("The access token provided is invalid"))
///     }
/// }
/// ```
pub trait TokenVerifier: Clone + Send + Sync + 'static {
    /// Verify the request's bearer token, checking the given scope
    /// alternative when one is supplied.
    fn verify(
        &self,
        request: &Request<Body>,
        scope: Option<&str>,
    ) -> impl Future<Output = Result<AccessToken, VerifyError>> + Send;
}

/// JSON error body per RFC 6749 Section 5.2: `error` plus
/// `error_description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. `invalid_token`).
    pub error: String,
    /// Human-readable description of the denial.
    pub error_description: String,
}

/// The denial response a verifier produces when verification fails.
///
/// This is an expected, frequent outcome, not a defect: it carries the HTTP
/// status code, response headers (including a `WWW-Authenticate` challenge),
/// and an optional JSON error body. The middleware passes all of it through
/// unchanged, only adding a `Content-Type: application/json` header when no
/// content-type is present.
#[derive(Debug, Clone)]
pub struct VerifyError {
    /// HTTP status code of the denial response.
    pub status: StatusCode,
    /// Response headers, passed through as-is.
    pub headers: HeaderMap,
    /// JSON error body; `None` renders an empty body.
    pub body: Option<ErrorBody>,
}

impl VerifyError {
    /// A bare denial with the given status and no body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// A denial carrying an RFC 6749 error body and the matching
    /// `WWW-Authenticate` challenge.
    pub fn with_error(
        status: StatusCode,
        error: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let error = error.into();
        let description = description.into();
        let challenge = format!(
            "Bearer realm=\"{}\", error=\"{}\", error_description=\"{}\"",
            WWW_REALM, error, description
        );

        let mut headers = HeaderMap::new();
        headers.insert(WWW_AUTHENTICATE, parse_header_value(&challenge));

        Self {
            status,
            headers,
            body: Some(ErrorBody {
                error,
                error_description: description,
            }),
        }
    }

    /// The request carried no bearer token at all.
    ///
    /// Per RFC 6750 Section 3, the challenge carries no error code when the
    /// request lacked any authentication information; the body is empty.
    pub fn missing_token() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            WWW_AUTHENTICATE,
            parse_header_value(&format!("Bearer realm=\"{}\"", WWW_REALM)),
        );
        Self {
            status: StatusCode::UNAUTHORIZED,
            headers,
            body: None,
        }
    }

    /// The `Authorization` header was present but not a well-formed bearer
    /// credential.
    pub fn malformed_header() -> Self {
        Self::with_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "Malformed auth header",
        )
    }

    /// The provided token is unknown, revoked, or otherwise invalid.
    pub fn invalid_token(description: impl Into<String>) -> Self {
        Self::with_error(StatusCode::UNAUTHORIZED, "invalid_token", description)
    }

    /// The provided token has expired.
    pub fn expired_token() -> Self {
        Self::invalid_token("The access token provided has expired")
    }

    /// The token is valid but lacks the required scope.
    pub fn insufficient_scope() -> Self {
        Self::with_error(
            StatusCode::FORBIDDEN,
            "insufficient_scope",
            "The request requires higher privileges than provided by the access token",
        )
    }

    /// Add or replace a response header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            Some(body) => write!(f, "{} {}: {}", self.status, body.error, body.error_description),
            None => write!(f, "{}", self.status),
        }
    }
}

impl std::error::Error for VerifyError {}

impl IntoResponse for VerifyError {
    fn into_response(self) -> Response {
        let mut response = match &self.body {
            Some(body) => (self.status, axum::Json(body)).into_response(),
            None => self.status.into_response(),
        };
        // Verifier-supplied headers win over anything the body rendering set.
        for (name, value) in self.headers.iter() {
            response.headers_mut().insert(name, value.clone());
        }
        response
    }
}

fn parse_header_value(value: &str) -> HeaderValue {
    value
        .parse()
        .unwrap_or_else(|_| HeaderValue::from_static("Bearer"))
}

/// Extract the bearer token from a request's `Authorization` header.
///
/// Returns [`VerifyError::missing_token`] when the header is absent and
/// [`VerifyError::malformed_header`] when it is present but not of the form
/// `Bearer <token>`. Custom [`TokenVerifier`] implementations can reuse this
/// so their denial taxonomy matches the bundled verifiers.
pub fn bearer_token(request: &Request<Body>) -> Result<&str, VerifyError> {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return Err(VerifyError::missing_token());
    };

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(VerifyError::malformed_header)
}

/// Token verifier backed by an in-memory store of issued tokens.
///
/// The Rust analog of an OAuth2 server running on memory storage: tokens are
/// registered up front and verified by exact bearer-value lookup, with expiry
/// and scope checks applied on every request.
///
/// # Example
///
/// ```rust
/// use tower_oauth2_guard::{AccessToken, MemoryVerifier};
///
/// let verifier = MemoryVerifier::new().token(
///     AccessToken::new("atokenvalue", "a client id")
///         .user_id("a user id")
///         .scope("allowFoo anotherScope"),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryVerifier {
    tokens: Arc<HashMap<String, AccessToken>>,
}

impl MemoryVerifier {
    /// Create an empty verifier (every request is denied).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token, keyed by its bearer value.
    pub fn token(mut self, token: AccessToken) -> Self {
        Arc::make_mut(&mut self.tokens).insert(token.access_token.clone(), token);
        self
    }
}

impl TokenVerifier for MemoryVerifier {
    async fn verify(
        &self,
        request: &Request<Body>,
        scope: Option<&str>,
    ) -> Result<AccessToken, VerifyError> {
        let bearer = bearer_token(request)?;

        let Some(token) = self.tokens.get(bearer) else {
            return Err(VerifyError::invalid_token(
                "The access token provided is invalid",
            ));
        };

        if token.is_expired() {
            return Err(VerifyError::expired_token());
        }

        if let Some(required) = scope {
            if !token.has_all_scopes(required) {
                return Err(VerifyError::insufficient_scope());
            }
        }

        Ok(token.clone())
    }
}
