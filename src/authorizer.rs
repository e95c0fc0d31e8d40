//! The core authorization decision, independent of any middleware plumbing.
//!
//! [`ScopeAuthorizer`] pairs a [`TokenVerifier`] with a [`ScopeRequirement`]
//! and evaluates one request at a time. The tower adapter in
//! [`middleware`](crate::middleware) is a thin shim over
//! [`authorize`](ScopeAuthorizer::authorize).

use axum::body::Body;
use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::Request;

use crate::scope::ScopeRequirement;
use crate::token::AccessToken;
use crate::verifier::{TokenVerifier, VerifyError};

/// Outcome of one authorization attempt.
#[derive(Debug)]
pub enum Decision {
    /// Some alternative was accepted; carries the verified token.
    Allowed(AccessToken),
    /// No alternative was accepted; carries the verifier's last error
    /// response.
    Denied(VerifyError),
}

/// Evaluates required-scope alternatives against a token verifier.
///
/// The authorizer is immutable after construction and safe to share across
/// concurrently handled requests, provided the verifier is. Per-route scope
/// configuration derives new instances via
/// [`with_required_scope`](Self::with_required_scope) without touching the
/// original.
#[derive(Debug, Clone)]
pub struct ScopeAuthorizer<V> {
    verifier: V,
    requirement: ScopeRequirement,
}

impl<V: TokenVerifier> ScopeAuthorizer<V> {
    /// Create an authorizer with the unconditional requirement: any valid
    /// token is accepted, scope not checked.
    pub fn new(verifier: V) -> Self {
        Self {
            verifier,
            requirement: ScopeRequirement::none(),
        }
    }

    /// Return a new authorizer sharing this verifier with the requirement
    /// replaced. The receiver is left untouched.
    pub fn with_required_scope(&self, scopes: impl Into<ScopeRequirement>) -> Self {
        Self {
            verifier: self.verifier.clone(),
            requirement: scopes.into(),
        }
    }

    /// The requirement this authorizer enforces.
    pub fn requirement(&self) -> &ScopeRequirement {
        &self.requirement
    }

    /// Evaluate the request against the scope alternatives, strictly in
    /// order.
    ///
    /// The first alternative the verifier accepts wins and its token is
    /// returned. When none is accepted, the denial carries whatever error
    /// the verifier produced for the last alternative tried, with a
    /// `Content-Type: application/json` header added only if the verifier
    /// did not set a content-type itself.
    pub async fn authorize(&self, request: &Request<Body>) -> Decision {
        let mut denial = None;

        for alternative in self.requirement.alternatives() {
            match self.verifier.verify(request, alternative.as_deref()).await {
                Ok(token) => return Decision::Allowed(token),
                Err(err) => denial = Some(err),
            }
        }

        // Normalization guarantees at least one alternative, so the fallback
        // is unreachable in practice.
        let mut err = denial.unwrap_or_else(VerifyError::missing_token);
        if !err.headers.contains_key(CONTENT_TYPE) {
            err.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Decision::Denied(err)
    }
}
