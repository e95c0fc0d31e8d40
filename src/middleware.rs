//! Tower middleware over [`ScopeAuthorizer`].
//!
//! Provides [`AuthorizationLayer`] and [`AuthorizationService`] that gate an
//! inner service behind bearer-token verification. On success the verified
//! [`AccessToken`](crate::AccessToken) is injected into request extensions
//! for downstream handlers; on denial the verifier's error response is
//! returned and the inner service is never called.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use tower::Layer;

use crate::authorizer::{Decision, ScopeAuthorizer};
use crate::error::BoxError;
use crate::scope::ScopeRequirement;
use crate::verifier::TokenVerifier;

/// Tower layer that wraps services with OAuth2 bearer-token authorization.
///
/// One base layer can be shared across routes with different scope
/// requirements: [`required_scope`](Self::required_scope) returns a new
/// layer with the same verifier, leaving the original untouched.
///
/// # Example
///
/// ```rust
/// use tower_oauth2_guard::{AccessToken, AuthorizationLayer, MemoryVerifier, ScopeAlternative};
///
/// let verifier = MemoryVerifier::new()
///     .token(AccessToken::new("atokenvalue", "a client id").scope("allowFoo"));
///
/// let layer = AuthorizationLayer::new(verifier);
/// let foo_layer = layer.clone().required_scope([ScopeAlternative::one("allowFoo")]);
/// ```
#[derive(Debug, Clone)]
pub struct AuthorizationLayer<V> {
    authorizer: ScopeAuthorizer<V>,
}

impl<V: TokenVerifier> AuthorizationLayer<V> {
    /// Create a layer with the given verifier and the unconditional scope
    /// requirement.
    pub fn new(verifier: V) -> Self {
        Self {
            authorizer: ScopeAuthorizer::new(verifier),
        }
    }

    /// Replace the scope requirement, returning a new layer.
    pub fn required_scope(self, scopes: impl Into<ScopeRequirement>) -> Self {
        Self {
            authorizer: self.authorizer.with_required_scope(scopes),
        }
    }
}

impl<S, V: TokenVerifier> Layer<S> for AuthorizationLayer<V> {
    type Service = AuthorizationService<S, V>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthorizationService {
            inner,
            authorizer: self.authorizer.clone(),
        }
    }
}

/// Tower service that authorizes each request before forwarding it.
///
/// Created by [`AuthorizationLayer`]. For each incoming request:
///
/// 1. Evaluates the scope alternatives via [`ScopeAuthorizer::authorize`]
/// 2. On success, injects the verified token into request extensions and
///    calls the inner service
/// 3. On denial, short-circuits with the verifier's error response
#[derive(Debug, Clone)]
pub struct AuthorizationService<S, V> {
    inner: S,
    authorizer: ScopeAuthorizer<V>,
}

impl<S, V> tower_service::Service<Request<Body>> for AuthorizationService<S, V>
where
    S: tower_service::Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError> + Send,
    V: TokenVerifier,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let authorizer = self.authorizer.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match authorizer.authorize(&req).await {
                Decision::Allowed(token) => {
                    tracing::trace!(client_id = %token.client_id, "request authorized");
                    let mut req = req;
                    req.extensions_mut().insert(token);
                    inner.call(req).await
                }
                Decision::Denied(err) => {
                    tracing::debug!(status = %err.status, error = %err, "request denied");
                    Ok(err.into_response())
                }
            }
        })
    }
}
