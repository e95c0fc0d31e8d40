//! Integration tests for tower-oauth2-guard
//!
//! Drives the full middleware stack through the tower service interface:
//! token verification, OR/AND scope requirements, denial responses, and
//! token forwarding via request extensions.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::{Layer, ServiceExt};
use tower_service::Service;

use tower_oauth2_guard::{
    AccessToken, AuthorizationLayer, MemoryVerifier, ScopeAlternative, TokenVerifier, VerifyError,
};

// =============================================================================
// Test fixtures
// =============================================================================

/// Far-future expiry used by tokens that should stay valid.
const FAR_FUTURE: u64 = 99_999_999_900;

fn stored_token(scope: Option<&str>) -> AccessToken {
    let token = AccessToken::new("atokenvalue", "a client id")
        .user_id("a user id")
        .expires(FAR_FUTURE);
    match scope {
        Some(scope) => token.scope(scope),
        None => token,
    }
}

fn verifier_with(token: AccessToken) -> MemoryVerifier {
    MemoryVerifier::new().token(token)
}

fn request_with_bearer(token: &str) -> Request<Body> {
    Request::builder()
        .uri("/foos")
        .method("PATCH")
        .header(AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn bare_request() -> Request<Body> {
    Request::builder()
        .uri("/foos")
        .method("PATCH")
        .body(Body::empty())
        .unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Inner service that returns 200 OK and asserts the forwarded token record
/// matches the stored one exactly.
#[derive(Clone)]
struct ExpectToken(AccessToken);

impl Service<Request<Body>> for ExpectToken {
    type Response = Response;
    type Error = std::convert::Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let expected = self.0.clone();
        Box::pin(async move {
            let token = req
                .extensions()
                .get::<AccessToken>()
                .expect("verified token forwarded in extensions");
            assert_eq!(token, &expected);
            Ok(StatusCode::OK.into_response())
        })
    }
}

/// Inner service that must never run.
#[derive(Clone)]
struct Unreachable;

impl Service<Request<Body>> for Unreachable {
    type Response = Response;
    type Error = std::convert::Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: Request<Body>) -> Self::Future {
        panic!("this will not get executed");
    }
}

// =============================================================================
// Basic verification
// =============================================================================

#[tokio::test]
async fn test_valid_token_forwards_stored_record() {
    let token = stored_token(None);
    let layer = AuthorizationLayer::new(verifier_with(token.clone()));
    let service = layer.layer(ExpectToken(token));

    let resp = service
        .oneshot(request_with_bearer("atokenvalue"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_denied_with_invalid_token_body() {
    let expired = AccessToken::new("atokenvalue", "a client id")
        .user_id("a user id")
        .expires(1);
    let layer = AuthorizationLayer::new(verifier_with(expired));
    let service = layer.layer(Unreachable);

    let resp = service
        .oneshot(request_with_bearer("atokenvalue"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_string(resp).await,
        "{\"error\":\"invalid_token\",\"error_description\":\"The access token provided has expired\"}"
    );
}

#[tokio::test]
async fn test_no_token_provided_returns_401() {
    let layer = AuthorizationLayer::new(MemoryVerifier::new());
    let service = layer.layer(Unreachable);

    let resp = service.oneshot(bare_request()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Scope requirements
// =============================================================================

#[tokio::test]
async fn test_required_scope_satisfied() {
    let token = stored_token(Some("allowFoo anotherScope"));
    let layer = AuthorizationLayer::new(verifier_with(token.clone()))
        .required_scope([ScopeAlternative::one("allowFoo")]);
    let service = layer.layer(ExpectToken(token));

    let resp = service
        .oneshot(request_with_bearer("atokenvalue"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_insufficient_scope_returns_403_with_body() {
    let token = stored_token(Some("aScope anotherScope"));
    let layer = AuthorizationLayer::new(verifier_with(token))
        .required_scope([ScopeAlternative::one("allowFoo")]);
    let service = layer.layer(Unreachable);

    let resp = service
        .oneshot(request_with_bearer("atokenvalue"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_string(resp).await,
        "{\"error\":\"insufficient_scope\",\"error_description\":\"The request requires higher \
         privileges than provided by the access token\"}"
    );
}

#[tokio::test]
async fn test_either_scope_or_logic() {
    // superUser OR (basicUser AND withPermission); the token carries the
    // second grouping plus an extra scope.
    let token = stored_token(Some("basicUser withPermission anExtraScope"));
    let layer = AuthorizationLayer::new(verifier_with(token.clone())).required_scope([
        ScopeAlternative::one("superUser"),
        ScopeAlternative::all(["basicUser", "withPermission"]),
    ]);
    let service = layer.layer(ExpectToken(token));

    let resp = service
        .oneshot(request_with_bearer("atokenvalue"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_empty_requirement_accepts_unscoped_token() {
    let token = stored_token(None);
    let layer = AuthorizationLayer::new(verifier_with(token.clone()))
        .required_scope(Vec::<ScopeAlternative>::new());
    let service = layer.layer(ExpectToken(token));

    let resp = service
        .oneshot(request_with_bearer("atokenvalue"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_required_scope_layers_are_independent() {
    let token = stored_token(Some("aScope"));
    let base = AuthorizationLayer::new(verifier_with(token.clone()));

    let needs_a = base.clone().required_scope([ScopeAlternative::one("aScope")]);
    let needs_b = base.clone().required_scope([ScopeAlternative::one("bScope")]);

    // The base layer still enforces no scope.
    let resp = base
        .layer(ExpectToken(token.clone()))
        .oneshot(request_with_bearer("atokenvalue"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = needs_a
        .layer(ExpectToken(token))
        .oneshot(request_with_bearer("atokenvalue"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = needs_b
        .layer(Unreachable)
        .oneshot(request_with_bearer("atokenvalue"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// =============================================================================
// Content-type handling
// =============================================================================

#[tokio::test]
async fn test_denial_adds_json_content_type() {
    let layer = AuthorizationLayer::new(MemoryVerifier::new());
    let service = layer.layer(Unreachable);

    let resp = service.oneshot(bare_request()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get(CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_denial_retains_verifier_content_type() {
    /// Verifier that always denies with a pre-set text/html content-type.
    #[derive(Clone)]
    struct HtmlDenier;

    impl TokenVerifier for HtmlDenier {
        async fn verify(
            &self,
            _request: &Request<Body>,
            _scope: Option<&str>,
        ) -> Result<AccessToken, VerifyError> {
            Err(VerifyError::new(StatusCode::BAD_REQUEST)
                .header(CONTENT_TYPE, HeaderValue::from_static("text/html")))
        }
    }

    let layer = AuthorizationLayer::new(HtmlDenier);
    let service = layer.layer(Unreachable);

    let resp = service.oneshot(bare_request()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "text/html");
}
