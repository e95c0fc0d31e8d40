//! # tower-oauth2-guard
//!
//! Tower middleware that gates access to downstream request handlers based on
//! OAuth2 bearer-token verification.
//!
//! The protocol logic (token parsing, expiry checks, scope comparison) lives
//! behind the [`TokenVerifier`] trait. This crate's own responsibility is
//! narrow: evaluate a list of required-scope alternatives against the
//! verifier, and translate the outcome into either continuing the middleware
//! chain or short-circuiting with the verifier's error response.
//!
//! # Scope requirements
//!
//! A [`ScopeRequirement`] is an ordered sequence of alternatives with OR
//! semantics across alternatives and AND semantics within one:
//!
//! ```rust
//! use tower_oauth2_guard::{ScopeAlternative, ScopeRequirement};
//!
//! // Satisfied by a token with the "superUser" scope, OR by a token with
//! // BOTH "basicUser" and "withPermission".
//! let requirement = ScopeRequirement::new([
//!     ScopeAlternative::one("superUser"),
//!     ScopeAlternative::all(["basicUser", "withPermission"]),
//! ]);
//! ```
//!
//! Alternatives are tried strictly in order; the first one the verifier
//! accepts wins. An empty requirement means "any valid token, scope not
//! checked".
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use tower_oauth2_guard::{
//!     AccessToken, AuthorizationLayer, MemoryVerifier, ScopeAlternative,
//! };
//!
//! # async fn run() {
//! let verifier = MemoryVerifier::new().token(AccessToken::new("atokenvalue", "a client id"));
//!
//! // One base layer, different scopes per route group.
//! let guard = AuthorizationLayer::new(verifier);
//! let admin_guard = guard.clone().required_scope([ScopeAlternative::one("admin")]);
//!
//! let app: Router = Router::new()
//!     .route("/admin", get(admin).layer(admin_guard))
//!     .route("/foos", get(foos).layer(guard));
//! # }
//!
//! async fn foos() -> &'static str {
//!     "ok"
//! }
//!
//! // The verified token is stamped onto the request extensions for
//! // downstream handlers.
//! async fn admin(axum::Extension(token): axum::Extension<AccessToken>) -> String {
//!     format!("hello {}", token.client_id)
//! }
//! ```
//!
//! # Denial responses
//!
//! A denied request never reaches the inner service. The response status,
//! headers, and `{"error", "error_description"}` JSON body all come from the
//! verifier's [`VerifyError`]; this crate's only contribution is adding a
//! `Content-Type: application/json` header when the verifier did not set one.

pub mod authorizer;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod scope;
pub mod token;
pub mod verifier;

// Re-exports
pub use authorizer::{Decision, ScopeAuthorizer};
pub use error::{BoxError, Error, Result};
pub use jwt::JwtVerifier;
pub use middleware::{AuthorizationLayer, AuthorizationService};
pub use scope::{ScopeAlternative, ScopeRequirement};
pub use token::AccessToken;
pub use verifier::{ErrorBody, MemoryVerifier, TokenVerifier, VerifyError};
