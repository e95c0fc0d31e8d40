//! The verified access-token record.
//!
//! [`AccessToken`] is the value a [`TokenVerifier`](crate::TokenVerifier)
//! produces on success. The middleware does not interpret its fields beyond
//! the granted-scope string; it only forwards the record to downstream
//! handlers via request extensions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// A verified OAuth2 access-token record.
///
/// Mirrors the shape an OAuth2 server's token storage hands back: the token
/// identifier, the owning client and user, an expiry timestamp, and the
/// space-delimited granted-scope string. Fields not covered by the standard
/// set land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The bearer token value itself.
    pub access_token: String,

    /// OAuth client the token was issued to.
    pub client_id: String,

    /// Resource owner, if the grant had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Expiration time (Unix timestamp, seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<u64>,

    /// Space-delimited granted-scope string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Additional fields not covered by the standard set.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl AccessToken {
    /// Create a token record with the given bearer value and client id.
    pub fn new(access_token: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            client_id: client_id.into(),
            user_id: None,
            expires: None,
            scope: None,
            extra: HashMap::new(),
        }
    }

    /// Set the owning user.
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the expiration timestamp (Unix seconds).
    pub fn expires(mut self, expires: u64) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Set the granted-scope string (space-delimited scope names).
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Parse the granted-scope string into a set of individual scope names.
    pub fn scopes(&self) -> HashSet<&str> {
        self.scope
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .collect()
    }

    /// Check if the token has a specific granted scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes().contains(scope)
    }

    /// Check if every scope name in the given space-delimited string is
    /// present in the token's granted scopes.
    pub fn has_all_scopes(&self, required: &str) -> bool {
        let granted = self.scopes();
        required.split_whitespace().all(|name| granted.contains(name))
    }

    /// Check if the token has expired based on the current system time.
    ///
    /// A token without an `expires` field never expires.
    pub fn is_expired(&self) -> bool {
        match self.expires {
            Some(expires) => {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs();
                now > expires
            }
            None => false,
        }
    }
}
