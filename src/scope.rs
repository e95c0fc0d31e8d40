//! Required-scope expressions and their normalization.
//!
//! A [`ScopeRequirement`] is an ordered sequence of alternatives. Each
//! alternative is a set of scope names that must ALL be granted to the token
//! (AND); the requirement matches if ANY alternative matches (OR). The
//! canonical form stores each alternative as a single space-joined string,
//! matching the wire convention where a token's scope field is itself a
//! space-delimited string of granted scope names.

/// One alternative of a scope requirement: a single scope name, or a
/// collection of names that must all be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeAlternative(String);

impl ScopeAlternative {
    /// An alternative satisfied by one scope name.
    pub fn one(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }

    /// An alternative satisfied only when every given scope name is granted.
    pub fn all<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let joined = scopes
            .into_iter()
            .map(Into::into)
            .collect::<Vec<_>>()
            .join(" ");
        Self(joined)
    }

    fn into_normalized(self) -> Option<String> {
        // An alternative with no names is the unconditional one.
        if self.0.is_empty() {
            None
        } else {
            Some(self.0)
        }
    }
}

impl From<&str> for ScopeAlternative {
    fn from(scope: &str) -> Self {
        Self::one(scope)
    }
}

impl From<String> for ScopeAlternative {
    fn from(scope: String) -> Self {
        Self::one(scope)
    }
}

impl From<Vec<&str>> for ScopeAlternative {
    fn from(scopes: Vec<&str>) -> Self {
        Self::all(scopes)
    }
}

impl From<Vec<String>> for ScopeAlternative {
    fn from(scopes: Vec<String>) -> Self {
        Self::all(scopes)
    }
}

/// An ordered, immutable set of scope alternatives.
///
/// Built once at configuration time and read-only for the lifetime of the
/// authorizer. The normalized form is never empty: an empty input yields a
/// single unconditional alternative (`None`), meaning "any valid token,
/// scope not checked".
///
/// # Example
///
/// ```rust
/// use tower_oauth2_guard::{ScopeAlternative, ScopeRequirement};
///
/// // "superUser", OR both "basicUser" and "withPermission".
/// let requirement = ScopeRequirement::new([
///     ScopeAlternative::one("superUser"),
///     ScopeAlternative::all(["basicUser", "withPermission"]),
/// ]);
/// assert_eq!(requirement.alternatives().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRequirement {
    alternatives: Vec<Option<String>>,
}

impl ScopeRequirement {
    /// Build a requirement from raw alternatives, normalizing each one.
    pub fn new<I, A>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ScopeAlternative>,
    {
        let alternatives: Vec<Option<String>> = alternatives
            .into_iter()
            .map(|alt| alt.into().into_normalized())
            .collect();

        if alternatives.is_empty() {
            return Self::none();
        }

        Self { alternatives }
    }

    /// The unconditional requirement: any valid token, scope not checked.
    pub fn none() -> Self {
        Self {
            alternatives: vec![None],
        }
    }

    /// The normalized alternatives, in the order they will be tried.
    ///
    /// `None` is the unconditional alternative; `Some(s)` is a space-joined
    /// string of scope names that must all be granted.
    pub fn alternatives(&self) -> &[Option<String>] {
        &self.alternatives
    }
}

impl Default for ScopeRequirement {
    fn default() -> Self {
        Self::none()
    }
}

impl<A: Into<ScopeAlternative>> FromIterator<A> for ScopeRequirement {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<A: Into<ScopeAlternative>, const N: usize> From<[A; N]> for ScopeRequirement {
    fn from(alternatives: [A; N]) -> Self {
        Self::new(alternatives)
    }
}

impl From<Vec<ScopeAlternative>> for ScopeRequirement {
    fn from(alternatives: Vec<ScopeAlternative>) -> Self {
        Self::new(alternatives)
    }
}
