//! Authenticated principal value

use serde::{Deserialize, Serialize};

/// The authenticated caller of a protected operation.
///
/// Built once at the request boundary, after the external principal
/// resolver has validated the bearer credential, and passed by parameter
/// through call chains instead of an ad hoc key-value bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedPrincipal {
    /// Opaque user identifier supplied by the principal resolver
    pub id: String,
    /// Codes of the roles bound to the user at resolution time
    pub roles: Vec<String>,
}

impl AuthenticatedPrincipal {
    /// Create a principal from a resolved user id and role codes
    pub fn new(id: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            id: id.into(),
            roles,
        }
    }

    /// Whether the principal carries the given role code
    pub fn has_role(&self, code: &str) -> bool {
        self.roles.iter().any(|r| r == code)
    }
}
