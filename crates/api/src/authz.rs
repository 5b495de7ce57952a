//! API-side authorization guard.
//!
//! Handlers call this before touching storage; stores and the ledger stay
//! auth-agnostic.

use cafeteria_auth::{AuthzError, Permission, authorize};

use crate::context::PrincipalContext;

/// Check that the request's principal holds `required`.
pub fn authorize_request(
    principal: &PrincipalContext,
    required: &Permission,
) -> Result<(), AuthzError> {
    authorize(principal.principal(), required)
}
