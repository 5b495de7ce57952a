use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Fixed role → permission policy.
///
/// - `admin`: everything
/// - `manager`: catalog and stock maintenance plus orders
/// - `user`: read the catalog, take orders
///
/// Unknown roles grant nothing.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    let mut granted: Vec<Permission> = Vec::new();
    for role in roles {
        let perms: &[Permission] = match role.as_str() {
            Role::ADMIN => &[Permission::WILDCARD],
            Role::MANAGER => &[
                Permission::CATALOG_READ,
                Permission::CATALOG_WRITE,
                Permission::STOCK_ADJUST,
                Permission::ORDERS_READ,
                Permission::ORDERS_WRITE,
            ],
            Role::USER => &[
                Permission::CATALOG_READ,
                Permission::ORDERS_READ,
                Permission::ORDERS_WRITE,
            ],
            _ => &[],
        };
        for p in perms {
            if !granted.contains(p) {
                granted.push(p.clone());
            }
        }
    }
    granted
}

/// Authorize a principal for one permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = permissions_for_roles(&principal.roles);
    let perms: HashSet<&str> = granted.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        debug!(user = %principal.username, permission = %required, "permission denied");
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
