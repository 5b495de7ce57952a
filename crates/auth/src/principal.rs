use serde::Serialize;

use cafeteria_core::UserId;

use crate::{JwtClaims, Role};

/// An authenticated user as seen by authorization checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub roles: Vec<Role>,
}

impl From<JwtClaims> for Principal {
    fn from(claims: JwtClaims) -> Self {
        Self {
            user_id: claims.uid,
            username: claims.sub,
            roles: claims.roles,
        }
    }
}
