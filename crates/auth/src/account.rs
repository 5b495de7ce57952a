//! User accounts as seen outside storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cafeteria_core::{DomainError, DomainResult, UserId};

use crate::Role;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Registered user (never carries the password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub roles: Vec<Role>,
}

/// Username/password pair submitted to register or log in.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Registration rules: non-blank username, password of at least
    /// [`MIN_PASSWORD_LEN`] characters. The username is trimmed.
    pub fn validate(self) -> DomainResult<Self> {
        let username = self.username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(Self {
            username,
            password: self.password,
        })
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
