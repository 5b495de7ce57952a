//! `cafeteria-auth`: authentication and authorization boundary.
//!
//! Decoupled from HTTP and storage: token encoding, password hashing and the
//! role → permission policy live here; the API layer extracts bearer tokens and
//! the infra layer stores hashes.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use account::{Credentials, UserAccount, MIN_PASSWORD_LEN};
pub use authorize::{authorize, permissions_for_roles, AuthzError};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256Jwt, IssuedToken, JwtValidator};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
