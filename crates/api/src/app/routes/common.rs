use core::str::FromStr;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use cafeteria_auth::Permission;
use cafeteria_core::DomainError;
use cafeteria_infra::StoreResult;

use crate::app::errors;
use crate::context::PrincipalContext;

/// Permission check turned into a ready 403 response.
pub fn guard(principal: &PrincipalContext, required: &Permission) -> Result<(), axum::response::Response> {
    crate::authz::authorize_request(principal, required).map_err(errors::authz_error_to_response)
}

/// Parse a path id into its typed form, answering 400 `invalid_id` otherwise.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}

/// Serialize a store result with `status`, or map its error.
pub fn respond<T: Serialize>(status: StatusCode, result: StoreResult<T>) -> axum::response::Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// `204 No Content` on success.
pub fn respond_empty<T>(result: StoreResult<T>) -> axum::response::Response {
    match result {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
