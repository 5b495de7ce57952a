use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use cafeteria_auth::AuthzError;
use cafeteria_core::DomainError;
use cafeteria_infra::StoreError;

use crate::app::services::AuthFlowError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Storage { .. } => {
            error!(error = %err, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "internal storage error",
            )
        }
        StoreError::InsufficientStock { product_id } | StoreError::RaceLost { product_id } => {
            json_error(
                StatusCode::CONFLICT,
                "insufficient_stock",
                format!("not enough stock for product {product_id}"),
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn auth_flow_error_to_response(err: AuthFlowError) -> axum::response::Response {
    match err {
        AuthFlowError::Invalid(e) => domain_error_to_response(e),
        AuthFlowError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid username or password",
        ),
        AuthFlowError::Store(e) => store_error_to_response(e),
        other => {
            error!(error = %other, "authentication flow failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "auth_error",
                "authentication failed",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafeteria_core::ProductId;

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ledger_rejections_are_conflicts() {
        let shortage = StoreError::InsufficientStock {
            product_id: ProductId::new(3),
        };
        let race = StoreError::RaceLost {
            product_id: ProductId::new(3),
        };
        for err in [shortage, race] {
            let resp = store_error_to_response(err);
            assert_eq!(resp.status(), StatusCode::CONFLICT);
            let body = body_json(resp).await;
            assert_eq!(body["error"], "insufficient_stock");
            assert_eq!(body["message"], "not enough stock for product 3");
        }
    }

    #[test]
    fn store_errors_map_to_statuses() {
        assert_eq!(
            store_error_to_response(StoreError::not_found("dish", 9i64)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            store_error_to_response(StoreError::Conflict("in use".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            store_error_to_response(DomainError::validation("bad").into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn credentials_failures_are_unauthorized() {
        let resp = auth_flow_error_to_response(AuthFlowError::InvalidCredentials);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
