//! Storage error model.
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx error | StoreError |
//! |------------|------------|
//! | Database (unique violation) | `Conflict` |
//! | Database (foreign key violation) | `Conflict` |
//! | Database (check violation) | `Conflict` |
//! | anything else | `Storage` |
//!
//! Ledger failures (`InsufficientStock`, `RaceLost`) are raised explicitly by
//! the ledger, never inferred from driver errors.

use thiserror::Error;

use cafeteria_core::{DomainError, ProductId};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Current stock cannot cover the requested amount.
    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: ProductId },

    /// The conditional deduction matched no row: stock was depleted between
    /// the availability check and the write.
    #[error("stock for product {product_id} was depleted concurrently")]
    RaceLost { product_id: ProductId },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Constraint violation (duplicate key, row still referenced, ...).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure in {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Both ledger rejections mean "not enough stock" to a caller.
    pub fn shortage_product(&self) -> Option<ProductId> {
        match self {
            Self::InsufficientStock { product_id } | Self::RaceLost { product_id } => {
                Some(*product_id)
            }
            _ => None,
        }
    }
}

pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(format!("{operation}: duplicate value ({})", db_err.message()));
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::Conflict(format!(
                "{operation}: referenced row missing or row still in use ({})",
                db_err.message()
            ));
        }
        if db_err.is_check_violation() {
            return StoreError::Conflict(format!("{operation}: {}", db_err.message()));
        }
    }
    StoreError::Storage {
        operation,
        source: err,
    }
}
