//! Strongly-typed identifiers used across the domain.
//!
//! Rows are keyed by SQLite `INTEGER PRIMARY KEY` values, so every identifier
//! wraps an `i64`. Identifiers are always positive.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(i64);

        impl $t {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                if raw <= 0 {
                    return Err(DomainError::invalid_id(format!("{}: must be positive", $name)));
                }
                Ok(Self(raw))
            }
        }
    };
}

id_newtype!(
    /// Identifier of a measurement unit (grams, pieces, ...).
    UnitId, "UnitId"
);
id_newtype!(
    /// Identifier of a raw product held in stock.
    ProductId, "ProductId"
);
id_newtype!(DishId, "DishId");
id_newtype!(DishIngredientId, "DishIngredientId");
id_newtype!(MenuItemId, "MenuItemId");
id_newtype!(TableId, "TableId");
id_newtype!(OrderId, "OrderId");
id_newtype!(OrderItemId, "OrderItemId");
id_newtype!(
    /// Identifier of an authenticated user account.
    UserId, "UserId"
);
