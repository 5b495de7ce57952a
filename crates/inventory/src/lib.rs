//! Inventory ledger arithmetic.
//!
//! Expands an ordered dish quantity through the dish's bill of materials into
//! per-product stock requirements, classifies quantity changes into stock
//! movements and checks a stock snapshot for sufficiency. Deterministic and
//! IO-free: the infra ledger loads rows, calls into this crate and applies the
//! result inside one storage transaction.

pub mod bom;
pub mod movement;

pub use bom::{check_availability, BillOfMaterials, IngredientLine, Requirement, Shortage, StockLine};
pub use movement::StockMovement;
