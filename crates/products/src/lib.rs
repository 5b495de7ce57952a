//! Products domain module: raw ingredients held in stock and their units.
//!
//! Pure domain types and validation (no IO, no HTTP, no storage).

pub mod product;
pub mod unit;

pub use product::{Product, ProductDraft, ProductWithUnit, PublicProduct};
pub use unit::{Unit, UnitDraft};
