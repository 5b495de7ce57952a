//! Orders domain module: tables, orders and order line items.
//!
//! Pure domain types and validation (no IO, no HTTP, no storage). Stock
//! bookkeeping for order lines lives in `cafeteria-inventory` and is applied by
//! the infra ledger.

pub mod order;
pub mod table;

pub use order::{
    validate_line_quantity, Order, OrderDetails, OrderDraft, OrderItem, OrderLine, OrderStatus,
};
pub use table::{Table, TableDraft};
