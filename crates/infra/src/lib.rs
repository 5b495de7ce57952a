//! Infrastructure layer: SQLite storage and the transactional inventory ledger.

pub mod db;
pub mod error;
pub mod ledger;

pub use db::{
    DbConfig, DishIngredientStore, DishStore, MenuStore, OrderStore, ProductStore,
    StoredCredentials, TableStore, UnitStore, UserStore, connect,
};
pub use error::{StoreError, StoreResult};
pub use ledger::InventoryLedger;
