use serde::{Deserialize, Serialize};

use cafeteria_core::{DishId, MenuItemId};

/// Menu entry: whether a dish is currently offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub dish_id: DishId,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MenuItemDraft {
    pub dish_id: DishId,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}
