use serde::{Deserialize, Serialize};

use cafeteria_core::{require_name, DomainResult, UnitId};

/// Measurement unit a product's stock is counted in (e.g. "грамм"/"г").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub abbreviation: String,
}

/// Unit fields as submitted for create/replace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnitDraft {
    pub name: String,
    pub abbreviation: String,
}

impl UnitDraft {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            name: require_name("name", &self.name)?,
            abbreviation: require_name("abbreviation", &self.abbreviation)?,
        })
    }
}
