use serde::{Deserialize, Serialize};

use cafeteria_core::{DomainError, DomainResult, TableId};

/// A dining table orders are placed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub number: i64,
    pub capacity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableDraft {
    pub number: i64,
    pub capacity: i64,
}

impl TableDraft {
    pub fn validate(self) -> DomainResult<Self> {
        if self.number <= 0 {
            return Err(DomainError::validation("table number must be positive"));
        }
        if self.capacity <= 0 {
            return Err(DomainError::validation("table capacity must be positive"));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_tables() {
        assert!(TableDraft { number: 1, capacity: 0 }.validate().is_err());
        assert!(TableDraft { number: 0, capacity: 4 }.validate().is_err());
        assert!(TableDraft { number: 3, capacity: 4 }.validate().is_ok());
    }
}
