//! Topical category master record.

use crate::model::check_id;
use crate::model::enums::CategoryType;
use crate::model::id::{generate_id, RecordId};
use crate::model::ModelValidationError;
use serde::{Deserialize, Serialize};

/// Row of `M_CATEGORY`. One row per `CategoryType` at most.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: RecordId,
    pub name: CategoryType,
    pub description: Option<String>,
}

impl Category {
    pub fn new(name: CategoryType) -> Self {
        Self {
            id: generate_id(),
            name,
            description: None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        check_id(&self.id)
    }
}
