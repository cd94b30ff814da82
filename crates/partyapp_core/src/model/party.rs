//! Political party master record.

use crate::model::id::{generate_id, RecordId};
use crate::model::{check_id, check_optional, check_required, ModelValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const PARTY_NAME_MAX: usize = 50;
pub const PARTY_SHORT_NAME_MAX: usize = 50;

/// Row of `M_PARTY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: RecordId,
    /// Unique official name; business key for seeding.
    pub name: String,
    pub short_name: Option<String>,
    pub founded_on: Option<NaiveDate>,
    pub dissolved_on: Option<NaiveDate>,
}

impl Party {
    /// Creates a party with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            short_name: None,
            founded_on: None,
            dissolved_on: None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        check_id(&self.id)?;
        check_required("party.name", &self.name, PARTY_NAME_MAX)?;
        check_optional(
            "party.short_name",
            self.short_name.as_deref(),
            PARTY_SHORT_NAME_MAX,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Party;
    use crate::model::ModelValidationError;

    #[test]
    fn new_party_is_valid() {
        let party = Party::new("Alpha");
        party.validate().unwrap();
    }

    #[test]
    fn blank_name_is_rejected() {
        let party = Party::new("  ");
        assert_eq!(
            party.validate(),
            Err(ModelValidationError::EmptyField("party.name"))
        );
    }
}
