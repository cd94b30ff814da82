//! Association rows between laws, categories and parties.

use crate::model::enums::PartyRole;
use crate::model::id::RecordId;
use crate::model::{check_id, ModelValidationError};
use serde::{Deserialize, Serialize};

/// Row of `T_LAW_CATEGORY_MAP`; both columns form the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawCategoryMap {
    pub law_id: RecordId,
    pub category_id: RecordId,
}

impl LawCategoryMap {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        check_id(&self.law_id)?;
        check_id(&self.category_id)
    }
}

/// Row of `T_PARTY_LAW_ROLE`; `(law_id, party_id, role)` is the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyLawRole {
    pub law_id: RecordId,
    pub party_id: RecordId,
    pub role: PartyRole,
    pub note: Option<String>,
}

impl PartyLawRole {
    pub fn new(law_id: impl Into<RecordId>, party_id: impl Into<RecordId>, role: PartyRole) -> Self {
        Self {
            law_id: law_id.into(),
            party_id: party_id.into(),
            role,
            note: None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        check_id(&self.law_id)?;
        check_id(&self.party_id)
    }
}
