//! Law transaction record.
//!
//! # Invariants
//! - `law_number` is unique when present and is the seeding business key.
//! - `created_at`/`updated_at` are assigned by the database; values set on a
//!   `Law` before insert are ignored.

use crate::model::enums::{JurisdictionLevel, LawType};
use crate::model::id::{generate_id, RecordId};
use crate::model::{check_id, check_optional, check_required, ModelValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const LAW_TITLE_MAX: usize = 100;
pub const LAW_NUMBER_MAX: usize = 50;
pub const SOURCE_HASH_MAX: usize = 64;

/// Row of `T_LAW`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Law {
    pub id: RecordId,
    /// Official title.
    pub title: String,
    pub law_number: Option<String>,
    #[serde(rename = "type")]
    pub kind: LawType,
    pub jurisdiction: JurisdictionLevel,
    pub promulgated_on: Option<NaiveDate>,
    pub enacted_on: Option<NaiveDate>,
    pub summary: Option<String>,
    pub source_url: Option<String>,
    pub source_hash: Option<String>,
    /// Server timestamp, `None` until read back.
    pub created_at: Option<String>,
    /// Server timestamp refreshed on every update.
    pub updated_at: Option<String>,
}

impl Law {
    pub fn new(title: impl Into<String>, kind: LawType, jurisdiction: JurisdictionLevel) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            law_number: None,
            kind,
            jurisdiction,
            promulgated_on: None,
            enacted_on: None,
            summary: None,
            source_url: None,
            source_hash: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        check_id(&self.id)?;
        check_required("law.title", &self.title, LAW_TITLE_MAX)?;
        check_optional("law.law_number", self.law_number.as_deref(), LAW_NUMBER_MAX)?;
        check_optional(
            "law.source_hash",
            self.source_hash.as_deref(),
            SOURCE_HASH_MAX,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Law;
    use crate::model::enums::{JurisdictionLevel, LawType};
    use crate::model::ModelValidationError;

    #[test]
    fn overlong_source_hash_is_rejected() {
        let mut law = Law::new("Budget Act", LawType::Statute, JurisdictionLevel::National);
        law.source_hash = Some("f".repeat(65));

        assert!(matches!(
            law.validate(),
            Err(ModelValidationError::TooLong {
                field: "law.source_hash",
                max_chars: 64,
                actual: 65,
            })
        ));
    }
}
