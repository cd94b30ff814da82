//! Closed value sets stored as plain text columns.
//!
//! # Invariants
//! - `as_str` and `parse` are exact inverses.
//! - `VALUES` lists every member in declaration order; schema `CHECK`
//!   constraints are rendered from it.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Text-backed enumeration persisted as its snake_case member name.
pub trait DbEnum: Sized + Copy {
    /// Enum name used in error messages.
    const NAME: &'static str;
    /// Accepted database values.
    const VALUES: &'static [&'static str];

    fn as_str(self) -> &'static str;

    /// Exact, case-sensitive match against `VALUES`.
    fn parse(value: &str) -> Option<Self>;

    fn parse_or_err(value: &str) -> Result<Self, EnumValueError> {
        Self::parse(value).ok_or_else(|| EnumValueError {
            enum_name: Self::NAME,
            value: value.to_string(),
            allowed: Self::VALUES,
        })
    }
}

/// Value is not a member of the declared set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueError {
    pub enum_name: &'static str,
    pub value: String,
    pub allowed: &'static [&'static str],
}

impl Display for EnumValueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` is not a valid {}; expected one of {}",
            self.value,
            self.enum_name,
            self.allowed.join("|")
        )
    }
}

impl Error for EnumValueError {}

/// Legal form of a law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LawType {
    Constitution,
    Statute,
    CabinetOrder,
    MinisterialOrder,
    NationalRule,
    Ordinance,
    LocalRule,
}

impl DbEnum for LawType {
    const NAME: &'static str = "LawType";
    const VALUES: &'static [&'static str] = &[
        "constitution",
        "statute",
        "cabinet_order",
        "ministerial_order",
        "national_rule",
        "ordinance",
        "local_rule",
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Constitution => "constitution",
            Self::Statute => "statute",
            Self::CabinetOrder => "cabinet_order",
            Self::MinisterialOrder => "ministerial_order",
            Self::NationalRule => "national_rule",
            Self::Ordinance => "ordinance",
            Self::LocalRule => "local_rule",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "constitution" => Some(Self::Constitution),
            "statute" => Some(Self::Statute),
            "cabinet_order" => Some(Self::CabinetOrder),
            "ministerial_order" => Some(Self::MinisterialOrder),
            "national_rule" => Some(Self::NationalRule),
            "ordinance" => Some(Self::Ordinance),
            "local_rule" => Some(Self::LocalRule),
            _ => None,
        }
    }
}

/// Government level a law belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JurisdictionLevel {
    National,
    Local,
}

impl DbEnum for JurisdictionLevel {
    const NAME: &'static str = "JurisdictionLevel";
    const VALUES: &'static [&'static str] = &["national", "local"];

    fn as_str(self) -> &'static str {
        match self {
            Self::National => "national",
            Self::Local => "local",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "national" => Some(Self::National),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Part a party played for a law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Submitter,
    CoSubmitter,
    Cabinet,
    Coalition,
    VotedFor,
    VotedAgainst,
}

impl DbEnum for PartyRole {
    const NAME: &'static str = "PartyRole";
    const VALUES: &'static [&'static str] = &[
        "submitter",
        "co_submitter",
        "cabinet",
        "coalition",
        "voted_for",
        "voted_against",
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Submitter => "submitter",
            Self::CoSubmitter => "co_submitter",
            Self::Cabinet => "cabinet",
            Self::Coalition => "coalition",
            Self::VotedFor => "voted_for",
            Self::VotedAgainst => "voted_against",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "submitter" => Some(Self::Submitter),
            "co_submitter" => Some(Self::CoSubmitter),
            "cabinet" => Some(Self::Cabinet),
            "coalition" => Some(Self::Coalition),
            "voted_for" => Some(Self::VotedFor),
            "voted_against" => Some(Self::VotedAgainst),
            _ => None,
        }
    }
}

/// Fixed topical category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Politics,
    Economy,
    International,
    EnvironmentScience,
    Culture,
    LifeMedical,
    Society,
}

impl DbEnum for CategoryType {
    const NAME: &'static str = "CategoryType";
    const VALUES: &'static [&'static str] = &[
        "politics",
        "economy",
        "international",
        "environment_science",
        "culture",
        "life_medical",
        "society",
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Politics => "politics",
            Self::Economy => "economy",
            Self::International => "international",
            Self::EnvironmentScience => "environment_science",
            Self::Culture => "culture",
            Self::LifeMedical => "life_medical",
            Self::Society => "society",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "politics" => Some(Self::Politics),
            "economy" => Some(Self::Economy),
            "international" => Some(Self::International),
            "environment_science" => Some(Self::EnvironmentScience),
            "culture" => Some(Self::Culture),
            "life_medical" => Some(Self::LifeMedical),
            "society" => Some(Self::Society),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CategoryType, DbEnum, JurisdictionLevel, LawType, PartyRole};

    fn assert_values_roundtrip<E: DbEnum + PartialEq + std::fmt::Debug>() {
        for value in E::VALUES {
            let parsed = E::parse(value).expect("declared value should parse");
            assert_eq!(parsed.as_str(), *value);
        }
    }

    #[test]
    fn declared_values_match_members() {
        assert_values_roundtrip::<LawType>();
        assert_values_roundtrip::<JurisdictionLevel>();
        assert_values_roundtrip::<PartyRole>();
        assert_values_roundtrip::<CategoryType>();
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert_eq!(PartyRole::parse("Submitter"), None);
        assert_eq!(PartyRole::parse("co-submitter"), None);
        let err = PartyRole::parse_or_err("voted for").unwrap_err();
        assert!(err.to_string().contains("PartyRole"));
    }
}
