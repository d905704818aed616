//! Consent classification.
//!
//! The raw consent code carried in a record maps onto exactly three states. Every caller that
//! needs to branch on consent goes through [`ConsentState::from_code`].

use crate::constants::{
    CONSENT_CODE_ELECTRONIC, CONSENT_CODE_IN_PERSON, FIELD_ELECTRONIC_CONSENT_TRIGGER,
    FIELD_IN_PERSON_CONSENT_TRIGGER,
};
use serde::Serialize;

/// Participant consent preference as understood by this service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsentState {
    Electronic,
    InPerson,
    /// No preference was recorded, or the code is not recognised.
    Unset,
}

impl ConsentState {
    /// Classify a raw consent code. Anything other than the two known codes is `Unset`.
    pub fn from_code(code: &str) -> Self {
        match code {
            CONSENT_CODE_ELECTRONIC => Self::Electronic,
            CONSENT_CODE_IN_PERSON => Self::InPerson,
            _ => Self::Unset,
        }
    }

    /// The notification branch for this state, if one exists.
    pub fn branch(self) -> Option<ConsentBranch> {
        match self {
            Self::Electronic => Some(ConsentBranch::Electronic),
            Self::InPerson => Some(ConsentBranch::InPerson),
            Self::Unset => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Electronic => "electronic",
            Self::InPerson => "in-person",
            Self::Unset => "unset",
        }
    }
}

impl std::fmt::Display for ConsentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two actionable consent branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsentBranch {
    Electronic,
    InPerson,
}

impl ConsentBranch {
    /// Target-store field that fires this branch's alert.
    pub fn trigger_field(self) -> &'static str {
        match self {
            Self::Electronic => FIELD_ELECTRONIC_CONSENT_TRIGGER,
            Self::InPerson => FIELD_IN_PERSON_CONSENT_TRIGGER,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Electronic => "electronic",
            Self::InPerson => "in-person",
        }
    }
}

impl std::fmt::Display for ConsentBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
